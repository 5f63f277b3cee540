use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::metrics::MetricsRecorder;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    /// Upper bound on a single protected call
    pub timeout: Duration,
    /// How long the circuit stays open before probing again
    pub half_open_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout: Duration::from_secs(60),
            half_open_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failures: u32,
    successes: u32,
    opened_at: Option<Instant>,
}

/// Circuit breaker guarding calls to one downstream service
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl CircuitBreaker {
    pub fn new(
        name: impl Into<String>,
        config: CircuitBreakerConfig,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Self {
        let name = name.into();
        metrics.record_circuit_breaker_state(&name, CircuitState::Closed);

        Self {
            name,
            config,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failures: 0,
                successes: 0,
                opened_at: None,
            }),
            metrics,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute a future with circuit breaker protection
    pub async fn call<F, T, E>(&self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        if !self.try_acquire().await {
            return Err(CircuitBreakerError::Open);
        }

        let start = Instant::now();
        match tokio::time::timeout(self.config.timeout, f).await {
            Ok(Ok(value)) => {
                self.on_success().await;
                tracing::debug!(
                    service = %self.name,
                    duration_ms = %start.elapsed().as_millis(),
                    "Circuit breaker call succeeded"
                );
                Ok(value)
            }
            Ok(Err(err)) => {
                self.on_failure().await;
                tracing::warn!(
                    service = %self.name,
                    duration_ms = %start.elapsed().as_millis(),
                    "Circuit breaker call failed"
                );
                Err(CircuitBreakerError::CallFailed(err))
            }
            Err(_) => {
                self.on_failure().await;
                tracing::error!(
                    service = %self.name,
                    timeout_ms = %self.config.timeout.as_millis(),
                    "Circuit breaker call timed out"
                );
                Err(CircuitBreakerError::Timeout)
            }
        }
    }

    /// Returns true if the call should proceed
    async fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock().await;

        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooled_down = inner
                    .opened_at
                    .map(|at| at.elapsed() >= self.config.half_open_timeout)
                    .unwrap_or(true);

                if cooled_down {
                    inner.successes = 0;
                    self.transition(&mut inner, CircuitState::HalfOpen);
                }
                cooled_down
            }
        }
    }

    async fn on_success(&self) {
        let mut inner = self.inner.lock().await;

        match inner.state {
            CircuitState::Closed => inner.failures = 0,
            CircuitState::HalfOpen => {
                inner.successes += 1;
                if inner.successes >= self.config.success_threshold {
                    inner.failures = 0;
                    inner.successes = 0;
                    inner.opened_at = None;
                    self.transition(&mut inner, CircuitState::Closed);
                }
            }
            CircuitState::Open => {}
        }
    }

    async fn on_failure(&self) {
        let mut inner = self.inner.lock().await;
        inner.failures += 1;

        match inner.state {
            CircuitState::Closed if inner.failures >= self.config.failure_threshold => {
                inner.opened_at = Some(Instant::now());
                self.transition(&mut inner, CircuitState::Open);
            }
            CircuitState::HalfOpen => {
                // a single failed probe reopens the circuit
                inner.failures = 1;
                inner.opened_at = Some(Instant::now());
                self.transition(&mut inner, CircuitState::Open);
            }
            _ => {}
        }
    }

    fn transition(&self, inner: &mut BreakerState, to: CircuitState) {
        let from = inner.state;
        inner.state = to;
        self.metrics.record_circuit_breaker_state(&self.name, to);

        match to {
            CircuitState::Open => tracing::warn!(
                service = %self.name,
                from = ?from,
                failures = %inner.failures,
                "Circuit breaker opened"
            ),
            _ => tracing::info!(service = %self.name, from = ?from, to = ?to, "Circuit breaker transitioned"),
        }
    }

    /// Get current state (for testing/monitoring)
    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("Circuit breaker is open")]
    Open,

    #[error("Call timed out")]
    Timeout,

    #[error("Call failed: {0}")]
    CallFailed(E),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::NoopMetrics;

    #[derive(Debug, thiserror::Error)]
    #[error("Test error")]
    struct TestError;

    fn breaker(config: CircuitBreakerConfig) -> CircuitBreaker {
        CircuitBreaker::new("test-service", config, Arc::new(NoopMetrics))
    }

    #[tokio::test]
    async fn test_circuit_breaker_success() {
        let cb = breaker(CircuitBreakerConfig::default());

        let result = cb.call(async { Ok::<_, TestError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_circuit_breaker_failure() {
        let cb = breaker(CircuitBreakerConfig::default());

        let result = cb.call(async { Err::<i32, _>(TestError) }).await;
        assert!(matches!(result, Err(CircuitBreakerError::CallFailed(TestError))));
        assert_eq!(cb.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_circuit_breaker_timeout() {
        let cb = breaker(CircuitBreakerConfig {
            timeout: Duration::from_millis(50),
            ..Default::default()
        });

        let result = cb
            .call(async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, TestError>(42)
            })
            .await;

        assert!(matches!(result, Err(CircuitBreakerError::Timeout)));
    }

    #[tokio::test]
    async fn test_circuit_breaker_opens_after_failures() {
        let cb = breaker(CircuitBreakerConfig {
            failure_threshold: 3,
            ..Default::default()
        });

        for _ in 0..3 {
            let _ = cb.call(async { Err::<i32, _>(TestError) }).await;
        }
        assert_eq!(cb.state().await, CircuitState::Open);

        let result = cb.call(async { Ok::<_, TestError>(1) }).await;
        assert!(matches!(result, Err(CircuitBreakerError::Open)));
    }

    #[tokio::test]
    async fn test_half_open_closes_after_successes() {
        let cb = breaker(CircuitBreakerConfig {
            failure_threshold: 1,
            success_threshold: 2,
            half_open_timeout: Duration::from_millis(20),
            ..Default::default()
        });

        let _ = cb.call(async { Err::<i32, _>(TestError) }).await;
        assert_eq!(cb.state().await, CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(cb.call(async { Ok::<_, TestError>(1) }).await.is_ok());
        assert_eq!(cb.state().await, CircuitState::HalfOpen);
        assert!(cb.call(async { Ok::<_, TestError>(2) }).await.is_ok());
        assert_eq!(cb.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_half_open_failure_reopens() {
        let cb = breaker(CircuitBreakerConfig {
            failure_threshold: 1,
            half_open_timeout: Duration::from_millis(20),
            ..Default::default()
        });

        let _ = cb.call(async { Err::<i32, _>(TestError) }).await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        let _ = cb.call(async { Err::<i32, _>(TestError) }).await;
        assert_eq!(cb.state().await, CircuitState::Open);
    }

    #[test]
    fn test_circuit_breaker_config_default() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.success_threshold, 2);
        assert_eq!(config.timeout, Duration::from_secs(60));
    }
}
