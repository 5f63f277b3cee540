use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge,
    IntGaugeVec, Opts, Registry, TextEncoder,
};
use thiserror::Error;

use crate::circuit_breaker::CircuitState;

/// Metrics sink injected into the order pipeline.
///
/// Implementations must be cheap to call from hot paths; tests substitute a
/// counting fake.
pub trait MetricsRecorder: Send + Sync {
    fn order_created(&self);

    fn order_status_updated(&self, status: &str);

    fn increment_active_orders(&self);

    fn decrement_active_orders(&self);

    fn record_operation(&self, operation: &str, success: bool, duration_secs: f64);

    fn record_batch(&self, total: usize, failed: usize, duration_secs: f64);

    fn record_cache_request(&self, cache: &str, hit: bool);

    fn record_circuit_breaker_state(&self, service: &str, state: CircuitState);
}

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("Metrics output is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Prometheus-backed recorder owning its own registry
pub struct PrometheusMetrics {
    registry: Registry,
    orders_created: IntCounter,
    status_updates: IntCounterVec,
    active_orders: IntGauge,
    operations: IntCounterVec,
    operation_duration: HistogramVec,
    batch_items: IntCounterVec,
    batch_duration: Histogram,
    cache_requests: IntCounterVec,
    circuit_breaker_state: IntGaugeVec,
}

impl PrometheusMetrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let orders_created = IntCounter::with_opts(Opts::new(
            "orders_created_total",
            "Total number of orders persisted",
        ))?;
        let status_updates = IntCounterVec::new(
            Opts::new(
                "order_status_updates_total",
                "Total number of order status updates",
            ),
            &["status"],
        )?;
        let active_orders = IntGauge::new("active_orders", "Orders not yet completed or cancelled")?;
        let operations = IntCounterVec::new(
            Opts::new("order_operations_total", "Total number of order operations"),
            &["operation", "status"],
        )?;
        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "order_operation_duration_seconds",
                "Order operation duration in seconds",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["operation"],
        )?;
        let batch_items = IntCounterVec::new(
            Opts::new("order_batch_items_total", "Total number of batch items processed"),
            &["status"],
        )?;
        let batch_duration = Histogram::with_opts(
            HistogramOpts::new("order_batch_duration_seconds", "Batch processing duration")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        )?;
        let cache_requests = IntCounterVec::new(
            Opts::new("cache_requests_total", "Total number of cache requests"),
            &["cache_type", "status"],
        )?;
        let circuit_breaker_state = IntGaugeVec::new(
            Opts::new(
                "circuit_breaker_state",
                "Circuit breaker state (0=closed, 1=open, 2=half-open)",
            ),
            &["service"],
        )?;

        registry.register(Box::new(orders_created.clone()))?;
        registry.register(Box::new(status_updates.clone()))?;
        registry.register(Box::new(active_orders.clone()))?;
        registry.register(Box::new(operations.clone()))?;
        registry.register(Box::new(operation_duration.clone()))?;
        registry.register(Box::new(batch_items.clone()))?;
        registry.register(Box::new(batch_duration.clone()))?;
        registry.register(Box::new(cache_requests.clone()))?;
        registry.register(Box::new(circuit_breaker_state.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            status_updates,
            active_orders,
            operations,
            operation_duration,
            batch_items,
            batch_duration,
            cache_requests,
            circuit_breaker_state,
        })
    }

    /// Get all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn active_orders(&self) -> i64 {
        self.active_orders.get()
    }
}

impl MetricsRecorder for PrometheusMetrics {
    fn order_created(&self) {
        self.orders_created.inc();
    }

    fn order_status_updated(&self, status: &str) {
        self.status_updates.with_label_values(&[status]).inc();
    }

    fn increment_active_orders(&self) {
        self.active_orders.inc();
    }

    fn decrement_active_orders(&self) {
        self.active_orders.dec();
    }

    fn record_operation(&self, operation: &str, success: bool, duration_secs: f64) {
        let status = if success { "success" } else { "error" };
        self.operations
            .with_label_values(&[operation, status])
            .inc();
        self.operation_duration
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    fn record_batch(&self, total: usize, failed: usize, duration_secs: f64) {
        let succeeded = total.saturating_sub(failed);
        self.batch_items
            .with_label_values(&["success"])
            .inc_by(succeeded as u64);
        self.batch_items
            .with_label_values(&["error"])
            .inc_by(failed as u64);
        self.batch_duration.observe(duration_secs);
    }

    fn record_cache_request(&self, cache: &str, hit: bool) {
        let status = if hit { "hit" } else { "miss" };
        self.cache_requests
            .with_label_values(&[cache, status])
            .inc();
    }

    fn record_circuit_breaker_state(&self, service: &str, state: CircuitState) {
        let value = match state {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        };
        self.circuit_breaker_state
            .with_label_values(&[service])
            .set(value);
    }
}

/// Recorder that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsRecorder for NoopMetrics {
    fn order_created(&self) {}
    fn order_status_updated(&self, _status: &str) {}
    fn increment_active_orders(&self) {}
    fn decrement_active_orders(&self) {}
    fn record_operation(&self, _operation: &str, _success: bool, _duration_secs: f64) {}
    fn record_batch(&self, _total: usize, _failed: usize, _duration_secs: f64) {}
    fn record_cache_request(&self, _cache: &str, _hit: bool) {}
    fn record_circuit_breaker_state(&self, _service: &str, _state: CircuitState) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_metrics() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.order_created();

        let output = metrics.gather().unwrap();
        assert!(output.contains("orders_created_total 1"));
    }

    #[test]
    fn test_active_orders_gauge() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.increment_active_orders();
        metrics.increment_active_orders();
        metrics.decrement_active_orders();

        assert_eq!(metrics.active_orders(), 1);
    }

    #[test]
    fn test_status_update_labels() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.order_status_updated("completed");

        let output = metrics.gather().unwrap();
        assert!(output.contains("order_status_updates_total{status=\"completed\"} 1"));
    }

    #[test]
    fn test_record_batch() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.record_batch(5, 2, 0.3);

        let output = metrics.gather().unwrap();
        assert!(output.contains("order_batch_items_total{status=\"success\"} 3"));
        assert!(output.contains("order_batch_items_total{status=\"error\"} 2"));
    }

    #[test]
    fn test_registries_are_independent() {
        let first = PrometheusMetrics::new().unwrap();
        let second = PrometheusMetrics::new().unwrap();
        first.increment_active_orders();

        assert_eq!(first.active_orders(), 1);
        assert_eq!(second.active_orders(), 0);
    }

    #[test]
    fn test_circuit_breaker_state() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.record_circuit_breaker_state("payment-service", CircuitState::Open);

        let output = metrics.gather().unwrap();
        assert!(output.contains("circuit_breaker_state{service=\"payment-service\"} 1"));
    }
}
