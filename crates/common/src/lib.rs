pub mod circuit_breaker;
pub mod config;
pub mod metrics;
pub mod telemetry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};
pub use config::AppConfig;
pub use metrics::{MetricsRecorder, NoopMetrics, PrometheusMetrics};
