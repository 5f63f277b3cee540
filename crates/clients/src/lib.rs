//! Capabilities the order pipeline calls out to: inventory checks, payment
//! intents and customer notifications. Each has an HTTP implementation guarded
//! by a circuit breaker and an in-memory implementation.

pub mod http;
pub mod inventory;
pub mod memory;
pub mod notification;
pub mod payment;

pub use http::ServiceClient;
pub use inventory::{HttpInventoryChecker, InventoryChecker};
pub use memory::{
    InMemoryInventory, InMemoryNotifications, InMemoryPayments, PaymentRecord, SentNotification,
};
pub use notification::{HttpNotificationDispatcher, NotificationDispatcher};
pub use payment::{HttpPaymentAuthority, PaymentAuthority, PaymentIntent};

use common::CircuitBreakerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Circuit breaker is open for {0}")]
    CircuitOpen(String),

    #[error("Request to {0} timed out")]
    Timeout(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {service}")]
    UnexpectedStatus { service: String, status: u16 },

    #[error("{0} is unavailable")]
    Unavailable(String),
}

impl ClientError {
    fn from_breaker(service: &str, err: CircuitBreakerError<ClientError>) -> Self {
        match err {
            CircuitBreakerError::Open => ClientError::CircuitOpen(service.to_string()),
            CircuitBreakerError::Timeout => ClientError::Timeout(service.to_string()),
            CircuitBreakerError::CallFailed(e) => e,
        }
    }
}
