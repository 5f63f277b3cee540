use domain::{DomainError, OrderId};
use persistence::RepositoryError;
use thiserror::Error;

/// Failures that abort an order operation.
///
/// Degraded steps (publishing, notifications, payment) never surface here;
/// they are logged and the primary effect still succeeds.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Product not available in requested quantity")]
    InsufficientInventory,

    #[error("Failed to check inventory: {0}")]
    InventoryService(String),

    #[error("Order not found: {0}")]
    NotFound(OrderId),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Batch deadline elapsed before the order was processed")]
    BatchTimeout,

    /// The pipeline for one order panicked or was cancelled
    #[error("Order processing aborted: {0}")]
    Pipeline(String),
}

impl OrderError {
    /// Stable machine-readable classification
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::Validation(_) => "validation_error",
            OrderError::InsufficientInventory => "insufficient_inventory",
            OrderError::InventoryService(_) => "inventory_service_error",
            OrderError::NotFound(_) => "not_found",
            OrderError::Persistence(_) => "persistence_error",
            OrderError::BatchTimeout => "batch_timeout",
            OrderError::Pipeline(_) => "pipeline_error",
        }
    }

    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, OrderError::InventoryService(_) | OrderError::BatchTimeout)
    }
}

impl From<RepositoryError> for OrderError {
    fn from(err: RepositoryError) -> Self {
        OrderError::Persistence(err.to_string())
    }
}

impl From<DomainError> for OrderError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::ValidationError(msg) => OrderError::Validation(msg),
            other => OrderError::Validation(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for OrderError {
    fn from(errors: validator::ValidationErrors) -> Self {
        OrderError::Validation(errors.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_inventory_message() {
        assert_eq!(
            OrderError::InsufficientInventory.to_string(),
            "Product not available in requested quantity"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(OrderError::InventoryService("down".into()).is_transient());
        assert!(OrderError::BatchTimeout.is_transient());
        assert!(!OrderError::InsufficientInventory.is_transient());
        assert!(!OrderError::Persistence("disk".into()).is_transient());
        assert!(!OrderError::NotFound(1).is_transient());
        assert!(!OrderError::Pipeline("panicked".into()).is_transient());
    }

    #[test]
    fn test_repository_errors_are_persistence() {
        let err: OrderError = RepositoryError::Unavailable("gone".into()).into();
        assert_eq!(err.kind(), "persistence_error");
    }

    #[test]
    fn test_unknown_status_is_validation() {
        let err: OrderError = DomainError::UnknownStatus("lost".into()).into();
        assert!(matches!(err, OrderError::Validation(_)));
    }
}
