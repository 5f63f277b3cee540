//! The order pipeline: creation with its best-effort side effects, cached
//! reads, mutations with status notifications and bounded batch creation.

pub mod batch;
pub mod errors;
pub mod notifier;
pub mod service;
pub mod tasks;

pub use batch::{BatchFailure, BatchItemResult, BatchProcessor, BatchSummary, OrderCreator};
pub use errors::{OrderError, Result};
pub use notifier::StatusNotifier;
pub use service::{
    OrderDependencies, OrderService, OrderServiceConfig, OrderWithPayment, PaymentOutcome,
    StatusUpdateAck,
};
pub use tasks::TaskRunner;
