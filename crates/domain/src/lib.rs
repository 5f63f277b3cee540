pub mod commands;
pub mod errors;
pub mod events;
pub mod models;

pub use commands::order_commands::{
    CreateOrderCommand, CreateOrderWithPaymentCommand, UpdateOrderCommand, UpdateStatusCommand,
};
pub use errors::DomainError;
pub use events::{order_events::OrderCreatedEvent, DomainEvent, EventEnvelope, EventMetadata};
pub use models::order::{CustomerId, NewOrder, Order, OrderId, OrderStatus, ProductId};
