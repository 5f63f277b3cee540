use serde::{Deserialize, Serialize};

use super::DomainEvent;
use crate::models::order::Order;

/// Published once an order has been persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl DomainEvent for OrderCreatedEvent {
    fn event_type() -> &'static str {
        "OrderCreated"
    }
}
