use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::order::{CustomerId, OrderStatus, ProductId};

/// Command to create a new order
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderCommand {
    #[validate(range(min = 1, message = "Customer ID must be positive"))]
    pub customer_id: CustomerId,

    #[validate(range(min = 1, message = "Product ID must be positive"))]
    pub product_id: ProductId,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,

    #[serde(default)]
    #[validate(range(min = 0.0, message = "Total price cannot be negative"))]
    pub total_price: f64,
}

/// Command to create an order and open a payment intent for it
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderWithPaymentCommand {
    #[serde(flatten)]
    #[validate(nested)]
    pub order: CreateOrderCommand,

    #[validate(length(equal = 3, message = "Currency must be a 3-letter ISO code"))]
    pub currency: String,
}

/// Command to overwrite every mutable field of an order
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateOrderCommand {
    #[validate(range(min = 1, message = "Customer ID must be positive"))]
    pub customer_id: CustomerId,

    #[validate(range(min = 1, message = "Product ID must be positive"))]
    pub product_id: ProductId,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,

    #[validate(range(min = 0.0, message = "Total price cannot be negative"))]
    pub total_price: f64,

    pub status: OrderStatus,
}

/// Command to change only the status column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusCommand {
    pub status: OrderStatus,
}
