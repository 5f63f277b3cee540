use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use domain::{CreateOrderCommand, CreateOrderWithPaymentCommand, Order};
use orchestration::OrderWithPayment;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Create an order
pub async fn handle(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrderCommand>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let Json(cmd) = payload?;
    info!("Received create order request for customer: {}", cmd.customer_id);

    let order = state.orders.create_order(cmd).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Create an order and open a payment intent for it
pub async fn handle_with_payment(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrderWithPaymentCommand>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderWithPayment>), ApiError> {
    let Json(cmd) = payload?;
    info!(
        "Received create order with payment request for customer: {}",
        cmd.order.customer_id
    );

    let created = state.orders.create_order_with_payment(cmd).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
