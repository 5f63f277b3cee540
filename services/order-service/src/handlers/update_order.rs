use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use domain::{Order, OrderId, OrderStatus, UpdateOrderCommand, UpdateStatusCommand};
use serde::Serialize;
use tracing::info;

use crate::error::{parse_id, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusUpdateResponse {
    pub message: String,
    pub order_id: OrderId,
    pub status: OrderStatus,
}

/// Replace every mutable field of an order
pub async fn handle(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateOrderCommand>, JsonRejection>,
) -> Result<Json<Order>, ApiError> {
    let id = parse_id(&id)?;
    let Json(cmd) = payload?;
    info!("Updating order: {}", id);

    Ok(Json(state.orders.update_order(id, cmd).await?))
}

/// Change only the status of an order
pub async fn handle_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusCommand>, JsonRejection>,
) -> Result<Json<StatusUpdateResponse>, ApiError> {
    let id = parse_id(&id)?;
    let Json(cmd) = payload?;
    info!("Updating status of order {} to {}", id, cmd.status);

    let ack = state.orders.update_order_status(id, cmd.status).await?;
    Ok(Json(StatusUpdateResponse {
        message: "Order status updated successfully".to_string(),
        order_id: ack.order_id,
        status: ack.status,
    }))
}
