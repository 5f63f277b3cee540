use axum::{
    extract::{Path, State},
    Json,
};
use domain::Order;
use tracing::info;

use crate::error::{parse_id, ApiError};
use crate::state::AppState;

/// Get a single order by ID, cache first
pub async fn get_order_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let id = parse_id(&id)?;
    info!("Fetching order: {}", id);

    Ok(Json(state.orders.get_order(id).await?))
}

/// List every order
pub async fn list_orders_handler(State(state): State<AppState>) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.list_orders().await?))
}
