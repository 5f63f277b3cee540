use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::error::{parse_id, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DeleteOrderResponse {
    pub message: String,
}

pub async fn handle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOrderResponse>, ApiError> {
    let id = parse_id(&id)?;
    info!("Deleting order: {}", id);

    state.orders.delete_order(id).await?;
    Ok(Json(DeleteOrderResponse {
        message: "Order deleted successfully".to_string(),
    }))
}
