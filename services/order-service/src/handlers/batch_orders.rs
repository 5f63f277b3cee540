use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use domain::CreateOrderCommand;
use orchestration::BatchSummary;
use std::time::Instant;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Create many orders in parallel. Individual failures are reported in the
/// summary; the request itself only fails on an unreadable body.
pub async fn handle(
    State(state): State<AppState>,
    payload: Result<Json<Vec<CreateOrderCommand>>, JsonRejection>,
) -> Result<Json<BatchSummary>, ApiError> {
    let Json(orders) = payload?;
    info!("Received batch of {} orders", orders.len());

    let started = Instant::now();
    let results = state
        .batch
        .process(
            orders,
            state.batch_config.workers,
            state.batch_config.timeout(),
        )
        .await;

    Ok(Json(BatchSummary::from_results(&results, started.elapsed())))
}
