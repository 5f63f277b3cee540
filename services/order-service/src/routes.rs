use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{
    batch_orders, create_order, delete_order, get_order, health, metrics, update_order,
};
use crate::state::AppState;

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        .route(
            "/api/v1/orders",
            post(create_order::handle).get(get_order::list_orders_handler),
        )
        .route(
            "/api/v1/orders/with-payment",
            post(create_order::handle_with_payment),
        )
        .route("/api/v1/orders/batch", post(batch_orders::handle))
        .route(
            "/api/v1/orders/:id",
            get(get_order::get_order_handler)
                .put(update_order::handle)
                .delete(delete_order::handle),
        )
        .route("/api/v1/orders/:id/status", patch(update_order::handle_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
