use axum::{routing::get, Router};

use crate::infrastructure::AppState;

pub mod bulk_operations;
pub mod health;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/bulk-operations",
            get(bulk_operations::list_operations).post(bulk_operations::submit_operation),
        )
        .route("/bulk-operations/:id", get(bulk_operations::get_operation))
        .with_state(state)
}
