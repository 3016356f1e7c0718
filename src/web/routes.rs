//! Web API Routes

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::web::{handlers, state::AppState};

/// Health check routes for monitoring
pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(handlers::health::health_check))
}

/// Report creation routes
pub fn report_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reports/v1", post(handlers::reports::create_report_v1))
        .route("/reports/v2", post(handlers::reports::create_report_v2))
}
