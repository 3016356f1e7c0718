//! # Web API Module
//!
//! HTTP entry points that create report work and report service health.

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod handlers;
pub mod response_types;
pub mod routes;
pub mod state;

pub use response_types::{ApiError, ApiResponse, ApiResult};
pub use state::AppState;

/// Create the web application with all routes and middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    let app = Router::new()
        .merge(routes::health_routes())
        .merge(routes::report_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Web application created with all routes and middleware");
    app
}
