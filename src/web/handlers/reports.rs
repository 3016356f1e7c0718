//! # Report Creation Handlers
//!
//! `POST /reports/v1` and `POST /reports/v2`. Both persist a unit of work and
//! dispatch its two steps; V2 routes to the `-v2` topics and asks workers to
//! skip the vector store.

use crate::dispatch::DispatchVariant;
use crate::web::response_types::{ApiError, ApiResponse, ApiResult};
use crate::web::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReportParams {
    pub video_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub google_access_token: String,
}

/// Create report: POST /reports/v1?video_id=
pub async fn create_report_v1(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CreateReportParams>,
    Json(request): Json<CreateReportRequest>,
) -> ApiResult<Value> {
    let receipt = dispatch(&state, &params, &request, DispatchVariant::V1).await?;
    Ok(Json(ApiResponse::ok(json!({ "task_id": receipt }))))
}

/// Create report without vector storage: POST /reports/v2?video_id=
pub async fn create_report_v2(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CreateReportParams>,
    Json(request): Json<CreateReportRequest>,
) -> ApiResult<Value> {
    let receipt = dispatch(&state, &params, &request, DispatchVariant::V2).await?;
    Ok(Json(ApiResponse::ok(json!({
        "task_id": receipt,
        "version": "v2",
    }))))
}

async fn dispatch(
    state: &AppState,
    params: &CreateReportParams,
    request: &CreateReportRequest,
    variant: DispatchVariant,
) -> Result<i64, ApiError> {
    if request.google_access_token.trim().is_empty() {
        return Err(ApiError::bad_request("googleAccessToken must not be empty"));
    }

    match state
        .dispatcher
        .create_report(params.video_id, &request.google_access_token, variant)
        .await
    {
        Ok(receipt) => Ok(receipt.task_id),
        Err(error) => {
            warn!(
                video_id = params.video_id,
                variant = %variant,
                error = %error,
                "Report creation failed"
            );
            Err(error.into())
        }
    }
}
