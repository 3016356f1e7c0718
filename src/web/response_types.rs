//! # Web API Response Types
//!
//! Every endpoint answers with the same envelope:
//! `{"isSuccess", "code", "message", "result"}`. Errors use the envelope too,
//! with `isSuccess: false` and an HTTP status taken from the error.

use crate::dispatch::DispatchError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

pub const SUCCESS_CODE: &str = "COMMON200";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(result: T) -> Self {
        Self {
            is_success: true,
            code: SUCCESS_CODE.to_string(),
            message: "OK".to_string(),
            result,
        }
    }
}

/// Web API errors with HTTP status code mappings
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    #[error("Service temporarily unavailable")]
    ServiceUnavailable { detail: Value },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Dispatch(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "COMMON400",
            Self::ServiceUnavailable { .. } => "COMMON503",
            Self::Dispatch(_) | Self::Internal(_) => "COMMON500",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let result = match &self {
            Self::ServiceUnavailable { detail } => detail.clone(),
            other => json!({ "error": other.to_string() }),
        };
        let body = ApiResponse {
            is_success: false,
            code: self.code().to_string(),
            message: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            result,
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_uses_camel_case() {
        let value = serde_json::to_value(ApiResponse::ok(json!({"task_id": 3}))).unwrap();
        assert_eq!(
            value,
            json!({
                "isSuccess": true,
                "code": "COMMON200",
                "message": "OK",
                "result": {"task_id": 3}
            })
        );
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            ApiError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::bad_request("video_id").status_code(),
            StatusCode::BAD_REQUEST
        );
        let response = ApiError::Internal("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
