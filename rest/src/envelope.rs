//! JSON envelopes shared by every endpoint.
//!
//! Success: `{"success": true, "message": ..., "data": {...}}`.
//! Failure: `{"success": false, "error": {"message", "code", "details"}}`,
//! with the HTTP status taken from the error's [`ErrorCode`].

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use metaforge_ops::OpsError;
use serde::Serialize;
use serde_json::Value;

/// Successful response body.
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiSuccess<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub code: String,
    pub details: Value,
}

/// Failure response body.
#[derive(Debug, Serialize)]
pub struct ApiFailure {
    pub success: bool,
    pub error: ErrorBody,
}

impl ApiFailure {
    pub fn from_error(err: &OpsError) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                message: err.to_string(),
                code: err.code().to_string(),
                details: err.details(),
            },
        }
    }
}

/// Response wrapper for [`OpsError`], so handlers can use `?`.
#[derive(Debug)]
pub struct ApiError(pub OpsError);

impl From<OpsError> for ApiError {
    fn from(err: OpsError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.code().http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        tracing::debug!(code = %self.0.code(), %status, "request failed");
        (status, Json(ApiFailure::from_error(&self.0))).into_response()
    }
}
