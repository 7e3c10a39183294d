//! Bridge error responses.
//!
//! Errors leave the bridge in the same `{status, message}` shape as every
//! coordinator reply, so UI surfaces handle one format.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use wp_snippets::SaveStatus;

use crate::coordinator::SendError;

/// Bridge error response body.
#[derive(Debug, Serialize)]
pub struct BridgeErrorResponse {
    pub status: SaveStatus,
    pub message: String,
}

/// Bridge error type that can be converted to HTTP responses.
#[derive(Debug)]
pub struct BridgeError {
    pub status: StatusCode,
    pub message: String,
}

impl BridgeError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Create a 400 Bad Request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Create a 403 Forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// Create a 503 Service Unavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let body = BridgeErrorResponse {
            status: SaveStatus::Error,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<SendError> for BridgeError {
    fn from(err: SendError) -> Self {
        tracing::warn!(error = %err, "Coordinator unavailable");
        BridgeError::service_unavailable(err.to_string())
    }
}

/// Result type for bridge handlers.
pub type BridgeResult<T> = Result<T, BridgeError>;
