//! Application error type mapping to HTTP status codes.
//!
//! Every error leaves as `{"error": message, "code": CODE}`. Validation
//! and session-state errors map to 4xx, backend and protocol failures to
//! 5xx; the machine-readable codes come from the error enums themselves.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use parley_types::error::{AgentError, DialogError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Dialog(DialogError),
    Agent(AgentError),
    /// No session stored under the requested key.
    SessionNotFound(String),
}

impl From<DialogError> for AppError {
    fn from(e: DialogError) -> Self {
        AppError::Dialog(e)
    }
}

impl From<AgentError> for AppError {
    fn from(e: AgentError) -> Self {
        AppError::Agent(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Dialog(e) => {
                let status = match e {
                    DialogError::DialogCompleted(_) | DialogError::MaxRoundsExceeded { .. } => {
                        StatusCode::CONFLICT
                    }
                    _ if e.is_client_error() => StatusCode::BAD_REQUEST,
                    DialogError::Backend(_) => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.code(), e.to_string())
            }
            AppError::Agent(e) => {
                let status = match e {
                    _ if e.is_client_error() => StatusCode::BAD_REQUEST,
                    AgentError::Backend(_) => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::SERVICE_UNAVAILABLE,
                };
                (status, e.code(), e.to_string())
            }
            AppError::SessionNotFound(key) => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                format!("no session stored under key '{key}'"),
            ),
        };

        if status.is_server_error() {
            tracing::error!(code, %message, "request failed");
        } else {
            tracing::debug!(code, %message, "request rejected");
        }

        (status, Json(json!({ "error": message, "code": code }))).into_response()
    }
}
