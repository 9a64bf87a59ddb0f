//! Session inspection and deletion.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;

use parley_types::dialog::DialogSession;

use crate::http::error::AppError;
use crate::state::AppState;

/// `GET /api/v1/session/{key}` -- inspect the stored session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DialogSession>, AppError> {
    match state.dialog.session(&key).await? {
        Some(session) => Ok(Json(session)),
        None => Err(AppError::SessionNotFound(key)),
    }
}

/// `DELETE /api/v1/session/{key}` -- drop the stored session.
///
/// Deleting an absent session succeeds; the end state is the same.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.dialog.clear_session(&key).await?;
    Ok(Json(json!({ "deleted": key })))
}
