//! Multi-round dialog endpoint.

use axum::extract::State;
use axum::Json;

use parley_types::api::{DialogRequest, DialogResponse};

use crate::http::error::AppError;
use crate::state::AppState;

/// `POST /api/v1/chat` -- run one dialog round.
pub async fn post_chat(
    State(state): State<AppState>,
    Json(request): Json<DialogRequest>,
) -> Result<Json<DialogResponse>, AppError> {
    let response = state.dialog.process(request).await?;
    Ok(Json(response))
}
