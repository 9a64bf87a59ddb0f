//! Tool-augmented request endpoint.

use axum::extract::State;
use axum::Json;

use parley_types::api::{AgentRequest, AgentResponse};

use crate::http::error::AppError;
use crate::state::AppState;

/// `POST /api/v1/agent` -- run the tool-calling loop to completion.
pub async fn post_agent(
    State(state): State<AppState>,
    Json(request): Json<AgentRequest>,
) -> Result<Json<AgentResponse>, AppError> {
    let response = state.agent.run(request).await?;
    Ok(Json(response))
}
