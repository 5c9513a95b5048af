use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::agent;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// POST /agent/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let response = agent::chat(
        state.store.as_ref(),
        &state.llm,
        &req.session_id,
        &req.message,
    )
    .await?;
    Ok(Json(ChatResponse { response }))
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub ready: bool,
    #[serde(rename = "availableRoles")]
    pub available_roles: &'static [&'static str],
    pub message: &'static str,
}

/// GET /agent/status
pub async fn handle_status() -> Json<StatusResponse> {
    Json(StatusResponse {
        ready: agent::is_ready(),
        available_roles: agent::AVAILABLE_ROLES,
        message: "Agent is ready to chat",
    })
}
