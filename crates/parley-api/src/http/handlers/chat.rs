//! Chat turn HTTP handler.
//!
//! Endpoint:
//! - POST /api/v1/chat - Submit a user message, get the assistant reply

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

/// Request body for a chat turn.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Existing session to continue; absent, empty, or unknown starts a new one.
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
}

/// Response body for a chat turn.
#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub session_id: String,
    /// True when the backend failed and the reply is an offline message.
    pub offline: bool,
}

/// POST /api/v1/chat - Run one chat turn.
///
/// Always answers 200 for a non-empty message, even when the backend or the
/// store is down.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatReply>>, AppError> {
    let clock = RequestClock::start();

    if body.message.trim().is_empty() {
        return Err(AppError::Validation("Message cannot be empty".to_string()));
    }

    let result = state
        .sessions
        .run_turn(body.session_id.as_deref(), &body.message)
        .await;

    let link = format!("/api/v1/sessions/{}/messages", result.session_id);
    let reply = ChatReply {
        offline: result.outcome.is_offline(),
        reply: result.reply,
        session_id: result.session_id,
    };

    Ok(Json(clock.success(reply).with_link("messages", &link)))
}
