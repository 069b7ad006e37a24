//! Unwrapped routes for the bundled web front-end.
//!
//! The front-end posts to root-level paths and reads bare JSON bodies, so
//! these answer without the `ApiResponse` envelope.
//!
//! Endpoints:
//! - POST /chat                              - Run one chat turn
//! - POST /new_chat                          - Start a new session
//! - GET  /get_chat_history?session_id={id}  - Full conversation
//! - GET  /get_sidebar_data                  - Recent / pinned / archived lists

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use parley_types::session::Sidebar;

use crate::http::error::AppError;
use crate::http::handlers::chat::{ChatReply, ChatRequest};
use crate::http::handlers::session::{NewSession, SessionMessages};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub session_id: String,
}

/// POST /chat
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    if body.message.trim().is_empty() {
        return Err(AppError::Validation("Message cannot be empty".to_string()));
    }

    let result = state
        .sessions
        .run_turn(body.session_id.as_deref(), &body.message)
        .await;

    Ok(Json(ChatReply {
        offline: result.outcome.is_offline(),
        reply: result.reply,
        session_id: result.session_id,
    }))
}

/// POST /new_chat
pub async fn new_chat(State(state): State<AppState>) -> Json<NewSession> {
    let session = state.sessions.create_session().await;
    Json(NewSession {
        session_id: session.session_id,
    })
}

/// GET /get_chat_history?session_id={id}
pub async fn chat_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<SessionMessages>, AppError> {
    let messages = state.sessions.history(&query.session_id).await?;
    Ok(Json(SessionMessages {
        session_id: query.session_id,
        messages,
    }))
}

/// GET /get_sidebar_data
pub async fn sidebar_data(State(state): State<AppState>) -> Result<Json<Sidebar>, AppError> {
    Ok(Json(state.sessions.sidebar().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::offline_state;
    use parley_core::chat::offline::OFFLINE_GREETING;
    use parley_types::error::SessionError;

    #[tokio::test]
    async fn test_front_end_flow_without_envelope() {
        let state = offline_state();

        let Json(created) = new_chat(State(state.clone())).await;

        let Json(reply) = chat(
            State(state.clone()),
            Json(ChatRequest {
                session_id: Some(created.session_id.clone()),
                message: "hello there".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(reply.session_id, created.session_id);
        assert_eq!(reply.reply, OFFLINE_GREETING);

        let Json(history) = chat_history(
            State(state.clone()),
            Query(HistoryQuery {
                session_id: created.session_id.clone(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(history.messages.len(), 3);
        assert_eq!(history.messages[1].content, "hello there");

        let Json(sidebar) = sidebar_data(State(state)).await.unwrap();
        let body = serde_json::to_value(&sidebar).unwrap();
        assert_eq!(body["recent"][0]["session_id"], created.session_id.as_str());
        assert_eq!(body["recent"][0]["title"], "hello there");
    }

    #[tokio::test]
    async fn test_history_for_unknown_session_is_not_found() {
        let err = chat_history(
            State(offline_state()),
            Query(HistoryQuery {
                session_id: "nope".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Session(SessionError::NotFound)));
    }
}
