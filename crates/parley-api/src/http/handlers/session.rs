//! Session HTTP handlers.
//!
//! Endpoints:
//! - POST   /api/v1/sessions                - Start a new session
//! - GET    /api/v1/sessions/{id}/messages  - Get the full conversation
//! - POST   /api/v1/sessions/{id}/pin       - Toggle pinned
//! - POST   /api/v1/sessions/{id}/archive   - Toggle archived
//! - DELETE /api/v1/sessions/{id}           - Delete a session (idempotent)
//! - GET    /api/v1/sidebar                 - Recent / pinned / archived lists

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use parley_types::llm::Message;
use parley_types::session::Sidebar;

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NewSession {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct SessionMessages {
    pub session_id: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct PinStatus {
    pub status: &'static str,
    pub is_pinned: bool,
}

#[derive(Debug, Serialize)]
pub struct ArchiveStatus {
    pub status: &'static str,
    pub is_archived: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteStatus {
    pub status: &'static str,
}

/// POST /api/v1/sessions - Start a new session.
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<NewSession>>, AppError> {
    let clock = RequestClock::start();

    let session = state.sessions.create_session().await;
    let link = format!("/api/v1/sessions/{}/messages", session.session_id);

    Ok(Json(
        clock
            .success(NewSession {
                session_id: session.session_id,
            })
            .with_link("messages", &link),
    ))
}

/// GET /api/v1/sessions/{id}/messages - Full conversation in order.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<SessionMessages>>, AppError> {
    let clock = RequestClock::start();

    let messages = state.sessions.history(&session_id).await?;

    Ok(Json(clock.success(SessionMessages {
        session_id,
        messages,
    })))
}

/// POST /api/v1/sessions/{id}/pin - Flip the pinned flag.
pub async fn toggle_pin(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<PinStatus>>, AppError> {
    let clock = RequestClock::start();

    let is_pinned = state.sessions.toggle_pin(&session_id).await?;

    Ok(Json(clock.success(PinStatus {
        status: "success",
        is_pinned,
    })))
}

/// POST /api/v1/sessions/{id}/archive - Flip the archived flag.
pub async fn toggle_archive(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<ArchiveStatus>>, AppError> {
    let clock = RequestClock::start();

    let is_archived = state.sessions.toggle_archive(&session_id).await?;

    Ok(Json(clock.success(ArchiveStatus {
        status: "success",
        is_archived,
    })))
}

/// DELETE /api/v1/sessions/{id} - Delete a session. Unknown IDs succeed.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<DeleteStatus>>, AppError> {
    let clock = RequestClock::start();

    state.sessions.delete(&session_id).await?;

    Ok(Json(clock.success(DeleteStatus { status: "success" })))
}

/// GET /api/v1/sidebar - Recent, pinned and archived sessions.
pub async fn sidebar(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Sidebar>>, AppError> {
    let clock = RequestClock::start();

    let sidebar = state.sessions.sidebar().await?;

    Ok(Json(clock.success(sidebar)))
}
