//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use parley_types::error::{SessionError, StoreError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Session-related errors.
    Session(SessionError),
    /// Validation error.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::Session(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Session(SessionError::NotFound) => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                "Session not found".to_string(),
            ),
            AppError::Session(SessionError::Store(StoreError::Unavailable)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "STORE_UNAVAILABLE",
                "Session store unavailable".to_string(),
            ),
            AppError::Session(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR", e.to_string())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, error = %message, "Request failed");
        }

        let body = ApiResponse::error(code, &message, uuid::Uuid::now_v7().to_string());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let resp = AppError::from(SessionError::NotFound).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_maps_to_400() {
        let resp = AppError::Validation("Message cannot be empty".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_errors_map_to_5xx() {
        let unavailable = AppError::from(SessionError::Store(StoreError::Unavailable));
        assert_eq!(unavailable.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);

        let query = AppError::from(SessionError::Store(StoreError::Query("x".to_string())));
        let (status, code, _) = query.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "STORE_ERROR");
    }
}
