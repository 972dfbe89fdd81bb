//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::http::response::ApiResponse;
use haven_types::error::{AssistantError, ExpertChatError, IdentityError, RepositoryError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Expert(ExpertChatError),
    Assistant(AssistantError),
    Identity(IdentityError),
    Repository(RepositoryError),
    /// Missing or invalid credentials.
    Unauthorized(String),
    /// Authenticated, but the role does not allow this.
    Forbidden(String),
    Validation(String),
}

impl From<ExpertChatError> for AppError {
    fn from(e: ExpertChatError) -> Self {
        AppError::Expert(e)
    }
}

impl From<AssistantError> for AppError {
    fn from(e: AssistantError) -> Self {
        AppError::Assistant(e)
    }
}

impl From<IdentityError> for AppError {
    fn from(e: IdentityError) -> Self {
        AppError::Identity(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Repository(e)
    }
}

fn storage_status(e: &RepositoryError) -> (StatusCode, &'static str, String) {
    match e {
        RepositoryError::NotFound => {
            (StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found".to_string())
        }
        RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        RepositoryError::Connection => (
            StatusCode::SERVICE_UNAVAILABLE,
            "STORAGE_UNAVAILABLE",
            "Storage is unavailable, please retry".to_string(),
        ),
        RepositoryError::Query(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "STORAGE_ERROR",
            e.to_string(),
        ),
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Expert(ExpertChatError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Expert(ExpertChatError::NotFound) => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                "Expert chat session not found".to_string(),
            ),
            AppError::Expert(ExpertChatError::PermissionDenied(msg)) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone())
            }
            AppError::Expert(e @ ExpertChatError::InvalidTransition { .. }) => {
                (StatusCode::CONFLICT, "INVALID_TRANSITION", e.to_string())
            }
            AppError::Expert(e @ ExpertChatError::SessionClosed) => {
                (StatusCode::CONFLICT, "SESSION_CLOSED", e.to_string())
            }
            AppError::Expert(ExpertChatError::Storage(e)) => storage_status(e),
            AppError::Assistant(AssistantError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Assistant(AssistantError::NotFound) => (
                StatusCode::NOT_FOUND,
                "CONVERSATION_NOT_FOUND",
                "Conversation not found".to_string(),
            ),
            AppError::Assistant(e @ AssistantError::Llm(_)) => {
                (StatusCode::BAD_GATEWAY, "ASSISTANT_UNAVAILABLE", e.to_string())
            }
            AppError::Assistant(AssistantError::Storage(e)) => storage_status(e),
            AppError::Identity(IdentityError::NotFound) => (
                StatusCode::NOT_FOUND,
                "PROFILE_NOT_FOUND",
                "Profile not found".to_string(),
            ),
            AppError::Identity(IdentityError::InvalidToken) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid API token".to_string(),
            ),
            AppError::Identity(IdentityError::Storage(e)) => storage_status(e),
            AppError::Repository(e) => storage_status(e),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(code, %message, "request failed");
        }

        let mut response = ApiResponse::error(code, &message).into_response();
        *response.status_mut() = status;
        response
    }
}
