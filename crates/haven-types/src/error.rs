use thiserror::Error;

use crate::expert::ExpertSessionStatus;
use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in haven-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from expert chat session operations.
///
/// Callers surface all of these to the user as a notification; none is
/// fatal and the user may retry.
#[derive(Debug, Error)]
pub enum ExpertChatError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("expert chat session not found")]
    NotFound,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("invalid status transition from '{from}' to '{to}'")]
    InvalidTransition {
        from: ExpertSessionStatus,
        to: ExpertSessionStatus,
    },

    #[error("session is completed and accepts no further messages")]
    SessionClosed,

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

/// Errors related to identity lookups and tokens.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("profile not found")]
    NotFound,

    #[error("invalid or unknown API token")]
    InvalidToken,

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

/// Errors from the AI assistant.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conversation not found")]
    NotFound,

    #[error("assistant unavailable: {0}")]
    Llm(#[from] LlmError),

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}
