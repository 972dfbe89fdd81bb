//! Query parameter extractors for list endpoints.

use serde::Deserialize;

/// Query parameters for `GET /expert-sessions`.
#[derive(Debug, Deserialize)]
pub struct ExpertSessionListQuery {
    /// Filter by status (pending, active, completed).
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for `GET /assistant/conversations`.
#[derive(Debug, Deserialize)]
pub struct ConversationListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}
