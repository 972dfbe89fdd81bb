//! AI assistant HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/assistant/reply               - Send a message, get the reply
//! - GET  /api/v1/assistant/conversations       - List the caller's conversations
//! - GET  /api/v1/assistant/conversations/{id}  - Get one conversation

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use uuid::Uuid;

use haven_types::assistant::{AiConversation, AssistantReply};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::extractors::query::ConversationListQuery;
use crate::http::handlers::expert::parse_uuid;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    /// Continue this conversation; omit to start a new one.
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    pub message: String,
}

/// POST /api/v1/assistant/reply
///
/// The reply carries `suggested_urgency` when the message asked for a human
/// or sounded like a crisis, so the client can offer an expert session.
pub async fn reply(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Json(body): Json<ReplyRequest>,
) -> Result<ApiResponse<AssistantReply>, AppError> {
    let clock = RequestClock::start();
    let reply = state
        .assistant_service
        .reply(&principal, body.conversation_id, &body.message)
        .await?;
    let link = format!("/api/v1/assistant/conversations/{}", reply.conversation_id);
    Ok(clock
        .respond(reply)
        .with_link("conversation", &link)
        .with_link("escalate", "/api/v1/expert-sessions"))
}

/// GET /api/v1/assistant/conversations?limit=20
pub async fn list_conversations(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Query(query): Query<ConversationListQuery>,
) -> Result<ApiResponse<Vec<AiConversation>>, AppError> {
    let clock = RequestClock::start();
    let conversations = state
        .assistant_service
        .list_conversations(&principal, Some(query.limit))
        .await?;
    Ok(clock
        .respond(conversations)
        .with_link("self", "/api/v1/assistant/conversations"))
}

/// GET /api/v1/assistant/conversations/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
) -> Result<ApiResponse<AiConversation>, AppError> {
    let clock = RequestClock::start();
    let id = parse_uuid(&id)?;
    let conversation = state
        .assistant_service
        .get_conversation(&principal, &id)
        .await?;
    Ok(clock.respond(conversation))
}
