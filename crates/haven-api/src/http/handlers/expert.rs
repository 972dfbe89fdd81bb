//! Expert chat session HTTP handlers.
//!
//! Endpoints:
//! - POST   /api/v1/expert-sessions                - Request an expert
//! - GET    /api/v1/expert-sessions                - List visible sessions
//! - GET    /api/v1/expert-sessions/{id}           - Get a single session
//! - DELETE /api/v1/expert-sessions/{id}           - Delete a session
//! - POST   /api/v1/expert-sessions/{id}/messages  - Append a message
//! - POST   /api/v1/expert-sessions/{id}/accept    - Admin takes the session
//! - POST   /api/v1/expert-sessions/{id}/complete  - Admin closes the session

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use uuid::Uuid;

use haven_core::expert::access::AccessPolicy;
use haven_types::expert::{
    ExpertChatSession, ExpertSessionFilter, ExpertSessionStatus, NewExpertSession,
};
use haven_types::message::SenderRole;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::extractors::query::ExpertSessionListQuery;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

/// Request body for posting a message.
#[derive(Debug, Deserialize)]
pub struct AppendMessageRequest {
    pub text: String,
    /// Defaults to the caller's role (`user` or `doctor`).
    #[serde(default)]
    pub sender: Option<SenderRole>,
}

/// Parse a UUID from a path parameter, returning a 400 error on invalid format.
pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid UUID: {s}")))
}

fn session_link(id: &Uuid) -> String {
    format!("/api/v1/expert-sessions/{id}")
}

/// POST /api/v1/expert-sessions
pub async fn create_session(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Json(request): Json<NewExpertSession>,
) -> Result<ApiResponse<ExpertChatSession>, AppError> {
    let clock = RequestClock::start();
    let session = state
        .expert_service
        .create_session(&principal, request)
        .await?;
    let link = session_link(&session.id);
    Ok(clock.respond(session).with_link("self", &link))
}

/// GET /api/v1/expert-sessions?status=pending
///
/// Admins see every session; users only their own.
pub async fn list_sessions(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Query(query): Query<ExpertSessionListQuery>,
) -> Result<ApiResponse<Vec<ExpertChatSession>>, AppError> {
    let clock = RequestClock::start();
    let status = query
        .status
        .as_deref()
        .map(str::parse::<ExpertSessionStatus>)
        .transpose()
        .map_err(AppError::Validation)?;

    let filter = ExpertSessionFilter {
        user_id: None,
        status,
        limit: query.limit,
        offset: query.offset,
    };
    let sessions = state
        .expert_service
        .list_sessions(&principal, filter)
        .await?;
    Ok(clock
        .respond(sessions)
        .with_link("self", "/api/v1/expert-sessions"))
}

/// GET /api/v1/expert-sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
) -> Result<ApiResponse<ExpertChatSession>, AppError> {
    let clock = RequestClock::start();
    let id = parse_uuid(&id)?;
    let session = state.expert_service.get_session(&principal, &id).await?;
    Ok(clock
        .respond(session)
        .with_link("self", &session_link(&id))
        .with_link("watch", &format!("/api/v1/ws/expert-sessions/{id}")))
}

/// DELETE /api/v1/expert-sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let clock = RequestClock::start();
    let id = parse_uuid(&id)?;
    state.expert_service.delete_session(&principal, &id).await?;
    Ok(clock.respond(serde_json::json!({ "deleted": true, "id": id })))
}

/// POST /api/v1/expert-sessions/{id}/messages
pub async fn append_message(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
    Json(body): Json<AppendMessageRequest>,
) -> Result<ApiResponse<ExpertChatSession>, AppError> {
    let clock = RequestClock::start();
    let id = parse_uuid(&id)?;
    let sender = body
        .sender
        .unwrap_or_else(|| AccessPolicy::sender_for(&principal));
    let session = state
        .expert_service
        .append_message(&principal, &id, &body.text, sender)
        .await?;
    Ok(clock.respond(session).with_link("self", &session_link(&id)))
}

/// POST /api/v1/expert-sessions/{id}/accept
pub async fn accept_session(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
) -> Result<ApiResponse<ExpertChatSession>, AppError> {
    let clock = RequestClock::start();
    let id = parse_uuid(&id)?;
    let session = state.expert_service.accept(&principal, &id).await?;
    Ok(clock.respond(session).with_link("self", &session_link(&id)))
}

/// POST /api/v1/expert-sessions/{id}/complete
pub async fn complete_session(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
) -> Result<ApiResponse<ExpertChatSession>, AppError> {
    let clock = RequestClock::start();
    let id = parse_uuid(&id)?;
    let session = state.expert_service.complete(&principal, &id).await?;
    Ok(clock.respond(session).with_link("self", &session_link(&id)))
}
