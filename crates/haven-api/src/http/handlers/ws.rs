//! WebSocket handlers for the expert session change feed.
//!
//! - `/ws/expert-sessions/{id}` pushes a snapshot of one session followed by
//!   every change to it, and accepts `send_message` commands so a client can
//!   chat over the same socket.
//! - `/ws/expert-sessions` pushes changes to every session (admins) or to
//!   the caller's own sessions (users).
//!
//! Delivery is best-effort: a client that falls behind the broadcast buffer
//! misses changes and should reload the session over REST.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use uuid::Uuid;

use haven_core::event::feed::SessionSubscription;
use haven_core::expert::access::AccessPolicy;
use haven_types::event::SessionChange;
use haven_types::expert::ExpertChatSession;
use haven_types::identity::Principal;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::handlers::expert::parse_uuid;
use crate::state::AppState;

/// Incoming command from a WebSocket client.
///
/// Unknown or malformed messages are logged and ignored.
#[derive(Debug, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsCommand {
    /// Append a message to the watched session as the caller.
    SendMessage { text: String },
    /// Keep-alive ping. Server responds with `{"type":"pong"}`.
    Ping,
}

/// GET /api/v1/ws/expert-sessions/{id}
pub async fn session_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_uuid(&id)?;
    // Visibility is checked before upgrading so a refusal is a plain HTTP error.
    let (session, subscription) = state.expert_service.subscribe(&principal, &id).await?;
    let snapshot = snapshot_frame(&session);

    Ok(ws.on_upgrade(move |socket| {
        handle_connection(socket, state, principal, Some(id), snapshot, subscription)
    }))
}

/// GET /api/v1/ws/expert-sessions
pub async fn feed_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> Result<impl IntoResponse, AppError> {
    let subscription = if principal.is_admin() {
        state.expert_service.subscribe_all(&principal)?
    } else {
        state.expert_service.subscribe_own(&principal)
    };
    let scope = if principal.is_admin() { "all" } else { "own" };
    let hello = json!({ "type": "subscribed", "scope": scope });

    Ok(ws.on_upgrade(move |socket| {
        handle_connection(socket, state, principal, None, hello, subscription)
    }))
}

fn snapshot_frame(session: &ExpertChatSession) -> serde_json::Value {
    json!({ "type": "snapshot", "session": session })
}

async fn handle_connection(
    socket: WebSocket,
    state: AppState,
    principal: Principal,
    session_id: Option<Uuid>,
    first_frame: serde_json::Value,
    subscription: SessionSubscription,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    pump(
        &mut ws_sender,
        &mut ws_receiver,
        &state,
        &principal,
        session_id,
        first_frame,
        subscription,
    )
    .await;
    tracing::debug!(user_id = %principal.user_id, "WebSocket connection closed");
}

/// Multiplex feed changes out and client commands in on one task.
///
/// A single-session socket is closed once its session is deleted.
async fn pump(
    ws_sender: &mut (impl SinkExt<Message, Error = axum::Error> + Unpin),
    ws_receiver: &mut (impl StreamExt<Item = Result<Message, axum::Error>> + Unpin),
    state: &AppState,
    principal: &Principal,
    session_id: Option<Uuid>,
    first_frame: serde_json::Value,
    mut subscription: SessionSubscription,
) {
    if ws_sender
        .send(Message::Text(first_frame.to_string().into()))
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            change = subscription.recv() => {
                let Some(change) = change else {
                    // Feed closed: server shutting down
                    break;
                };
                let deleted = session_id.is_some() && matches!(change, SessionChange::Deleted { .. });
                match serde_json::to_string(&change) {
                    Ok(text) => {
                        if ws_sender.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!("Failed to serialize SessionChange: {err}");
                    }
                }
                if deleted {
                    let _ = ws_sender.send(Message::Close(None)).await;
                    break;
                }
            }

            msg_result = ws_receiver.next() => {
                match msg_result {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = process_command(&text, state, principal, session_id).await {
                            if ws_sender.send(Message::Text(reply.to_string().into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!("WebSocket receive error: {err}");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

/// Handle one client command. Returns a frame to send back, if any.
///
/// Successful sends need no reply: the resulting change arrives on the feed.
async fn process_command(
    text: &str,
    state: &AppState,
    principal: &Principal,
    session_id: Option<Uuid>,
) -> Option<serde_json::Value> {
    let cmd: WsCommand = match serde_json::from_str(text) {
        Ok(cmd) => cmd,
        Err(err) => {
            tracing::warn!("Ignoring malformed WebSocket command: {err}");
            return None;
        }
    };

    match cmd {
        WsCommand::Ping => Some(json!({ "type": "pong" })),
        WsCommand::SendMessage { text } => {
            let Some(session_id) = session_id else {
                return Some(json!({
                    "type": "error",
                    "message": "send_message is only available on a single-session socket",
                }));
            };
            let sender = AccessPolicy::sender_for(principal);
            match state
                .expert_service
                .append_message(principal, &session_id, &text, sender)
                .await
            {
                Ok(_) => None,
                Err(err) => Some(json!({ "type": "error", "message": err.to_string() })),
            }
        }
    }
}
