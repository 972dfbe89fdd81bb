//! Client-side expert chat manager.
//!
//! Holds one user's view of their escalation: which mode the chat is in,
//! the local copy of the session row, and the change subscription that keeps
//! that copy current. Pushed rows replace the local copy wholesale.

use std::sync::Arc;

use haven_types::error::ExpertChatError;
use haven_types::event::SessionChange;
use haven_types::expert::{ExpertChatSession, ExpertSessionStatus, NewExpertSession, Urgency};
use haven_types::identity::Principal;
use haven_types::message::ChatMessage;
use tracing::{info, warn};
use uuid::Uuid;

use crate::event::feed::SessionSubscription;
use crate::expert::access::AccessPolicy;
use crate::expert::service::ExpertChatService;
use crate::repository::expert::ExpertSessionRepository;

/// Who the user is currently talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    Ai,
    Expert,
}

/// Something the user should be told about after a pushed change.
#[derive(Debug, Clone, PartialEq)]
pub enum ManagerNotice {
    /// An admin accepted the pending request.
    ExpertJoined { admin_id: Uuid },
    /// New messages or other field changes.
    Updated,
    /// The expert ended the session; the chat is back in AI mode.
    Completed,
    /// The session row was deleted; the chat is back in AI mode.
    Deleted,
}

impl ManagerNotice {
    pub fn message(&self) -> &'static str {
        match self {
            ManagerNotice::ExpertJoined { .. } => "An expert has joined the chat.",
            ManagerNotice::Updated => "The conversation was updated.",
            ManagerNotice::Completed => {
                "The expert has ended this session. You are now chatting with the AI assistant again."
            }
            ManagerNotice::Deleted => {
                "This expert session was removed. You are now chatting with the AI assistant again."
            }
        }
    }
}

pub struct ExpertChatManager<R: ExpertSessionRepository> {
    service: Arc<ExpertChatService<R>>,
    principal: Principal,
    session: Option<ExpertChatSession>,
    subscription: Option<SessionSubscription>,
}

impl<R: ExpertSessionRepository> ExpertChatManager<R> {
    pub fn new(service: Arc<ExpertChatService<R>>, principal: Principal) -> Self {
        Self {
            service,
            principal,
            session: None,
            subscription: None,
        }
    }

    pub fn mode(&self) -> ChatMode {
        if self.session.is_some() {
            ChatMode::Expert
        } else {
            ChatMode::Ai
        }
    }

    pub fn session(&self) -> Option<&ExpertChatSession> {
        self.session.as_ref()
    }

    /// Submit a "speak with an expert" request and start watching it.
    ///
    /// On failure the manager stays in AI mode.
    pub async fn request_expert(
        &mut self,
        reason: &str,
        urgency: Urgency,
    ) -> Result<&ExpertChatSession, ExpertChatError> {
        let request = NewExpertSession {
            reason: reason.to_string(),
            urgency,
            mental_issue_root: None,
        };
        let session = self
            .service
            .create_session(&self.principal, request)
            .await
            .inspect_err(|e| warn!(error = %e, "expert request failed"))?;

        self.subscription = Some(self.service.feed().subscribe_session(session.id));
        Ok(self.session.insert(session))
    }

    /// Re-attach to an existing open session, e.g. after a reload.
    pub async fn resume(&mut self, session_id: &Uuid) -> Result<&ExpertChatSession, ExpertChatError> {
        let (session, subscription) = self
            .service
            .subscribe(&self.principal, session_id)
            .await
            .inspect_err(|e| warn!(session_id = %session_id, error = %e, "resume failed"))?;
        if !session.accepts_messages() {
            return Err(ExpertChatError::SessionClosed);
        }
        self.subscription = Some(subscription);
        Ok(self.session.insert(session))
    }

    /// Send a message to the expert session.
    ///
    /// The message is shown locally before the store confirms it. If the
    /// write fails, the local copy keeps it until the next pushed row.
    pub async fn send(&mut self, text: &str) -> Result<(), ExpertChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ExpertChatError::Validation(
                "message cannot be empty".to_string(),
            ));
        }
        let sender = AccessPolicy::sender_for(&self.principal);
        let Some(session) = self.session.as_mut() else {
            return Err(ExpertChatError::Validation(
                "not connected to an expert".to_string(),
            ));
        };
        if !session.accepts_messages() {
            return Err(ExpertChatError::SessionClosed);
        }

        session.messages.push(ChatMessage::new(text, sender));
        let session_id = session.id;

        match self
            .service
            .append_message(&self.principal, &session_id, text, sender)
            .await
        {
            Ok(row) => {
                self.replace_local(row);
                Ok(())
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "message send failed");
                Err(e)
            }
        }
    }

    /// Apply one pushed change to local state.
    ///
    /// Changes for other sessions are ignored. Completion and deletion
    /// detach the manager and return the chat to AI mode.
    pub fn apply_change(&mut self, change: SessionChange) -> Option<ManagerNotice> {
        let current = self.session.as_ref()?;
        if change.session_id() != current.id {
            return None;
        }
        let previous = current.status;

        match change {
            SessionChange::Deleted { session_id, .. } => {
                info!(session_id = %session_id, "expert session deleted remotely");
                self.detach();
                Some(ManagerNotice::Deleted)
            }
            SessionChange::Inserted { session } | SessionChange::Updated { session } => {
                let status = session.status;
                let admin_id = session.admin_id;
                if status == ExpertSessionStatus::Completed {
                    info!(session_id = %session.id, "expert session completed, back to AI mode");
                    self.detach();
                    return Some(ManagerNotice::Completed);
                }
                self.replace_local(session);
                match (previous, status, admin_id) {
                    (ExpertSessionStatus::Pending, ExpertSessionStatus::Active, Some(admin_id)) => {
                        Some(ManagerNotice::ExpertJoined { admin_id })
                    }
                    _ => Some(ManagerNotice::Updated),
                }
            }
        }
    }

    /// Wait for the next pushed change that produces a notice.
    ///
    /// Returns `None` in AI mode or once the feed closes.
    pub async fn next_notice(&mut self) -> Option<ManagerNotice> {
        loop {
            let change = self.subscription.as_mut()?.recv().await?;
            if let Some(notice) = self.apply_change(change) {
                return Some(notice);
            }
        }
    }

    /// Stop watching and return to AI mode without touching the session.
    pub fn leave(&mut self) {
        self.detach();
    }

    fn replace_local(&mut self, session: ExpertChatSession) {
        self.session = Some(session);
    }

    fn detach(&mut self) {
        self.session = None;
        self.subscription = None;
    }
}
