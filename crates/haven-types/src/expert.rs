//! Expert chat session types.
//!
//! An expert chat session is a user's request to move from the AI assistant
//! to a human counsellor. It moves through `pending -> active -> completed`
//! and carries its whole message history as one ordered list.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::message::{ChatMessage, SenderRole};

/// Message placed in every new session so the user sees the request landed.
pub const INITIAL_SYSTEM_MESSAGE: &str =
    "Your request has been sent to our experts. A counsellor will join this chat shortly.";

/// Lifecycle status of an expert chat session.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (status IN ('pending', 'active', 'completed'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpertSessionStatus {
    Pending,
    Active,
    Completed,
}

impl ExpertSessionStatus {
    /// Whether the state machine allows moving from `self` to `next`.
    ///
    /// Only `pending -> active` and `active -> completed` are legal.
    pub fn can_transition_to(self, next: ExpertSessionStatus) -> bool {
        matches!(
            (self, next),
            (ExpertSessionStatus::Pending, ExpertSessionStatus::Active)
                | (ExpertSessionStatus::Active, ExpertSessionStatus::Completed)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == ExpertSessionStatus::Completed
    }
}

impl fmt::Display for ExpertSessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpertSessionStatus::Pending => write!(f, "pending"),
            ExpertSessionStatus::Active => write!(f, "active"),
            ExpertSessionStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for ExpertSessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ExpertSessionStatus::Pending),
            "active" => Ok(ExpertSessionStatus::Active),
            "completed" => Ok(ExpertSessionStatus::Completed),
            other => Err(format!("invalid expert session status: '{other}'")),
        }
    }
}

impl Default for ExpertSessionStatus {
    fn default() -> Self {
        ExpertSessionStatus::Pending
    }
}

/// How urgently the user wants a counsellor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Normal,
    High,
    Urgent,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Low => write!(f, "low"),
            Urgency::Normal => write!(f, "normal"),
            Urgency::High => write!(f, "high"),
            Urgency::Urgent => write!(f, "urgent"),
        }
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Urgency::Low),
            "normal" => Ok(Urgency::Normal),
            "high" => Ok(Urgency::High),
            "urgent" => Ok(Urgency::Urgent),
            other => Err(format!("invalid urgency: '{other}'")),
        }
    }
}

impl Default for Urgency {
    fn default() -> Self {
        Urgency::Normal
    }
}

/// One escalation request and its conversation with an expert.
///
/// `admin_id` is `None` exactly while the session is `Pending`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertChatSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub admin_id: Option<Uuid>,
    pub status: ExpertSessionStatus,
    pub messages: Vec<ChatMessage>,
    pub user_request_reason: Option<String>,
    pub urgency: Urgency,
    pub mental_issue_root: Option<String>,
    /// Academic term the request was made in (e.g. `2025-2`).
    pub semester: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExpertChatSession {
    /// Build a fresh `pending` session holding the initial system message.
    pub fn new_pending(user_id: Uuid, request: &NewExpertSession) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            admin_id: None,
            status: ExpertSessionStatus::Pending,
            messages: vec![ChatMessage::new(INITIAL_SYSTEM_MESSAGE, SenderRole::Ai)],
            user_request_reason: Some(request.reason.trim().to_string()),
            urgency: request.urgency,
            mental_issue_root: request.mental_issue_root.clone(),
            semester: semester_for(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether new messages may be added.
    pub fn accepts_messages(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

/// Payload submitted by a user asking to speak with an expert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpertSession {
    pub reason: String,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub mental_issue_root: Option<String>,
}

/// Selection criteria for listing sessions.
#[derive(Debug, Clone, Default)]
pub struct ExpertSessionFilter {
    /// Restrict to sessions requested by this user.
    pub user_id: Option<Uuid>,
    pub status: Option<ExpertSessionStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Academic term for a date: `<year>-1` for January-June, `<year>-2` otherwise.
pub fn semester_for(date: DateTime<Utc>) -> String {
    let half = if date.month() <= 6 { 1 } else { 2 };
    format!("{}-{}", date.year(), half)
}
