//! AI assistant conversation types.
//!
//! An `AiConversation` is the persisted history of one chat with the AI
//! assistant. Its message list has the same shape as an expert session's.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

use crate::expert::Urgency;
use crate::message::ChatMessage;

/// Greeting the assistant opens every new conversation with.
pub const ASSISTANT_GREETING: &str =
    "Hello! I'm your mental health assistant. How are you feeling today?";

/// Longest title derived from a user's first message.
const TITLE_MAX_CHARS: usize = 48;

/// What a user message appears to ask for, by keyword matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Ordinary conversation for the AI assistant.
    General,
    /// The user asked for a human counsellor.
    Escalation,
    /// Language suggesting the user may be in danger.
    Crisis,
}

impl Intent {
    /// Urgency to pre-fill when offering an expert session, if any.
    pub fn suggested_urgency(self) -> Option<Urgency> {
        match self {
            Intent::General => None,
            Intent::Escalation => Some(Urgency::Normal),
            Intent::Crisis => Some(Urgency::Urgent),
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::General => write!(f, "general"),
            Intent::Escalation => write!(f, "escalation"),
            Intent::Crisis => write!(f, "crisis"),
        }
    }
}

/// A persisted conversation with the AI assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConversation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub last_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AiConversation {
    /// Start a conversation titled after the user's opening message.
    pub fn start(user_id: Uuid, opening: &str, greeting: ChatMessage) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            title: derive_title(opening),
            last_message: Some(greeting.content.clone()),
            messages: vec![greeting],
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message and refresh `last_message` / `updated_at`.
    pub fn push(&mut self, message: ChatMessage) {
        self.last_message = Some(message.content.clone());
        self.updated_at = message.timestamp;
        self.messages.push(message);
    }
}

/// Result of one assistant turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantReply {
    pub conversation_id: Uuid,
    pub reply: ChatMessage,
    pub intent: Intent,
    /// Set when the client should offer "speak with an expert".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_urgency: Option<Urgency>,
}

fn derive_title(opening: &str) -> String {
    let trimmed = opening.trim();
    if trimmed.chars().count() <= TITLE_MAX_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(TITLE_MAX_CHARS - 3).collect();
    format!("{}...", cut.trim_end())
}
