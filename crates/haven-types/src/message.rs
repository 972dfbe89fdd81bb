//! Chat message types shared by expert sessions and AI conversations.
//!
//! Messages live inside their parent record as an ordered JSON array.
//! There are no sequence numbers: array order is the conversation order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Who wrote a message.
///
/// `Doctor` is the human expert. Older clients send `admin` for the same
/// role, so it is accepted as an alias on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    User,
    Ai,
    #[serde(alias = "admin")]
    Doctor,
}

impl fmt::Display for SenderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenderRole::User => write!(f, "user"),
            SenderRole::Ai => write!(f, "ai"),
            SenderRole::Doctor => write!(f, "doctor"),
        }
    }
}

impl FromStr for SenderRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(SenderRole::User),
            "ai" => Ok(SenderRole::Ai),
            "doctor" | "admin" => Ok(SenderRole::Doctor),
            other => Err(format!("invalid sender role: '{other}'")),
        }
    }
}

/// A single chat message.
///
/// The id is generated by the writer from the current time in milliseconds,
/// so two messages written in the same millisecond share an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub sender: SenderRole,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Build a message stamped with the current time.
    pub fn new(content: impl Into<String>, sender: SenderRole) -> Self {
        let timestamp = Utc::now();
        Self {
            id: timestamp.timestamp_millis().to_string(),
            content: content.into(),
            sender,
            timestamp,
        }
    }
}
