//! Change-feed events for expert chat sessions.
//!
//! Every successful write to the session store is followed by one
//! `SessionChange` carrying the full row, so subscribers can replace their
//! local copy wholesale. All variants are Clone + Send + Sync for use with
//! tokio broadcast channels.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::expert::ExpertChatSession;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionChange {
    /// A new session row was inserted.
    Inserted { session: ExpertChatSession },

    /// Any field of an existing row changed (status, admin, messages).
    Updated { session: ExpertChatSession },

    /// The row was deleted.
    Deleted { session_id: Uuid, user_id: Uuid },
}

impl SessionChange {
    pub fn session_id(&self) -> Uuid {
        match self {
            SessionChange::Inserted { session } | SessionChange::Updated { session } => session.id,
            SessionChange::Deleted { session_id, .. } => *session_id,
        }
    }

    /// Id of the user who requested the session.
    pub fn user_id(&self) -> Uuid {
        match self {
            SessionChange::Inserted { session } | SessionChange::Updated { session } => {
                session.user_id
            }
            SessionChange::Deleted { user_id, .. } => *user_id,
        }
    }

    /// The full row, if the change carries one.
    pub fn session(&self) -> Option<&ExpertChatSession> {
        match self {
            SessionChange::Inserted { session } | SessionChange::Updated { session } => {
                Some(session)
            }
            SessionChange::Deleted { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expert::{NewExpertSession, Urgency};

    fn sample_session() -> ExpertChatSession {
        ExpertChatSession::new_pending(
            Uuid::now_v7(),
            &NewExpertSession {
                reason: "can't sleep".to_string(),
                urgency: Urgency::Low,
                mental_issue_root: None,
            },
        )
    }

    #[test]
    fn test_updated_serializes_with_tag() {
        let session = sample_session();
        let change = SessionChange::Updated {
            session: session.clone(),
        };
        let json = serde_json::to_string(&change).unwrap();
        assert!(json.contains("\"type\":\"updated\""));
        let parsed: SessionChange = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.session_id(), session.id);
        assert_eq!(parsed.session().unwrap().status, session.status);
    }

    #[test]
    fn test_deleted_carries_ids_only() {
        let session_id = Uuid::now_v7();
        let user_id = Uuid::now_v7();
        let change = SessionChange::Deleted { session_id, user_id };
        assert_eq!(change.session_id(), session_id);
        assert_eq!(change.user_id(), user_id);
        assert!(change.session().is_none());
    }
}
