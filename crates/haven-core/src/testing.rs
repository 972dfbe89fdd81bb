//! In-memory repository fakes for service tests.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use haven_types::assistant::AiConversation;
use haven_types::error::RepositoryError;
use haven_types::expert::{ExpertChatSession, ExpertSessionFilter, ExpertSessionStatus};
use haven_types::identity::Profile;
use haven_types::message::ChatMessage;
use uuid::Uuid;

use crate::repository::conversation::ConversationRepository;
use crate::repository::expert::ExpertSessionRepository;
use crate::repository::profile::ProfileRepository;

/// Yields once inside every read so concurrent callers interleave.
#[derive(Default)]
pub struct MemorySessionRepo {
    rows: Mutex<HashMap<Uuid, ExpertChatSession>>,
}

impl ExpertSessionRepository for MemorySessionRepo {
    async fn insert_session(&self, session: &ExpertChatSession) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&session.id) {
            return Err(RepositoryError::Conflict("duplicate id".to_string()));
        }
        rows.insert(session.id, session.clone());
        Ok(())
    }

    async fn get_session(&self, id: &Uuid) -> Result<Option<ExpertChatSession>, RepositoryError> {
        let row = self.rows.lock().unwrap().get(id).cloned();
        tokio::task::yield_now().await;
        Ok(row)
    }

    async fn set_status(
        &self,
        id: &Uuid,
        expected: ExpertSessionStatus,
        status: ExpertSessionStatus,
        admin_id: Option<Uuid>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if row.status != expected {
            return Err(RepositoryError::Conflict(format!(
                "session is {}, expected {expected}",
                row.status
            )));
        }
        row.status = status;
        row.admin_id = admin_id;
        row.updated_at = updated_at;
        Ok(())
    }

    async fn replace_messages(
        &self,
        id: &Uuid,
        messages: &[ChatMessage],
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.get_mut(id).ok_or(RepositoryError::NotFound)?;
        row.messages = messages.to_vec();
        row.updated_at = updated_at;
        Ok(())
    }

    async fn delete_session(&self, id: &Uuid) -> Result<(), RepositoryError> {
        self.rows
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_sessions(
        &self,
        filter: &ExpertSessionFilter,
    ) -> Result<Vec<ExpertChatSession>, RepositoryError> {
        let mut sessions: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|s| filter.user_id.is_none_or(|u| s.user_id == u))
            .filter(|s| filter.status.is_none_or(|st| s.status == st))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let offset = filter.offset.unwrap_or(0) as usize;
        let limit = filter.limit.unwrap_or(i64::MAX) as usize;
        Ok(sessions.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_by_status(&self, status: ExpertSessionStatus) -> Result<u64, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.status == status)
            .count() as u64)
    }
}

#[derive(Default)]
pub struct MemoryProfileRepo {
    profiles: Mutex<Vec<Profile>>,
    tokens: Mutex<HashMap<String, Uuid>>,
}

impl ProfileRepository for MemoryProfileRepo {
    async fn create_profile(&self, profile: &Profile) -> Result<(), RepositoryError> {
        self.profiles.lock().unwrap().push(profile.clone());
        Ok(())
    }

    async fn get_profile(&self, id: &Uuid) -> Result<Option<Profile>, RepositoryError> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == *id)
            .cloned())
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, RepositoryError> {
        Ok(self.profiles.lock().unwrap().clone())
    }

    async fn count_profiles(&self) -> Result<u64, RepositoryError> {
        Ok(self.profiles.lock().unwrap().len() as u64)
    }

    async fn create_token(&self, profile_id: &Uuid, token_hash: &str) -> Result<(), RepositoryError> {
        let mut tokens = self.tokens.lock().unwrap();
        if tokens.contains_key(token_hash) {
            return Err(RepositoryError::Conflict("duplicate token".to_string()));
        }
        tokens.insert(token_hash.to_string(), *profile_id);
        Ok(())
    }

    async fn find_profile_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Profile>, RepositoryError> {
        let id = self.tokens.lock().unwrap().get(token_hash).copied();
        match id {
            Some(id) => self.get_profile(&id).await,
            None => Ok(None),
        }
    }
}

#[derive(Default)]
pub struct MemoryConversationRepo {
    rows: Mutex<HashMap<Uuid, AiConversation>>,
}

impl ConversationRepository for MemoryConversationRepo {
    async fn insert_conversation(&self, conversation: &AiConversation) -> Result<(), RepositoryError> {
        self.rows
            .lock()
            .unwrap()
            .insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn update_conversation(&self, conversation: &AiConversation) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        if !rows.contains_key(&conversation.id) {
            return Err(RepositoryError::NotFound);
        }
        rows.insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn get_conversation(&self, id: &Uuid) -> Result<Option<AiConversation>, RepositoryError> {
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn list_for_user(
        &self,
        user_id: &Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<AiConversation>, RepositoryError> {
        let mut convs: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.user_id == *user_id)
            .cloned()
            .collect();
        convs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        convs.truncate(limit.unwrap_or(i64::MAX) as usize);
        Ok(convs)
    }

    async fn count_updated_since(&self, since: DateTime<Utc>) -> Result<u64, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.updated_at >= since)
            .count() as u64)
    }
}
