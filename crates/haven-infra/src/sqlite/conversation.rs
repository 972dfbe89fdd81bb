//! SQLite AI conversation repository implementation.

use chrono::{DateTime, Utc};
use haven_core::repository::conversation::ConversationRepository;
use haven_types::assistant::AiConversation;
use haven_types::error::RepositoryError;
use haven_types::message::ChatMessage;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_uuid, query_error};

/// SQLite-backed implementation of `ConversationRepository`.
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct ConversationRow {
    id: String,
    user_id: String,
    title: String,
    messages: String,
    last_message: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            messages: row.try_get("messages")?,
            last_message: row.try_get("last_message")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_conversation(self) -> Result<AiConversation, RepositoryError> {
        let messages: Vec<ChatMessage> = serde_json::from_str(&self.messages)
            .map_err(|e| RepositoryError::Query(format!("invalid messages json: {e}")))?;
        Ok(AiConversation {
            id: parse_uuid(&self.id, "conversation id")?,
            user_id: parse_uuid(&self.user_id, "user_id")?,
            title: self.title,
            messages,
            last_message: self.last_message,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn map_conversation(row: &sqlx::sqlite::SqliteRow) -> Result<AiConversation, RepositoryError> {
    ConversationRow::from_row(row)
        .map_err(|e| RepositoryError::Query(e.to_string()))?
        .into_conversation()
}

fn messages_json(conversation: &AiConversation) -> Result<String, RepositoryError> {
    serde_json::to_string(&conversation.messages)
        .map_err(|e| RepositoryError::Query(format!("failed to encode messages: {e}")))
}

impl ConversationRepository for SqliteConversationRepository {
    async fn insert_conversation(&self, conversation: &AiConversation) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO ai_conversations (id, user_id, title, messages, last_message, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(conversation.id.to_string())
        .bind(conversation.user_id.to_string())
        .bind(&conversation.title)
        .bind(messages_json(conversation)?)
        .bind(&conversation.last_message)
        .bind(format_datetime(&conversation.created_at))
        .bind(format_datetime(&conversation.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;
        Ok(())
    }

    async fn update_conversation(&self, conversation: &AiConversation) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE ai_conversations SET messages = ?, last_message = ?, updated_at = ? WHERE id = ?",
        )
        .bind(messages_json(conversation)?)
        .bind(&conversation.last_message)
        .bind(format_datetime(&conversation.updated_at))
        .bind(conversation.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn get_conversation(&self, id: &Uuid) -> Result<Option<AiConversation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM ai_conversations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        row.as_ref().map(map_conversation).transpose()
    }

    async fn list_for_user(
        &self,
        user_id: &Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<AiConversation>, RepositoryError> {
        let mut sql =
            String::from("SELECT * FROM ai_conversations WHERE user_id = ? ORDER BY updated_at DESC");
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        let rows = sqlx::query(&sql)
            .bind(user_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;
        rows.iter().map(map_conversation).collect()
    }

    async fn count_updated_since(&self, since: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM ai_conversations WHERE updated_at >= ?")
            .bind(format_datetime(&since))
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)?;
        let count: i64 = row
            .try_get("count")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_support::{seed_profile, test_pool};
    use haven_types::assistant::ASSISTANT_GREETING;
    use haven_types::identity::UserRole;
    use haven_types::message::SenderRole;

    fn start(user_id: Uuid, opening: &str) -> AiConversation {
        AiConversation::start(
            user_id,
            opening,
            ChatMessage::new(ASSISTANT_GREETING, SenderRole::Ai),
        )
    }

    #[tokio::test]
    async fn test_insert_update_get() {
        let pool = test_pool().await;
        let user = seed_profile(&pool, UserRole::User).await;
        let repo = SqliteConversationRepository::new(pool);

        let mut conv = start(user.id, "sleep problems");
        repo.insert_conversation(&conv).await.unwrap();

        conv.push(ChatMessage::new("I can't sleep", SenderRole::User));
        repo.update_conversation(&conv).await.unwrap();

        let loaded = repo.get_conversation(&conv.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "sleep problems");
        assert_eq!(loaded.messages.len(), 2);
        assert_eq!(loaded.last_message.as_deref(), Some("I can't sleep"));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let pool = test_pool().await;
        let user = seed_profile(&pool, UserRole::User).await;
        let repo = SqliteConversationRepository::new(pool);
        let conv = start(user.id, "never saved");
        assert!(matches!(
            repo.update_conversation(&conv).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_and_recent_count() {
        let pool = test_pool().await;
        let alice = seed_profile(&pool, UserRole::User).await;
        let bob = seed_profile(&pool, UserRole::User).await;
        let repo = SqliteConversationRepository::new(pool);

        let mut old = start(alice.id, "old");
        old.updated_at = Utc::now() - chrono::Duration::days(2);
        repo.insert_conversation(&old).await.unwrap();
        let fresh = start(alice.id, "fresh");
        repo.insert_conversation(&fresh).await.unwrap();
        repo.insert_conversation(&start(bob.id, "bob's")).await.unwrap();

        let alices = repo.list_for_user(&alice.id, None).await.unwrap();
        assert_eq!(alices.len(), 2);
        assert_eq!(alices[0].id, fresh.id);

        let limited = repo.list_for_user(&alice.id, Some(1)).await.unwrap();
        assert_eq!(limited.len(), 1);

        let since = Utc::now() - chrono::Duration::hours(24);
        assert_eq!(repo.count_updated_since(since).await.unwrap(), 2);
    }
}
