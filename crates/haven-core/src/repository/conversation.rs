//! ConversationRepository trait definition.

use chrono::{DateTime, Utc};
use haven_types::assistant::AiConversation;
use haven_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for AI assistant conversations.
pub trait ConversationRepository: Send + Sync {
    fn insert_conversation(
        &self,
        conversation: &AiConversation,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Write messages, last_message and updated_at back.
    fn update_conversation(
        &self,
        conversation: &AiConversation,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_conversation(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<AiConversation>, RepositoryError>> + Send;

    /// A user's conversations, most recently updated first.
    fn list_for_user(
        &self,
        user_id: &Uuid,
        limit: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<AiConversation>, RepositoryError>> + Send;

    /// Number of conversations (all users) updated at or after `since`.
    fn count_updated_since(
        &self,
        since: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
