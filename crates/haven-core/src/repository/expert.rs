//! ExpertSessionRepository trait definition.
//!
//! Updates are column-level: status changes and message writes touch
//! different columns, so neither overwrites the other. The messages column
//! itself is always written whole.

use chrono::{DateTime, Utc};
use haven_types::error::RepositoryError;
use haven_types::expert::{ExpertChatSession, ExpertSessionFilter, ExpertSessionStatus};
use haven_types::message::ChatMessage;
use uuid::Uuid;

/// Repository trait for expert chat session persistence.
///
/// Implementations live in haven-infra (e.g., `SqliteExpertSessionRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ExpertSessionRepository: Send + Sync {
    /// Insert a new session row.
    fn insert_session(
        &self,
        session: &ExpertChatSession,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_session(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ExpertChatSession>, RepositoryError>> + Send;

    /// Set status and assigned admin, only if the row is still in `expected`.
    ///
    /// Returns `NotFound` if the row is gone and `Conflict` if its status has
    /// moved on since the caller read it.
    fn set_status(
        &self,
        id: &Uuid,
        expected: ExpertSessionStatus,
        status: ExpertSessionStatus,
        admin_id: Option<Uuid>,
        updated_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Overwrite the whole messages array. Returns `NotFound` if no row matched.
    fn replace_messages(
        &self,
        id: &Uuid,
        messages: &[ChatMessage],
        updated_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a session. Returns `NotFound` if no row matched.
    fn delete_session(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List sessions matching the filter, ordered by created_at DESC.
    fn list_sessions(
        &self,
        filter: &ExpertSessionFilter,
    ) -> impl std::future::Future<Output = Result<Vec<ExpertChatSession>, RepositoryError>> + Send;

    fn count_by_status(
        &self,
        status: ExpertSessionStatus,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
