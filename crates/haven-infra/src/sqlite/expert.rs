//! SQLite expert session repository implementation.
//!
//! Implements `ExpertSessionRepository` from `haven-core`. The message list
//! lives in one JSON column; status and messages are updated by separate
//! statements so a status change never clobbers the messages column.

use chrono::{DateTime, Utc};
use haven_core::repository::expert::ExpertSessionRepository;
use haven_types::error::RepositoryError;
use haven_types::expert::{ExpertChatSession, ExpertSessionFilter, ExpertSessionStatus, Urgency};
use haven_types::message::ChatMessage;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_uuid, query_error};

/// SQLite-backed implementation of `ExpertSessionRepository`.
pub struct SqliteExpertSessionRepository {
    pool: DatabasePool,
}

impl SqliteExpertSessionRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to `ExpertChatSession`.
struct ExpertSessionRow {
    id: String,
    user_id: String,
    admin_id: Option<String>,
    status: String,
    messages: String,
    user_request_reason: Option<String>,
    urgency: String,
    mental_issue_root: Option<String>,
    semester: String,
    created_at: String,
    updated_at: String,
}

impl ExpertSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            admin_id: row.try_get("admin_id")?,
            status: row.try_get("status")?,
            messages: row.try_get("messages")?,
            user_request_reason: row.try_get("user_request_reason")?,
            urgency: row.try_get("urgency")?,
            mental_issue_root: row.try_get("mental_issue_root")?,
            semester: row.try_get("semester")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self) -> Result<ExpertChatSession, RepositoryError> {
        let status: ExpertSessionStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let urgency: Urgency = self
            .urgency
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let messages: Vec<ChatMessage> = serde_json::from_str(&self.messages)
            .map_err(|e| RepositoryError::Query(format!("invalid messages json: {e}")))?;

        Ok(ExpertChatSession {
            id: parse_uuid(&self.id, "session id")?,
            user_id: parse_uuid(&self.user_id, "user_id")?,
            admin_id: self
                .admin_id
                .as_deref()
                .map(|s| parse_uuid(s, "admin_id"))
                .transpose()?,
            status,
            messages,
            user_request_reason: self.user_request_reason,
            urgency,
            mental_issue_root: self.mental_issue_root,
            semester: self.semester,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn messages_json(messages: &[ChatMessage]) -> Result<String, RepositoryError> {
    serde_json::to_string(messages)
        .map_err(|e| RepositoryError::Query(format!("failed to encode messages: {e}")))
}

impl ExpertSessionRepository for SqliteExpertSessionRepository {
    async fn insert_session(&self, session: &ExpertChatSession) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO expert_chat_sessions
               (id, user_id, admin_id, status, messages, user_request_reason, urgency,
                mental_issue_root, semester, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(session.user_id.to_string())
        .bind(session.admin_id.map(|id| id.to_string()))
        .bind(session.status.to_string())
        .bind(messages_json(&session.messages)?)
        .bind(&session.user_request_reason)
        .bind(session.urgency.to_string())
        .bind(&session.mental_issue_root)
        .bind(&session.semester)
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    async fn get_session(&self, id: &Uuid) -> Result<Option<ExpertChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM expert_chat_sessions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let session_row = ExpertSessionRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn set_status(
        &self,
        id: &Uuid,
        expected: ExpertSessionStatus,
        status: ExpertSessionStatus,
        admin_id: Option<Uuid>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE expert_chat_sessions SET status = ?, admin_id = ?, updated_at = ?
               WHERE id = ? AND status = ?"#,
        )
        .bind(status.to_string())
        .bind(admin_id.map(|a| a.to_string()))
        .bind(format_datetime(&updated_at))
        .bind(id.to_string())
        .bind(expected.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Nothing matched: either the row is gone or its status moved on.
        let row = sqlx::query("SELECT status FROM expert_chat_sessions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.writer)
            .await
            .map_err(query_error)?;
        let Some(row) = row else {
            return Err(RepositoryError::NotFound);
        };
        let current: String = row
            .try_get("status")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Err(RepositoryError::Conflict(format!(
            "session is {current}, expected {expected}"
        )))
    }

    async fn replace_messages(
        &self,
        id: &Uuid,
        messages: &[ChatMessage],
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE expert_chat_sessions SET messages = ?, updated_at = ? WHERE id = ?")
                .bind(messages_json(messages)?)
                .bind(format_datetime(&updated_at))
                .bind(id.to_string())
                .execute(&self.pool.writer)
                .await
                .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_session(&self, id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM expert_chat_sessions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_sessions(
        &self,
        filter: &ExpertSessionFilter,
    ) -> Result<Vec<ExpertChatSession>, RepositoryError> {
        let mut sql = String::from("SELECT * FROM expert_chat_sessions WHERE 1 = 1");
        if filter.user_id.is_some() {
            sql.push_str(" AND user_id = ?");
        }
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        sql.push_str(" ORDER BY created_at DESC");
        // SQLite requires LIMIT before OFFSET
        match (filter.limit, filter.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }

        let mut query = sqlx::query(&sql);
        if let Some(user_id) = filter.user_id {
            query = query.bind(user_id.to_string());
        }
        if let Some(status) = filter.status {
            query = query.bind(status.to_string());
        }

        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let session_row = ExpertSessionRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            sessions.push(session_row.into_session()?);
        }
        Ok(sessions)
    }

    async fn count_by_status(&self, status: ExpertSessionStatus) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM expert_chat_sessions WHERE status = ?")
            .bind(status.to_string())
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)?;
        let count: i64 = row
            .try_get("count")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(count as u64)
    }
}
