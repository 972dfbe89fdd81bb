//! SQLite profile and API token repository implementation.

use chrono::Utc;
use haven_core::repository::profile::ProfileRepository;
use haven_types::error::RepositoryError;
use haven_types::identity::{Profile, UserRole};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_uuid, query_error};

/// SQLite-backed implementation of `ProfileRepository`.
pub struct SqliteProfileRepository {
    pool: DatabasePool,
}

impl SqliteProfileRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct ProfileRow {
    id: String,
    first_name: Option<String>,
    last_name: Option<String>,
    role: String,
    created_at: String,
    updated_at: String,
}

impl ProfileRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            role: row.try_get("role")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_profile(self) -> Result<Profile, RepositoryError> {
        let role: UserRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        Ok(Profile {
            id: parse_uuid(&self.id, "profile id")?,
            first_name: self.first_name,
            last_name: self.last_name,
            role,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn map_profile(row: &sqlx::sqlite::SqliteRow) -> Result<Profile, RepositoryError> {
    ProfileRow::from_row(row)
        .map_err(|e| RepositoryError::Query(e.to_string()))?
        .into_profile()
}

impl ProfileRepository for SqliteProfileRepository {
    async fn create_profile(&self, profile: &Profile) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO profiles (id, first_name, last_name, role, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(profile.id.to_string())
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(profile.role.to_string())
        .bind(format_datetime(&profile.created_at))
        .bind(format_datetime(&profile.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;
        Ok(())
    }

    async fn get_profile(&self, id: &Uuid) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM profiles WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        row.as_ref().map(map_profile).transpose()
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM profiles ORDER BY created_at ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;
        rows.iter().map(map_profile).collect()
    }

    async fn count_profiles(&self) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM profiles")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)?;
        let count: i64 = row
            .try_get("count")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(count as u64)
    }

    async fn create_token(&self, profile_id: &Uuid, token_hash: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO api_tokens (id, profile_id, token_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(Uuid::now_v7().to_string())
        .bind(profile_id.to_string())
        .bind(token_hash)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;
        Ok(())
    }

    async fn find_profile_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT p.* FROM profiles p
               JOIN api_tokens t ON t.profile_id = p.id
               WHERE t.token_hash = ?"#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;

        if row.is_some() {
            // Best-effort usage stamp; a failure here must not fail auth.
            if let Err(e) = sqlx::query("UPDATE api_tokens SET last_used_at = ? WHERE token_hash = ?")
                .bind(format_datetime(&Utc::now()))
                .bind(token_hash)
                .execute(&self.pool.writer)
                .await
            {
                tracing::debug!(error = %e, "failed to stamp token last_used_at");
            }
        }

        row.as_ref().map(map_profile).transpose()
    }
}
