//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools. Timestamps are stored as RFC 3339 strings
//! with fixed microsecond precision so they sort lexically.

pub mod conversation;
pub mod expert;
pub mod pool;
pub mod profile;

use chrono::{DateTime, SecondsFormat, Utc};
use haven_types::error::RepositoryError;
use uuid::Uuid;

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_uuid(s: &str, what: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::Query(format!("invalid {what}: {e}")))
}

fn query_error(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(db.message().to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => RepositoryError::Connection,
        other => RepositoryError::Query(other.to_string()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use haven_core::repository::profile::ProfileRepository;
    use haven_types::identity::{Profile, UserRole};

    use super::pool::DatabasePool;
    use super::profile::SqliteProfileRepository;

    pub async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    /// Insert a profile so foreign keys on user/admin ids are satisfied.
    pub async fn seed_profile(pool: &DatabasePool, role: UserRole) -> Profile {
        let profile = Profile::new(Some("Test".to_string()), None, role);
        SqliteProfileRepository::new(pool.clone())
            .create_profile(&profile)
            .await
            .unwrap();
        profile
    }
}
