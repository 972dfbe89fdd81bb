//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both the CLI and
//! the REST API. Services are generic over repository/provider/hasher
//! traits; AppState pins them to the concrete infra implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use haven_core::assistant::service::AssistantService;
use haven_core::event::feed::ChangeFeed;
use haven_core::expert::service::ExpertChatService;
use haven_core::identity::service::IdentityService;
use haven_core::llm::box_provider::BoxLlmProvider;
use haven_core::stats::collect_dashboard_stats;
use haven_infra::config::{load_config, read_api_key};
use haven_infra::crypto::token::Sha256TokenHasher;
use haven_infra::filesystem::{database_url, resolve_data_dir};
use haven_infra::llm::create_provider;
use haven_infra::sqlite::conversation::SqliteConversationRepository;
use haven_infra::sqlite::expert::SqliteExpertSessionRepository;
use haven_infra::sqlite::pool::DatabasePool;
use haven_infra::sqlite::profile::SqliteProfileRepository;
use haven_types::config::HavenConfig;
use haven_types::error::RepositoryError;
use haven_types::stats::DashboardStats;

pub type ConcreteExpertChatService = ExpertChatService<SqliteExpertSessionRepository>;

pub type ConcreteAssistantService = AssistantService<SqliteConversationRepository, BoxLlmProvider>;

pub type ConcreteIdentityService = IdentityService<SqliteProfileRepository, Sha256TokenHasher>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub expert_service: Arc<ConcreteExpertChatService>,
    pub assistant_service: Arc<ConcreteAssistantService>,
    pub identity_service: Arc<ConcreteIdentityService>,
    pub config: Arc<HavenConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize from the resolved data directory (`HAVEN_DATA_DIR` or `~/.haven`).
    pub async fn init() -> anyhow::Result<Self> {
        Self::init_at(&resolve_data_dir()).await
    }

    /// Connect to the database under `data_dir` and wire services.
    pub async fn init_at(data_dir: &Path) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;

        let config = load_config(data_dir).await;
        let db_pool = DatabasePool::new(&database_url(data_dir)).await?;

        let feed = ChangeFeed::new(config.realtime.feed_capacity);
        let expert_service = ExpertChatService::new(
            SqliteExpertSessionRepository::new(db_pool.clone()),
            feed,
        );

        let provider = create_provider(
            &config.assistant,
            read_api_key(&config.assistant.api_key_env),
        );
        let assistant_service = AssistantService::new(
            SqliteConversationRepository::new(db_pool.clone()),
            provider,
            config.assistant.clone(),
        );

        let identity_service = IdentityService::new(
            SqliteProfileRepository::new(db_pool.clone()),
            Sha256TokenHasher::new(),
        );

        tracing::debug!(data_dir = %data_dir.display(), "application state initialized");

        Ok(Self {
            expert_service: Arc::new(expert_service),
            assistant_service: Arc::new(assistant_service),
            identity_service: Arc::new(identity_service),
            config: Arc::new(config),
            data_dir: data_dir.to_path_buf(),
            db_pool,
        })
    }

    /// Dashboard counts as of now.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, RepositoryError> {
        collect_dashboard_stats(
            self.expert_service.repo(),
            self.identity_service.profiles(),
            self.assistant_service.conversations(),
            chrono::Utc::now(),
        )
        .await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// State over a throwaway data dir with canned assistant replies.
    pub async fn test_state() -> AppState {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join("config.toml"),
            "[assistant]\nprovider = \"canned\"\n",
        )
        .await
        .unwrap();
        let path = dir.path().to_path_buf();
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        AppState::init_at(&path).await.unwrap()
    }
}
