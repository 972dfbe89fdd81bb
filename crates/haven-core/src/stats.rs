//! Admin dashboard statistics.

use chrono::{DateTime, Duration, Utc};
use haven_types::error::RepositoryError;
use haven_types::expert::ExpertSessionStatus;
use haven_types::stats::DashboardStats;

use crate::repository::conversation::ConversationRepository;
use crate::repository::expert::ExpertSessionRepository;
use crate::repository::profile::ProfileRepository;

/// Window for "recent" AI conversations.
pub const RECENT_WINDOW_HOURS: i64 = 24;

/// Gather dashboard counts as of `now`.
pub async fn collect_dashboard_stats<E, P, C>(
    sessions: &E,
    profiles: &P,
    conversations: &C,
    now: DateTime<Utc>,
) -> Result<DashboardStats, RepositoryError>
where
    E: ExpertSessionRepository,
    P: ProfileRepository,
    C: ConversationRepository,
{
    Ok(DashboardStats {
        total_users: profiles.count_profiles().await?,
        pending_expert_sessions: sessions.count_by_status(ExpertSessionStatus::Pending).await?,
        active_expert_sessions: sessions.count_by_status(ExpertSessionStatus::Active).await?,
        completed_expert_sessions: sessions
            .count_by_status(ExpertSessionStatus::Completed)
            .await?,
        recent_ai_conversations: conversations
            .count_updated_since(now - Duration::hours(RECENT_WINDOW_HOURS))
            .await?,
    })
}
