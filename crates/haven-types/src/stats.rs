//! Admin dashboard statistics.

use serde::{Deserialize, Serialize};

/// Aggregate counts shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_users: u64,
    pub pending_expert_sessions: u64,
    pub active_expert_sessions: u64,
    pub completed_expert_sessions: u64,
    /// AI conversations updated within the last 24 hours.
    pub recent_ai_conversations: u64,
}
