//! Aggregates shown on the admin dashboard.

use serde::{Deserialize, Serialize};

/// Headline counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_contacts: i64,
    pub total_campaigns: i64,
    pub active_campaigns: i64,
    pub total_users: i64,
    pub contacts_today: i64,
    pub contacts_this_week: i64,
}

/// One leaderboard entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectorStats {
    pub id: String,
    pub username: String,
    pub full_name: Option<String>,
    pub contact_count: i64,
    pub campaign_count: i64,
}
