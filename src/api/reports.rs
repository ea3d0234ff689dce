//! Dashboard report endpoints (admin only).

use axum::extract::State;
use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};

use super::{success, ApiResult};
use crate::auth::AdminUser;
use crate::db::now;
use crate::models::{CampaignSummary, CollectorStats, DashboardStats};
use crate::AppState;

const LEADERBOARD_SIZE: usize = 5;
const RECENT_CAMPAIGNS: usize = 5;

/// GET /api/reports/dashboard - Headline counters.
pub async fn get_dashboard(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<DashboardStats> {
    let at = now();
    let today = start_of_day(at, state.config.display_offset);
    let week = at - Duration::days(7);

    success(state.repo.dashboard_stats(today, week).await?)
}

/// GET /api/reports/top-collectors - Collectors with most contacts.
pub async fn get_top_collectors(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Vec<CollectorStats>> {
    success(state.repo.top_collectors(LEADERBOARD_SIZE).await?)
}

/// GET /api/reports/recent-campaigns - Newest campaigns with counts.
pub async fn get_recent_campaigns(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Vec<CampaignSummary>> {
    success(state.repo.recent_campaigns(RECENT_CAMPAIGNS).await?)
}

/// Local midnight of the day containing `at`, as UTC.
fn start_of_day(at: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let midnight = at.with_timezone(&offset).date_naive().and_time(NaiveTime::MIN);
    // A fixed offset has exactly one mapping for every local time
    (midnight - Duration::seconds(offset.local_minus_utc() as i64)).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_start_of_day_uses_local_midnight() {
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();

        // 01:00 UTC is still the previous day in BRT
        let at = Utc.with_ymd_and_hms(2025, 3, 2, 1, 0, 0).unwrap();
        assert_eq!(
            start_of_day(at, brt),
            Utc.with_ymd_and_hms(2025, 3, 1, 3, 0, 0).unwrap()
        );

        let at = Utc.with_ymd_and_hms(2025, 3, 2, 15, 0, 0).unwrap();
        assert_eq!(
            start_of_day(at, brt),
            Utc.with_ymd_and_hms(2025, 3, 2, 3, 0, 0).unwrap()
        );
    }
}
