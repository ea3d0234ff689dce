//! Read-only aggregate queries for the admin dashboard and exports.

use chrono::{DateTime, Utc};
use sqlx::Row;

use super::repository::campaign_from_row;
use super::{ts, Repository};
use crate::errors::AppError;
use crate::models::{CampaignSummary, CollectorStats, DashboardStats};

const SUMMARY_SQL: &str = r#"
    SELECT c.id AS id, c.name AS name, c.location AS location,
           c.start_date AS start_date, c.end_date AS end_date, c.status AS status,
           c.created_by AS created_by, c.created_at AS created_at,
           (SELECT COUNT(*) FROM campaign_participants p WHERE p.campaign_id = c.id) AS participant_count,
           (SELECT COUNT(*) FROM contacts k WHERE k.campaign_id = c.id) AS contact_count
    FROM campaigns c
    ORDER BY c.created_at DESC, c.rowid DESC
"#;

impl Repository {
    /// Headline counters. `today_start` and `week_start` are computed by the caller.
    pub async fn dashboard_stats(
        &self,
        today_start: DateTime<Utc>,
        week_start: DateTime<Utc>,
    ) -> Result<DashboardStats, AppError> {
        let row = sqlx::query(
            r#"SELECT
                (SELECT COUNT(*) FROM contacts) AS total_contacts,
                (SELECT COUNT(*) FROM campaigns) AS total_campaigns,
                (SELECT COUNT(*) FROM campaigns WHERE status = 'active') AS active_campaigns,
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM contacts WHERE created_at >= ?) AS contacts_today,
                (SELECT COUNT(*) FROM contacts WHERE created_at >= ?) AS contacts_this_week"#,
        )
        .bind(ts(today_start))
        .bind(ts(week_start))
        .fetch_one(self.pool())
        .await?;

        Ok(DashboardStats {
            total_contacts: row.try_get("total_contacts")?,
            total_campaigns: row.try_get("total_campaigns")?,
            active_campaigns: row.try_get("active_campaigns")?,
            total_users: row.try_get("total_users")?,
            contacts_today: row.try_get("contacts_today")?,
            contacts_this_week: row.try_get("contacts_this_week")?,
        })
    }

    /// Counts for every collector-role user, oldest account first.
    pub async fn collector_stats(&self) -> Result<Vec<CollectorStats>, AppError> {
        let rows = sqlx::query(
            r#"SELECT u.id AS id, u.username AS username, u.full_name AS full_name,
                      (SELECT COUNT(*) FROM contacts k WHERE k.collector_id = u.id) AS contact_count,
                      (SELECT COUNT(*) FROM campaign_participants p WHERE p.user_id = u.id) AS campaign_count
               FROM users u
               WHERE u.role = 'collector'
               ORDER BY u.created_at ASC, u.rowid ASC"#,
        )
        .fetch_all(self.pool())
        .await?;

        let stats = rows
            .iter()
            .map(|row| {
                Ok(CollectorStats {
                    id: row.try_get("id")?,
                    username: row.try_get("username")?,
                    full_name: row.try_get("full_name")?,
                    contact_count: row.try_get("contact_count")?,
                    campaign_count: row.try_get("campaign_count")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(stats)
    }

    /// Leaderboard of the collectors with most contacts.
    pub async fn top_collectors(&self, limit: usize) -> Result<Vec<CollectorStats>, AppError> {
        Ok(rank_top_collectors(self.collector_stats().await?, limit))
    }

    /// Every campaign with participant and contact counts, newest first.
    pub async fn campaign_summaries(&self) -> Result<Vec<CampaignSummary>, AppError> {
        let rows = sqlx::query(SUMMARY_SQL).fetch_all(self.pool()).await?;

        let summaries = rows
            .iter()
            .map(|row| {
                Ok(CampaignSummary {
                    campaign: campaign_from_row(row)?,
                    participant_count: row.try_get("participant_count")?,
                    contact_count: row.try_get("contact_count")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(summaries)
    }

    /// The newest campaigns with their counts.
    pub async fn recent_campaigns(&self, limit: usize) -> Result<Vec<CampaignSummary>, AppError> {
        let mut summaries = self.campaign_summaries().await?;
        summaries.truncate(limit);
        Ok(summaries)
    }
}

/// Order by contact count, highest first, and keep the first `limit`.
/// `sort_by` is stable, so equal counts keep their input order.
pub fn rank_top_collectors(mut stats: Vec<CollectorStats>, limit: usize) -> Vec<CollectorStats> {
    stats.sort_by(|a, b| b.contact_count.cmp(&a.contact_count));
    stats.truncate(limit);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector(username: &str, contacts: i64) -> CollectorStats {
        CollectorStats {
            id: format!("id-{}", username),
            username: username.to_string(),
            full_name: None,
            contact_count: contacts,
            campaign_count: 1,
        }
    }

    #[test]
    fn test_rank_orders_by_contacts() {
        let ranked = rank_top_collectors(
            vec![collector("ana", 3), collector("bruno", 10), collector("carla", 7)],
            5,
        );
        let names: Vec<_> = ranked.iter().map(|c| c.username.as_str()).collect();
        assert_eq!(names, vec!["bruno", "carla", "ana"]);
    }

    #[test]
    fn test_rank_ties_keep_input_order() {
        let ranked = rank_top_collectors(
            vec![collector("ana", 4), collector("bruno", 4), collector("carla", 9)],
            5,
        );
        let names: Vec<_> = ranked.iter().map(|c| c.username.as_str()).collect();
        assert_eq!(names, vec!["carla", "ana", "bruno"]);
    }

    #[test]
    fn test_rank_truncates() {
        let stats = (0..8).map(|i| collector(&format!("c{}", i), i)).collect();
        let ranked = rank_top_collectors(stats, 5);
        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[0].username, "c7");
        assert_eq!(ranked[4].username, "c3");
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank_top_collectors(Vec::new(), 5).is_empty());
    }
}
