//! Campaign and participation models.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{self, Validate};
use super::ContactWithDetails;
use crate::errors::AppError;

/// Two-state campaign flag. Both transitions are allowed and no history is kept.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Active,
    Finished,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Active => "active",
            CampaignStatus::Finished => "finished",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(CampaignStatus::Active),
            "finished" => Some(CampaignStatus::Finished),
            _ => None,
        }
    }

    /// Label used in spreadsheets.
    pub fn label(&self) -> &'static str {
        match self {
            CampaignStatus::Active => "Ativa",
            CampaignStatus::Finished => "Finalizada",
        }
    }
}

/// A scheduled, location-bound collection event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub location: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: CampaignStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Join relation between a user and a campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participation {
    pub id: String,
    pub campaign_id: String,
    pub user_id: String,
    pub joined_at: DateTime<Utc>,
}

/// Participation row carrying the participant's username.
#[derive(Debug, Clone, Serialize)]
pub struct Participant {
    #[serde(flatten)]
    pub participation: Participation,
    pub username: Option<String>,
}

/// Campaign listing entry.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignWithParticipants {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub participants: Vec<Participation>,
    pub contact_count: i64,
}

/// The campaign a user is currently collecting for.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveCampaign {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub participants: Vec<Participation>,
}

/// Full campaign page: participants and collected contacts.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignDetail {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub participants: Vec<Participant>,
    pub contacts: Vec<ContactWithDetails>,
}

/// Campaign with aggregate counts, used by reports and the full export.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignSummary {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub participant_count: i64,
    pub contact_count: i64,
}

/// Request body for `POST /api/campaigns`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub location: String,
    pub start_date: DateTime<Utc>,
    /// Defaults to the start day at the configured default end time.
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

impl Validate for CreateCampaignRequest {
    fn validate(&self) -> Result<(), AppError> {
        validation::CAMPAIGN_NAME.check(&self.name)?;
        validation::CAMPAIGN_LOCATION.check(&self.location)?;
        match self.end_date {
            Some(end) => check_window(self.start_date, end),
            None => Ok(()),
        }
    }
}

/// Request body for `PUT /api/campaigns/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCampaignRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<CampaignStatus>,
}

impl Validate for UpdateCampaignRequest {
    fn validate(&self) -> Result<(), AppError> {
        validation::CAMPAIGN_NAME.check_opt(self.name.as_deref())?;
        validation::CAMPAIGN_LOCATION.check_opt(self.location.as_deref())
    }
}

/// The end of a campaign may not precede its start.
pub fn check_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), AppError> {
    if end < start {
        return Err(AppError::invalid_field(
            "end_date",
            "Data de fim deve ser posterior à data de início",
        ));
    }
    Ok(())
}

/// End date for a campaign created without one: the start day, in `offset`,
/// at `end_time` (`HH:MM`). Moves to the following day when that is not after
/// the start.
pub fn default_end_date(
    start: DateTime<Utc>,
    end_time: &str,
    offset: FixedOffset,
) -> Result<DateTime<Utc>, AppError> {
    let time = NaiveTime::parse_from_str(end_time, "%H:%M").map_err(|_| {
        AppError::Internal(format!("Horário padrão inválido: {}", end_time))
    })?;

    let local_day = start.with_timezone(&offset).date_naive();
    let end = local_day
        .and_time(time)
        .and_local_timezone(offset)
        .single()
        .map(|end| end.with_timezone(&Utc))
        .ok_or_else(|| AppError::Internal("Data de fim inválida".to_string()))?;

    if end <= start {
        Ok(end + Duration::days(1))
    } else {
        Ok(end)
    }
}

/// Request body for `PUT /api/participation/active`.
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchCampaignRequest {
    pub campaign_id: String,
}

/// Query parameters for `GET /api/campaigns`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampaignFilter {
    #[serde(default)]
    pub status: Option<CampaignStatus>,
}

/// Campaign closed by the finish-campaigns job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishedCampaign {
    pub id: String,
    pub name: String,
}

/// Result of one finish-campaigns run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishCampaignsResult {
    pub message: String,
    pub campaigns: Vec<FinishedCampaign>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_status_round_trip_strings() {
        assert_eq!(CampaignStatus::parse("active"), Some(CampaignStatus::Active));
        assert_eq!(CampaignStatus::Finished.as_str(), "finished");
        assert_eq!(CampaignStatus::parse("archived"), None);
        assert_eq!(CampaignStatus::Finished.label(), "Finalizada");
    }

    #[test]
    fn test_create_rejects_inverted_window() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let request = CreateCampaignRequest {
            name: "Mutirão Centro".into(),
            location: "Praça Central".into(),
            start_date: start,
            end_date: Some(start - chrono::Duration::hours(1)),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_accepts_missing_end() {
        let request = CreateCampaignRequest {
            name: "Mutirão Centro".into(),
            location: "Praça Central".into(),
            start_date: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
            end_date: None,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_default_end_date_same_day() {
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        // 09:00 local
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let end = default_end_date(start, "18:00", brt).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 1, 21, 0, 0).unwrap());
    }

    #[test]
    fn test_default_end_date_rolls_over() {
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        // 19:30 local, after the default end time
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 22, 30, 0).unwrap();
        let end = default_end_date(start, "18:00", brt).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 2, 21, 0, 0).unwrap());
        assert!(default_end_date(start, "25:99", brt).is_err());
    }

    #[test]
    fn test_update_checks_only_present_fields() {
        let request = UpdateCampaignRequest {
            location: Some("X".into()),
            ..Default::default()
        };
        assert!(request.validate().is_err());
        assert!(UpdateCampaignRequest::default().validate().is_ok());
    }
}
