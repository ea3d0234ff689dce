//! Application settings singleton.

use serde::{Deserialize, Serialize};

use super::validation::{self, Validate};
use crate::errors::AppError;

/// Global switches editable by administrators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub registration_open: bool,
    /// `HH:MM` used when a campaign is created without an end date
    pub default_campaign_end_time: String,
}

/// Request body for `PUT /api/settings`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSettingsRequest {
    pub registration_open: bool,
    pub default_campaign_end_time: String,
}

impl Validate for UpdateSettingsRequest {
    fn validate(&self) -> Result<(), AppError> {
        validation::check_time_of_day("default_campaign_end_time", &self.default_campaign_end_time)
    }
}
