//! Contact models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{self, Validate};
use crate::errors::AppError;

/// One canvassed person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub campaign_id: String,
    pub collector_id: String,
    pub neighborhood: String,
    pub first_name: String,
    pub phone: String,
    pub demand: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contact joined with its campaign and collector names. The joined fields
/// are `None` when the referenced row no longer exists.
#[derive(Debug, Clone, Serialize)]
pub struct ContactWithDetails {
    #[serde(flatten)]
    pub contact: Contact,
    pub campaign_name: Option<String>,
    pub campaign_location: Option<String>,
    pub collector_username: Option<String>,
}

/// Request body for `POST /api/contacts`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContactRequest {
    pub neighborhood: String,
    pub first_name: String,
    pub phone: String,
    #[serde(default)]
    pub demand: Option<String>,
}

impl Validate for CreateContactRequest {
    fn validate(&self) -> Result<(), AppError> {
        validation::NEIGHBORHOOD.check(&self.neighborhood)?;
        validation::FIRST_NAME.check(&self.first_name)?;
        validation::check_phone(&self.phone)
    }
}

/// Request body for `PUT /api/contacts/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContactRequest {
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub demand: Option<String>,
}

impl Validate for UpdateContactRequest {
    fn validate(&self) -> Result<(), AppError> {
        validation::NEIGHBORHOOD.check_opt(self.neighborhood.as_deref())?;
        validation::FIRST_NAME.check_opt(self.first_name.as_deref())?;
        match &self.phone {
            Some(phone) => validation::check_phone(phone),
            None => Ok(()),
        }
    }
}

/// Query parameters for `GET /api/contacts`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactFilter {
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub collector_id: Option<String>,
    #[serde(default)]
    pub mine: bool,
}

/// Query parameters for `GET /api/neighborhoods`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NeighborhoodQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// Blank demands are stored as absent.
pub fn normalize_demand(demand: Option<&str>) -> Option<String> {
    demand
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}
