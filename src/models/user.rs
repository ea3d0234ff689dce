//! User and session models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{self, Validate};
use crate::errors::AppError;

/// The sole authorization axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Collector,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Collector => "collector",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "collector" => Some(Role::Collector),
            _ => None,
        }
    }
}

/// A user profile. The password hash never leaves the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// User row enriched with activity counts, as shown in the user manager.
#[derive(Debug, Clone, Serialize)]
pub struct UserWithCounts {
    #[serde(flatten)]
    pub user: User,
    pub contact_count: i64,
    pub campaign_count: i64,
}

/// Request body for `POST /api/auth/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), AppError> {
        validation::check_email(&self.email)?;
        validation::PASSWORD.check(&self.password)?;
        validation::USERNAME.check(&self.username)
    }
}

/// Request body for `POST /api/auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Issued session returned by register and login.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Request body for `PUT /api/auth/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl Validate for UpdateProfileRequest {
    fn validate(&self) -> Result<(), AppError> {
        validation::USERNAME.check_opt(self.username.as_deref())
    }
}

/// Request body for `PUT /api/auth/password`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub new_password: String,
}

impl Validate for ChangePasswordRequest {
    fn validate(&self) -> Result<(), AppError> {
        validation::PASSWORD.check(&self.new_password)
    }
}

/// Request body for `PUT /api/users/{id}/role`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}
