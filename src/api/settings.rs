//! Application settings endpoints.

use axum::extract::State;

use super::extract::Json;
use super::{success, ApiResult};
use crate::auth::AdminUser;
use crate::models::{AppSettings, UpdateSettingsRequest, Validate};
use crate::AppState;

/// GET /api/settings - Public read, the register page needs it before login.
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<AppSettings> {
    success(state.repo.get_settings().await?)
}

/// PUT /api/settings - Replace the settings.
pub async fn update_settings(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<UpdateSettingsRequest>,
) -> ApiResult<AppSettings> {
    request.validate()?;

    let settings = state.repo.update_settings(&request).await?;
    tracing::info!(
        registration_open = settings.registration_open,
        default_campaign_end_time = %settings.default_campaign_end_time,
        "Updated settings"
    );
    success(settings)
}
