//! Active campaign endpoints.

use axum::extract::State;

use super::extract::Json;
use super::{success, ApiResult};
use crate::auth::CurrentUser;
use crate::models::{ActiveCampaign, SwitchCampaignRequest};
use crate::AppState;

/// GET /api/participation/active - The caller's active campaign, or null.
pub async fn get_active_campaign(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Option<ActiveCampaign>> {
    success(state.repo.active_campaign(&current.user.id).await?)
}

/// PUT /api/participation/active - Leave the current campaign and join another.
pub async fn switch_active_campaign(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<SwitchCampaignRequest>,
) -> ApiResult<ActiveCampaign> {
    success(
        state
            .repo
            .switch_campaign(&current.user.id, &request.campaign_id)
            .await?,
    )
}

/// DELETE /api/participation/active - Leave the current campaign, if any.
pub async fn leave_active_campaign(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<()> {
    if let Some(campaign_id) = state.repo.leave_active_campaign(&current.user.id).await? {
        tracing::debug!(%campaign_id, user_id = %current.user.id, "Left active campaign");
    }
    success(())
}
