//! Campaign API endpoints.

use axum::extract::{Path, State};

use super::extract::{Json, Query};
use super::{success, ApiResult};
use crate::auth::{AdminUser, CurrentUser};
use crate::errors::AppError;
use crate::models::{
    default_end_date, Campaign, CampaignDetail, CampaignFilter, CampaignStatus,
    CampaignWithParticipants, CreateCampaignRequest, Participation, UpdateCampaignRequest,
    Validate,
};
use crate::AppState;

/// GET /api/campaigns - List campaigns, optionally by status.
pub async fn list_campaigns(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(filter): Query<CampaignFilter>,
) -> ApiResult<Vec<CampaignWithParticipants>> {
    success(state.repo.list_campaigns(filter.status).await?)
}

/// GET /api/campaigns/{id} - Campaign with participants and contacts.
pub async fn get_campaign(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<CampaignDetail> {
    match state.repo.get_campaign_detail(&id).await? {
        Some(detail) => success(detail),
        None => Err(AppError::NotFound(format!("Campanha {} não encontrada", id))),
    }
}

/// POST /api/campaigns - Create a campaign.
pub async fn create_campaign(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<CreateCampaignRequest>,
) -> ApiResult<Campaign> {
    request.validate()?;

    let end_date = match request.end_date {
        Some(end) => end,
        None => {
            let settings = state.repo.get_settings().await?;
            default_end_date(
                request.start_date,
                &settings.default_campaign_end_time,
                state.config.display_offset,
            )?
        }
    };

    let campaign = state
        .repo
        .create_campaign(&request, end_date, &admin.id)
        .await?;

    tracing::info!(campaign_id = %campaign.id, name = %campaign.name, "Created campaign");
    success(campaign)
}

/// PUT /api/campaigns/{id} - Update a campaign.
pub async fn update_campaign(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateCampaignRequest>,
) -> ApiResult<Campaign> {
    request.validate()?;
    success(state.repo.update_campaign(&id, &request).await?)
}

/// POST /api/campaigns/{id}/finish - Mark a campaign finished.
pub async fn finish_campaign(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Campaign> {
    success(
        state
            .repo
            .set_campaign_status(&id, CampaignStatus::Finished)
            .await?,
    )
}

/// POST /api/campaigns/{id}/reopen - Mark a finished campaign active again.
pub async fn reopen_campaign(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Campaign> {
    success(
        state
            .repo
            .set_campaign_status(&id, CampaignStatus::Active)
            .await?,
    )
}

/// DELETE /api/campaigns/{id} - Delete a campaign with its contacts and participations.
pub async fn delete_campaign(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.delete_campaign(&id).await?;
    success(())
}

/// POST /api/campaigns/{id}/join - Join an active campaign.
pub async fn join_campaign(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Participation> {
    let participation = state.repo.join_campaign(&id, &current.user.id).await?;

    tracing::debug!(campaign_id = %id, user_id = %current.user.id, "Joined campaign");
    success(participation)
}

/// POST /api/campaigns/{id}/leave - Leave a campaign.
pub async fn leave_campaign(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.leave_campaign(&id, &current.user.id).await?;
    success(())
}
