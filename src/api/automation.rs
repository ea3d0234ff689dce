//! Trigger for the finish-campaigns job.

use axum::{extract::State, http::HeaderMap};

use super::{success, ApiResult};
use crate::auth;
use crate::models::FinishCampaignsResult;
use crate::scheduler;
use crate::AppState;

/// POST /api/functions/finish-campaigns - Finish every expired campaign.
///
/// Accepts either the scheduler key header or an admin session.
pub async fn finish_expired_campaigns(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<FinishCampaignsResult> {
    if !auth::has_scheduler_key(&headers, state.config.scheduler_key.as_deref()) {
        let current = auth::authenticate(&state, &headers).await?;
        auth::require_admin(&current.user)?;
    }

    let result = scheduler::finish_campaigns(&state.repo).await?;
    tracing::info!(count = result.campaigns.len(), "Finish-campaigns triggered");
    success(result)
}
