//! Contact API endpoints.

use axum::extract::{Path, State};

use super::extract::{Json, Query};
use super::{success, ApiResult};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::{
    Contact, ContactFilter, ContactWithDetails, CreateContactRequest, NeighborhoodQuery,
    UpdateContactRequest, Validate,
};
use crate::AppState;

/// GET /api/contacts - List contacts, newest first.
pub async fn list_contacts(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(filter): Query<ContactFilter>,
) -> ApiResult<Vec<ContactWithDetails>> {
    let collector_id = if filter.mine {
        Some(current.user.id.as_str())
    } else {
        filter.collector_id.as_deref()
    };

    success(
        state
            .repo
            .list_contacts(filter.campaign_id.as_deref(), collector_id)
            .await?,
    )
}

/// POST /api/contacts - Record a contact in the caller's active campaign.
pub async fn create_contact(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateContactRequest>,
) -> ApiResult<Contact> {
    request.validate()?;

    let active = state
        .repo
        .active_campaign(&current.user.id)
        .await?
        .ok_or_else(|| {
            AppError::validation("Você precisa estar em uma campanha ativa para adicionar contatos")
        })?;

    let contact = state
        .repo
        .create_contact(&active.campaign.id, &current.user.id, &request)
        .await?;

    tracing::debug!(contact_id = %contact.id, campaign_id = %contact.campaign_id, "Created contact");
    success(contact)
}

/// PUT /api/contacts/{id} - Update a contact.
pub async fn update_contact(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateContactRequest>,
) -> ApiResult<Contact> {
    request.validate()?;
    success(state.repo.update_contact(&id, &request).await?)
}

/// DELETE /api/contacts/{id} - Delete a contact.
pub async fn delete_contact(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.delete_contact(&id).await?;
    success(())
}

/// GET /api/neighborhoods - Neighborhood suggestions.
pub async fn list_neighborhoods(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(query): Query<NeighborhoodQuery>,
) -> ApiResult<Vec<String>> {
    success(state.repo.neighborhoods(query.q.as_deref()).await?)
}
