//! Spreadsheet download endpoints (admin only).

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::auth::AdminUser;
use crate::db::now;
use crate::errors::AppError;
use crate::export::{self, ExportFile, XLSX_CONTENT_TYPE};
use crate::AppState;

/// Number of contact rows in the attached workbook.
const EXPORT_ROWS_HEADER: header::HeaderName = header::HeaderName::from_static("x-export-rows");

/// GET /api/export/contacts - Every contact.
pub async fn export_contacts_xlsx(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Response, AppError> {
    let contacts = state.repo.list_contacts(None, None).await?;
    let file = export::export_contacts(&contacts, now(), state.config.display_offset)?;

    tracing::info!(rows = file.rows, filename = %file.filename, "Exported contacts");
    Ok(attachment(file))
}

/// GET /api/export/campaigns/{id} - Contacts of one campaign.
pub async fn export_campaign_xlsx(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let campaign = state
        .repo
        .get_campaign(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Campanha {} não encontrada", id)))?;
    let contacts = state.repo.list_contacts(Some(id.as_str()), None).await?;
    let file = export::export_campaign_contacts(
        &campaign.name,
        &contacts,
        now(),
        state.config.display_offset,
    )?;

    tracing::info!(campaign_id = %id, rows = file.rows, "Exported campaign contacts");
    Ok(attachment(file))
}

/// GET /api/export/all - Summary, campaigns and contacts workbook.
pub async fn export_all_xlsx(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Response, AppError> {
    let campaigns = state.repo.campaign_summaries().await?;
    let contacts = state.repo.list_contacts(None, None).await?;
    let file = export::export_all(&campaigns, &contacts, now(), state.config.display_offset)?;

    tracing::info!(
        campaigns = campaigns.len(),
        contacts = file.rows,
        "Exported full workbook"
    );
    Ok(attachment(file))
}

fn attachment(file: ExportFile) -> Response {
    (
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.filename),
            ),
            (EXPORT_ROWS_HEADER, file.rows.to_string()),
        ],
        file.bytes,
    )
        .into_response()
}
