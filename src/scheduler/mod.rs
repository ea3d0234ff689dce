//! Campaign automation: closing campaigns whose end date has passed.

use std::sync::Arc;
use std::time::Duration;

use crate::db::{now, Repository};
use crate::errors::AppError;
use crate::models::FinishCampaignsResult;

/// Finish every expired active campaign and describe what changed.
pub async fn finish_campaigns(repo: &Repository) -> Result<FinishCampaignsResult, AppError> {
    let campaigns = repo.finish_expired_campaigns(now()).await?;

    let message = match campaigns.len() {
        0 => "Nenhuma campanha para finalizar".to_string(),
        1 => "1 campanha finalizada".to_string(),
        n => format!("{} campanhas finalizadas", n),
    };

    Ok(FinishCampaignsResult { message, campaigns })
}

/// Run `finish_campaigns` every `interval_secs` seconds. Zero disables the task.
pub fn spawn_finish_task(repo: Arc<Repository>, interval_secs: u64) {
    if interval_secs == 0 {
        tracing::info!("Automatic campaign finishing disabled");
        return;
    }

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            match finish_campaigns(&repo).await {
                Ok(result) if !result.campaigns.is_empty() => {
                    tracing::info!(
                        count = result.campaigns.len(),
                        "Finished expired campaigns"
                    );
                }
                Ok(_) => tracing::debug!("No expired campaigns"),
                Err(e) => tracing::warn!("Finishing expired campaigns failed: {}", e),
            }
        }
    });
}
