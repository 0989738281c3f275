use crate::{
    backup::BackupOutcome,
    config::BackupJobConfig,
    observability::metrics,
    services::{BackupService, GovernanceResult},
};

/// Run one backup check and log its outcome.
pub async fn run_backup_pass(service: &BackupService) -> GovernanceResult<BackupOutcome> {
    let result = service.run_scheduled().await;
    match &result {
        Ok(BackupOutcome::Ran { ran_at }) => {
            tracing::info!(ran_at = %ran_at, "Scheduled backup complete")
        }
        Ok(BackupOutcome::Skipped { next_due_at }) => {
            tracing::debug!(next_due_at = ?next_due_at, "Scheduled backup skipped")
        }
        Err(e) => {
            tracing::error!(error = %e, "Error running scheduled backup");
            metrics::record_job_failure("backup");
        }
    }
    result
}

/// Starts the backup worker as a background task.
///
/// Checks due-ness immediately and then once per configured interval, until
/// the task is cancelled.
pub async fn start_backup_worker(service: BackupService, config: BackupJobConfig) {
    if !config.enabled {
        tracing::info!("Backup worker disabled by configuration");
        return;
    }

    tracing::info!(interval_hours = config.interval_hours, "Starting backup worker");

    let interval = config.interval();
    loop {
        let _ = run_backup_pass(&service).await;
        tokio::time::sleep(interval).await;
    }
}
