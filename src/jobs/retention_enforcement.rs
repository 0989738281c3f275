use crate::{
    config::RetentionJobConfig,
    models::PerformedVia,
    observability::metrics,
    retention::RetentionReport,
    services::{GovernanceResult, RetentionService},
};

/// Run one retention pass and log its outcome.
pub async fn run_retention_pass(service: &RetentionService) -> GovernanceResult<RetentionReport> {
    let result = service.enforce_policy(PerformedVia::Schedule).await;
    match &result {
        Ok(report) if report.has_changes() => tracing::info!(
            archived = report.archived_count,
            deleted = report.deleted_count,
            audit_deleted = report.audit_deleted,
            "Retention run complete"
        ),
        Ok(_) => tracing::debug!("Retention run complete, nothing to do"),
        Err(e) => {
            tracing::error!(error = %e, "Error running retention enforcement");
            metrics::record_job_failure("retention");
        }
    }
    result
}

/// Starts the retention worker as a background task.
///
/// Runs a pass immediately and then once per configured interval, until the
/// task is cancelled.
pub async fn start_retention_worker(service: RetentionService, config: RetentionJobConfig) {
    if !config.enabled {
        tracing::info!("Retention worker disabled by configuration");
        return;
    }

    tracing::info!(
        interval_hours = config.interval_hours,
        "Starting retention worker"
    );

    let interval = config.interval();
    loop {
        let _ = run_retention_pass(&service).await;
        tokio::time::sleep(interval).await;
    }
}
