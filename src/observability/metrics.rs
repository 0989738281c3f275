//! Prometheus metrics for governance operations.
//!
//! Provides metrics for:
//! - Bulk purge progress and failures per entity kind
//! - Retention archive/delete/prune counts
//! - Backup runs by trigger
//! - Background job failures and admin auth rejections
//!
//! Every recording function compiles to a no-op without the `prometheus`
//! feature.

#[cfg(feature = "prometheus")]
use std::sync::OnceLock;

#[cfg(feature = "prometheus")]
use metrics::{counter, histogram};
#[cfg(feature = "prometheus")]
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::MetricsConfig;

/// Global Prometheus handle for the metrics endpoint.
#[cfg(feature = "prometheus")]
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics system with the given configuration.
#[cfg(feature = "prometheus")]
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(MetricsError::Install)?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::Setup("Metrics already initialized".to_string()))?;

    Ok(())
}

/// Initialize the metrics system (no-op without prometheus feature).
#[cfg(not(feature = "prometheus"))]
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if config.enabled {
        tracing::warn!(
            "Metrics are enabled in config but the 'prometheus' feature is not compiled. \
            Rebuild with: cargo build --features prometheus"
        );
    }
    Ok(())
}

/// Get the Prometheus handle for rendering metrics.
#[cfg(feature = "prometheus")]
pub fn get_prometheus_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// Render the current metrics in Prometheus text format, if installed.
pub fn render() -> Option<String> {
    #[cfg(feature = "prometheus")]
    {
        get_prometheus_handle().map(PrometheusHandle::render)
    }
    #[cfg(not(feature = "prometheus"))]
    {
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Metric Recording Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Record the outcome of one bulk purge.
///
/// # Arguments
/// * `entity` - The entity kind purged (e.g., "classification", "learning_example")
/// * `deleted` - Rows deleted
/// * `failed` - Failed delete attempts
/// * `rounds` - Batches processed
pub fn record_purge(entity: &str, deleted: u64, failed: u64, rounds: u64) {
    #[cfg(feature = "prometheus")]
    {
        counter!("purge_rows_deleted_total", "entity" => entity.to_string()).increment(deleted);
        counter!("purge_rows_failed_total", "entity" => entity.to_string()).increment(failed);
        histogram!("purge_rounds", "entity" => entity.to_string()).record(rounds as f64);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (entity, deleted, failed, rounds);
    }
}

/// Record retention changes.
///
/// # Arguments
/// * `kind` - "archived", "deleted", or "audit_deleted"
/// * `count` - Rows affected
pub fn record_retention(kind: &str, count: u64) {
    #[cfg(feature = "prometheus")]
    {
        counter!(
            "retention_rows_total",
            "kind" => kind.to_string()
        )
        .increment(count);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (kind, count);
    }
}

/// Record a backup run.
pub fn record_backup(trigger: &str) {
    #[cfg(feature = "prometheus")]
    {
        counter!(
            "backup_runs_total",
            "trigger" => trigger.to_string()
        )
        .increment(1);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = trigger;
    }
}

/// Record a failed background job run.
///
/// Tracks errors for alerting; jobs do not retry until their next tick.
pub fn record_job_failure(job: &str) {
    #[cfg(feature = "prometheus")]
    {
        counter!(
            "job_failures_total",
            "job" => job.to_string()
        )
        .increment(1);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = job;
    }
}

/// Record a rejected admin request.
pub fn record_auth_failure(code: &str) {
    #[cfg(feature = "prometheus")]
    {
        counter!(
            "admin_auth_failures_total",
            "code" => code.to_string()
        )
        .increment(1);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = code;
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to set up metrics: {0}")]
    Setup(String),

    #[cfg(feature = "prometheus")]
    #[error("Failed to install metrics recorder: {0}")]
    Install(#[from] metrics_exporter_prometheus::BuildError),
}
