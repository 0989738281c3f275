//! Bounded-batch delete loop shared by the bulk purges.
//!
//! Each round re-queries the remaining candidates from scratch instead of
//! walking an offset, so an interrupted purge can simply be run again: rows
//! already deleted stop appearing, and nothing is skipped when rows vanish
//! underneath the loop.
//!
//! Per-row failures are logged and tallied, never surfaced. A round in which
//! every delete fails halts the purge (the safety stop), so a permanently
//! undeletable set cannot spin the loop forever. A failed fetch stops the
//! purge with [`PurgeInterrupted`], which still carries the tally so far.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    db::{DbError, DbResult, SupportDataRepo},
    models::SupportEntity,
    observability::metrics,
};

/// Candidates fetched per round.
pub const BATCH_SIZE: u32 = 200;

/// Outcome of one purge invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeStats {
    pub deleted: u64,
    /// Failed delete attempts. A row that fails in several rounds counts once
    /// per attempt.
    pub failed: u64,
    /// Non-empty batches processed.
    pub rounds: u64,
}

/// A purge stopped because its next batch could not be fetched.
///
/// Rows counted in `stats` are already gone.
#[derive(Debug, Error)]
#[error("purge interrupted after {} deletions: {source}", .stats.deleted)]
pub struct PurgeInterrupted {
    pub stats: PurgeStats,
    #[source]
    pub source: DbError,
}

/// Where a purge gets its candidates and how it deletes them.
#[async_trait]
pub trait PurgeSource: Send + Sync {
    /// Fetch up to `limit` remaining candidate ids.
    async fn fetch_batch(&self, limit: u32) -> DbResult<Vec<Uuid>>;

    async fn delete_one(&self, id: Uuid) -> DbResult<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct PaginatedPurger {
    batch_size: u32,
}

impl Default for PaginatedPurger {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginatedPurger {
    pub fn new() -> Self {
        Self {
            batch_size: BATCH_SIZE,
        }
    }

    pub fn with_batch_size(batch_size: u32) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    /// Delete everything `source` yields.
    ///
    /// Only a failure to fetch candidates is returned as an error.
    pub async fn purge(
        &self,
        label: &str,
        source: &dyn PurgeSource,
    ) -> Result<PurgeStats, PurgeInterrupted> {
        let mut stats = PurgeStats::default();

        loop {
            let batch = match source.fetch_batch(self.batch_size).await {
                Ok(batch) => batch,
                Err(e) => {
                    tracing::error!(
                        entity = label,
                        deleted = stats.deleted,
                        failed = stats.failed,
                        rounds = stats.rounds,
                        error = %e,
                        "Purge interrupted: could not fetch candidates"
                    );
                    metrics::record_purge(label, stats.deleted, stats.failed, stats.rounds);
                    return Err(PurgeInterrupted { stats, source: e });
                }
            };
            if batch.is_empty() {
                break;
            }

            stats.rounds += 1;
            let mut round_deleted = 0u64;

            for id in &batch {
                match source.delete_one(*id).await {
                    Ok(()) => round_deleted += 1,
                    Err(e) => {
                        stats.failed += 1;
                        tracing::warn!(
                            entity = label,
                            id = %id,
                            error = %e,
                            "Failed to delete row during purge"
                        );
                    }
                }
            }
            stats.deleted += round_deleted;

            if round_deleted == 0 {
                tracing::warn!(
                    entity = label,
                    batch = batch.len(),
                    round = stats.rounds,
                    "Purge made no progress in a full round; stopping"
                );
                break;
            }

            if (batch.len() as u64) < u64::from(self.batch_size) {
                break;
            }
        }

        tracing::info!(
            entity = label,
            deleted = stats.deleted,
            failed = stats.failed,
            rounds = stats.rounds,
            "Purge finished"
        );
        metrics::record_purge(label, stats.deleted, stats.failed, stats.rounds);

        Ok(stats)
    }
}

/// Purge source over one support entity kind.
pub struct EntityPurgeSource {
    repo: Arc<dyn SupportDataRepo>,
    kind: SupportEntity,
}

impl EntityPurgeSource {
    pub fn new(repo: Arc<dyn SupportDataRepo>, kind: SupportEntity) -> Self {
        Self { repo, kind }
    }
}

#[async_trait]
impl PurgeSource for EntityPurgeSource {
    async fn fetch_batch(&self, limit: u32) -> DbResult<Vec<Uuid>> {
        self.repo.list_ids(self.kind, limit).await
    }

    async fn delete_one(&self, id: Uuid) -> DbResult<()> {
        self.repo.delete(self.kind, id).await
    }
}
