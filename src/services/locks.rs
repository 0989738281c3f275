//! Single-flight guard for destructive operations.
//!
//! At most one run of each [`Operation`] is in flight per process. A second
//! caller gets [`GovernanceError::Busy`] instead of queueing. The permit
//! releases the slot when dropped, including on early return or panic.

use std::{sync::Arc, time::Instant};

use dashmap::{DashMap, mapref::entry::Entry};
use serde::Serialize;

use super::GovernanceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    HardReset,
    LearningReset,
    Retention,
    Backup,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::HardReset => "hard_reset",
            Operation::LearningReset => "reset_learning",
            Operation::Retention => "retention",
            Operation::Backup => "backup",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Default)]
pub struct OperationLocks {
    running: Arc<DashMap<Operation, Instant>>,
}

impl OperationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `operation`, or fail with `Busy` if it is taken.
    pub fn acquire(&self, operation: Operation) -> Result<OperationPermit, GovernanceError> {
        match self.running.entry(operation) {
            Entry::Occupied(e) => {
                tracing::info!(
                    operation = %operation,
                    running_for_secs = e.get().elapsed().as_secs(),
                    "Operation already running"
                );
                Err(GovernanceError::Busy(operation))
            }
            Entry::Vacant(e) => {
                e.insert(Instant::now());
                Ok(OperationPermit {
                    operation,
                    running: Arc::clone(&self.running),
                })
            }
        }
    }

    pub fn is_running(&self, operation: Operation) -> bool {
        self.running.contains_key(&operation)
    }
}

/// Held for the duration of an operation.
#[must_use = "the operation slot is released as soon as the permit is dropped"]
pub struct OperationPermit {
    operation: Operation,
    running: Arc<DashMap<Operation, Instant>>,
}

impl Drop for OperationPermit {
    fn drop(&mut self) {
        self.running.remove(&self.operation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_busy() {
        let locks = OperationLocks::new();
        let _permit = locks.acquire(Operation::HardReset).unwrap();

        let second = locks.acquire(Operation::HardReset);
        assert!(matches!(
            second,
            Err(GovernanceError::Busy(Operation::HardReset))
        ));
    }

    #[test]
    fn test_released_on_drop() {
        let locks = OperationLocks::new();
        {
            let _permit = locks.acquire(Operation::Backup).unwrap();
            assert!(locks.is_running(Operation::Backup));
        }
        assert!(!locks.is_running(Operation::Backup));
        assert!(locks.acquire(Operation::Backup).is_ok());
    }

    #[test]
    fn test_operations_independent() {
        let locks = OperationLocks::new();
        let _reset = locks.acquire(Operation::HardReset).unwrap();
        assert!(locks.acquire(Operation::LearningReset).is_ok());
    }

    #[test]
    fn test_clones_share_state() {
        let locks = OperationLocks::new();
        let other = locks.clone();
        let _permit = locks.acquire(Operation::Retention).unwrap();
        assert!(other.acquire(Operation::Retention).is_err());
    }
}
