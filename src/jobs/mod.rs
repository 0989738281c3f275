//! Background triggers for the scheduled governance operations.
//!
//! - **Retention enforcement**: applies the retention policy once per
//!   interval (daily by default).
//! - **Scheduled backup**: checks backup due-ness once per interval (hourly by
//!   default); the cadence itself comes from the `backup_schedule` setting.
//!
//! Each worker runs one pass, logs the outcome, and sleeps. A failed pass is
//! logged and counted but not retried; the next tick is the retry. The hard
//! reset is never scheduled.
//!
//! # Example
//!
//! ```toml
//! [jobs.retention]
//! enabled = true
//! interval_hours = 24
//!
//! [jobs.backup]
//! enabled = true
//! interval_hours = 1
//! ```

mod retention_enforcement;
mod scheduled_backup;

pub use retention_enforcement::{run_retention_pass, start_retention_worker};
pub use scheduled_backup::{run_backup_pass, start_backup_worker};
