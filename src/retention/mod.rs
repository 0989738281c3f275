//! Retention policy enforcement.
//!
//! One run:
//! 1. Archives open conversations whose latest message is older than the
//!    retention period (when auto-archive is enabled)
//! 2. Deletes conversations archived before the same cutoff (when deletion of
//!    archived data is enabled)
//! 3. Prunes action log entries older than the audit retention period
//!
//! Every step re-queries its candidates page by page until a short page comes
//! back. Unlike the bulk purges, any row error aborts the whole run.

mod enforcer;

pub use enforcer::{RetentionAbort, RetentionEnforcer, RetentionReport, RetentionStage, cutoff};
