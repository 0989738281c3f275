//! Shared database repository test infrastructure
//!
//! Each repository has a test module containing test functions that take the
//! repository as a trait object, run against an in-memory SQLite database
//! with the production migrations applied.
//!
//! ```bash
//! cargo test db::tests
//! ```

mod action_logs;
pub mod faults;
pub mod harness;
