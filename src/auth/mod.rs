//! Caller identity and the admin access guard.

mod error;
mod guard;
mod session;

pub use error::AuthError;
pub use guard::AccessGuard;
pub use session::{CanonicalUser, Session, UserRef, canonicalize, normalize_role_key};
