use std::{collections::BTreeSet, sync::Arc};

use super::{
    AuthError,
    session::{CanonicalUser, Session, canonicalize, normalize_role_key},
};
use crate::{config::AuthConfig, db::UserRepo};

/// Resolves session identities against the user store and enforces the
/// admin requirement on destructive and exporting operations.
pub struct AccessGuard {
    users: Arc<dyn UserRepo>,
    admin_role_keys: BTreeSet<String>,
}

impl AccessGuard {
    pub fn new(users: Arc<dyn UserRepo>, config: &AuthConfig) -> Self {
        Self {
            users,
            admin_role_keys: config
                .admin_role_keys
                .iter()
                .filter_map(|key| normalize_role_key(key))
                .collect(),
        }
    }

    /// Resolve the session's user from the store.
    ///
    /// A session naming a user the store does not know is unauthenticated.
    pub async fn resolve(&self, session: &Session) -> Result<CanonicalUser, AuthError> {
        let Some(user_id) = session.user_id() else {
            return Err(AuthError::Unauthenticated);
        };

        match self.users.get_by_id(user_id).await? {
            Some(user) => Ok(canonicalize(&user)),
            None => {
                tracing::debug!(user_id, "Session names an unknown user");
                Err(AuthError::Unauthenticated)
            }
        }
    }

    /// Require an administrator. Returns the canonical user id.
    pub async fn require_admin(&self, session: &Session) -> Result<String, AuthError> {
        let user = self.resolve(session).await?;

        if !user.has_any_role(&self.admin_role_keys) {
            tracing::warn!(
                user_id = %user.id,
                via = %session.via,
                "Non-admin attempted an admin-only operation"
            );
            return Err(AuthError::Forbidden(
                "administrator role required".to_string(),
            ));
        }

        Ok(user.id)
    }
}

#[cfg(all(test, feature = "database-sqlite"))]
mod tests {
    use super::*;
    use crate::{
        db::tests::harness::create_test_db,
        models::{PerformedVia, RoleRef, UpsertUser},
    };

    async fn guard_with_users() -> AccessGuard {
        let (_, db) = create_test_db().await;
        let users = db.users();
        users
            .upsert(UpsertUser {
                id: "admin_1".into(),
                display_name: None,
                roles: vec![RoleRef::Object {
                    key: "Admin".into(),
                }],
            })
            .await
            .unwrap();
        users
            .upsert(UpsertUser {
                id: "agent_1".into(),
                display_name: None,
                roles: vec![RoleRef::Key("agent".into())],
            })
            .await
            .unwrap();
        AccessGuard::new(users, &AuthConfig::default())
    }

    #[tokio::test]
    async fn test_admin_passes_in_both_shapes() {
        let guard = guard_with_users().await;

        let bare = Session::from_header_value("admin_1", PerformedVia::Admin);
        let linked = Session::from_header_value(r#"{"id":"admin_1"}"#, PerformedVia::Admin);

        assert_eq!(guard.require_admin(&bare).await.unwrap(), "admin_1");
        assert_eq!(guard.require_admin(&linked).await.unwrap(), "admin_1");
    }

    #[tokio::test]
    async fn test_non_admin_forbidden() {
        let guard = guard_with_users().await;
        let session = Session::for_user("agent_1", PerformedVia::Admin);

        let err = guard.require_admin(&session).await.unwrap_err();
        assert!(matches!(err, AuthError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_missing_and_unknown_identity_unauthenticated() {
        let guard = guard_with_users().await;

        let anonymous = Session::anonymous(PerformedVia::Admin);
        assert!(matches!(
            guard.require_admin(&anonymous).await,
            Err(AuthError::Unauthenticated)
        ));

        let unknown = Session::for_user("ghost", PerformedVia::Admin);
        assert!(matches!(
            guard.require_admin(&unknown).await,
            Err(AuthError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_configured_admin_keys() {
        let (_, db) = create_test_db().await;
        db.users()
            .upsert(UpsertUser {
                id: "ops".into(),
                display_name: None,
                roles: vec![RoleRef::Key("support-lead".into())],
            })
            .await
            .unwrap();

        let config = AuthConfig {
            admin_role_keys: vec!["Support-Lead".into()],
            ..Default::default()
        };
        let guard = AccessGuard::new(db.users(), &config);
        let session = Session::for_user("ops", PerformedVia::Cli);
        assert_eq!(guard.require_admin(&session).await.unwrap(), "ops");
    }
}
