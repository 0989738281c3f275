//! Shared tests for ActionLogRepo implementations

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::{
    db::{DbError, repos::ActionLogRepo},
    models::{CreateActionLogEntry, PerformedVia, SYSTEM_ACTOR},
};

fn entry(action: &str, performed_at: Option<chrono::DateTime<Utc>>) -> CreateActionLogEntry {
    CreateActionLogEntry {
        action: action.to_string(),
        description: format!("{action} ran"),
        performed_by: SYSTEM_ACTOR.to_string(),
        performed_via: PerformedVia::Schedule,
        success: true,
        metadata: json!({"source": "test"}),
        performed_at,
    }
}

async fn test_create_and_list_recent(repo: &dyn ActionLogRepo) {
    let now = Utc::now();
    repo.create(entry("support.first", Some(now - Duration::minutes(5))))
        .await
        .unwrap();
    let second = repo.create(entry("support.second", Some(now))).await.unwrap();
    assert_eq!(second.performed_via, PerformedVia::Schedule);

    let recent = repo.list_recent(10).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].action, "support.second");
    assert_eq!(recent[0].metadata, json!({"source": "test"}));
    assert!(recent[0].success);
    assert_eq!(recent[1].action, "support.first");
}

async fn test_performed_at_defaults_to_now(repo: &dyn ActionLogRepo) {
    let before = Utc::now();
    let created = repo.create(entry("support.now", None)).await.unwrap();
    assert!(created.performed_at >= before);
}

async fn test_list_ids_before(repo: &dyn ActionLogRepo) {
    let now = Utc::now();
    let old = repo
        .create(entry("support.old", Some(now - Duration::days(800))))
        .await
        .unwrap();
    repo.create(entry("support.new", Some(now - Duration::days(10))))
        .await
        .unwrap();

    let ids = repo
        .list_ids_before(now - Duration::days(730), 250)
        .await
        .unwrap();
    assert_eq!(ids, vec![old.id]);
}

async fn test_delete(repo: &dyn ActionLogRepo) {
    let created = repo.create(entry("support.delete", None)).await.unwrap();
    repo.delete(created.id).await.unwrap();
    assert!(repo.list_recent(10).await.unwrap().is_empty());

    let missing = repo.delete(Uuid::new_v4()).await;
    assert!(matches!(missing, Err(DbError::NotFound)));
}

mod sqlite_tests {
    use super::*;
    use crate::db::{
        sqlite::SqliteActionLogRepo,
        tests::harness::{create_sqlite_pool, run_sqlite_migrations},
    };

    async fn create_repo() -> SqliteActionLogRepo {
        let pool = create_sqlite_pool().await;
        run_sqlite_migrations(&pool).await;
        SqliteActionLogRepo::new(pool)
    }

    macro_rules! sqlite_test {
        ($name:ident) => {
            #[tokio::test]
            async fn $name() {
                let repo = create_repo().await;
                super::$name(&repo).await;
            }
        };
    }

    sqlite_test!(test_create_and_list_recent);
    sqlite_test!(test_performed_at_defaults_to_now);
    sqlite_test!(test_list_ids_before);
    sqlite_test!(test_delete);
}
