//! Test harness for database repository testing
//!
//! Provides in-memory SQLite databases with the real migrations applied, plus
//! raw seeding helpers for support records that have no create API.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{db::DbPool, models::SupportEntity};

/// Create an in-memory SQLite pool for testing
pub async fn create_sqlite_pool() -> SqlitePool {
    sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool")
}

/// Run SQLite migrations on the pool
///
/// Uses the actual migration files to ensure tests match production schema
pub async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations_sqlx/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}

/// A migrated in-memory database, returned both as the raw pool (for
/// seeding) and as a `DbPool` (for the code under test).
pub async fn create_test_db() -> (SqlitePool, Arc<DbPool>) {
    let pool = create_sqlite_pool().await;
    run_sqlite_migrations(&pool).await;
    (pool.clone(), Arc::new(DbPool::from_sqlite(pool)))
}

/// Insert a conversation row directly and return its id.
pub async fn insert_conversation(
    pool: &SqlitePool,
    latest_message_at: DateTime<Utc>,
    archived_at: Option<DateTime<Utc>>,
) -> Uuid {
    let id = Uuid::new_v4();
    let status = if archived_at.is_some() {
        "archived"
    } else {
        "open"
    };
    sqlx::query(
        "INSERT INTO conversations (id, subject, status, latest_message_at, archived_at, created_at) \
         VALUES (?, 'seeded', ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(status)
    .bind(latest_message_at)
    .bind(archived_at)
    .bind(Utc::now())
    .execute(pool)
    .await
    .expect("Failed to insert conversation");
    id
}

/// Insert `count` rows of the given kind and return their ids.
///
/// Child kinds are attached to a freshly inserted parent conversation.
pub async fn insert_support_rows(pool: &SqlitePool, kind: SupportEntity, count: usize) -> Vec<Uuid> {
    if kind == SupportEntity::Conversation {
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            ids.push(insert_conversation(pool, Utc::now(), None).await);
        }
        return ids;
    }

    let parent = if kind.is_conversation_child() {
        Some(insert_conversation(pool, Utc::now(), None).await)
    } else {
        None
    };

    let sql = match parent {
        Some(_) => format!(
            "INSERT INTO {} (id, conversation_id, created_at) VALUES (?, ?, ?)",
            kind.table_name()
        ),
        None => format!(
            "INSERT INTO {} (id, created_at) VALUES (?, ?)",
            kind.table_name()
        ),
    };

    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let id = Uuid::new_v4();
        let mut query = sqlx::query(&sql).bind(id.to_string());
        if let Some(parent) = parent {
            query = query.bind(parent.to_string());
        }
        query
            .bind(Utc::now())
            .execute(pool)
            .await
            .expect("Failed to insert support row");
        ids.push(id);
    }
    ids
}

/// Count rows in a table.
pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("Failed to count rows")
}
