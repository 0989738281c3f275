use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::{
    db::{error::DbResult, repos::UserRepo},
    models::{RoleRef, UpsertUser, User},
};

pub struct SqliteUserRepo {
    pool: SqlitePool,
}

impl SqliteUserRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &SqliteRow) -> DbResult<User> {
        let roles: String = row.get("roles");
        Ok(User {
            id: row.get("id"),
            display_name: row.get("display_name"),
            roles: serde_json::from_str::<Vec<RoleRef>>(&roles)?,
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl UserRepo for SqliteUserRepo {
    async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let row = sqlx::query("SELECT id, display_name, roles, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn upsert(&self, input: UpsertUser) -> DbResult<User> {
        let roles = serde_json::to_string(&input.roles)?;

        sqlx::query(
            r#"
            INSERT INTO users (id, display_name, roles, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                display_name = excluded.display_name,
                roles = excluded.roles
            "#,
        )
        .bind(&input.id)
        .bind(&input.display_name)
        .bind(&roles)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT id, display_name, roles, created_at FROM users WHERE id = ?")
            .bind(&input.id)
            .fetch_one(&self.pool)
            .await?;

        Self::row_to_user(&row)
    }
}
