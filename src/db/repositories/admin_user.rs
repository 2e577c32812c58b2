//! Admin account repository

use crate::db::{Backend, DynDatabasePool};
use crate::models::{AdminUser, UserRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const USER_COLUMNS: &str = "id, email, password_hash, role, created_at, updated_at";

#[async_trait]
pub trait AdminUserRepository: Send + Sync {
    async fn create(&self, user: &AdminUser) -> Result<AdminUser>;
    async fn get_by_id(&self, id: i64) -> Result<Option<AdminUser>>;
    /// Lookup by lowercase email
    async fn get_by_email(&self, email: &str) -> Result<Option<AdminUser>>;
    /// Oldest account, if any
    async fn first(&self) -> Result<Option<AdminUser>>;
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<()>;
    async fn count(&self) -> Result<i64>;
}

pub struct SqlxAdminUserRepository {
    pool: DynDatabasePool,
}

impl SqlxAdminUserRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AdminUserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AdminUserRepository for SqlxAdminUserRepository {
    async fn create(&self, user: &AdminUser) -> Result<AdminUser> {
        match self.pool.backend() {
            Backend::Sqlite(p) => create_sqlite(p, user).await,
            Backend::Mysql(p) => create_mysql(p, user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<AdminUser>> {
        let sql = format!("SELECT {} FROM admin_users WHERE id = ?", USER_COLUMNS);
        match self.pool.backend() {
            Backend::Sqlite(p) => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(p)
                    .await
                    .context("Failed to get admin user")?;
                row.map(|r| row_to_user_sqlite(&r)).transpose()
            }
            Backend::Mysql(p) => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(p)
                    .await
                    .context("Failed to get admin user")?;
                row.map(|r| row_to_user_mysql(&r)).transpose()
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<AdminUser>> {
        let sql = format!("SELECT {} FROM admin_users WHERE email = ?", USER_COLUMNS);
        match self.pool.backend() {
            Backend::Sqlite(p) => {
                let row = sqlx::query(&sql)
                    .bind(email)
                    .fetch_optional(p)
                    .await
                    .context("Failed to get admin user by email")?;
                row.map(|r| row_to_user_sqlite(&r)).transpose()
            }
            Backend::Mysql(p) => {
                let row = sqlx::query(&sql)
                    .bind(email)
                    .fetch_optional(p)
                    .await
                    .context("Failed to get admin user by email")?;
                row.map(|r| row_to_user_mysql(&r)).transpose()
            }
        }
    }

    async fn first(&self) -> Result<Option<AdminUser>> {
        let sql = format!("SELECT {} FROM admin_users ORDER BY id ASC LIMIT 1", USER_COLUMNS);
        match self.pool.backend() {
            Backend::Sqlite(p) => {
                let row = sqlx::query(&sql)
                    .fetch_optional(p)
                    .await
                    .context("Failed to get first admin user")?;
                row.map(|r| row_to_user_sqlite(&r)).transpose()
            }
            Backend::Mysql(p) => {
                let row = sqlx::query(&sql)
                    .fetch_optional(p)
                    .await
                    .context("Failed to get first admin user")?;
                row.map(|r| row_to_user_mysql(&r)).transpose()
            }
        }
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<()> {
        let sql = "UPDATE admin_users SET password_hash = ?, updated_at = ? WHERE id = ?";
        let now = Utc::now();
        match self.pool.backend() {
            Backend::Sqlite(p) => sqlx::query(sql)
                .bind(password_hash)
                .bind(now)
                .bind(id)
                .execute(p)
                .await
                .map(|_| ()),
            Backend::Mysql(p) => sqlx::query(sql)
                .bind(password_hash)
                .bind(now)
                .bind(id)
                .execute(p)
                .await
                .map(|_| ()),
        }
        .context("Failed to update admin password")
    }

    async fn count(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) as count FROM admin_users";
        let count: i64 = match self.pool.backend() {
            Backend::Sqlite(p) => sqlx::query(sql).fetch_one(p).await?.get("count"),
            Backend::Mysql(p) => sqlx::query(sql).fetch_one(p).await?.get("count"),
        };
        Ok(count)
    }
}

async fn create_sqlite(pool: &SqlitePool, user: &AdminUser) -> Result<AdminUser> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO admin_users (email, password_hash, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create admin user")?;

    Ok(AdminUser {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..user.clone()
    })
}

async fn create_mysql(pool: &MySqlPool, user: &AdminUser) -> Result<AdminUser> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO admin_users (email, password_hash, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create admin user")?;

    Ok(AdminUser {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..user.clone()
    })
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<AdminUser> {
    let role: String = row.try_get("role")?;
    Ok(AdminUser {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: role.parse::<UserRole>()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<AdminUser> {
    let role: String = row.try_get("role")?;
    Ok(AdminUser {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: role.parse::<UserRole>()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};

    async fn setup_test_repo() -> SqlxAdminUserRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        SqlxAdminUserRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let repo = setup_test_repo().await;
        assert_eq!(repo.count().await.unwrap(), 0);

        let user = AdminUser::new("Owner@Example.com".into(), "hash".into(), UserRole::Admin);
        let created = repo.create(&user).await.unwrap();
        assert!(created.id > 0);

        let found = repo.get_by_email("owner@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.role, UserRole::Admin);
        assert_eq!(repo.count().await.unwrap(), 1);

        let second = AdminUser::new("second@example.com".into(), "hash".into(), UserRole::Viewer);
        repo.create(&second).await.unwrap();
        assert_eq!(repo.first().await.unwrap().unwrap().id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = setup_test_repo().await;
        let user = AdminUser::new("a@b.co".into(), "hash".into(), UserRole::Admin);
        repo.create(&user).await.unwrap();
        let err = repo.create(&user).await.unwrap_err();
        assert!(crate::db::pool::is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_update_password() {
        let repo = setup_test_repo().await;
        let user = AdminUser::new("a@b.co".into(), "old".into(), UserRole::Admin);
        let created = repo.create(&user).await.unwrap();

        repo.update_password(created.id, "new").await.unwrap();
        let found = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.password_hash, "new");
    }
}
