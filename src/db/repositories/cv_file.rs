//! CV metadata repository

use crate::db::{Backend, DynDatabasePool};
use crate::models::CvFile;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

#[async_trait]
pub trait CvFileRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CvFile>>;
    /// Insert or replace the record stored under `file.key`
    async fn upsert(&self, file: &CvFile) -> Result<CvFile>;
}

pub struct SqlxCvFileRepository {
    pool: DynDatabasePool,
}

impl SqlxCvFileRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CvFileRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CvFileRepository for SqlxCvFileRepository {
    async fn get(&self, key: &str) -> Result<Option<CvFile>> {
        let sql = "SELECT file_key, storage_key, file_name, mime_type, url, updated_at FROM cv_files WHERE file_key = ?";
        match self.pool.backend() {
            Backend::Sqlite(p) => {
                let row = sqlx::query(sql)
                    .bind(key)
                    .fetch_optional(p)
                    .await
                    .context("Failed to get CV file")?;
                row.map(|r| row_to_cv_sqlite(&r)).transpose()
            }
            Backend::Mysql(p) => {
                let row = sqlx::query(sql)
                    .bind(key)
                    .fetch_optional(p)
                    .await
                    .context("Failed to get CV file")?;
                row.map(|r| row_to_cv_mysql(&r)).transpose()
            }
        }
    }

    async fn upsert(&self, file: &CvFile) -> Result<CvFile> {
        match self.pool.backend() {
            Backend::Sqlite(p) => {
                sqlx::query(
                    r#"
                    INSERT INTO cv_files (file_key, storage_key, file_name, mime_type, url, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?)
                    ON CONFLICT(file_key) DO UPDATE SET
                        storage_key = excluded.storage_key,
                        file_name = excluded.file_name,
                        mime_type = excluded.mime_type,
                        url = excluded.url,
                        updated_at = excluded.updated_at
                    "#,
                )
                .bind(&file.key)
                .bind(&file.storage_key)
                .bind(&file.file_name)
                .bind(&file.mime_type)
                .bind(&file.url)
                .bind(file.updated_at)
                .execute(p)
                .await
                .context("Failed to save CV file")?;
            }
            Backend::Mysql(p) => {
                sqlx::query(
                    r#"
                    INSERT INTO cv_files (file_key, storage_key, file_name, mime_type, url, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?)
                    ON DUPLICATE KEY UPDATE
                        storage_key = VALUES(storage_key),
                        file_name = VALUES(file_name),
                        mime_type = VALUES(mime_type),
                        url = VALUES(url),
                        updated_at = VALUES(updated_at)
                    "#,
                )
                .bind(&file.key)
                .bind(&file.storage_key)
                .bind(&file.file_name)
                .bind(&file.mime_type)
                .bind(&file.url)
                .bind(file.updated_at)
                .execute(p)
                .await
                .context("Failed to save CV file")?;
            }
        }
        Ok(file.clone())
    }
}

fn row_to_cv_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<CvFile> {
    Ok(CvFile {
        key: row.try_get("file_key")?,
        storage_key: row.try_get("storage_key")?,
        file_name: row.try_get("file_name")?,
        mime_type: row.try_get("mime_type")?,
        url: row.try_get("url")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_cv_mysql(row: &sqlx::mysql::MySqlRow) -> Result<CvFile> {
    Ok(CvFile {
        key: row.try_get("file_key")?,
        storage_key: row.try_get("storage_key")?,
        file_name: row.try_get("file_name")?,
        mime_type: row.try_get("mime_type")?,
        url: row.try_get("url")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};
    use crate::models::DEFAULT_CV_KEY;
    use chrono::Utc;

    async fn setup_test_repo() -> SqlxCvFileRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        SqlxCvFileRepository::new(pool)
    }

    fn sample(storage_key: &str, file_name: &str) -> CvFile {
        CvFile {
            key: DEFAULT_CV_KEY.to_string(),
            storage_key: storage_key.to_string(),
            file_name: file_name.to_string(),
            mime_type: "application/pdf".to_string(),
            url: format!("http://localhost:4000/uploads/{}", storage_key),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_get_missing() {
        let repo = setup_test_repo().await;
        assert!(repo.get(DEFAULT_CV_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing() {
        let repo = setup_test_repo().await;
        repo.upsert(&sample("cv/a.pdf", "first.pdf")).await.unwrap();
        repo.upsert(&sample("cv/b.pdf", "second.pdf")).await.unwrap();

        let stored = repo.get(DEFAULT_CV_KEY).await.unwrap().unwrap();
        assert_eq!(stored.storage_key, "cv/b.pdf");
        assert_eq!(stored.file_name, "second.pdf");
    }
}
