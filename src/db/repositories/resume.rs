//! Resume section repository

use crate::db::{Backend, DynDatabasePool};
use crate::models::ResumeSection;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const RESUME_COLUMNS: &str = "id, section_key, title_en, title_ru, title_uz, content_en, content_ru, content_uz, sort_order, created_at, updated_at";

#[async_trait]
pub trait ResumeRepository: Send + Sync {
    async fn create(&self, section: &ResumeSection) -> Result<ResumeSection>;
    async fn get_by_id(&self, id: i64) -> Result<Option<ResumeSection>>;
    async fn get_by_key(&self, section_key: &str) -> Result<Option<ResumeSection>>;
    /// All sections by sort order
    async fn list(&self) -> Result<Vec<ResumeSection>>;
    async fn update(&self, section: &ResumeSection) -> Result<ResumeSection>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn exists_by_key(&self, section_key: &str, exclude_id: Option<i64>) -> Result<bool>;
}

pub struct SqlxResumeRepository {
    pool: DynDatabasePool,
}

impl SqlxResumeRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ResumeRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ResumeRepository for SqlxResumeRepository {
    async fn create(&self, section: &ResumeSection) -> Result<ResumeSection> {
        match self.pool.backend() {
            Backend::Sqlite(p) => create_sqlite(p, section).await,
            Backend::Mysql(p) => create_mysql(p, section).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ResumeSection>> {
        let sql = format!("SELECT {} FROM resume_sections WHERE id = ?", RESUME_COLUMNS);
        match self.pool.backend() {
            Backend::Sqlite(p) => {
                let row = sqlx::query(&sql).bind(id).fetch_optional(p).await
                    .context("Failed to get resume section")?;
                row.map(|r| row_to_section_sqlite(&r)).transpose()
            }
            Backend::Mysql(p) => {
                let row = sqlx::query(&sql).bind(id).fetch_optional(p).await
                    .context("Failed to get resume section")?;
                row.map(|r| row_to_section_mysql(&r)).transpose()
            }
        }
    }

    async fn get_by_key(&self, section_key: &str) -> Result<Option<ResumeSection>> {
        let sql = format!("SELECT {} FROM resume_sections WHERE section_key = ?", RESUME_COLUMNS);
        match self.pool.backend() {
            Backend::Sqlite(p) => {
                let row = sqlx::query(&sql).bind(section_key).fetch_optional(p).await
                    .context("Failed to get resume section by key")?;
                row.map(|r| row_to_section_sqlite(&r)).transpose()
            }
            Backend::Mysql(p) => {
                let row = sqlx::query(&sql).bind(section_key).fetch_optional(p).await
                    .context("Failed to get resume section by key")?;
                row.map(|r| row_to_section_mysql(&r)).transpose()
            }
        }
    }

    async fn list(&self) -> Result<Vec<ResumeSection>> {
        let sql = format!(
            "SELECT {} FROM resume_sections ORDER BY sort_order ASC, id ASC",
            RESUME_COLUMNS
        );
        match self.pool.backend() {
            Backend::Sqlite(p) => {
                let rows = sqlx::query(&sql).fetch_all(p).await
                    .context("Failed to list resume sections")?;
                rows.iter().map(row_to_section_sqlite).collect()
            }
            Backend::Mysql(p) => {
                let rows = sqlx::query(&sql).fetch_all(p).await
                    .context("Failed to list resume sections")?;
                rows.iter().map(row_to_section_mysql).collect()
            }
        }
    }

    async fn update(&self, section: &ResumeSection) -> Result<ResumeSection> {
        let sql = "UPDATE resume_sections SET section_key = ?, title_en = ?, title_ru = ?, title_uz = ?, content_en = ?, content_ru = ?, content_uz = ?, sort_order = ?, updated_at = ? WHERE id = ?";
        let now = Utc::now();
        match self.pool.backend() {
            Backend::Sqlite(p) => {
                sqlx::query(sql)
                    .bind(&section.section_key)
                    .bind(&section.title_en)
                    .bind(&section.title_ru)
                    .bind(&section.title_uz)
                    .bind(&section.content_en)
                    .bind(&section.content_ru)
                    .bind(&section.content_uz)
                    .bind(section.sort_order)
                    .bind(now)
                    .bind(section.id)
                    .execute(p)
                    .await
                    .context("Failed to update resume section")?;
            }
            Backend::Mysql(p) => {
                sqlx::query(sql)
                    .bind(&section.section_key)
                    .bind(&section.title_en)
                    .bind(&section.title_ru)
                    .bind(&section.title_uz)
                    .bind(&section.content_en)
                    .bind(&section.content_ru)
                    .bind(&section.content_uz)
                    .bind(section.sort_order)
                    .bind(now)
                    .bind(section.id)
                    .execute(p)
                    .await
                    .context("Failed to update resume section")?;
            }
        }
        self.get_by_id(section.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Resume section not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM resume_sections WHERE id = ?";
        let affected = match self.pool.backend() {
            Backend::Sqlite(p) => sqlx::query(sql).bind(id).execute(p).await.map(|r| r.rows_affected()),
            Backend::Mysql(p) => sqlx::query(sql).bind(id).execute(p).await.map(|r| r.rows_affected()),
        }
        .context("Failed to delete resume section")?;
        Ok(affected > 0)
    }

    async fn exists_by_key(&self, section_key: &str, exclude_id: Option<i64>) -> Result<bool> {
        let sql = "SELECT COUNT(*) as count FROM resume_sections WHERE section_key = ? AND id != ?";
        let exclude = exclude_id.unwrap_or(0);
        let count: i64 = match self.pool.backend() {
            Backend::Sqlite(p) => sqlx::query(sql).bind(section_key).bind(exclude).fetch_one(p).await?.get("count"),
            Backend::Mysql(p) => sqlx::query(sql).bind(section_key).bind(exclude).fetch_one(p).await?.get("count"),
        };
        Ok(count > 0)
    }
}

async fn create_sqlite(pool: &SqlitePool, section: &ResumeSection) -> Result<ResumeSection> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO resume_sections (section_key, title_en, title_ru, title_uz, content_en, content_ru, content_uz, sort_order, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&section.section_key)
    .bind(&section.title_en)
    .bind(&section.title_ru)
    .bind(&section.title_uz)
    .bind(&section.content_en)
    .bind(&section.content_ru)
    .bind(&section.content_uz)
    .bind(section.sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create resume section")?;

    Ok(ResumeSection {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..section.clone()
    })
}

async fn create_mysql(pool: &MySqlPool, section: &ResumeSection) -> Result<ResumeSection> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO resume_sections (section_key, title_en, title_ru, title_uz, content_en, content_ru, content_uz, sort_order, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&section.section_key)
    .bind(&section.title_en)
    .bind(&section.title_ru)
    .bind(&section.title_uz)
    .bind(&section.content_en)
    .bind(&section.content_ru)
    .bind(&section.content_uz)
    .bind(section.sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create resume section")?;

    Ok(ResumeSection {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..section.clone()
    })
}

fn row_to_section_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<ResumeSection> {
    Ok(ResumeSection {
        id: row.try_get("id")?,
        section_key: row.try_get("section_key")?,
        title_en: row.try_get("title_en")?,
        title_ru: row.try_get("title_ru")?,
        title_uz: row.try_get("title_uz")?,
        content_en: row.try_get("content_en")?,
        content_ru: row.try_get("content_ru")?,
        content_uz: row.try_get("content_uz")?,
        sort_order: row.try_get("sort_order")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_section_mysql(row: &sqlx::mysql::MySqlRow) -> Result<ResumeSection> {
    Ok(ResumeSection {
        id: row.try_get("id")?,
        section_key: row.try_get("section_key")?,
        title_en: row.try_get("title_en")?,
        title_ru: row.try_get("title_ru")?,
        title_uz: row.try_get("title_uz")?,
        content_en: row.try_get("content_en")?,
        content_ru: row.try_get("content_ru")?,
        content_uz: row.try_get("content_uz")?,
        sort_order: row.try_get("sort_order")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
