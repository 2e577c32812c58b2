//! Project repository

use crate::db::{Backend, DynDatabasePool};
use crate::models::Project;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const PROJECT_COLUMNS: &str = "id, slug, title_en, title_ru, title_uz, description_en, description_ru, description_uz, tech_stack, thumbnail, link_url, github_url, published, sort_order, created_at, updated_at";

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, project: &Project) -> Result<Project>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Project>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Project>>;
    /// All projects by sort order, then newest first
    async fn list(&self) -> Result<Vec<Project>>;
    async fn list_published(&self) -> Result<Vec<Project>>;
    async fn update(&self, project: &Project) -> Result<Project>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;
}

pub struct SqlxProjectRepository {
    pool: DynDatabasePool,
}

impl SqlxProjectRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ProjectRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ProjectRepository for SqlxProjectRepository {
    async fn create(&self, project: &Project) -> Result<Project> {
        match self.pool.backend() {
            Backend::Sqlite(p) => create_sqlite(p, project).await,
            Backend::Mysql(p) => create_mysql(p, project).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Project>> {
        match self.pool.backend() {
            Backend::Sqlite(p) => get_by_id_sqlite(p, id).await,
            Backend::Mysql(p) => get_by_id_mysql(p, id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Project>> {
        match self.pool.backend() {
            Backend::Sqlite(p) => get_by_slug_sqlite(p, slug).await,
            Backend::Mysql(p) => get_by_slug_mysql(p, slug).await,
        }
    }

    async fn list(&self) -> Result<Vec<Project>> {
        match self.pool.backend() {
            Backend::Sqlite(p) => list_sqlite(p, false).await,
            Backend::Mysql(p) => list_mysql(p, false).await,
        }
    }

    async fn list_published(&self) -> Result<Vec<Project>> {
        match self.pool.backend() {
            Backend::Sqlite(p) => list_sqlite(p, true).await,
            Backend::Mysql(p) => list_mysql(p, true).await,
        }
    }

    async fn update(&self, project: &Project) -> Result<Project> {
        match self.pool.backend() {
            Backend::Sqlite(p) => update_sqlite(p, project).await,
            Backend::Mysql(p) => update_mysql(p, project).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM projects WHERE id = ?";
        let affected = match self.pool.backend() {
            Backend::Sqlite(p) => sqlx::query(sql)
                .bind(id)
                .execute(p)
                .await
                .map(|r| r.rows_affected()),
            Backend::Mysql(p) => sqlx::query(sql)
                .bind(id)
                .execute(p)
                .await
                .map(|r| r.rows_affected()),
        }
        .context("Failed to delete project")?;
        Ok(affected > 0)
    }

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let sql = "SELECT COUNT(*) as count FROM projects WHERE slug = ? AND id != ?";
        let exclude = exclude_id.unwrap_or(0);
        let count: i64 = match self.pool.backend() {
            Backend::Sqlite(p) => sqlx::query(sql)
                .bind(slug)
                .bind(exclude)
                .fetch_one(p)
                .await?
                .get("count"),
            Backend::Mysql(p) => sqlx::query(sql)
                .bind(slug)
                .bind(exclude)
                .fetch_one(p)
                .await?
                .get("count"),
        };
        Ok(count > 0)
    }
}

fn list_query(published_only: bool) -> String {
    let filter = if published_only { "WHERE published = TRUE " } else { "" };
    format!(
        "SELECT {} FROM projects {}ORDER BY sort_order ASC, created_at DESC, id DESC",
        PROJECT_COLUMNS, filter
    )
}

fn encode_tech_stack(tech_stack: &[String]) -> Result<String> {
    serde_json::to_string(tech_stack).context("Failed to encode tech stack")
}

fn decode_tech_stack(raw: &str) -> Result<Vec<String>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).context("Failed to decode tech stack")
}

// SQLite implementations
async fn create_sqlite(pool: &SqlitePool, project: &Project) -> Result<Project> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO projects (slug, title_en, title_ru, title_uz, description_en, description_ru, description_uz, tech_stack, thumbnail, link_url, github_url, published, sort_order, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&project.slug)
    .bind(&project.title_en)
    .bind(&project.title_ru)
    .bind(&project.title_uz)
    .bind(&project.description_en)
    .bind(&project.description_ru)
    .bind(&project.description_uz)
    .bind(encode_tech_stack(&project.tech_stack)?)
    .bind(&project.thumbnail)
    .bind(&project.link_url)
    .bind(&project.github_url)
    .bind(project.published)
    .bind(project.sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create project")?;

    Ok(Project {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..project.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Project>> {
    let row = sqlx::query(&format!("SELECT {} FROM projects WHERE id = ?", PROJECT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get project")?;
    row.map(|r| row_to_project_sqlite(&r)).transpose()
}

async fn get_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Project>> {
    let row = sqlx::query(&format!("SELECT {} FROM projects WHERE slug = ?", PROJECT_COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get project by slug")?;
    row.map(|r| row_to_project_sqlite(&r)).transpose()
}

async fn list_sqlite(pool: &SqlitePool, published_only: bool) -> Result<Vec<Project>> {
    let rows = sqlx::query(&list_query(published_only))
        .fetch_all(pool)
        .await
        .context("Failed to list projects")?;
    rows.iter().map(row_to_project_sqlite).collect()
}

async fn update_sqlite(pool: &SqlitePool, project: &Project) -> Result<Project> {
    sqlx::query(
        "UPDATE projects SET slug = ?, title_en = ?, title_ru = ?, title_uz = ?, description_en = ?, description_ru = ?, description_uz = ?, tech_stack = ?, thumbnail = ?, link_url = ?, github_url = ?, published = ?, sort_order = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&project.slug)
    .bind(&project.title_en)
    .bind(&project.title_ru)
    .bind(&project.title_uz)
    .bind(&project.description_en)
    .bind(&project.description_ru)
    .bind(&project.description_uz)
    .bind(encode_tech_stack(&project.tech_stack)?)
    .bind(&project.thumbnail)
    .bind(&project.link_url)
    .bind(&project.github_url)
    .bind(project.published)
    .bind(project.sort_order)
    .bind(Utc::now())
    .bind(project.id)
    .execute(pool)
    .await
    .context("Failed to update project")?;
    get_by_id_sqlite(pool, project.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Project not found after update"))
}

fn row_to_project_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Project> {
    let tech_stack: String = row.try_get("tech_stack")?;
    Ok(Project {
        id: row.try_get("id")?,
        slug: row.try_get("slug")?,
        title_en: row.try_get("title_en")?,
        title_ru: row.try_get("title_ru")?,
        title_uz: row.try_get("title_uz")?,
        description_en: row.try_get("description_en")?,
        description_ru: row.try_get("description_ru")?,
        description_uz: row.try_get("description_uz")?,
        tech_stack: decode_tech_stack(&tech_stack)?,
        thumbnail: row.try_get("thumbnail")?,
        link_url: row.try_get("link_url")?,
        github_url: row.try_get("github_url")?,
        published: row.try_get("published")?,
        sort_order: row.try_get("sort_order")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// MySQL implementations
async fn create_mysql(pool: &MySqlPool, project: &Project) -> Result<Project> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO projects (slug, title_en, title_ru, title_uz, description_en, description_ru, description_uz, tech_stack, thumbnail, link_url, github_url, published, sort_order, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&project.slug)
    .bind(&project.title_en)
    .bind(&project.title_ru)
    .bind(&project.title_uz)
    .bind(&project.description_en)
    .bind(&project.description_ru)
    .bind(&project.description_uz)
    .bind(encode_tech_stack(&project.tech_stack)?)
    .bind(&project.thumbnail)
    .bind(&project.link_url)
    .bind(&project.github_url)
    .bind(project.published)
    .bind(project.sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create project")?;

    Ok(Project {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..project.clone()
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Project>> {
    let row = sqlx::query(&format!("SELECT {} FROM projects WHERE id = ?", PROJECT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get project")?;
    row.map(|r| row_to_project_mysql(&r)).transpose()
}

async fn get_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Project>> {
    let row = sqlx::query(&format!("SELECT {} FROM projects WHERE slug = ?", PROJECT_COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get project by slug")?;
    row.map(|r| row_to_project_mysql(&r)).transpose()
}

async fn list_mysql(pool: &MySqlPool, published_only: bool) -> Result<Vec<Project>> {
    let rows = sqlx::query(&list_query(published_only))
        .fetch_all(pool)
        .await
        .context("Failed to list projects")?;
    rows.iter().map(row_to_project_mysql).collect()
}

async fn update_mysql(pool: &MySqlPool, project: &Project) -> Result<Project> {
    sqlx::query(
        "UPDATE projects SET slug = ?, title_en = ?, title_ru = ?, title_uz = ?, description_en = ?, description_ru = ?, description_uz = ?, tech_stack = ?, thumbnail = ?, link_url = ?, github_url = ?, published = ?, sort_order = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&project.slug)
    .bind(&project.title_en)
    .bind(&project.title_ru)
    .bind(&project.title_uz)
    .bind(&project.description_en)
    .bind(&project.description_ru)
    .bind(&project.description_uz)
    .bind(encode_tech_stack(&project.tech_stack)?)
    .bind(&project.thumbnail)
    .bind(&project.link_url)
    .bind(&project.github_url)
    .bind(project.published)
    .bind(project.sort_order)
    .bind(Utc::now())
    .bind(project.id)
    .execute(pool)
    .await
    .context("Failed to update project")?;
    get_by_id_mysql(pool, project.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Project not found after update"))
}

fn row_to_project_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Project> {
    let tech_stack: String = row.try_get("tech_stack")?;
    Ok(Project {
        id: row.try_get("id")?,
        slug: row.try_get("slug")?,
        title_en: row.try_get("title_en")?,
        title_ru: row.try_get("title_ru")?,
        title_uz: row.try_get("title_uz")?,
        description_en: row.try_get("description_en")?,
        description_ru: row.try_get("description_ru")?,
        description_uz: row.try_get("description_uz")?,
        tech_stack: decode_tech_stack(&tech_stack)?,
        thumbnail: row.try_get("thumbnail")?,
        link_url: row.try_get("link_url")?,
        github_url: row.try_get("github_url")?,
        published: row.try_get("published")?,
        sort_order: row.try_get("sort_order")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
