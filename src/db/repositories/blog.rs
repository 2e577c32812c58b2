//! Blog post repository

use crate::db::{Backend, DynDatabasePool};
use crate::models::BlogPost;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const BLOG_COLUMNS: &str = "id, slug, title_en, title_ru, title_uz, description_en, description_ru, description_uz, content_en, content_ru, content_uz, thumbnail, published, created_at, updated_at";

#[async_trait]
pub trait BlogRepository: Send + Sync {
    async fn create(&self, post: &BlogPost) -> Result<BlogPost>;
    async fn get_by_id(&self, id: i64) -> Result<Option<BlogPost>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>>;
    /// All posts, newest first
    async fn list(&self) -> Result<Vec<BlogPost>>;
    /// Published posts, newest first
    async fn list_published(&self) -> Result<Vec<BlogPost>>;
    async fn update(&self, post: &BlogPost) -> Result<BlogPost>;
    /// Returns false when no row matched
    async fn delete(&self, id: i64) -> Result<bool>;
    /// Whether another post (not `exclude_id`) already uses `slug`
    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;
}

pub struct SqlxBlogRepository {
    pool: DynDatabasePool,
}

impl SqlxBlogRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BlogRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BlogRepository for SqlxBlogRepository {
    async fn create(&self, post: &BlogPost) -> Result<BlogPost> {
        match self.pool.backend() {
            Backend::Sqlite(p) => create_sqlite(p, post).await,
            Backend::Mysql(p) => create_mysql(p, post).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogPost>> {
        match self.pool.backend() {
            Backend::Sqlite(p) => get_by_id_sqlite(p, id).await,
            Backend::Mysql(p) => get_by_id_mysql(p, id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        match self.pool.backend() {
            Backend::Sqlite(p) => get_by_slug_sqlite(p, slug).await,
            Backend::Mysql(p) => get_by_slug_mysql(p, slug).await,
        }
    }

    async fn list(&self) -> Result<Vec<BlogPost>> {
        match self.pool.backend() {
            Backend::Sqlite(p) => list_sqlite(p, false).await,
            Backend::Mysql(p) => list_mysql(p, false).await,
        }
    }

    async fn list_published(&self) -> Result<Vec<BlogPost>> {
        match self.pool.backend() {
            Backend::Sqlite(p) => list_sqlite(p, true).await,
            Backend::Mysql(p) => list_mysql(p, true).await,
        }
    }

    async fn update(&self, post: &BlogPost) -> Result<BlogPost> {
        match self.pool.backend() {
            Backend::Sqlite(p) => update_sqlite(p, post).await,
            Backend::Mysql(p) => update_mysql(p, post).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.backend() {
            Backend::Sqlite(p) => delete_sqlite(p, id).await,
            Backend::Mysql(p) => delete_mysql(p, id).await,
        }
    }

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        match self.pool.backend() {
            Backend::Sqlite(p) => exists_by_slug_sqlite(p, slug, exclude_id).await,
            Backend::Mysql(p) => exists_by_slug_mysql(p, slug, exclude_id).await,
        }
    }
}

fn list_query(published_only: bool) -> String {
    let filter = if published_only { "WHERE published = TRUE " } else { "" };
    format!(
        "SELECT {} FROM blog_posts {}ORDER BY created_at DESC, id DESC",
        BLOG_COLUMNS, filter
    )
}

// SQLite implementations
async fn create_sqlite(pool: &SqlitePool, post: &BlogPost) -> Result<BlogPost> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO blog_posts (slug, title_en, title_ru, title_uz, description_en, description_ru, description_uz, content_en, content_ru, content_uz, thumbnail, published, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&post.slug)
    .bind(&post.title_en)
    .bind(&post.title_ru)
    .bind(&post.title_uz)
    .bind(&post.description_en)
    .bind(&post.description_ru)
    .bind(&post.description_uz)
    .bind(&post.content_en)
    .bind(&post.content_ru)
    .bind(&post.content_uz)
    .bind(&post.thumbnail)
    .bind(post.published)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create blog post")?;

    Ok(BlogPost {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..post.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<BlogPost>> {
    let row = sqlx::query(&format!("SELECT {} FROM blog_posts WHERE id = ?", BLOG_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get blog post")?;
    row.map(|r| row_to_blog_sqlite(&r)).transpose()
}

async fn get_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<BlogPost>> {
    let row = sqlx::query(&format!("SELECT {} FROM blog_posts WHERE slug = ?", BLOG_COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get blog post by slug")?;
    row.map(|r| row_to_blog_sqlite(&r)).transpose()
}

async fn list_sqlite(pool: &SqlitePool, published_only: bool) -> Result<Vec<BlogPost>> {
    let rows = sqlx::query(&list_query(published_only))
        .fetch_all(pool)
        .await
        .context("Failed to list blog posts")?;
    rows.iter().map(row_to_blog_sqlite).collect()
}

async fn update_sqlite(pool: &SqlitePool, post: &BlogPost) -> Result<BlogPost> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE blog_posts SET slug = ?, title_en = ?, title_ru = ?, title_uz = ?, description_en = ?, description_ru = ?, description_uz = ?, content_en = ?, content_ru = ?, content_uz = ?, thumbnail = ?, published = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&post.slug)
    .bind(&post.title_en)
    .bind(&post.title_ru)
    .bind(&post.title_uz)
    .bind(&post.description_en)
    .bind(&post.description_ru)
    .bind(&post.description_uz)
    .bind(&post.content_en)
    .bind(&post.content_ru)
    .bind(&post.content_uz)
    .bind(&post.thumbnail)
    .bind(post.published)
    .bind(now)
    .bind(post.id)
    .execute(pool)
    .await
    .context("Failed to update blog post")?;
    get_by_id_sqlite(pool, post.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Blog post not found after update"))
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM blog_posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete blog post")?;
    Ok(result.rows_affected() > 0)
}

async fn exists_by_slug_sqlite(pool: &SqlitePool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM blog_posts WHERE slug = ? AND id != ?")
        .bind(slug)
        .bind(exclude_id.unwrap_or(0))
        .fetch_one(pool)
        .await
        .context("Failed to check blog slug")?;
    Ok(row.get::<i64, _>("count") > 0)
}

fn row_to_blog_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<BlogPost> {
    Ok(BlogPost {
        id: row.try_get("id")?,
        slug: row.try_get("slug")?,
        title_en: row.try_get("title_en")?,
        title_ru: row.try_get("title_ru")?,
        title_uz: row.try_get("title_uz")?,
        description_en: row.try_get("description_en")?,
        description_ru: row.try_get("description_ru")?,
        description_uz: row.try_get("description_uz")?,
        content_en: row.try_get("content_en")?,
        content_ru: row.try_get("content_ru")?,
        content_uz: row.try_get("content_uz")?,
        thumbnail: row.try_get("thumbnail")?,
        published: row.try_get("published")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// MySQL implementations
async fn create_mysql(pool: &MySqlPool, post: &BlogPost) -> Result<BlogPost> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO blog_posts (slug, title_en, title_ru, title_uz, description_en, description_ru, description_uz, content_en, content_ru, content_uz, thumbnail, published, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&post.slug)
    .bind(&post.title_en)
    .bind(&post.title_ru)
    .bind(&post.title_uz)
    .bind(&post.description_en)
    .bind(&post.description_ru)
    .bind(&post.description_uz)
    .bind(&post.content_en)
    .bind(&post.content_ru)
    .bind(&post.content_uz)
    .bind(&post.thumbnail)
    .bind(post.published)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create blog post")?;

    Ok(BlogPost {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..post.clone()
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<BlogPost>> {
    let row = sqlx::query(&format!("SELECT {} FROM blog_posts WHERE id = ?", BLOG_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get blog post")?;
    row.map(|r| row_to_blog_mysql(&r)).transpose()
}

async fn get_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<BlogPost>> {
    let row = sqlx::query(&format!("SELECT {} FROM blog_posts WHERE slug = ?", BLOG_COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get blog post by slug")?;
    row.map(|r| row_to_blog_mysql(&r)).transpose()
}

async fn list_mysql(pool: &MySqlPool, published_only: bool) -> Result<Vec<BlogPost>> {
    let rows = sqlx::query(&list_query(published_only))
        .fetch_all(pool)
        .await
        .context("Failed to list blog posts")?;
    rows.iter().map(row_to_blog_mysql).collect()
}

async fn update_mysql(pool: &MySqlPool, post: &BlogPost) -> Result<BlogPost> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE blog_posts SET slug = ?, title_en = ?, title_ru = ?, title_uz = ?, description_en = ?, description_ru = ?, description_uz = ?, content_en = ?, content_ru = ?, content_uz = ?, thumbnail = ?, published = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&post.slug)
    .bind(&post.title_en)
    .bind(&post.title_ru)
    .bind(&post.title_uz)
    .bind(&post.description_en)
    .bind(&post.description_ru)
    .bind(&post.description_uz)
    .bind(&post.content_en)
    .bind(&post.content_ru)
    .bind(&post.content_uz)
    .bind(&post.thumbnail)
    .bind(post.published)
    .bind(now)
    .bind(post.id)
    .execute(pool)
    .await
    .context("Failed to update blog post")?;
    get_by_id_mysql(pool, post.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Blog post not found after update"))
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM blog_posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete blog post")?;
    Ok(result.rows_affected() > 0)
}

async fn exists_by_slug_mysql(pool: &MySqlPool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM blog_posts WHERE slug = ? AND id != ?")
        .bind(slug)
        .bind(exclude_id.unwrap_or(0))
        .fetch_one(pool)
        .await
        .context("Failed to check blog slug")?;
    Ok(row.get::<i64, _>("count") > 0)
}

fn row_to_blog_mysql(row: &sqlx::mysql::MySqlRow) -> Result<BlogPost> {
    Ok(BlogPost {
        id: row.try_get("id")?,
        slug: row.try_get("slug")?,
        title_en: row.try_get("title_en")?,
        title_ru: row.try_get("title_ru")?,
        title_uz: row.try_get("title_uz")?,
        description_en: row.try_get("description_en")?,
        description_ru: row.try_get("description_ru")?,
        description_uz: row.try_get("description_uz")?,
        content_en: row.try_get("content_en")?,
        content_ru: row.try_get("content_ru")?,
        content_uz: row.try_get("content_uz")?,
        thumbnail: row.try_get("thumbnail")?,
        published: row.try_get("published")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};
    use crate::models::CreateBlogPostInput;

    async fn setup_test_repo() -> SqlxBlogRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        SqlxBlogRepository::new(pool)
    }

    fn sample(slug: &str, published: bool) -> BlogPost {
        BlogPost::new(CreateBlogPostInput {
            slug: slug.to_string(),
            title_en: "Title".into(),
            title_ru: "Заголовок".into(),
            title_uz: "Sarlavha".into(),
            description_en: "Desc".into(),
            description_ru: "Описание".into(),
            description_uz: "Tavsif".into(),
            content_en: "Body".into(),
            content_ru: "Текст".into(),
            content_uz: "Matn".into(),
            thumbnail: None,
            published,
        })
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup_test_repo().await;
        let created = repo.create(&sample("first", true)).await.unwrap();
        assert!(created.id > 0);

        let by_id = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.slug, "first");
        assert_eq!(by_id.title_ru, "Заголовок");
        assert!(by_id.published);

        let by_slug = repo.get_by_slug("first").await.unwrap().unwrap();
        assert_eq!(by_slug.id, created.id);
        assert!(repo.get_by_slug("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_published_filters_drafts() {
        let repo = setup_test_repo().await;
        repo.create(&sample("draft", false)).await.unwrap();
        repo.create(&sample("live", true)).await.unwrap();

        assert_eq!(repo.list().await.unwrap().len(), 2);
        let published = repo.list_published().await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].slug, "live");
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let repo = setup_test_repo().await;
        repo.create(&sample("older", true)).await.unwrap();
        repo.create(&sample("newer", true)).await.unwrap();

        let posts = repo.list().await.unwrap();
        assert_eq!(posts[0].slug, "newer");
        assert_eq!(posts[1].slug, "older");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = setup_test_repo().await;
        let mut post = repo.create(&sample("edit-me", false)).await.unwrap();
        post.title_en = "Edited".into();
        post.thumbnail = Some("/uploads/images/a.png".into());

        let updated = repo.update(&post).await.unwrap();
        assert_eq!(updated.title_en, "Edited");
        assert_eq!(updated.thumbnail.as_deref(), Some("/uploads/images/a.png"));

        assert!(repo.delete(post.id).await.unwrap());
        assert!(!repo.delete(post.id).await.unwrap());
        assert!(repo.get_by_id(post.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_exists_by_slug_excludes_self() {
        let repo = setup_test_repo().await;
        let post = repo.create(&sample("taken", true)).await.unwrap();

        assert!(repo.exists_by_slug("taken", None).await.unwrap());
        assert!(!repo.exists_by_slug("taken", Some(post.id)).await.unwrap());
        assert!(!repo.exists_by_slug("free", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected_by_storage() {
        let repo = setup_test_repo().await;
        repo.create(&sample("dup", true)).await.unwrap();
        let err = repo.create(&sample("dup", true)).await.unwrap_err();
        assert!(crate::db::pool::is_unique_violation(&err));
    }
}
