//! Skill category and skill repositories

use crate::db::{Backend, DynDatabasePool};
use crate::models::{Skill, SkillCategory};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

const CATEGORY_COLUMNS: &str = "id, title_en, title_ru, title_uz, sort_order, created_at, updated_at";
const SKILL_COLUMNS: &str = "id, skill_category_id, label, sort_order, created_at, updated_at";

#[async_trait]
pub trait SkillCategoryRepository: Send + Sync {
    async fn create(&self, category: &SkillCategory) -> Result<SkillCategory>;
    async fn get_by_id(&self, id: i64) -> Result<Option<SkillCategory>>;
    /// All categories by sort order
    async fn list(&self) -> Result<Vec<SkillCategory>>;
    async fn update(&self, category: &SkillCategory) -> Result<SkillCategory>;
    /// Deletes the category and, by cascade, its skills
    async fn delete(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait SkillRepository: Send + Sync {
    async fn create(&self, skill: &Skill) -> Result<Skill>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Skill>>;
    /// All skills, ordered by their category's sort order, then their own
    async fn list(&self) -> Result<Vec<Skill>>;
    async fn update(&self, skill: &Skill) -> Result<Skill>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxSkillCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxSkillCategoryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SkillCategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

pub struct SqlxSkillRepository {
    pool: DynDatabasePool,
}

impl SqlxSkillRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SkillRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SkillCategoryRepository for SqlxSkillCategoryRepository {
    async fn create(&self, category: &SkillCategory) -> Result<SkillCategory> {
        let sql = "INSERT INTO skill_categories (title_en, title_ru, title_uz, sort_order, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)";
        let now = Utc::now();
        let id = match self.pool.backend() {
            Backend::Sqlite(p) => sqlx::query(sql)
                .bind(&category.title_en)
                .bind(&category.title_ru)
                .bind(&category.title_uz)
                .bind(category.sort_order)
                .bind(now)
                .bind(now)
                .execute(p)
                .await
                .map(|r| r.last_insert_rowid()),
            Backend::Mysql(p) => sqlx::query(sql)
                .bind(&category.title_en)
                .bind(&category.title_ru)
                .bind(&category.title_uz)
                .bind(category.sort_order)
                .bind(now)
                .bind(now)
                .execute(p)
                .await
                .map(|r| r.last_insert_id() as i64),
        }
        .context("Failed to create skill category")?;

        Ok(SkillCategory {
            id,
            created_at: now,
            updated_at: now,
            ..category.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<SkillCategory>> {
        let sql = format!("SELECT {} FROM skill_categories WHERE id = ?", CATEGORY_COLUMNS);
        match self.pool.backend() {
            Backend::Sqlite(p) => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(p)
                    .await
                    .context("Failed to get skill category")?;
                row.map(|r| row_to_category_sqlite(&r)).transpose()
            }
            Backend::Mysql(p) => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(p)
                    .await
                    .context("Failed to get skill category")?;
                row.map(|r| row_to_category_mysql(&r)).transpose()
            }
        }
    }

    async fn list(&self) -> Result<Vec<SkillCategory>> {
        let sql = format!(
            "SELECT {} FROM skill_categories ORDER BY sort_order ASC, id ASC",
            CATEGORY_COLUMNS
        );
        match self.pool.backend() {
            Backend::Sqlite(p) => {
                let rows = sqlx::query(&sql)
                    .fetch_all(p)
                    .await
                    .context("Failed to list skill categories")?;
                rows.iter().map(row_to_category_sqlite).collect()
            }
            Backend::Mysql(p) => {
                let rows = sqlx::query(&sql)
                    .fetch_all(p)
                    .await
                    .context("Failed to list skill categories")?;
                rows.iter().map(row_to_category_mysql).collect()
            }
        }
    }

    async fn update(&self, category: &SkillCategory) -> Result<SkillCategory> {
        let sql = "UPDATE skill_categories SET title_en = ?, title_ru = ?, title_uz = ?, sort_order = ?, updated_at = ? WHERE id = ?";
        let now = Utc::now();
        match self.pool.backend() {
            Backend::Sqlite(p) => sqlx::query(sql)
                .bind(&category.title_en)
                .bind(&category.title_ru)
                .bind(&category.title_uz)
                .bind(category.sort_order)
                .bind(now)
                .bind(category.id)
                .execute(p)
                .await
                .map(|_| ()),
            Backend::Mysql(p) => sqlx::query(sql)
                .bind(&category.title_en)
                .bind(&category.title_ru)
                .bind(&category.title_uz)
                .bind(category.sort_order)
                .bind(now)
                .bind(category.id)
                .execute(p)
                .await
                .map(|_| ()),
        }
        .context("Failed to update skill category")?;

        self.get_by_id(category.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Skill category not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM skill_categories WHERE id = ?";
        let affected = match self.pool.backend() {
            Backend::Sqlite(p) => sqlx::query(sql).bind(id).execute(p).await.map(|r| r.rows_affected()),
            Backend::Mysql(p) => sqlx::query(sql).bind(id).execute(p).await.map(|r| r.rows_affected()),
        }
        .context("Failed to delete skill category")?;
        Ok(affected > 0)
    }
}

#[async_trait]
impl SkillRepository for SqlxSkillRepository {
    async fn create(&self, skill: &Skill) -> Result<Skill> {
        let sql = "INSERT INTO skills (skill_category_id, label, sort_order, created_at, updated_at) VALUES (?, ?, ?, ?, ?)";
        let now = Utc::now();
        let id = match self.pool.backend() {
            Backend::Sqlite(p) => sqlx::query(sql)
                .bind(skill.skill_category_id)
                .bind(&skill.label)
                .bind(skill.sort_order)
                .bind(now)
                .bind(now)
                .execute(p)
                .await
                .map(|r| r.last_insert_rowid()),
            Backend::Mysql(p) => sqlx::query(sql)
                .bind(skill.skill_category_id)
                .bind(&skill.label)
                .bind(skill.sort_order)
                .bind(now)
                .bind(now)
                .execute(p)
                .await
                .map(|r| r.last_insert_id() as i64),
        }
        .context("Failed to create skill")?;

        Ok(Skill {
            id,
            created_at: now,
            updated_at: now,
            ..skill.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Skill>> {
        let sql = format!("SELECT {} FROM skills WHERE id = ?", SKILL_COLUMNS);
        match self.pool.backend() {
            Backend::Sqlite(p) => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(p)
                    .await
                    .context("Failed to get skill")?;
                row.map(|r| row_to_skill_sqlite(&r)).transpose()
            }
            Backend::Mysql(p) => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(p)
                    .await
                    .context("Failed to get skill")?;
                row.map(|r| row_to_skill_mysql(&r)).transpose()
            }
        }
    }

    async fn list(&self) -> Result<Vec<Skill>> {
        let sql = "SELECT s.id, s.skill_category_id, s.label, s.sort_order, s.created_at, s.updated_at \
                   FROM skills s JOIN skill_categories c ON c.id = s.skill_category_id \
                   ORDER BY c.sort_order ASC, c.id ASC, s.sort_order ASC, s.id ASC";
        match self.pool.backend() {
            Backend::Sqlite(p) => {
                let rows = sqlx::query(sql)
                    .fetch_all(p)
                    .await
                    .context("Failed to list skills")?;
                rows.iter().map(row_to_skill_sqlite).collect()
            }
            Backend::Mysql(p) => {
                let rows = sqlx::query(sql)
                    .fetch_all(p)
                    .await
                    .context("Failed to list skills")?;
                rows.iter().map(row_to_skill_mysql).collect()
            }
        }
    }

    async fn update(&self, skill: &Skill) -> Result<Skill> {
        let sql = "UPDATE skills SET skill_category_id = ?, label = ?, sort_order = ?, updated_at = ? WHERE id = ?";
        let now = Utc::now();
        match self.pool.backend() {
            Backend::Sqlite(p) => sqlx::query(sql)
                .bind(skill.skill_category_id)
                .bind(&skill.label)
                .bind(skill.sort_order)
                .bind(now)
                .bind(skill.id)
                .execute(p)
                .await
                .map(|_| ()),
            Backend::Mysql(p) => sqlx::query(sql)
                .bind(skill.skill_category_id)
                .bind(&skill.label)
                .bind(skill.sort_order)
                .bind(now)
                .bind(skill.id)
                .execute(p)
                .await
                .map(|_| ()),
        }
        .context("Failed to update skill")?;

        self.get_by_id(skill.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Skill not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM skills WHERE id = ?";
        let affected = match self.pool.backend() {
            Backend::Sqlite(p) => sqlx::query(sql).bind(id).execute(p).await.map(|r| r.rows_affected()),
            Backend::Mysql(p) => sqlx::query(sql).bind(id).execute(p).await.map(|r| r.rows_affected()),
        }
        .context("Failed to delete skill")?;
        Ok(affected > 0)
    }
}

fn row_to_category_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<SkillCategory> {
    Ok(SkillCategory {
        id: row.try_get("id")?,
        title_en: row.try_get("title_en")?,
        title_ru: row.try_get("title_ru")?,
        title_uz: row.try_get("title_uz")?,
        sort_order: row.try_get("sort_order")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_category_mysql(row: &sqlx::mysql::MySqlRow) -> Result<SkillCategory> {
    Ok(SkillCategory {
        id: row.try_get("id")?,
        title_en: row.try_get("title_en")?,
        title_ru: row.try_get("title_ru")?,
        title_uz: row.try_get("title_uz")?,
        sort_order: row.try_get("sort_order")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_skill_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Skill> {
    Ok(Skill {
        id: row.try_get("id")?,
        skill_category_id: row.try_get("skill_category_id")?,
        label: row.try_get("label")?,
        sort_order: row.try_get("sort_order")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_skill_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Skill> {
    Ok(Skill {
        id: row.try_get("id")?,
        skill_category_id: row.try_get("skill_category_id")?,
        label: row.try_get("label")?,
        sort_order: row.try_get("sort_order")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};
    use crate::models::CreateSkillCategoryInput;

    async fn setup_test_repos() -> (SqlxSkillCategoryRepository, SqlxSkillRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        (
            SqlxSkillCategoryRepository::new(pool.clone()),
            SqlxSkillRepository::new(pool),
        )
    }

    fn category(title: &str, sort_order: i32) -> SkillCategory {
        SkillCategory::new(CreateSkillCategoryInput {
            title_en: title.to_string(),
            title_ru: title.to_string(),
            title_uz: title.to_string(),
            sort_order,
        })
    }

    #[tokio::test]
    async fn test_skills_listed_by_category_then_skill_order() {
        let (categories, skills) = setup_test_repos().await;
        let backend = categories.create(&category("Backend", 1)).await.unwrap();
        let frontend = categories.create(&category("Frontend", 0)).await.unwrap();

        skills.create(&Skill::new(backend.id, "SQL".into(), 1)).await.unwrap();
        skills.create(&Skill::new(backend.id, "Rust".into(), 0)).await.unwrap();
        skills.create(&Skill::new(frontend.id, "CSS".into(), 0)).await.unwrap();

        let labels: Vec<String> = skills.list().await.unwrap().into_iter().map(|s| s.label).collect();
        assert_eq!(labels, vec!["CSS", "Rust", "SQL"]);

        let titles: Vec<String> = categories.list().await.unwrap().into_iter().map(|c| c.title_en).collect();
        assert_eq!(titles, vec!["Frontend", "Backend"]);
    }

    #[tokio::test]
    async fn test_delete_category_cascades() {
        let (categories, skills) = setup_test_repos().await;
        let cat = categories.create(&category("Tools", 0)).await.unwrap();
        let skill = skills.create(&Skill::new(cat.id, "Git".into(), 0)).await.unwrap();

        assert!(categories.delete(cat.id).await.unwrap());
        assert!(skills.get_by_id(skill.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_skill_requires_existing_category() {
        let (_, skills) = setup_test_repos().await;
        let err = skills.create(&Skill::new(999, "Go".into(), 0)).await.unwrap_err();
        assert!(crate::db::pool::is_foreign_key_violation(&err));
    }

    #[tokio::test]
    async fn test_update_skill() {
        let (categories, skills) = setup_test_repos().await;
        let a = categories.create(&category("A", 0)).await.unwrap();
        let b = categories.create(&category("B", 1)).await.unwrap();
        let mut skill = skills.create(&Skill::new(a.id, "Docker".into(), 0)).await.unwrap();

        skill.skill_category_id = b.id;
        skill.label = "Kubernetes".into();
        let updated = skills.update(&skill).await.unwrap();
        assert_eq!(updated.skill_category_id, b.id);
        assert_eq!(updated.label, "Kubernetes");
    }
}
