//! Skill service
//!
//! Skill categories with translated titles and the (untranslated) skills
//! grouped under them.

use crate::db::pool::is_foreign_key_violation;
use crate::db::repositories::{SkillCategoryRepository, SkillRepository};
use crate::models::{
    CreateSkillCategoryInput, CreateSkillInput, Skill, SkillCategory, SkillCategoryWithSkills,
    UpdateSkillCategoryInput, UpdateSkillInput,
};
use crate::services::error::ServiceError;
use crate::services::validation::ValidationErrors;
use anyhow::Context;
use std::collections::HashMap;
use std::sync::Arc;

const TITLE_MAX: usize = 100;
const LABEL_MAX: usize = 100;

pub struct SkillService {
    categories: Arc<dyn SkillCategoryRepository>,
    skills: Arc<dyn SkillRepository>,
}

impl SkillService {
    pub fn new(
        categories: Arc<dyn SkillCategoryRepository>,
        skills: Arc<dyn SkillRepository>,
    ) -> Self {
        Self { categories, skills }
    }

    /// Every category in order, each with its skills in order
    pub async fn list_grouped(&self) -> Result<Vec<SkillCategoryWithSkills>, ServiceError> {
        let categories = self.categories.list().await?;
        let mut by_category: HashMap<i64, Vec<Skill>> = HashMap::new();
        for skill in self.skills.list().await? {
            by_category
                .entry(skill.skill_category_id)
                .or_default()
                .push(skill);
        }

        Ok(categories
            .into_iter()
            .map(|category| {
                let skills = by_category.remove(&category.id).unwrap_or_default();
                SkillCategoryWithSkills { category, skills }
            })
            .collect())
    }

    // Categories

    pub async fn list_categories(&self) -> Result<Vec<SkillCategory>, ServiceError> {
        Ok(self.categories.list().await?)
    }

    pub async fn get_category(&self, id: i64) -> Result<SkillCategory, ServiceError> {
        self.categories
            .get_by_id(id)
            .await
            .context("Failed to get skill category")?
            .ok_or(ServiceError::NotFound("Skill category"))
    }

    pub async fn create_category(
        &self,
        input: CreateSkillCategoryInput,
    ) -> Result<SkillCategory, ServiceError> {
        let mut errors = ValidationErrors::new();
        errors.check_len("titleEn", &input.title_en, 1, TITLE_MAX);
        errors.check_len("titleRu", &input.title_ru, 1, TITLE_MAX);
        errors.check_len("titleUz", &input.title_uz, 1, TITLE_MAX);
        errors.into_result()?;

        Ok(self.categories.create(&SkillCategory::new(input)).await?)
    }

    pub async fn update_category(
        &self,
        id: i64,
        input: UpdateSkillCategoryInput,
    ) -> Result<SkillCategory, ServiceError> {
        let mut errors = ValidationErrors::new();
        for (path, value) in [
            ("titleEn", &input.title_en),
            ("titleRu", &input.title_ru),
            ("titleUz", &input.title_uz),
        ] {
            if let Some(value) = value {
                errors.check_len(path, value, 1, TITLE_MAX);
            }
        }
        errors.into_result()?;

        let mut category = self.get_category(id).await?;
        category.apply(input);
        Ok(self.categories.update(&category).await?)
    }

    /// Deleting a category removes its skills too
    pub async fn delete_category(&self, id: i64) -> Result<(), ServiceError> {
        if self.categories.delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound("Skill category"))
        }
    }

    // Skills

    pub async fn list_skills(&self) -> Result<Vec<Skill>, ServiceError> {
        Ok(self.skills.list().await?)
    }

    pub async fn get_skill(&self, id: i64) -> Result<Skill, ServiceError> {
        self.skills
            .get_by_id(id)
            .await
            .context("Failed to get skill")?
            .ok_or(ServiceError::NotFound("Skill"))
    }

    pub async fn create_skill(&self, input: CreateSkillInput) -> Result<Skill, ServiceError> {
        let label = input.label.trim().to_string();
        let mut errors = ValidationErrors::new();
        errors.check_len("label", &label, 1, LABEL_MAX);
        errors.into_result()?;

        self.ensure_category(input.skill_category_id).await?;

        let skill = Skill::new(input.skill_category_id, label, input.sort_order);
        self.skills
            .create(&skill)
            .await
            .map_err(map_skill_write)
    }

    pub async fn update_skill(&self, id: i64, input: UpdateSkillInput) -> Result<Skill, ServiceError> {
        let label = input.label.as_deref().map(|l| l.trim().to_string());
        let mut errors = ValidationErrors::new();
        if let Some(label) = &label {
            errors.check_len("label", label, 1, LABEL_MAX);
        }
        errors.into_result()?;

        let mut skill = self.get_skill(id).await?;

        if let Some(category_id) = input.skill_category_id {
            if category_id != skill.skill_category_id {
                self.ensure_category(category_id).await?;
            }
            skill.skill_category_id = category_id;
        }
        if let Some(label) = label {
            skill.label = label;
        }
        if let Some(sort_order) = input.sort_order {
            skill.sort_order = sort_order;
        }

        self.skills.update(&skill).await.map_err(map_skill_write)
    }

    pub async fn delete_skill(&self, id: i64) -> Result<(), ServiceError> {
        if self.skills.delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound("Skill"))
        }
    }

    async fn ensure_category(&self, id: i64) -> Result<(), ServiceError> {
        if self.categories.get_by_id(id).await?.is_none() {
            return Err(ValidationErrors::single("skillCategoryId", "Skill category not found").into());
        }
        Ok(())
    }
}

/// A category deleted between the existence check and the write
fn map_skill_write(err: anyhow::Error) -> ServiceError {
    if is_foreign_key_violation(&err) {
        ValidationErrors::single("skillCategoryId", "Skill category not found").into()
    } else {
        ServiceError::InternalError(err)
    }
}
