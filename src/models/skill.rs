//! Skill categories and skills

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A group of skills with a translated title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillCategory {
    pub id: i64,
    pub title_en: String,
    pub title_ru: String,
    pub title_uz: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single skill. Labels are not translated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: i64,
    pub skill_category_id: i64,
    pub label: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A category together with its skills, as served publicly
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillCategoryWithSkills {
    #[serde(flatten)]
    pub category: SkillCategory,
    pub skills: Vec<Skill>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSkillCategoryInput {
    pub title_en: String,
    pub title_ru: String,
    pub title_uz: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSkillCategoryInput {
    pub title_en: Option<String>,
    pub title_ru: Option<String>,
    pub title_uz: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSkillInput {
    pub skill_category_id: i64,
    pub label: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSkillInput {
    pub skill_category_id: Option<i64>,
    pub label: Option<String>,
    pub sort_order: Option<i32>,
}

impl SkillCategory {
    pub fn new(input: CreateSkillCategoryInput) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            title_en: input.title_en,
            title_ru: input.title_ru,
            title_uz: input.title_uz,
            sort_order: input.sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, input: UpdateSkillCategoryInput) {
        if let Some(v) = input.title_en {
            self.title_en = v;
        }
        if let Some(v) = input.title_ru {
            self.title_ru = v;
        }
        if let Some(v) = input.title_uz {
            self.title_uz = v;
        }
        if let Some(v) = input.sort_order {
            self.sort_order = v;
        }
    }
}

impl Skill {
    pub fn new(skill_category_id: i64, label: String, sort_order: i32) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            skill_category_id,
            label,
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }
}
