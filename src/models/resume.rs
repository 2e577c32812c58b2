//! Resume section model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One section of the resume page (experience, education, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSection {
    pub id: i64,
    pub section_key: String,
    pub title_en: String,
    pub title_ru: String,
    pub title_uz: String,
    pub content_en: String,
    pub content_ru: String,
    pub content_uz: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResumeSection {
    pub fn new(input: CreateResumeSectionInput) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            section_key: input.section_key,
            title_en: input.title_en,
            title_ru: input.title_ru,
            title_uz: input.title_uz,
            content_en: input.content_en,
            content_ru: input.content_ru,
            content_uz: input.content_uz,
            sort_order: input.sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, input: UpdateResumeSectionInput) {
        if let Some(v) = input.section_key {
            self.section_key = v;
        }
        if let Some(v) = input.title_en {
            self.title_en = v;
        }
        if let Some(v) = input.title_ru {
            self.title_ru = v;
        }
        if let Some(v) = input.title_uz {
            self.title_uz = v;
        }
        if let Some(v) = input.content_en {
            self.content_en = v;
        }
        if let Some(v) = input.content_ru {
            self.content_ru = v;
        }
        if let Some(v) = input.content_uz {
            self.content_uz = v;
        }
        if let Some(v) = input.sort_order {
            self.sort_order = v;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateResumeSectionInput {
    pub section_key: String,
    pub title_en: String,
    pub title_ru: String,
    pub title_uz: String,
    pub content_en: String,
    pub content_ru: String,
    pub content_uz: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateResumeSectionInput {
    pub section_key: Option<String>,
    pub title_en: Option<String>,
    pub title_ru: Option<String>,
    pub title_uz: Option<String>,
    pub content_en: Option<String>,
    pub content_ru: Option<String>,
    pub content_uz: Option<String>,
    pub sort_order: Option<i32>,
}
