//! Blog post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::double_option;

/// A blog post with every translatable field in three locales
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: i64,
    pub slug: String,
    pub title_en: String,
    pub title_ru: String,
    pub title_uz: String,
    pub description_en: String,
    pub description_ru: String,
    pub description_uz: String,
    pub content_en: String,
    pub content_ru: String,
    pub content_uz: String,
    pub thumbnail: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    /// Build an unsaved post from validated input
    pub fn new(input: CreateBlogPostInput) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            slug: input.slug,
            title_en: input.title_en,
            title_ru: input.title_ru,
            title_uz: input.title_uz,
            description_en: input.description_en,
            description_ru: input.description_ru,
            description_uz: input.description_uz,
            content_en: input.content_en,
            content_ru: input.content_ru,
            content_uz: input.content_uz,
            thumbnail: input.thumbnail,
            published: input.published,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update in place
    pub fn apply(&mut self, input: UpdateBlogPostInput) {
        if let Some(slug) = input.slug {
            self.slug = slug;
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
        if let Some(v) = input.description_en {
            self.description_en = v;
        }
        if let Some(v) = input.description_ru {
            self.description_ru = v;
        }
        if let Some(v) = input.description_uz {
            self.description_uz = v;
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
        if let Some(thumbnail) = input.thumbnail {
            self.thumbnail = thumbnail;
        }
        if let Some(published) = input.published {
            self.published = published;
        }
    }
}

/// Input for creating a blog post
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateBlogPostInput {
    pub slug: String,
    pub title_en: String,
    pub title_ru: String,
    pub title_uz: String,
    pub description_en: String,
    pub description_ru: String,
    pub description_uz: String,
    pub content_en: String,
    pub content_ru: String,
    pub content_uz: String,
    pub thumbnail: Option<String>,
    pub published: bool,
}

/// Input for updating a blog post. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateBlogPostInput {
    pub slug: Option<String>,
    pub title_en: Option<String>,
    pub title_ru: Option<String>,
    pub title_uz: Option<String>,
    pub description_en: Option<String>,
    pub description_ru: Option<String>,
    pub description_uz: Option<String>,
    pub content_en: Option<String>,
    pub content_ru: Option<String>,
    pub content_uz: Option<String>,
    /// `null` clears the thumbnail
    #[serde(deserialize_with = "double_option")]
    pub thumbnail: Option<Option<String>>,
    pub published: Option<bool>,
}
