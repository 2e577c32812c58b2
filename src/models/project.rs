//! Portfolio project model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::double_option;

/// A portfolio project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub slug: String,
    pub title_en: String,
    pub title_ru: String,
    pub title_uz: String,
    pub description_en: String,
    pub description_ru: String,
    pub description_uz: String,
    pub tech_stack: Vec<String>,
    pub thumbnail: Option<String>,
    pub link_url: Option<String>,
    pub github_url: Option<String>,
    pub published: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(input: CreateProjectInput) -> Self {
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
            tech_stack: input.tech_stack,
            thumbnail: input.thumbnail,
            link_url: input.link_url,
            github_url: input.github_url,
            published: input.published,
            sort_order: input.sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, input: UpdateProjectInput) {
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
        if let Some(tech_stack) = input.tech_stack {
            self.tech_stack = tech_stack;
        }
        if let Some(thumbnail) = input.thumbnail {
            self.thumbnail = thumbnail;
        }
        if let Some(link_url) = input.link_url {
            self.link_url = link_url;
        }
        if let Some(github_url) = input.github_url {
            self.github_url = github_url;
        }
        if let Some(published) = input.published {
            self.published = published;
        }
        if let Some(sort_order) = input.sort_order {
            self.sort_order = sort_order;
        }
    }
}

/// Input for creating a project
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateProjectInput {
    pub slug: String,
    pub title_en: String,
    pub title_ru: String,
    pub title_uz: String,
    pub description_en: String,
    pub description_ru: String,
    pub description_uz: String,
    pub tech_stack: Vec<String>,
    pub thumbnail: Option<String>,
    pub link_url: Option<String>,
    pub github_url: Option<String>,
    pub published: bool,
    pub sort_order: i32,
}

/// Input for updating a project
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProjectInput {
    pub slug: Option<String>,
    pub title_en: Option<String>,
    pub title_ru: Option<String>,
    pub title_uz: Option<String>,
    pub description_en: Option<String>,
    pub description_ru: Option<String>,
    pub description_uz: Option<String>,
    pub tech_stack: Option<Vec<String>>,
    #[serde(deserialize_with = "double_option")]
    pub thumbnail: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub link_url: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub github_url: Option<Option<String>>,
    pub published: Option<bool>,
    pub sort_order: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_partial_update() {
        let mut project = Project::new(CreateProjectInput {
            slug: "folio".into(),
            tech_stack: vec!["Rust".into()],
            link_url: Some("https://example.com".into()),
            sort_order: 3,
            ..Default::default()
        });

        let update: UpdateProjectInput = serde_json::from_value(json!({
            "techStack": ["Rust", "SQL"],
            "linkUrl": null,
            "sortOrder": 1
        }))
        .unwrap();
        project.apply(update);

        assert_eq!(project.slug, "folio");
        assert_eq!(project.tech_stack, vec!["Rust", "SQL"]);
        assert!(project.link_url.is_none());
        assert_eq!(project.sort_order, 1);
    }
}
