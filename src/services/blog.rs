//! Blog service
//!
//! Validation and CRUD for blog posts. Public reads only see published
//! posts; locale projection happens at the API layer.

use crate::db::repositories::BlogRepository;
use crate::models::{BlogPost, CreateBlogPostInput, UpdateBlogPostInput};
use crate::services::error::ServiceError;
use crate::services::validation::ValidationErrors;
use anyhow::Context;
use std::sync::Arc;

const TITLE_MAX: usize = 500;
const DESCRIPTION_MAX: usize = 2000;
const CONTENT_MAX: usize = 50000;
const THUMBNAIL_MAX: usize = 500;

pub struct BlogService {
    repo: Arc<dyn BlogRepository>,
}

impl BlogService {
    pub fn new(repo: Arc<dyn BlogRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, input: CreateBlogPostInput) -> Result<BlogPost, ServiceError> {
        validate_create(&input)?;

        if self.repo.exists_by_slug(&input.slug, None).await? {
            return Err(ServiceError::Conflict { field: "slug" });
        }

        let post = BlogPost::new(input);
        self.repo
            .create(&post)
            .await
            .map_err(|e| ServiceError::from_write(e, "slug"))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<BlogPost, ServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get blog post")?
            .ok_or(ServiceError::NotFound("Blog post"))
    }

    /// Any post by slug, published or not
    pub async fn get_by_slug(&self, slug: &str) -> Result<BlogPost, ServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get blog post by slug")?
            .ok_or(ServiceError::NotFound("Blog post"))
    }

    /// A published post by slug; drafts are reported as missing
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<BlogPost, ServiceError> {
        let post = self.get_by_slug(slug).await?;
        if post.published {
            Ok(post)
        } else {
            Err(ServiceError::NotFound("Blog post"))
        }
    }

    pub async fn list(&self) -> Result<Vec<BlogPost>, ServiceError> {
        Ok(self.repo.list().await?)
    }

    pub async fn list_published(&self) -> Result<Vec<BlogPost>, ServiceError> {
        Ok(self.repo.list_published().await?)
    }

    pub async fn update(&self, id: i64, input: UpdateBlogPostInput) -> Result<BlogPost, ServiceError> {
        validate_update(&input)?;

        let mut post = self.get_by_id(id).await?;

        if let Some(slug) = &input.slug {
            if *slug != post.slug && self.repo.exists_by_slug(slug, Some(id)).await? {
                return Err(ServiceError::Conflict { field: "slug" });
            }
        }

        post.apply(input);
        self.repo
            .update(&post)
            .await
            .map_err(|e| ServiceError::from_write(e, "slug"))
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound("Blog post"))
        }
    }
}

fn validate_create(input: &CreateBlogPostInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check_slug("slug", &input.slug);
    errors.check_len("titleEn", &input.title_en, 1, TITLE_MAX);
    errors.check_len("titleRu", &input.title_ru, 1, TITLE_MAX);
    errors.check_len("titleUz", &input.title_uz, 1, TITLE_MAX);
    errors.check_len("descriptionEn", &input.description_en, 1, DESCRIPTION_MAX);
    errors.check_len("descriptionRu", &input.description_ru, 1, DESCRIPTION_MAX);
    errors.check_len("descriptionUz", &input.description_uz, 1, DESCRIPTION_MAX);
    errors.check_len("contentEn", &input.content_en, 1, CONTENT_MAX);
    errors.check_len("contentRu", &input.content_ru, 1, CONTENT_MAX);
    errors.check_len("contentUz", &input.content_uz, 1, CONTENT_MAX);
    errors.check_optional_len("thumbnail", input.thumbnail.as_deref(), THUMBNAIL_MAX);
    errors.into_result()
}

fn validate_update(input: &UpdateBlogPostInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if let Some(slug) = &input.slug {
        errors.check_slug("slug", slug);
    }
    let texts = [
        ("titleEn", &input.title_en, TITLE_MAX),
        ("titleRu", &input.title_ru, TITLE_MAX),
        ("titleUz", &input.title_uz, TITLE_MAX),
        ("descriptionEn", &input.description_en, DESCRIPTION_MAX),
        ("descriptionRu", &input.description_ru, DESCRIPTION_MAX),
        ("descriptionUz", &input.description_uz, DESCRIPTION_MAX),
        ("contentEn", &input.content_en, CONTENT_MAX),
        ("contentRu", &input.content_ru, CONTENT_MAX),
        ("contentUz", &input.content_uz, CONTENT_MAX),
    ];
    for (path, value, max) in texts {
        if let Some(value) = value {
            errors.check_len(path, value, 1, max);
        }
    }
    if let Some(thumbnail) = &input.thumbnail {
        errors.check_optional_len("thumbnail", thumbnail.as_deref(), THUMBNAIL_MAX);
    }
    errors.into_result()
}
