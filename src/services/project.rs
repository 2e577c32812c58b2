//! Project service

use crate::db::repositories::ProjectRepository;
use crate::models::{CreateProjectInput, Project, UpdateProjectInput};
use crate::services::error::ServiceError;
use crate::services::validation::ValidationErrors;
use anyhow::Context;
use std::sync::Arc;

const TITLE_MAX: usize = 500;
const DESCRIPTION_MAX: usize = 5000;
const THUMBNAIL_MAX: usize = 500;
const URL_MAX: usize = 1000;
const TECH_STACK_MAX_ITEMS: usize = 20;
const TECH_ITEM_MAX: usize = 50;
const SORT_ORDER_MAX: i32 = 9999;

pub struct ProjectService {
    repo: Arc<dyn ProjectRepository>,
}

impl ProjectService {
    pub fn new(repo: Arc<dyn ProjectRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, input: CreateProjectInput) -> Result<Project, ServiceError> {
        validate_create(&input)?;

        if self.repo.exists_by_slug(&input.slug, None).await? {
            return Err(ServiceError::Conflict { field: "slug" });
        }

        let project = Project::new(input);
        self.repo
            .create(&project)
            .await
            .map_err(|e| ServiceError::from_write(e, "slug"))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Project, ServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get project")?
            .ok_or(ServiceError::NotFound("Project"))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Project, ServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get project by slug")?
            .ok_or(ServiceError::NotFound("Project"))
    }

    pub async fn get_published_by_slug(&self, slug: &str) -> Result<Project, ServiceError> {
        let project = self.get_by_slug(slug).await?;
        if project.published {
            Ok(project)
        } else {
            Err(ServiceError::NotFound("Project"))
        }
    }

    pub async fn list(&self) -> Result<Vec<Project>, ServiceError> {
        Ok(self.repo.list().await?)
    }

    pub async fn list_published(&self) -> Result<Vec<Project>, ServiceError> {
        Ok(self.repo.list_published().await?)
    }

    pub async fn update(&self, id: i64, input: UpdateProjectInput) -> Result<Project, ServiceError> {
        validate_update(&input)?;

        let mut project = self.get_by_id(id).await?;

        if let Some(slug) = &input.slug {
            if *slug != project.slug && self.repo.exists_by_slug(slug, Some(id)).await? {
                return Err(ServiceError::Conflict { field: "slug" });
            }
        }

        project.apply(input);
        self.repo
            .update(&project)
            .await
            .map_err(|e| ServiceError::from_write(e, "slug"))
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound("Project"))
        }
    }
}

fn check_tech_stack(errors: &mut ValidationErrors, items: &[String]) {
    if items.len() > TECH_STACK_MAX_ITEMS {
        errors.add(
            "techStack",
            format!("At most {} items allowed", TECH_STACK_MAX_ITEMS),
        );
    }
    for (i, item) in items.iter().enumerate() {
        errors.check_len(&format!("techStack.{}", i), item, 1, TECH_ITEM_MAX);
    }
}

fn validate_create(input: &CreateProjectInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check_slug("slug", &input.slug);
    errors.check_len("titleEn", &input.title_en, 1, TITLE_MAX);
    errors.check_len("titleRu", &input.title_ru, 1, TITLE_MAX);
    errors.check_len("titleUz", &input.title_uz, 1, TITLE_MAX);
    errors.check_len("descriptionEn", &input.description_en, 1, DESCRIPTION_MAX);
    errors.check_len("descriptionRu", &input.description_ru, 1, DESCRIPTION_MAX);
    errors.check_len("descriptionUz", &input.description_uz, 1, DESCRIPTION_MAX);
    check_tech_stack(&mut errors, &input.tech_stack);
    errors.check_optional_len("thumbnail", input.thumbnail.as_deref(), THUMBNAIL_MAX);
    errors.check_url("linkUrl", input.link_url.as_deref(), URL_MAX);
    errors.check_url("githubUrl", input.github_url.as_deref(), URL_MAX);
    errors.check_range("sortOrder", input.sort_order, 0, SORT_ORDER_MAX);
    errors.into_result()
}

fn validate_update(input: &UpdateProjectInput) -> Result<(), ValidationErrors> {
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
    ];
    for (path, value, max) in texts {
        if let Some(value) = value {
            errors.check_len(path, value, 1, max);
        }
    }
    if let Some(items) = &input.tech_stack {
        check_tech_stack(&mut errors, items);
    }
    if let Some(thumbnail) = &input.thumbnail {
        errors.check_optional_len("thumbnail", thumbnail.as_deref(), THUMBNAIL_MAX);
    }
    if let Some(link_url) = &input.link_url {
        errors.check_url("linkUrl", link_url.as_deref(), URL_MAX);
    }
    if let Some(github_url) = &input.github_url {
        errors.check_url("githubUrl", github_url.as_deref(), URL_MAX);
    }
    if let Some(sort_order) = input.sort_order {
        errors.check_range("sortOrder", sort_order, 0, SORT_ORDER_MAX);
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxProjectRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_service() -> ProjectService {
        let pool = create_test_pool()
            .await
            .expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        ProjectService::new(SqlxProjectRepository::boxed(pool))
    }

    fn valid_input(slug: &str, sort_order: i32) -> CreateProjectInput {
        CreateProjectInput {
            slug: slug.to_string(),
            title_en: "Folio".into(),
            title_ru: "Фолио".into(),
            title_uz: "Folio".into(),
            description_en: "Portfolio backend".into(),
            description_ru: "Бэкенд портфолио".into(),
            description_uz: "Portfolio backendi".into(),
            tech_stack: vec!["Rust".into(), "axum".into()],
            thumbnail: None,
            link_url: Some("https://example.com".into()),
            github_url: None,
            published: true,
            sort_order,
        }
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips() {
        let service = setup_test_service().await;
        let created = service.create(valid_input("folio", 1)).await.unwrap();
        let fetched = service.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched.tech_stack, vec!["Rust", "axum"]);
        assert_eq!(fetched.link_url.as_deref(), Some("https://example.com"));
        assert_eq!(fetched.sort_order, 1);
    }

    #[tokio::test]
    async fn test_rejects_bad_urls_and_tech_stack() {
        let service = setup_test_service().await;
        let mut input = valid_input("folio", 0);
        input.link_url = Some("not a url".into());
        input.github_url = Some("ftp://github.com/me".into());
        input.tech_stack = (0..21).map(|i| format!("tech{}", i)).collect();
        input.sort_order = 10000;

        match service.create(input).await {
            Err(ServiceError::Validation(errors)) => {
                let paths: Vec<&str> = errors.errors().iter().map(|e| e.path.as_str()).collect();
                assert_eq!(paths, vec!["techStack", "linkUrl", "githubUrl", "sortOrder"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tech_item_length_checked() {
        let service = setup_test_service().await;
        let mut input = valid_input("folio", 0);
        input.tech_stack = vec!["ok".into(), "x".repeat(51)];
        match service.create(input).await {
            Err(ServiceError::Validation(errors)) => {
                assert_eq!(errors.errors()[0].path, "techStack.1");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_clears_link() {
        let service = setup_test_service().await;
        let created = service.create(valid_input("folio", 0)).await.unwrap();
        let input = UpdateProjectInput {
            link_url: Some(None),
            ..Default::default()
        };
        let updated = service.update(created.id, input).await.unwrap();
        assert!(updated.link_url.is_none());
        assert_eq!(updated.title_ru, "Фолио");
    }

    #[tokio::test]
    async fn test_public_list_respects_order_and_published() {
        let service = setup_test_service().await;
        service.create(valid_input("second", 2)).await.unwrap();
        service.create(valid_input("first", 1)).await.unwrap();
        let mut hidden = valid_input("hidden", 0);
        hidden.published = false;
        service.create(hidden).await.unwrap();

        let slugs: Vec<String> = service
            .list_published()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.slug)
            .collect();
        assert_eq!(slugs, vec!["first", "second"]);
        assert!(matches!(
            service.get_published_by_slug("hidden").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let service = setup_test_service().await;
        assert!(matches!(service.delete(7).await, Err(ServiceError::NotFound(_))));
    }
}
