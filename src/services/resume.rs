//! Resume service
//!
//! Resume sections plus the single downloadable CV.

use crate::db::repositories::{CvFileRepository, ResumeRepository};
use crate::models::{
    CreateResumeSectionInput, CvFile, ResumeSection, UpdateResumeSectionInput, DEFAULT_CV_KEY,
};
use crate::services::error::ServiceError;
use crate::services::storage::DynFileStorage;
use crate::services::upload::{sanitize_display_name, validate_pdf, PDF_MIME};
use crate::services::validation::ValidationErrors;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

const TITLE_MAX: usize = 500;
const CONTENT_MAX: usize = 50000;

pub struct ResumeService {
    repo: Arc<dyn ResumeRepository>,
    cv_repo: Arc<dyn CvFileRepository>,
    storage: DynFileStorage,
    max_cv_size: u64,
}

impl ResumeService {
    pub fn new(
        repo: Arc<dyn ResumeRepository>,
        cv_repo: Arc<dyn CvFileRepository>,
        storage: DynFileStorage,
        max_cv_size: u64,
    ) -> Self {
        Self {
            repo,
            cv_repo,
            storage,
            max_cv_size,
        }
    }

    pub async fn create(&self, input: CreateResumeSectionInput) -> Result<ResumeSection, ServiceError> {
        validate_create(&input)?;

        if self.repo.exists_by_key(&input.section_key, None).await? {
            return Err(ServiceError::Conflict { field: "sectionKey" });
        }

        let section = ResumeSection::new(input);
        self.repo
            .create(&section)
            .await
            .map_err(|e| ServiceError::from_write(e, "sectionKey"))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<ResumeSection, ServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get resume section")?
            .ok_or(ServiceError::NotFound("Resume section"))
    }

    pub async fn get_by_key(&self, section_key: &str) -> Result<ResumeSection, ServiceError> {
        self.repo
            .get_by_key(section_key)
            .await
            .context("Failed to get resume section by key")?
            .ok_or(ServiceError::NotFound("Resume section"))
    }

    pub async fn list(&self) -> Result<Vec<ResumeSection>, ServiceError> {
        Ok(self.repo.list().await?)
    }

    pub async fn update(
        &self,
        id: i64,
        input: UpdateResumeSectionInput,
    ) -> Result<ResumeSection, ServiceError> {
        validate_update(&input)?;

        let mut section = self.get_by_id(id).await?;

        if let Some(key) = &input.section_key {
            if *key != section.section_key && self.repo.exists_by_key(key, Some(id)).await? {
                return Err(ServiceError::Conflict { field: "sectionKey" });
            }
        }

        section.apply(input);
        self.repo
            .update(&section)
            .await
            .map_err(|e| ServiceError::from_write(e, "sectionKey"))
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound("Resume section"))
        }
    }

    /// Metadata of the published CV
    pub async fn get_cv(&self) -> Result<CvFile, ServiceError> {
        self.cv_repo
            .get(DEFAULT_CV_KEY)
            .await
            .context("Failed to get CV metadata")?
            .ok_or(ServiceError::NotFound("CV file"))
    }

    /// The published CV and its contents
    pub async fn download_cv(&self) -> Result<(CvFile, Vec<u8>), ServiceError> {
        let cv = self.get_cv().await?;
        let bytes = self
            .storage
            .get(&cv.storage_key)
            .await
            .context("Failed to read CV file")?
            .ok_or(ServiceError::NotFound("CV file"))?;
        Ok((cv, bytes))
    }

    /// Validate, store and publish a new CV, replacing the previous one
    pub async fn upload_cv(
        &self,
        file_name: Option<&str>,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<CvFile, ServiceError> {
        let storage_key = validate_pdf(file_name, content_type, &bytes, self.max_cv_size)
            .map_err(|e| ValidationErrors::single("file", e.to_string()))?;

        let previous = self.cv_repo.get(DEFAULT_CV_KEY).await?;

        let url = self
            .storage
            .put(&storage_key, bytes, PDF_MIME)
            .await
            .context("Failed to store CV file")?;

        let cv = CvFile {
            key: DEFAULT_CV_KEY.to_string(),
            storage_key,
            file_name: sanitize_display_name(file_name),
            mime_type: PDF_MIME.to_string(),
            url,
            updated_at: Utc::now(),
        };
        let saved = self.cv_repo.upsert(&cv).await?;

        if let Some(previous) = previous {
            if previous.storage_key != saved.storage_key {
                if let Err(e) = self.storage.delete(&previous.storage_key).await {
                    tracing::warn!("Failed to delete previous CV {}: {}", previous.storage_key, e);
                }
            }
        }

        tracing::info!("CV updated: {}", saved.file_name);
        Ok(saved)
    }
}

fn validate_create(input: &CreateResumeSectionInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check_slug("sectionKey", &input.section_key);
    errors.check_len("titleEn", &input.title_en, 1, TITLE_MAX);
    errors.check_len("titleRu", &input.title_ru, 1, TITLE_MAX);
    errors.check_len("titleUz", &input.title_uz, 1, TITLE_MAX);
    errors.check_len("contentEn", &input.content_en, 1, CONTENT_MAX);
    errors.check_len("contentRu", &input.content_ru, 1, CONTENT_MAX);
    errors.check_len("contentUz", &input.content_uz, 1, CONTENT_MAX);
    errors.into_result()
}

fn validate_update(input: &UpdateResumeSectionInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if let Some(key) = &input.section_key {
        errors.check_slug("sectionKey", key);
    }
    let texts = [
        ("titleEn", &input.title_en, TITLE_MAX),
        ("titleRu", &input.title_ru, TITLE_MAX),
        ("titleUz", &input.title_uz, TITLE_MAX),
        ("contentEn", &input.content_en, CONTENT_MAX),
        ("contentRu", &input.content_ru, CONTENT_MAX),
        ("contentUz", &input.content_uz, CONTENT_MAX),
    ];
    for (path, value, max) in texts {
        if let Some(value) = value {
            errors.check_len(path, value, 1, max);
        }
    }
    errors.into_result()
}
