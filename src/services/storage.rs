//! File storage backends
//!
//! Uploaded images and the CV go through [`FileStorage`]. The local driver
//! writes under `upload.path` and is served at `/uploads`; the Supabase
//! driver talks to the Storage REST API.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

use crate::config::{Config, StorageDriver};

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `bytes` under `key`, replacing any existing object, and return
    /// the public URL.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    /// Read an object back, `None` when it does not exist
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Remove an object. Missing objects are not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

pub type DynFileStorage = Arc<dyn FileStorage>;

/// Build the storage driver selected in the configuration
pub fn create_storage(config: &Config) -> Result<DynFileStorage> {
    match config.storage.driver {
        StorageDriver::Local => Ok(Arc::new(LocalStorage::new(
            config.upload.path.clone(),
            &config.server.public_base_url,
        ))),
        StorageDriver::Supabase => {
            let url = config
                .storage
                .supabase_url
                .as_deref()
                .ok_or_else(|| anyhow!("storage.supabase_url is required"))?;
            let key = config
                .storage
                .supabase_service_key
                .as_deref()
                .ok_or_else(|| anyhow!("storage.supabase_service_key is required"))?;
            Ok(Arc::new(SupabaseStorage::new(url, key, &config.storage.bucket)?))
        }
    }
}

/// Reject keys that could escape the storage root
fn check_key(key: &str) -> Result<()> {
    if key.is_empty() {
        bail!("Storage key is empty");
    }
    let path = Path::new(key);
    if key.contains("..")
        || key.contains('\\')
        || !path.components().all(|c| matches!(c, Component::Normal(_)))
    {
        bail!("Invalid storage key: {}", key);
    }
    Ok(())
}

/// Files on the local disk
pub struct LocalStorage {
    root: PathBuf,
    url_prefix: String,
}

impl LocalStorage {
    /// `base_url` is the public origin of this server; objects are served
    /// from `{base_url}/uploads/{key}`.
    pub fn new(root: PathBuf, base_url: &str) -> Self {
        Self {
            root,
            url_prefix: format!("{}/uploads", base_url.trim_end_matches('/')),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        check_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl FileStorage for LocalStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write file: {:?}", path))?;
        Ok(format!("{}/{}", self.url_prefix, key))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read file: {:?}", path)),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete file: {:?}", path)),
        }
    }
}

/// Supabase Storage over its REST API
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(base_url: &str, service_key: &str, bucket: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            bucket: bucket.to_string(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, key)
    }

    /// Public URL of an object in a public bucket
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, key
        )
    }
}

#[async_trait]
impl FileStorage for SupabaseStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        check_key(key)?;
        let response = self
            .client
            .post(self.object_url(key))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .context("Supabase upload request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Supabase upload failed: {} {}", status, body);
        }

        Ok(self.public_url(key))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        check_key(key)?;
        let url = format!(
            "{}/storage/v1/object/authenticated/{}/{}",
            self.base_url, self.bucket, key
        );
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .send()
            .await
            .context("Supabase download request failed")?;

        // Storage reports missing objects as 400 or 404 depending on version
        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Ok(None),
            status if status.is_success() => {
                let bytes = response
                    .bytes()
                    .await
                    .context("Failed to read Supabase response")?;
                Ok(Some(bytes.to_vec()))
            }
            status => bail!("Supabase download failed: {}", status),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        check_key(key)?;
        let response = self
            .client
            .delete(format!("{}/storage/v1/object/{}", self.base_url, self.bucket))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&serde_json::json!({ "prefixes": [key] }))
            .send()
            .await
            .context("Supabase delete request failed")?;

        if !response.status().is_success() {
            bail!("Supabase delete failed: {}", response.status());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_check_key() {
        assert!(check_key("images/abc.png").is_ok());
        assert!(check_key("cv/abc.pdf").is_ok());
        assert!(check_key("").is_err());
        assert!(check_key("../etc/passwd").is_err());
        assert!(check_key("images/../../x").is_err());
        assert!(check_key("/abs/path").is_err());
        assert!(check_key("images\\x.png").is_err());
    }

    #[tokio::test]
    async fn test_local_put_get_delete() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf(), "http://localhost:4000/");

        let url = storage
            .put("images/a.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:4000/uploads/images/a.png");
        assert!(dir.path().join("images/a.png").exists());

        assert_eq!(storage.get("images/a.png").await.unwrap(), Some(vec![1, 2, 3]));

        storage.delete("images/a.png").await.unwrap();
        assert_eq!(storage.get("images/a.png").await.unwrap(), None);
        // Deleting twice is fine
        storage.delete("images/a.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_local_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf(), "");
        assert!(storage.put("../x.png", vec![1], "image/png").await.is_err());
    }

    #[tokio::test]
    async fn test_supabase_put_returns_public_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/portfolio/images/a.png"))
            .and(header("authorization", "Bearer service-key"))
            .and(header("x-upsert", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"Key": "portfolio/images/a.png"})))
            .expect(1)
            .mount(&server)
            .await;

        let storage = SupabaseStorage::new(&server.uri(), "service-key", "portfolio").unwrap();
        let url = storage.put("images/a.png", vec![0x89, 0x50], "image/png").await.unwrap();
        assert_eq!(
            url,
            format!("{}/storage/v1/object/public/portfolio/images/a.png", server.uri())
        );
    }

    #[tokio::test]
    async fn test_supabase_upload_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;

        let storage = SupabaseStorage::new(&server.uri(), "bad", "portfolio").unwrap();
        let err = storage.put("cv/a.pdf", vec![1], "application/pdf").await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn test_supabase_delete_and_missing_get() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/storage/v1/object/portfolio"))
            .and(body_json(serde_json::json!({"prefixes": ["cv/old.pdf"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/storage/v1/object/authenticated/portfolio/cv/old.pdf"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let storage = SupabaseStorage::new(&server.uri(), "key", "portfolio").unwrap();
        storage.delete("cv/old.pdf").await.unwrap();
        assert!(storage.get("cv/old.pdf").await.unwrap().is_none());
    }
}
