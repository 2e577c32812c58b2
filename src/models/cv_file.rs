//! Uploaded CV metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key of the single CV record
pub const DEFAULT_CV_KEY: &str = "default";

/// Metadata of the currently published CV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvFile {
    pub key: String,
    /// Object key inside the file storage
    pub storage_key: String,
    /// Display name offered on download
    pub file_name: String,
    pub mime_type: String,
    /// Public URL returned by the storage driver
    pub url: String,
    pub updated_at: DateTime<Utc>,
}
