//! Configuration management
//!
//! This module handles loading and parsing configuration for the folio backend.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// JWT secret used when nothing is configured. Rejected in production.
pub const DEFAULT_JWT_SECRET: &str = "folio-development-secret-change-me";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Upload configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// File storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Telegram notifier configuration
    #[serde(default)]
    pub telegram: TelegramConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Deployment environment
    #[serde(default)]
    pub environment: Environment,
    /// Allowed CORS origins in production. Development mirrors any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Trust X-Forwarded-For / X-Real-IP for the client address
    #[serde(default = "default_true")]
    pub trust_proxy: bool,
    /// Externally visible base URL, used to build absolute download links
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
            cors_origins: Vec::new(),
            trust_proxy: true,
            public_base_url: default_public_base_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_true() -> bool {
    true
}

fn default_public_base_url() -> String {
    "http://localhost:4000".to_string()
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/folio.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing access tokens
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Token lifetime in seconds (default: 7 days)
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: u64,
    /// Admin account created at startup when missing
    #[serde(default)]
    pub admin_email: Option<String>,
    /// Password for the bootstrap admin account
    #[serde(default)]
    pub admin_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_seconds: default_token_ttl(),
            admin_email: None,
            admin_password: None,
        }
    }
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_token_ttl() -> u64 {
    7 * 24 * 60 * 60
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Upload directory path for the local storage driver
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// Maximum image size in bytes (default: 5MB)
    #[serde(default = "default_max_image_size")]
    pub max_image_size: u64,
    /// Maximum CV size in bytes (default: 10MB)
    #[serde(default = "default_max_cv_size")]
    pub max_cv_size: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            max_image_size: default_max_image_size(),
            max_cv_size: default_max_cv_size(),
        }
    }
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_image_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_max_cv_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

/// File storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage driver (local or supabase)
    #[serde(default)]
    pub driver: StorageDriver,
    /// Supabase project URL, e.g. https://xyz.supabase.co
    #[serde(default)]
    pub supabase_url: Option<String>,
    /// Supabase service role key
    #[serde(default)]
    pub supabase_service_key: Option<String>,
    /// Bucket name
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: StorageDriver::default(),
            supabase_url: None,
            supabase_service_key: None,
            bucket: default_bucket(),
        }
    }
}

fn default_bucket() -> String {
    "portfolio".to_string()
}

/// Storage driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    /// Local filesystem (default)
    #[default]
    Local,
    /// Supabase object storage
    Supabase,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_login_max")]
    pub login_max: usize,
    #[serde(default = "default_login_window")]
    pub login_window_secs: u64,
    #[serde(default = "default_contact_max")]
    pub contact_max: usize,
    #[serde(default = "default_contact_window")]
    pub contact_window_secs: u64,
    /// Global per-IP request budget. Unset means 200 in production, 500 otherwise.
    #[serde(default)]
    pub api_max: Option<usize>,
    #[serde(default = "default_api_window")]
    pub api_window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login_max: default_login_max(),
            login_window_secs: default_login_window(),
            contact_max: default_contact_max(),
            contact_window_secs: default_contact_window(),
            api_max: None,
            api_window_secs: default_api_window(),
        }
    }
}

impl RateLimitConfig {
    /// Effective global request budget for the given environment
    pub fn api_max_for(&self, environment: Environment) -> usize {
        self.api_max.unwrap_or(if environment.is_production() { 200 } else { 500 })
    }
}

fn default_login_max() -> usize {
    5
}

fn default_login_window() -> u64 {
    15 * 60
}

fn default_contact_max() -> usize {
    5
}

fn default_contact_window() -> u64 {
    60 * 60
}

fn default_api_window() -> u64 {
    15 * 60
}

/// Telegram notifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
    #[serde(default = "default_telegram_timeout")]
    pub timeout_ms: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: default_telegram_api_base(),
            timeout_ms: default_telegram_timeout(),
        }
    }
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_telegram_timeout() -> u64 {
    6000
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        // Handle empty file - return defaults
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern `FOLIO_<SECTION>_<KEY>`:
    /// - FOLIO_SERVER_HOST, FOLIO_SERVER_PORT, FOLIO_SERVER_ENVIRONMENT
    /// - FOLIO_DATABASE_DRIVER, FOLIO_DATABASE_URL
    /// - FOLIO_AUTH_JWT_SECRET, FOLIO_AUTH_ADMIN_EMAIL, FOLIO_AUTH_ADMIN_PASSWORD
    /// - FOLIO_STORAGE_DRIVER, FOLIO_STORAGE_SUPABASE_URL, ...
    /// - FOLIO_TELEGRAM_BOT_TOKEN, FOLIO_TELEGRAM_CHAT_ID
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // Server configuration
        if let Ok(host) = std::env::var("FOLIO_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("FOLIO_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(env) = std::env::var("FOLIO_SERVER_ENVIRONMENT") {
            match env.to_lowercase().as_str() {
                "development" => self.server.environment = Environment::Development,
                "production" => self.server.environment = Environment::Production,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(origins) = std::env::var("FOLIO_SERVER_CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Ok(trust) = std::env::var("FOLIO_SERVER_TRUST_PROXY") {
            if let Ok(trust) = trust.parse::<bool>() {
                self.server.trust_proxy = trust;
            }
        }
        if let Ok(base) = std::env::var("FOLIO_SERVER_PUBLIC_BASE_URL") {
            self.server.public_base_url = base;
        }

        // Database configuration
        if let Ok(driver) = std::env::var("FOLIO_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {}
            }
        }
        if let Ok(url) = std::env::var("FOLIO_DATABASE_URL") {
            self.database.url = url;
        }

        // Auth configuration
        if let Ok(secret) = std::env::var("FOLIO_AUTH_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(ttl) = std::env::var("FOLIO_AUTH_TOKEN_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.auth.token_ttl_seconds = ttl;
            }
        }
        if let Ok(email) = std::env::var("FOLIO_AUTH_ADMIN_EMAIL") {
            self.auth.admin_email = Some(email);
        }
        if let Ok(password) = std::env::var("FOLIO_AUTH_ADMIN_PASSWORD") {
            self.auth.admin_password = Some(password);
        }

        // Upload configuration
        if let Ok(path) = std::env::var("FOLIO_UPLOAD_PATH") {
            self.upload.path = PathBuf::from(path);
        }

        // Storage configuration
        if let Ok(driver) = std::env::var("FOLIO_STORAGE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "local" => self.storage.driver = StorageDriver::Local,
                "supabase" => self.storage.driver = StorageDriver::Supabase,
                _ => {}
            }
        }
        if let Ok(url) = std::env::var("FOLIO_STORAGE_SUPABASE_URL") {
            self.storage.supabase_url = Some(url);
        }
        if let Ok(key) = std::env::var("FOLIO_STORAGE_SUPABASE_SERVICE_KEY") {
            self.storage.supabase_service_key = Some(key);
        }
        if let Ok(bucket) = std::env::var("FOLIO_STORAGE_BUCKET") {
            self.storage.bucket = bucket;
        }

        // Telegram configuration
        if let Ok(token) = std::env::var("FOLIO_TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Ok(chat_id) = std::env::var("FOLIO_TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = Some(chat_id);
        }
    }

    /// Reject configurations that are unsafe or unusable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.environment.is_production() {
            if self.auth.jwt_secret == DEFAULT_JWT_SECRET {
                return Err(ConfigError::ValidationError(
                    "auth.jwt_secret must be set in production".to_string(),
                ));
            }
            if self.auth.jwt_secret.len() < 32 {
                return Err(ConfigError::ValidationError(
                    "auth.jwt_secret must be at least 32 bytes in production".to_string(),
                ));
            }
        }

        if self.storage.driver == StorageDriver::Supabase
            && (self.storage.supabase_url.is_none() || self.storage.supabase_service_key.is_none())
        {
            return Err(ConfigError::ValidationError(
                "storage.supabase_url and storage.supabase_service_key are required for the supabase driver"
                    .to_string(),
            ));
        }

        if self.auth.token_ttl_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "auth.token_ttl_seconds must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "FOLIO_SERVER_HOST",
    "FOLIO_SERVER_PORT",
    "FOLIO_SERVER_ENVIRONMENT",
    "FOLIO_SERVER_CORS_ORIGINS",
    "FOLIO_SERVER_TRUST_PROXY",
    "FOLIO_SERVER_PUBLIC_BASE_URL",
    "FOLIO_DATABASE_DRIVER",
    "FOLIO_DATABASE_URL",
    "FOLIO_AUTH_JWT_SECRET",
    "FOLIO_AUTH_TOKEN_TTL_SECONDS",
    "FOLIO_AUTH_ADMIN_EMAIL",
    "FOLIO_AUTH_ADMIN_PASSWORD",
    "FOLIO_UPLOAD_PATH",
    "FOLIO_STORAGE_DRIVER",
    "FOLIO_STORAGE_SUPABASE_URL",
    "FOLIO_STORAGE_SUPABASE_SERVICE_KEY",
    "FOLIO_STORAGE_BUCKET",
    "FOLIO_TELEGRAM_BOT_TOKEN",
    "FOLIO_TELEGRAM_CHAT_ID",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        super::CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn valid_port_strategy() -> impl Strategy<Value = u16> {
        1024u16..65535u16
    }

    fn valid_host_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("0.0.0.0".to_string()),
            Just("127.0.0.1".to_string()),
            Just("localhost".to_string()),
            "[a-z]{3,10}\\.[a-z]{2,5}".prop_map(|s| s),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Serializing a config to YAML and loading it back preserves values
        #[test]
        fn property_config_roundtrip(
            host in valid_host_strategy(),
            port in valid_port_strategy(),
            login_max in 1usize..100,
            ttl in 60u64..10_000_000,
        ) {
            let mut config = Config::default();
            config.server.host = host.clone();
            config.server.port = port;
            config.rate_limit.login_max = login_max;
            config.auth.token_ttl_seconds = ttl;

            let yaml = serde_yaml::to_string(&config).unwrap();
            let mut file = NamedTempFile::new().unwrap();
            write!(file, "{}", yaml).unwrap();

            let loaded = Config::load(file.path()).unwrap();
            prop_assert_eq!(loaded.server.host, host);
            prop_assert_eq!(loaded.server.port, port);
            prop_assert_eq!(loaded.rate_limit.login_max, login_max);
            prop_assert_eq!(loaded.auth.token_ttl_seconds, ttl);
        }

        /// Any valid port in the environment overrides the file value
        #[test]
        fn property_env_override_port(port in valid_port_strategy()) {
            let _guard = lock_env();
            clear_env();

            let mut file = NamedTempFile::new().unwrap();
            write!(file, "server:\n  port: 1000\n").unwrap();

            std::env::set_var("FOLIO_SERVER_PORT", port.to_string());
            let config = Config::load_with_env(file.path()).unwrap();
            clear_env();

            prop_assert_eq!(config.server.port, port);
        }
    }
}
