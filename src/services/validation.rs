//! Input validation helpers
//!
//! Validators collect every violation rather than stopping at the first, so
//! a client gets the full list of `{path, message}` pairs in one response.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use url::Url;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug regex is valid"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

/// One rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

/// Accumulated field errors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-error shorthand
    pub fn single(path: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(path, message);
        errors
    }

    pub fn add(&mut self, path: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            path: path.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Check a required string's length in characters
    pub fn check_len(&mut self, path: &str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len < min {
            if min == 1 {
                self.add(path, "Required");
            } else {
                self.add(path, format!("Must be at least {} characters", min));
            }
        } else if len > max {
            self.add(path, format!("Must be at most {} characters", max));
        }
    }

    /// Check an optional string's length when present
    pub fn check_optional_len(&mut self, path: &str, value: Option<&str>, max: usize) {
        if let Some(value) = value {
            if value.chars().count() > max {
                self.add(path, format!("Must be at most {} characters", max));
            }
        }
    }

    /// Check a URL-safe slug: lowercase alphanumerics separated by single hyphens
    pub fn check_slug(&mut self, path: &str, value: &str) {
        if value.is_empty() {
            self.add(path, "Required");
        } else if value.chars().count() > 200 {
            self.add(path, "Must be at most 200 characters");
        } else if !is_valid_slug(value) {
            self.add(path, "Must be lowercase letters, digits and single hyphens");
        }
    }

    /// Check an optional absolute http(s) URL
    pub fn check_url(&mut self, path: &str, value: Option<&str>, max: usize) {
        let Some(value) = value else {
            return;
        };
        if value.chars().count() > max {
            self.add(path, format!("Must be at most {} characters", max));
        } else if !is_valid_url(value) {
            self.add(path, "Must be a valid URL");
        }
    }

    pub fn check_range(&mut self, path: &str, value: i32, min: i32, max: i32) {
        if value < min || value > max {
            self.add(path, format!("Must be between {} and {}", min, max));
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

pub fn is_valid_slug(value: &str) -> bool {
    SLUG_RE.is_match(value)
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Absolute http(s) URL with a non-empty host and no whitespace
pub fn is_valid_url(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match Url::parse(value) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_rules() {
        assert!(is_valid_slug("hello"));
        assert!(is_valid_slug("hello-world-2"));
        assert!(!is_valid_slug("Hello"));
        assert!(!is_valid_slug("hello--world"));
        assert!(!is_valid_slug("-hello"));
        assert!(!is_valid_slug("hello-"));
        assert!(!is_valid_slug("hello world"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn test_check_slug_length() {
        let mut errors = ValidationErrors::new();
        errors.check_slug("slug", &"a".repeat(201));
        errors.check_slug("slug", "");
        assert_eq!(errors.errors().len(), 2);
        assert_eq!(errors.errors()[1].message, "Required");
    }

    #[test]
    fn test_email_rules() {
        assert!(is_valid_email("me@example.com"));
        assert!(!is_valid_email("me@example"));
        assert!(!is_valid_email("me example@x.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn test_url_rules() {
        assert!(is_valid_url("https://github.com/me/repo"));
        assert!(is_valid_url("http://localhost:3000"));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("https://"));
        assert!(!is_valid_url("javascript:alert(1)"));
        assert!(!is_valid_url("https://exa mple.com"));
    }

    #[test]
    fn test_url_rejects_malformed_hosts() {
        assert!(is_valid_url("https://[::1]:8080/path"));
        assert!(!is_valid_url("https://[::1"));
        assert!(!is_valid_url("http://@"));
        assert!(!is_valid_url("https://:80"));
        assert!(!is_valid_url("http://%%%/x"));
        assert!(!is_valid_url("https://a<b>.com"));
    }

    #[test]
    fn test_len_counts_characters() {
        let mut errors = ValidationErrors::new();
        errors.check_len("titleRu", &"я".repeat(100), 1, 100);
        assert!(errors.is_empty());

        errors.check_len("titleRu", &"я".repeat(101), 1, 100);
        errors.check_len("titleUz", "", 1, 100);
        assert_eq!(errors.errors().len(), 2);
        assert_eq!(errors.to_string(), "titleRu: Must be at most 100 characters; titleUz: Required");
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());
        let err = ValidationErrors::single("id", "bad").into_result().unwrap_err();
        assert_eq!(serde_json::to_value(&err).unwrap(), serde_json::json!([{"path": "id", "message": "bad"}]));
    }
}
