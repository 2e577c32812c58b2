//! Error type shared by the content services

use super::validation::ValidationErrors;
use crate::db::pool::is_unique_violation;

/// Errors returned by content services
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Record not found
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Unique field already taken
    #[error("Duplicate value for {field}")]
    Conflict { field: &'static str },

    /// A required collaborator is not configured
    #[error("{0}")]
    Unavailable(&'static str),

    /// Input failed validation
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Validation(errors)
    }
}

impl ServiceError {
    /// Map a repository write failure, turning unique-constraint races on
    /// `field` into a conflict.
    pub fn from_write(err: anyhow::Error, field: &'static str) -> Self {
        if is_unique_violation(&err) {
            ServiceError::Conflict { field }
        } else {
            ServiceError::InternalError(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(ServiceError::NotFound("Blog").to_string(), "Blog not found");
        assert_eq!(
            ServiceError::Conflict { field: "slug" }.to_string(),
            "Duplicate value for slug"
        );
    }

    #[test]
    fn test_from_write_passes_through_other_errors() {
        let err = ServiceError::from_write(anyhow::anyhow!("disk full"), "slug");
        assert!(matches!(err, ServiceError::InternalError(_)));
    }
}
