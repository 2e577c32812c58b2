//! Admin authentication
//!
//! Email/password login, token verification for the admin API, and the
//! startup bootstrap of the configured admin account.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::repositories::AdminUserRepository;
use crate::models::{AdminUser, UserRole, UserSummary};
use crate::services::password::{hash_password, verify_dummy, verify_password};
use crate::services::token::TokenService;

/// Error types for authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("No token provided")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for login
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

pub struct AuthService {
    repo: Arc<dyn AdminUserRepository>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(repo: Arc<dyn AdminUserRepository>, tokens: TokenService) -> Self {
        Self { repo, tokens }
    }

    /// Check credentials and issue a token.
    ///
    /// Unknown emails and wrong passwords fail the same way and take about
    /// the same time.
    pub async fn login(&self, input: LoginInput) -> Result<LoginResponse, AuthError> {
        let email = input.email.trim().to_lowercase();

        let Some(user) = self.repo.get_by_email(&email).await? else {
            verify_dummy(&input.password);
            return Err(AuthError::InvalidCredentials);
        };

        let valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(&user)
            .context("Failed to issue token")?;

        tracing::info!("Admin logged in: {}", user.email);
        Ok(LoginResponse {
            token,
            user: UserSummary::from(&user),
        })
    }

    /// Resolve a bearer token to an admin account
    pub async fn authenticate(&self, token: &str) -> Result<AdminUser, AuthError> {
        let claims = self
            .tokens
            .verify(token)
            .map_err(|_| AuthError::InvalidToken)?;
        let id = claims.user_id().ok_or(AuthError::InvalidToken)?;

        match self.repo.get_by_id(id).await? {
            Some(user) if user.role == UserRole::Admin => Ok(user),
            _ => Err(AuthError::InvalidToken),
        }
    }

    /// Create the configured admin account if no account uses that email.
    ///
    /// Returns the created account, or `None` when it already existed.
    pub async fn bootstrap_admin(
        &self,
        email: &str,
        password: &str,
    ) -> anyhow::Result<Option<AdminUser>> {
        let email = email.trim().to_lowercase();
        if self.repo.get_by_email(&email).await?.is_some() {
            return Ok(None);
        }

        let user = AdminUser::new(email, hash_password(password)?, UserRole::Admin);
        let created = self.repo.create(&user).await?;
        tracing::info!("Admin account created: {}", created.email);
        Ok(Some(created))
    }

    /// Set the password of the account with `email`, or of the oldest
    /// account when none matches. Creates the account if there are none.
    pub async fn reset_admin(&self, email: &str, password: &str) -> anyhow::Result<AdminUser> {
        let email = email.trim().to_lowercase();
        let hash = hash_password(password)?;

        let existing = match self.repo.get_by_email(&email).await? {
            Some(user) => Some(user),
            None => self.repo.first().await?,
        };

        match existing {
            Some(mut user) => {
                self.repo.update_password(user.id, &hash).await?;
                user.password_hash = hash;
                Ok(user)
            }
            None => {
                let user = AdminUser::new(email, hash, UserRole::Admin);
                self.repo.create(&user).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxAdminUserRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_service() -> (AuthService, Arc<dyn AdminUserRepository>) {
        let pool = create_test_pool()
            .await
            .expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxAdminUserRepository::boxed(pool);
        let service = AuthService::new(repo.clone(), TokenService::new("test-secret", 3600));
        (service, repo)
    }

    fn login(email: &str, password: &str) -> LoginInput {
        LoginInput {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_login_returns_matching_token() {
        let (service, _) = setup_test_service().await;
        let admin = service
            .bootstrap_admin("Admin@Example.com", "correct horse")
            .await
            .unwrap()
            .unwrap();

        let response = service
            .login(login("  ADMIN@example.com ", "correct horse"))
            .await
            .unwrap();
        assert_eq!(response.user.id, admin.id);
        assert_eq!(response.user.email, "admin@example.com");
        assert_eq!(response.user.role, UserRole::Admin);

        let claims = TokenService::new("test-secret", 3600)
            .verify(&response.token)
            .unwrap();
        assert_eq!(claims.user_id(), Some(admin.id));
        assert_eq!(claims.email, admin.email);
        assert_eq!(claims.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_wrong_credentials_fail_alike() {
        let (service, _) = setup_test_service().await;
        service.bootstrap_admin("admin@example.com", "right").await.unwrap();

        let wrong_password = service.login(login("admin@example.com", "wrong")).await.unwrap_err();
        let unknown_email = service.login(login("nobody@example.com", "right")).await.unwrap_err();
        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_authenticate() {
        let (service, repo) = setup_test_service().await;
        service.bootstrap_admin("admin@example.com", "pw").await.unwrap();
        let token = service.login(login("admin@example.com", "pw")).await.unwrap().token;

        let user = service.authenticate(&token).await.unwrap();
        assert_eq!(user.email, "admin@example.com");

        assert!(matches!(
            service.authenticate("garbage").await,
            Err(AuthError::InvalidToken)
        ));

        // Viewers hold valid tokens but may not use the admin API
        let viewer = repo
            .create(&AdminUser::new("viewer@example.com".into(), hash_password("pw").unwrap(), UserRole::Viewer))
            .await
            .unwrap();
        let viewer_token = TokenService::new("test-secret", 3600).issue(&viewer).unwrap();
        assert!(matches!(
            service.authenticate(&viewer_token).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_token_for_deleted_user_rejected() {
        let (service, _) = setup_test_service().await;
        let mut ghost = AdminUser::new("ghost@example.com".into(), "x".into(), UserRole::Admin);
        ghost.id = 999;
        let token = TokenService::new("test-secret", 3600).issue(&ghost).unwrap();
        assert!(matches!(
            service.authenticate(&token).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let (service, repo) = setup_test_service().await;
        assert!(service.bootstrap_admin("a@b.co", "pw").await.unwrap().is_some());
        assert!(service.bootstrap_admin("A@B.co", "other").await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 1);

        // The original password still works
        assert!(service.login(login("a@b.co", "pw")).await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_admin_falls_back_to_first_account() {
        let (service, repo) = setup_test_service().await;
        service.bootstrap_admin("owner@example.com", "old").await.unwrap();

        let reset = service.reset_admin("other@example.com", "new").await.unwrap();
        assert_eq!(reset.email, "owner@example.com");
        assert_eq!(repo.count().await.unwrap(), 1);
        assert!(service.login(login("owner@example.com", "new")).await.is_ok());
        assert!(service.login(login("owner@example.com", "old")).await.is_err());
    }

    #[tokio::test]
    async fn test_reset_admin_creates_when_empty() {
        let (service, repo) = setup_test_service().await;
        let created = service.reset_admin("new@example.com", "pw").await.unwrap();
        assert!(created.is_admin());
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
