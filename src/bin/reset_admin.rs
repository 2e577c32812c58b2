//! CLI tool to reset the admin password.
//!
//! Usage: `cargo run --bin reset-admin -- [email] [password]`
//!
//! Missing arguments fall back to `auth.admin_email` / `auth.admin_password`
//! from the configuration. The account with that email is updated, or the
//! oldest account when none matches; an account is created if there are none.

use anyhow::{bail, Result};
use std::path::Path;

use folio::{
    config::Config,
    db::{self, repositories::SqlxAdminUserRepository},
    services::{AuthService, TokenService},
};

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let config = Config::load_with_env(Path::new("config.yml"))?;

    let email = args.next().or_else(|| config.auth.admin_email.clone());
    let password = args.next().or_else(|| config.auth.admin_password.clone());
    let (Some(email), Some(password)) = (email, password) else {
        bail!("Usage: reset-admin <email> <password> (or set FOLIO_AUTH_ADMIN_EMAIL / FOLIO_AUTH_ADMIN_PASSWORD)");
    };
    if password.is_empty() {
        bail!("Password must not be empty");
    }

    let pool = db::create_pool(&config.database).await?;
    db::migrations::run_migrations(&pool).await?;

    let tokens = TokenService::new(&config.auth.jwt_secret, config.auth.token_ttl_seconds);
    let auth = AuthService::new(SqlxAdminUserRepository::boxed(pool), tokens);
    let user = auth.reset_admin(&email, &password).await?;

    println!("Password updated for {} (id {})", user.email, user.id);
    Ok(())
}
