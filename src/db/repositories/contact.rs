//! Contact link repository

use crate::db::{Backend, DynDatabasePool};
use crate::models::{Contact, ContactIcon, ContactType};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const CONTACT_COLUMNS: &str =
    "id, contact_type, icon, label, value, sort_order, created_at, updated_at";

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create(&self, contact: &Contact) -> Result<Contact>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Contact>>;
    /// All contacts by sort order
    async fn list(&self) -> Result<Vec<Contact>>;
    async fn update(&self, contact: &Contact) -> Result<Contact>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxContactRepository {
    pool: DynDatabasePool,
}

impl SqlxContactRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContactRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ContactRepository for SqlxContactRepository {
    async fn create(&self, contact: &Contact) -> Result<Contact> {
        match self.pool.backend() {
            Backend::Sqlite(p) => create_sqlite(p, contact).await,
            Backend::Mysql(p) => create_mysql(p, contact).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Contact>> {
        match self.pool.backend() {
            Backend::Sqlite(p) => get_by_id_sqlite(p, id).await,
            Backend::Mysql(p) => get_by_id_mysql(p, id).await,
        }
    }

    async fn list(&self) -> Result<Vec<Contact>> {
        match self.pool.backend() {
            Backend::Sqlite(p) => list_sqlite(p).await,
            Backend::Mysql(p) => list_mysql(p).await,
        }
    }

    async fn update(&self, contact: &Contact) -> Result<Contact> {
        match self.pool.backend() {
            Backend::Sqlite(p) => update_sqlite(p, contact).await,
            Backend::Mysql(p) => update_mysql(p, contact).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM contacts WHERE id = ?";
        let affected = match self.pool.backend() {
            Backend::Sqlite(p) => sqlx::query(sql).bind(id).execute(p).await.map(|r| r.rows_affected()),
            Backend::Mysql(p) => sqlx::query(sql).bind(id).execute(p).await.map(|r| r.rows_affected()),
        }
        .context("Failed to delete contact")?;
        Ok(affected > 0)
    }
}

fn parse_icon(raw: Option<String>) -> Result<Option<ContactIcon>> {
    raw.map(|icon| icon.parse()).transpose()
}

// SQLite implementations
async fn create_sqlite(pool: &SqlitePool, contact: &Contact) -> Result<Contact> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO contacts (contact_type, icon, label, value, sort_order, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(contact.contact_type.to_string())
    .bind(contact.icon.map(|i| i.to_string()))
    .bind(&contact.label)
    .bind(&contact.value)
    .bind(contact.sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create contact")?;

    Ok(Contact {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..contact.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Contact>> {
    let row = sqlx::query(&format!("SELECT {} FROM contacts WHERE id = ?", CONTACT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get contact")?;
    row.map(|r| row_to_contact_sqlite(&r)).transpose()
}

async fn list_sqlite(pool: &SqlitePool) -> Result<Vec<Contact>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM contacts ORDER BY sort_order ASC, id ASC",
        CONTACT_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list contacts")?;
    rows.iter().map(row_to_contact_sqlite).collect()
}

async fn update_sqlite(pool: &SqlitePool, contact: &Contact) -> Result<Contact> {
    sqlx::query(
        "UPDATE contacts SET contact_type = ?, icon = ?, label = ?, value = ?, sort_order = ?, updated_at = ? WHERE id = ?",
    )
    .bind(contact.contact_type.to_string())
    .bind(contact.icon.map(|i| i.to_string()))
    .bind(&contact.label)
    .bind(&contact.value)
    .bind(contact.sort_order)
    .bind(Utc::now())
    .bind(contact.id)
    .execute(pool)
    .await
    .context("Failed to update contact")?;
    get_by_id_sqlite(pool, contact.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Contact not found after update"))
}

fn row_to_contact_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Contact> {
    let contact_type: String = row.try_get("contact_type")?;
    Ok(Contact {
        id: row.try_get("id")?,
        contact_type: contact_type.parse::<ContactType>()?,
        icon: parse_icon(row.try_get("icon")?)?,
        label: row.try_get("label")?,
        value: row.try_get("value")?,
        sort_order: row.try_get("sort_order")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// MySQL implementations
async fn create_mysql(pool: &MySqlPool, contact: &Contact) -> Result<Contact> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO contacts (contact_type, icon, label, value, sort_order, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(contact.contact_type.to_string())
    .bind(contact.icon.map(|i| i.to_string()))
    .bind(&contact.label)
    .bind(&contact.value)
    .bind(contact.sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create contact")?;

    Ok(Contact {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..contact.clone()
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Contact>> {
    let row = sqlx::query(&format!("SELECT {} FROM contacts WHERE id = ?", CONTACT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get contact")?;
    row.map(|r| row_to_contact_mysql(&r)).transpose()
}

async fn list_mysql(pool: &MySqlPool) -> Result<Vec<Contact>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM contacts ORDER BY sort_order ASC, id ASC",
        CONTACT_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list contacts")?;
    rows.iter().map(row_to_contact_mysql).collect()
}

async fn update_mysql(pool: &MySqlPool, contact: &Contact) -> Result<Contact> {
    sqlx::query(
        "UPDATE contacts SET contact_type = ?, icon = ?, label = ?, value = ?, sort_order = ?, updated_at = ? WHERE id = ?",
    )
    .bind(contact.contact_type.to_string())
    .bind(contact.icon.map(|i| i.to_string()))
    .bind(&contact.label)
    .bind(&contact.value)
    .bind(contact.sort_order)
    .bind(Utc::now())
    .bind(contact.id)
    .execute(pool)
    .await
    .context("Failed to update contact")?;
    get_by_id_mysql(pool, contact.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Contact not found after update"))
}

fn row_to_contact_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Contact> {
    let contact_type: String = row.try_get("contact_type")?;
    Ok(Contact {
        id: row.try_get("id")?,
        contact_type: contact_type.parse::<ContactType>()?,
        icon: parse_icon(row.try_get("icon")?)?,
        label: row.try_get("label")?,
        value: row.try_get("value")?,
        sort_order: row.try_get("sort_order")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};

    async fn setup_test_repo() -> SqlxContactRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        SqlxContactRepository::new(pool)
    }

    fn sample(contact_type: ContactType, value: &str, sort_order: i32) -> Contact {
        let now = Utc::now();
        Contact {
            id: 0,
            contact_type,
            icon: None,
            label: None,
            value: value.to_string(),
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_list_sorted() {
        let repo = setup_test_repo().await;
        let mut github = sample(ContactType::Github, "https://github.com/me", 2);
        github.icon = Some(ContactIcon::Github);
        repo.create(&github).await.unwrap();
        repo.create(&sample(ContactType::Email, "me@example.com", 1)).await.unwrap();

        let contacts = repo.list().await.unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].contact_type, ContactType::Email);
        assert_eq!(contacts[1].icon, Some(ContactIcon::Github));
    }

    #[tokio::test]
    async fn test_update_clears_optional_fields() {
        let repo = setup_test_repo().await;
        let mut contact = sample(ContactType::Telegram, "@me", 0);
        contact.label = Some("Telegram".into());
        contact.icon = Some(ContactIcon::Send);
        let mut created = repo.create(&contact).await.unwrap();

        created.label = None;
        created.icon = None;
        let updated = repo.update(&created).await.unwrap();
        assert!(updated.label.is_none());
        assert!(updated.icon.is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_returns_false() {
        let repo = setup_test_repo().await;
        assert!(!repo.delete(42).await.unwrap());
    }
}
