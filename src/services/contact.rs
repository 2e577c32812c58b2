//! Contact service
//!
//! Contact links shown on the site, and the public contact form.

use crate::db::repositories::ContactRepository;
use crate::models::{
    Contact, ContactIcon, ContactMessageInput, ContactType, CreateContactInput, UpdateContactInput,
};
use crate::services::error::ServiceError;
use crate::services::notifier::DynNotifier;
use crate::services::validation::{is_valid_email, ValidationErrors};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

const LABEL_MAX: usize = 100;
const VALUE_MAX: usize = 500;
const NAME_MAX: usize = 100;
const EMAIL_MAX: usize = 255;
const MESSAGE_MAX: usize = 2000;

pub struct ContactService {
    repo: Arc<dyn ContactRepository>,
    notifier: Option<DynNotifier>,
}

impl ContactService {
    pub fn new(repo: Arc<dyn ContactRepository>, notifier: Option<DynNotifier>) -> Self {
        Self { repo, notifier }
    }

    pub async fn list(&self) -> Result<Vec<Contact>, ServiceError> {
        Ok(self.repo.list().await?)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Contact, ServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get contact")?
            .ok_or(ServiceError::NotFound("Contact"))
    }

    pub async fn create(&self, input: CreateContactInput) -> Result<Contact, ServiceError> {
        let mut errors = ValidationErrors::new();
        let contact_type = parse_type(&mut errors, &input.contact_type);
        let icon = parse_icon(&mut errors, input.icon.as_deref());
        errors.check_optional_len("label", input.label.as_deref(), LABEL_MAX);
        errors.check_len("value", &input.value, 1, VALUE_MAX);
        errors.into_result()?;

        let now = Utc::now();
        let contact = Contact {
            id: 0,
            // parse_type only returns None after recording an error
            contact_type: contact_type.unwrap_or(ContactType::Other),
            icon,
            label: input.label,
            value: input.value,
            sort_order: input.sort_order,
            created_at: now,
            updated_at: now,
        };
        Ok(self.repo.create(&contact).await?)
    }

    pub async fn update(&self, id: i64, input: UpdateContactInput) -> Result<Contact, ServiceError> {
        let mut errors = ValidationErrors::new();
        let contact_type = input
            .contact_type
            .as_deref()
            .map(|raw| parse_type(&mut errors, raw));
        let icon = input
            .icon
            .as_ref()
            .map(|raw| parse_icon(&mut errors, raw.as_deref()));
        if let Some(label) = &input.label {
            errors.check_optional_len("label", label.as_deref(), LABEL_MAX);
        }
        if let Some(value) = &input.value {
            errors.check_len("value", value, 1, VALUE_MAX);
        }
        errors.into_result()?;

        let mut contact = self.get_by_id(id).await?;
        if let Some(Some(contact_type)) = contact_type {
            contact.contact_type = contact_type;
        }
        if let Some(icon) = icon {
            contact.icon = icon;
        }
        if let Some(label) = input.label {
            contact.label = label;
        }
        if let Some(value) = input.value {
            contact.value = value;
        }
        if let Some(sort_order) = input.sort_order {
            contact.sort_order = sort_order;
        }

        Ok(self.repo.update(&contact).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound("Contact"))
        }
    }

    /// Validate a contact form message and hand it to the notifier.
    ///
    /// Delivery runs in the background; failures are only logged.
    pub async fn send_message(&self, input: ContactMessageInput) -> Result<(), ServiceError> {
        let message = validate_message(input)?;

        let notifier = self
            .notifier
            .clone()
            .ok_or(ServiceError::Unavailable("Contact form is not configured"))?;

        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&message).await {
                tracing::warn!("Failed to deliver contact message: {}", e);
            }
        });
        Ok(())
    }
}

fn parse_type(errors: &mut ValidationErrors, raw: &str) -> Option<ContactType> {
    match raw.parse() {
        Ok(t) => Some(t),
        Err(_) => {
            errors.add(
                "type",
                "Must be one of email, github, linkedin, instagram, telegram, other",
            );
            None
        }
    }
}

fn parse_icon(errors: &mut ValidationErrors, raw: Option<&str>) -> Option<ContactIcon> {
    let raw = raw?;
    match raw.parse() {
        Ok(icon) => Some(icon),
        Err(_) => {
            errors.add(
                "icon",
                "Must be one of mail, github, linkedin, instagram, send, link",
            );
            None
        }
    }
}

/// Trim and check a contact form submission
fn validate_message(input: ContactMessageInput) -> Result<ContactMessageInput, ValidationErrors> {
    let message = ContactMessageInput {
        name: input.name.trim().to_string(),
        email: input.email.trim().to_string(),
        message: input.message.trim().to_string(),
    };

    let mut errors = ValidationErrors::new();
    errors.check_len("name", &message.name, 1, NAME_MAX);
    if !is_valid_email(&message.email) {
        errors.add("email", "Invalid email");
    } else {
        errors.check_len("email", &message.email, 1, EMAIL_MAX);
    }
    errors.check_len("message", &message.message, 1, MESSAGE_MAX);
    errors.into_result()?;
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxContactRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::services::notifier::Notifier;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    struct ChannelNotifier(mpsc::UnboundedSender<ContactMessageInput>);

    #[async_trait]
    impl Notifier for ChannelNotifier {
        async fn notify(&self, message: &ContactMessageInput) -> anyhow::Result<()> {
            self.0.send(message.clone())?;
            Ok(())
        }
    }

    async fn setup_test_service(notifier: Option<DynNotifier>) -> ContactService {
        let pool = create_test_pool()
            .await
            .expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        ContactService::new(SqlxContactRepository::boxed(pool), notifier)
    }

    fn github() -> CreateContactInput {
        CreateContactInput {
            contact_type: "github".into(),
            icon: Some("github".into()),
            label: Some("GitHub".into()),
            value: "https://github.com/me".into(),
            sort_order: 1,
        }
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let service = setup_test_service(None).await;
        let created = service.create(github()).await.unwrap();
        let fetched = service.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched.contact_type, ContactType::Github);
        assert_eq!(fetched.icon, Some(ContactIcon::Github));
        assert_eq!(fetched.label.as_deref(), Some("GitHub"));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_enums() {
        let service = setup_test_service(None).await;
        let input = CreateContactInput {
            contact_type: "fax".into(),
            icon: Some("phone".into()),
            label: Some("x".repeat(101)),
            value: String::new(),
            sort_order: 0,
        };
        match service.create(input).await {
            Err(ServiceError::Validation(errors)) => {
                let paths: Vec<&str> = errors.errors().iter().map(|e| e.path.as_str()).collect();
                assert_eq!(paths, vec!["type", "icon", "label", "value"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_null_clears_icon() {
        let service = setup_test_service(None).await;
        let created = service.create(github()).await.unwrap();
        let input: UpdateContactInput =
            serde_json::from_value(serde_json::json!({"icon": null, "type": "other"})).unwrap();
        let updated = service.update(created.id, input).await.unwrap();
        assert!(updated.icon.is_none());
        assert_eq!(updated.contact_type, ContactType::Other);
        assert_eq!(updated.label.as_deref(), Some("GitHub"));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let service = setup_test_service(None).await;
        assert!(matches!(
            service.update(99, UpdateContactInput::default()).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(service.delete(99).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_send_message_unconfigured() {
        let service = setup_test_service(None).await;
        let input = ContactMessageInput {
            name: "Ann".into(),
            email: "ann@example.com".into(),
            message: "Hi".into(),
        };
        assert!(matches!(
            service.send_message(input).await,
            Err(ServiceError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_send_message_validates_before_config_check() {
        let service = setup_test_service(None).await;
        let input = ContactMessageInput {
            name: "   ".into(),
            email: "not-an-email".into(),
            message: "x".repeat(2001),
        };
        match service.send_message(input).await {
            Err(ServiceError::Validation(errors)) => assert_eq!(errors.errors().len(), 3),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_message_delivers_trimmed() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = setup_test_service(Some(Arc::new(ChannelNotifier(tx)))).await;
        let input = ContactMessageInput {
            name: "  Ann ".into(),
            email: " ann@example.com ".into(),
            message: " Hello there ".into(),
        };
        service.send_message(input).await.unwrap();

        let delivered = rx.recv().await.unwrap();
        assert_eq!(delivered.name, "Ann");
        assert_eq!(delivered.email, "ann@example.com");
        assert_eq!(delivered.message, "Hello there");
    }
}
