//! Contact link model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::double_option;

/// Kind of contact channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactType {
    Email,
    Github,
    Linkedin,
    Instagram,
    Telegram,
    Other,
}

impl fmt::Display for ContactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContactType::Email => "email",
            ContactType::Github => "github",
            ContactType::Linkedin => "linkedin",
            ContactType::Instagram => "instagram",
            ContactType::Telegram => "telegram",
            ContactType::Other => "other",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ContactType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(ContactType::Email),
            "github" => Ok(ContactType::Github),
            "linkedin" => Ok(ContactType::Linkedin),
            "instagram" => Ok(ContactType::Instagram),
            "telegram" => Ok(ContactType::Telegram),
            "other" => Ok(ContactType::Other),
            _ => Err(anyhow::anyhow!("Invalid contact type: {}", s)),
        }
    }
}

/// Icon shown next to a contact link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactIcon {
    Mail,
    Github,
    Linkedin,
    Instagram,
    Send,
    Link,
}

impl fmt::Display for ContactIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContactIcon::Mail => "mail",
            ContactIcon::Github => "github",
            ContactIcon::Linkedin => "linkedin",
            ContactIcon::Instagram => "instagram",
            ContactIcon::Send => "send",
            ContactIcon::Link => "link",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ContactIcon {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mail" => Ok(ContactIcon::Mail),
            "github" => Ok(ContactIcon::Github),
            "linkedin" => Ok(ContactIcon::Linkedin),
            "instagram" => Ok(ContactIcon::Instagram),
            "send" => Ok(ContactIcon::Send),
            "link" => Ok(ContactIcon::Link),
            _ => Err(anyhow::anyhow!("Invalid contact icon: {}", s)),
        }
    }
}

/// A contact link listed on the public site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: i64,
    #[serde(rename = "type")]
    pub contact_type: ContactType,
    pub icon: Option<ContactIcon>,
    pub label: Option<String>,
    pub value: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a contact. Enum fields arrive as strings and are
/// checked by the service so bad values are reported per field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateContactInput {
    #[serde(rename = "type")]
    pub contact_type: String,
    pub icon: Option<String>,
    pub label: Option<String>,
    pub value: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateContactInput {
    #[serde(rename = "type")]
    pub contact_type: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub icon: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub label: Option<Option<String>>,
    pub value: Option<String>,
    pub sort_order: Option<i32>,
}

/// Message submitted through the public contact form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactMessageInput {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_type_roundtrip() {
        for s in ["email", "github", "linkedin", "instagram", "telegram", "other"] {
            assert_eq!(s.parse::<ContactType>().unwrap().to_string(), s);
        }
        assert!("phone".parse::<ContactType>().is_err());
        assert!("Email".parse::<ContactType>().is_err());
    }

    #[test]
    fn test_contact_icon_roundtrip() {
        for s in ["mail", "github", "linkedin", "instagram", "send", "link"] {
            assert_eq!(s.parse::<ContactIcon>().unwrap().to_string(), s);
        }
        assert!("phone".parse::<ContactIcon>().is_err());
    }

    #[test]
    fn test_contact_serializes_type_key() {
        let now = Utc::now();
        let contact = Contact {
            id: 1,
            contact_type: ContactType::Telegram,
            icon: Some(ContactIcon::Send),
            label: None,
            value: "@me".into(),
            sort_order: 0,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&contact).unwrap();
        assert_eq!(value["type"], "telegram");
        assert_eq!(value["icon"], "send");
        assert_eq!(value["sortOrder"], 0);
    }
}
