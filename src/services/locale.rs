//! Multilingual field projection
//!
//! Content records carry every translatable field three times, with an
//! `En`, `Ru` or `Uz` suffix (`titleEn`, `titleRu`, `titleUz`). Public
//! endpoints project a record onto a single locale: the suffixed keys for
//! that locale collapse to the bare field name (`title`) and the other
//! variants are dropped. Keys without a locale suffix pass through.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// A supported content locale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    #[default]
    En,
    Ru,
    Uz,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::En, Locale::Ru, Locale::Uz];

    /// Parse a `lang` query value.
    ///
    /// Only the first two characters are considered, case-insensitively, so
    /// `ru-RU` and `RU` both select Russian. Anything unrecognized is English.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Locale::En;
        };
        let prefix: String = raw.chars().take(2).collect::<String>().to_lowercase();
        match prefix.as_str() {
            "ru" => Locale::Ru,
            "uz" => Locale::Uz,
            _ => Locale::En,
        }
    }

    /// Key suffix used for this locale's field variants
    pub fn suffix(self) -> &'static str {
        match self {
            Locale::En => "En",
            Locale::Ru => "Ru",
            Locale::Uz => "Uz",
        }
    }

    /// Split a key into its base name and locale, if it carries a suffix
    pub fn split_key(key: &str) -> Option<(&str, Locale)> {
        Locale::ALL.iter().find_map(|locale| {
            key.strip_suffix(locale.suffix())
                .filter(|base| !base.is_empty())
                .map(|base| (base, *locale))
        })
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Ru => write!(f, "ru"),
            Locale::Uz => write!(f, "uz"),
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Project a JSON record onto `locale`.
///
/// If the requested variant is missing or blank, the English variant is used
/// instead. Non-object values are returned unchanged.
pub fn project(record: &Value, locale: Locale) -> Value {
    let Value::Object(fields) = record else {
        return record.clone();
    };

    let mut projected = Map::with_capacity(fields.len());
    for (key, value) in fields {
        match Locale::split_key(key) {
            None => {
                projected.insert(key.clone(), value.clone());
            }
            Some((base, variant)) if variant == locale => {
                let chosen = if is_blank(value) && locale != Locale::En {
                    fields
                        .get(&format!("{}{}", base, Locale::En.suffix()))
                        .filter(|fallback| !is_blank(fallback))
                        .unwrap_or(value)
                } else {
                    value
                };
                projected.insert(base.to_string(), chosen.clone());
            }
            Some((base, Locale::En)) => {
                // English is the fallback when the requested variant is absent.
                let requested = format!("{}{}", base, locale.suffix());
                if !fields.contains_key(&requested) && !projected.contains_key(base) {
                    projected.insert(base.to_string(), value.clone());
                }
            }
            Some(_) => {}
        }
    }

    Value::Object(projected)
}

/// Serialize `item` and project it onto `locale`
pub fn localize<T: Serialize>(item: &T, locale: Locale) -> Value {
    match serde_json::to_value(item) {
        Ok(value) => project(&value, locale),
        Err(e) => {
            tracing::error!("Failed to serialize record for projection: {}", e);
            Value::Null
        }
    }
}

/// Project every item of a list onto `locale`
pub fn localize_all<T: Serialize>(items: &[T], locale: Locale) -> Vec<Value> {
    items.iter().map(|item| localize(item, locale)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_locale() {
        assert_eq!(Locale::parse(None), Locale::En);
        assert_eq!(Locale::parse(Some("")), Locale::En);
        assert_eq!(Locale::parse(Some("ru")), Locale::Ru);
        assert_eq!(Locale::parse(Some("RU")), Locale::Ru);
        assert_eq!(Locale::parse(Some("ru-RU")), Locale::Ru);
        assert_eq!(Locale::parse(Some("uz")), Locale::Uz);
        assert_eq!(Locale::parse(Some("uzb")), Locale::Uz);
        assert_eq!(Locale::parse(Some("de")), Locale::En);
        assert_eq!(Locale::parse(Some("r")), Locale::En);
        assert_eq!(Locale::parse(Some(" ru")), Locale::En);
    }

    #[test]
    fn test_split_key() {
        assert_eq!(Locale::split_key("titleEn"), Some(("title", Locale::En)));
        assert_eq!(Locale::split_key("contentUz"), Some(("content", Locale::Uz)));
        assert_eq!(Locale::split_key("En"), None);
        assert_eq!(Locale::split_key("slug"), None);
        assert_eq!(Locale::split_key("hidden"), None);
    }

    #[test]
    fn test_project_selects_locale() {
        let record = json!({
            "id": 1,
            "slug": "hello",
            "titleEn": "Hello",
            "titleRu": "Привет",
            "titleUz": "Salom",
            "published": true
        });

        assert_eq!(
            project(&record, Locale::Ru),
            json!({"id": 1, "slug": "hello", "title": "Привет", "published": true})
        );
        assert_eq!(
            project(&record, Locale::En),
            json!({"id": 1, "slug": "hello", "title": "Hello", "published": true})
        );
    }

    #[test]
    fn test_project_falls_back_to_english_when_blank() {
        let record = json!({"titleEn": "Hello", "titleRu": "", "titleUz": null});
        assert_eq!(project(&record, Locale::Ru), json!({"title": "Hello"}));
        assert_eq!(project(&record, Locale::Uz), json!({"title": "Hello"}));
    }

    #[test]
    fn test_project_falls_back_to_english_when_missing() {
        let record = json!({"titleEn": "Hello", "descriptionRu": "Описание"});
        assert_eq!(
            project(&record, Locale::Ru),
            json!({"title": "Hello", "description": "Описание"})
        );
        assert_eq!(project(&record, Locale::Uz), json!({"title": "Hello"}));
    }

    #[test]
    fn test_project_non_object_unchanged() {
        assert_eq!(project(&json!([1, 2]), Locale::Ru), json!([1, 2]));
        assert_eq!(project(&json!("x"), Locale::Uz), json!("x"));
    }

    #[test]
    fn test_localize_serializable() {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Item {
            title_en: String,
            title_ru: String,
            title_uz: String,
            sort_order: i32,
        }

        let item = Item {
            title_en: "Backend".into(),
            title_ru: "Бэкенд".into(),
            title_uz: "Bekend".into(),
            sort_order: 2,
        };

        assert_eq!(
            localize(&item, Locale::Uz),
            json!({"title": "Bekend", "sortOrder": 2})
        );
        assert_eq!(localize_all(&[item], Locale::En).len(), 1);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn locale_strategy() -> impl Strategy<Value = Locale> {
        prop_oneof![Just(Locale::En), Just(Locale::Ru), Just(Locale::Uz)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Projection yields the L-suffixed value under the base name and
        /// leaves plain fields untouched
        #[test]
        fn property_projection_picks_requested_variant(
            base in "[a-z]{1,8}",
            plain in "[a-z]{1,8}",
            en in "[A-Za-z]{1,12}",
            ru in "[A-Za-z]{1,12}",
            uz in "[A-Za-z]{1,12}",
            plain_value in any::<i64>(),
            locale in locale_strategy(),
        ) {
            let record = json!({
                format!("{}En", base): en.clone(),
                format!("{}Ru", base): ru.clone(),
                format!("{}Uz", base): uz.clone(),
                format!("{}_id", plain): plain_value,
            });

            let projected = project(&record, locale);
            let expected = match locale {
                Locale::En => en,
                Locale::Ru => ru,
                Locale::Uz => uz,
            };

            prop_assert_eq!(&projected[base.as_str()], &json!(expected));
            prop_assert_eq!(&projected[format!("{}_id", plain).as_str()], &json!(plain_value));
            let ru_key = format!("{}Ru", base);
            prop_assert!(projected.get(&ru_key).is_none());
            prop_assert_eq!(projected.as_object().map(|m| m.len()), Some(2));
        }
    }
}
