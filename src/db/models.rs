//! Database Models - the site document and the row it is stored in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{types::Json, FromRow};

/// Top-level section keys the admin panel edits.
pub mod section {
    pub const HERO: &str = "hero";
    pub const ABOUT: &str = "about";
    pub const TELEGRAM: &str = "telegram";
    pub const SHIRTS_TITLE: &str = "shirtsTitle";
    pub const SHIRTS: &str = "shirts";
    pub const DISCOUNTS: &str = "discounts";
    pub const FOOTER: &str = "footer";
}

/// The single editable document behind the landing page.
///
/// Kept as the JSON object the admin panel sent. Nothing below the top level
/// is validated or coerced, so whatever was saved is exactly what is read
/// back. The renderer reads fields through [`Document::lookup`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn section(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Replaces a top-level section; `None` removes it.
    pub fn set_section(&mut self, key: &str, value: Option<Value>) {
        match value {
            Some(value) => {
                self.0.insert(key.to_string(), value);
            }
            None => {
                self.0.remove(key);
            }
        }
    }

    /// Follows object keys from the top level. `None` as soon as a key is
    /// missing or a step is not an object.
    pub fn lookup(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.0.get(*first)?, |value, key| value.as_object()?.get(*key))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Row in `site_data`
#[derive(Debug, Clone, FromRow)]
pub struct SiteDataRow {
    pub id: i32,
    pub data: Json<Document>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_object_is_empty_document() {
        let empty = doc(json!({}));
        assert_eq!(empty, Document::default());
        assert!(empty.is_empty());
        assert_eq!(serde_json::to_value(&empty).unwrap(), json!({}));
    }

    #[test]
    fn test_non_object_document_is_rejected() {
        assert!(serde_json::from_value::<Document>(json!([1, 2])).is_err());
        assert!(serde_json::from_value::<Document>(json!("text")).is_err());
    }

    #[test]
    fn test_irregular_shapes_are_kept_verbatim() {
        let input = json!({
            "hero": "just a string",
            "about": { "title": { "es": "Sobre", "en": "About" }, "desc1": null },
            "discounts": { "validCodes": ["A", 2025, null], "newPrice": 19.99 },
            "footer": { "year": 2030 },
            "banner": { "enabled": true }
        });
        assert_eq!(serde_json::to_value(doc(input.clone())).unwrap(), input);
    }

    #[test]
    fn test_shirt_descriptions_keep_every_key() {
        let input = json!({
            "shirts": [
                { "id": "a", "desc": "plain text" },
                { "id": "b", "desc": { "intro": "Hi", "details": ["one"], "badge": "new" } },
                { "id": "c", "desc": {} }
            ]
        });
        let stored = doc(input.clone());
        assert_eq!(stored.lookup(&["shirts"]), input.get("shirts"));
        assert_eq!(serde_json::to_value(stored).unwrap(), input);
    }

    #[test]
    fn test_lookup_follows_objects_only() {
        let d = doc(json!({
            "hero": { "title": "T" },
            "telegram": "flat",
            "footer": { "year": 2030 }
        }));

        assert_eq!(d.lookup(&["hero", "title"]), Some(&json!("T")));
        assert_eq!(d.lookup(&["footer", "year"]), Some(&json!(2030)));
        assert_eq!(d.lookup(&["telegram", "link"]), None);
        assert_eq!(d.lookup(&["hero", "title", "deeper"]), None);
        assert_eq!(d.lookup(&["about", "title"]), None);
        assert_eq!(d.lookup(&[]), None);
    }

    #[test]
    fn test_set_section_replaces_and_removes() {
        let mut d = doc(json!({ "hero": { "title": "Old" }, "about": { "title": "A" } }));

        d.set_section(section::HERO, Some(json!({ "desc": "New" })));
        d.set_section(section::ABOUT, None);
        d.set_section(section::FOOTER, Some(Value::Null));

        assert_eq!(
            serde_json::to_value(d).unwrap(),
            json!({ "hero": { "desc": "New" }, "footer": null })
        );
    }
}
