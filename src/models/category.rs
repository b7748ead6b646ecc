//! Category model
//!
//! Categories group topics. They only enter the store through the seed
//! catalog, so their rules are limited to field presence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{field_path, Fields, Schema, ValidationError, Validator};

/// Category entry, keyed by its external identifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    /// External identifier, also the storage key
    pub id: String,
    /// Display name
    pub name: String,
    /// Icon reference (file name or icon identifier)
    pub icon: String,
}

impl Category {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        icon: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
        }
        .validated()
    }
}

impl Schema for Category {
    fn read(fields: &Fields<'_>, v: &mut Validator) -> Self {
        Self {
            id: fields.required_string(v, "id"),
            name: fields.required_string(v, "name"),
            icon: fields.required_string(v, "icon"),
        }
    }

    fn check(&self, v: &mut Validator, prefix: &str) {
        // the id becomes a document key
        v.min_chars(&field_path(prefix, "id"), &self.id, 1);
    }
}

/// Stored form of a category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryDocument {
    pub name: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
}

impl CategoryDocument {
    /// Split a category into its key and stored fields
    pub fn new(category: Category, created_at: DateTime<Utc>) -> (String, Self) {
        (
            category.id,
            Self {
                name: category.name,
                icon: category.icon,
                created_at,
            },
        )
    }

    pub fn into_category(self, id: String) -> Category {
        Category {
            id,
            name: self.name,
            icon: self.icon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rule;
    use serde_json::json;

    #[test]
    fn test_category_new() {
        let category = Category::new("js", "JavaScript", "js.svg").expect("valid category");

        assert_eq!(category.id, "js");
        assert_eq!(category.name, "JavaScript");
        assert_eq!(category.icon, "js.svg");
    }

    #[test]
    fn test_category_requires_id() {
        let err = Category::new("", "JavaScript", "js.svg").unwrap_err();
        assert!(err.has("id", Rule::MinLength));
    }

    #[test]
    fn test_category_from_json_missing_fields() {
        let err = Category::from_json(&json!({ "id": "js" })).unwrap_err();

        assert!(err.has("name", Rule::Required));
        assert!(err.has("icon", Rule::Required));
        assert!(!err.has_field("id"));
    }

    #[test]
    fn test_category_document_roundtrip_keeps_key_outside() {
        let category = Category::new("py", "Python", "py.svg").unwrap();
        let (id, doc) = CategoryDocument::new(category.clone(), Utc::now());

        assert_eq!(id, "py");
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["name"], "Python");

        assert_eq!(doc.into_category(id), category);
    }
}
