//! Topic model
//!
//! A topic is one study unit of the catalog: a title, the category it belongs
//! to, and an ordered list of detail lines. Topics are written by the seed
//! loader and read back through the catalog API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{field_path, Fields, Schema, ValidationError, Validator};

/// Longest accepted topic title
pub const TITLE_MAX_CHARS: usize = 100;

/// Longest accepted category identifier
pub const CATEGORY_ID_MAX_CHARS: usize = 50;

/// Title: 1 to 100 characters
pub fn check_title(v: &mut Validator, path: &str, title: &str) {
    v.min_chars(path, title, 1);
    v.max_chars(path, title, TITLE_MAX_CHARS);
}

/// Category reference: lowercase slug of at most 50 characters
pub fn check_category_id(v: &mut Validator, path: &str, category_id: &str) {
    v.max_chars(path, category_id, CATEGORY_ID_MAX_CHARS);
    v.slug(path, category_id);
}

/// Details: at least one entry, at least one of them non-blank
pub fn check_details(v: &mut Validator, path: &str, details: &[String]) {
    v.non_blank_entries(path, details);
}

/// Topic as submitted for creation (and as found in the seed catalog)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCreate {
    pub title: String,
    pub category_id: String,
    pub details: Vec<String>,
}

impl TopicCreate {
    pub fn new(
        title: impl Into<String>,
        category_id: impl Into<String>,
        details: Vec<String>,
    ) -> Result<Self, ValidationError> {
        Self {
            title: title.into(),
            category_id: category_id.into(),
            details,
        }
        .validated()
    }
}

impl Schema for TopicCreate {
    fn read(fields: &Fields<'_>, v: &mut Validator) -> Self {
        Self {
            title: fields.required_string(v, "title"),
            category_id: fields.required_string(v, "category_id"),
            details: fields.required_string_list(v, "details"),
        }
    }

    fn check(&self, v: &mut Validator, prefix: &str) {
        check_title(v, &field_path(prefix, "title"), &self.title);
        check_category_id(v, &field_path(prefix, "category_id"), &self.category_id);
        check_details(v, &field_path(prefix, "details"), &self.details);
    }
}

/// Topic as returned to callers, keyed by its external identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicResponse {
    /// External identifier, e.g. `js-closures`
    pub id: String,
    pub title: String,
    pub category_id: String,
    pub details: Vec<String>,
}

impl TopicResponse {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        category_id: impl Into<String>,
        details: Vec<String>,
    ) -> Result<Self, ValidationError> {
        Self {
            id: id.into(),
            title: title.into(),
            category_id: category_id.into(),
            details,
        }
        .validated()
    }
}

impl Schema for TopicResponse {
    fn read(fields: &Fields<'_>, v: &mut Validator) -> Self {
        Self {
            id: fields.required_string(v, "id"),
            title: fields.required_string(v, "title"),
            category_id: fields.required_string(v, "category_id"),
            details: fields.required_string_list(v, "details"),
        }
    }

    fn check(&self, v: &mut Validator, prefix: &str) {
        check_title(v, &field_path(prefix, "title"), &self.title);
        check_category_id(v, &field_path(prefix, "category_id"), &self.category_id);
        check_details(v, &field_path(prefix, "details"), &self.details);
    }
}

/// Stored form of a topic. The id is the document key, not a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicDocument {
    pub title: String,
    pub category_id: String,
    pub details: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl TopicDocument {
    pub fn new(topic: TopicCreate, created_at: DateTime<Utc>) -> Self {
        Self {
            title: topic.title,
            category_id: topic.category_id,
            details: topic.details,
            created_at,
        }
    }

    pub fn into_response(self, id: String) -> TopicResponse {
        TopicResponse {
            id,
            title: self.title,
            category_id: self.category_id,
            details: self.details,
        }
    }
}
