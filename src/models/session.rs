//! Study session model
//!
//! A session request names topics by id; the response carries a snapshot of
//! each topic. The snapshot is a projection with looser rules than the
//! catalog topic: its details may be empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{field_path, index_path, Fields, Schema, ValidationError, Validator};

/// Longest accepted user, topic or category reference in a session
pub const REFERENCE_MAX_CHARS: usize = 100;

/// Longest accepted topic title in a session snapshot
pub const ITEM_TITLE_MAX_CHARS: usize = 200;

/// Request to open a study session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub user_id: String,
    /// Topics to study, in order; may be empty
    pub topic_ids: Vec<String>,
}

impl SessionRequest {
    pub fn new(user_id: impl Into<String>, topic_ids: Vec<String>) -> Result<Self, ValidationError> {
        Self {
            user_id: user_id.into(),
            topic_ids,
        }
        .validated()
    }
}

impl Schema for SessionRequest {
    fn read(fields: &Fields<'_>, v: &mut Validator) -> Self {
        Self {
            user_id: fields.required_string(v, "user_id"),
            topic_ids: fields.required_string_list(v, "topic_ids"),
        }
    }

    fn check(&self, v: &mut Validator, prefix: &str) {
        v.max_chars(&field_path(prefix, "user_id"), &self.user_id, REFERENCE_MAX_CHARS);
    }
}

/// Topic snapshot inside a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionItem {
    pub topic_id: String,
    pub title: String,
    pub category_id: String,
    #[serde(default)]
    pub details: Vec<String>,
}

impl SessionItem {
    pub fn new(
        topic_id: impl Into<String>,
        title: impl Into<String>,
        category_id: impl Into<String>,
        details: Vec<String>,
    ) -> Result<Self, ValidationError> {
        Self {
            topic_id: topic_id.into(),
            title: title.into(),
            category_id: category_id.into(),
            details,
        }
        .validated()
    }
}

impl Schema for SessionItem {
    fn read(fields: &Fields<'_>, v: &mut Validator) -> Self {
        Self {
            topic_id: fields.required_string(v, "topic_id"),
            title: fields.required_string(v, "title"),
            category_id: fields.required_string(v, "category_id"),
            details: fields.string_list_or_empty(v, "details"),
        }
    }

    fn check(&self, v: &mut Validator, prefix: &str) {
        v.max_chars(&field_path(prefix, "topic_id"), &self.topic_id, REFERENCE_MAX_CHARS);
        v.max_chars(&field_path(prefix, "title"), &self.title, ITEM_TITLE_MAX_CHARS);
        v.max_chars(&field_path(prefix, "category_id"), &self.category_id, REFERENCE_MAX_CHARS);
    }
}

/// Study session as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub topics: Vec<SessionItem>,
}

impl Schema for SessionResponse {
    fn read(fields: &Fields<'_>, v: &mut Validator) -> Self {
        let topics = fields
            .objects_or_empty(v, "topics")
            .iter()
            .map(|item| SessionItem::read(item, v))
            .collect();

        Self {
            session_id: fields.required_string(v, "session_id"),
            user_id: fields.required_string(v, "user_id"),
            created_at: fields.required_datetime(v, "created_at"),
            topics,
        }
    }

    fn check(&self, v: &mut Validator, prefix: &str) {
        let topics_path = field_path(prefix, "topics");
        for (i, item) in self.topics.iter().enumerate() {
            item.check(v, &index_path(&topics_path, i));
        }
    }
}

/// Stored form of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDocument {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub topics: Vec<SessionItem>,
}

impl SessionDocument {
    pub fn into_response(self, session_id: String) -> SessionResponse {
        SessionResponse {
            session_id,
            user_id: self.user_id,
            created_at: self.created_at,
            topics: self.topics,
        }
    }
}
