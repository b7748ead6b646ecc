//! Progress model
//!
//! Tracks where a user stands on a topic. `status` is a free-form label such
//! as `not-started`, `in-progress` or `completed`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{field_path, Fields, Rule, Schema, ValidationError, Validator};
use super::Patch;

/// Longest accepted user or topic reference
pub const REFERENCE_MAX_CHARS: usize = 100;

/// Longest accepted status label
pub const STATUS_MAX_CHARS: usize = 50;

/// Longest accepted notes
pub const NOTES_MAX_CHARS: usize = 500;

fn check_references(v: &mut Validator, prefix: &str, user_id: &str, topic_id: &str) {
    v.max_chars(&field_path(prefix, "user_id"), user_id, REFERENCE_MAX_CHARS);
    v.max_chars(&field_path(prefix, "topic_id"), topic_id, REFERENCE_MAX_CHARS);
}

pub fn check_status(v: &mut Validator, path: &str, status: &str) {
    v.max_chars(path, status, STATUS_MAX_CHARS);
}

pub fn check_notes(v: &mut Validator, path: &str, notes: &str) {
    v.max_chars(path, notes, NOTES_MAX_CHARS);
}

/// New progress entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressCreate {
    pub user_id: String,
    pub topic_id: String,
    pub status: String,
    #[serde(default)]
    pub notes: String,
}

impl ProgressCreate {
    pub fn new(
        user_id: impl Into<String>,
        topic_id: impl Into<String>,
        status: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self::with_notes(user_id, topic_id, status, "")
    }

    pub fn with_notes(
        user_id: impl Into<String>,
        topic_id: impl Into<String>,
        status: impl Into<String>,
        notes: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self {
            user_id: user_id.into(),
            topic_id: topic_id.into(),
            status: status.into(),
            notes: notes.into(),
        }
        .validated()
    }
}

impl Schema for ProgressCreate {
    fn read(fields: &Fields<'_>, v: &mut Validator) -> Self {
        Self {
            user_id: fields.required_string(v, "user_id"),
            topic_id: fields.required_string(v, "topic_id"),
            status: fields.required_string(v, "status"),
            notes: fields.string_or(v, "notes", ""),
        }
    }

    fn check(&self, v: &mut Validator, prefix: &str) {
        check_references(v, prefix, &self.user_id, &self.topic_id);
        check_status(v, &field_path(prefix, "status"), &self.status);
        check_notes(v, &field_path(prefix, "notes"), &self.notes);
    }
}

/// Partial update of a progress entry.
///
/// An absent field is left unchanged. `notes: null` clears the notes;
/// `status: null` is rejected because a progress entry always has a status.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProgressUpdate {
    #[serde(skip_serializing_if = "Patch::is_absent")]
    pub status: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_absent")]
    pub notes: Patch<String>,
}

impl ProgressUpdate {
    pub fn new(status: Patch<String>, notes: Patch<String>) -> Result<Self, ValidationError> {
        Self { status, notes }.validated()
    }

    /// Update that only sets the status
    pub fn status(status: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(Patch::Value(status.into()), Patch::Absent)
    }

    /// Update that only sets the notes
    pub fn notes(notes: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(Patch::Absent, Patch::Value(notes.into()))
    }

    /// Check if the update mentions no field
    pub fn is_empty(&self) -> bool {
        self.status.is_absent() && self.notes.is_absent()
    }

    /// Apply to a stored entry, returning whether anything changed
    pub fn apply(&self, doc: &mut ProgressDocument) -> bool {
        let mut changed = false;

        if let Patch::Value(status) = &self.status {
            if doc.status != *status {
                doc.status = status.clone();
                changed = true;
            }
        }

        let notes = match &self.notes {
            Patch::Absent => None,
            Patch::Null => Some(""),
            Patch::Value(notes) => Some(notes.as_str()),
        };
        if let Some(notes) = notes {
            if doc.notes != notes {
                doc.notes = notes.to_string();
                changed = true;
            }
        }

        changed
    }
}

impl Schema for ProgressUpdate {
    fn read(fields: &Fields<'_>, v: &mut Validator) -> Self {
        Self {
            status: fields.patch_string(v, "status"),
            notes: fields.patch_string(v, "notes"),
        }
    }

    fn check(&self, v: &mut Validator, prefix: &str) {
        let status_path = field_path(prefix, "status");
        match &self.status {
            Patch::Null => v.push(status_path, Rule::NotNull, "status cannot be cleared"),
            Patch::Value(status) => check_status(v, &status_path, status),
            Patch::Absent => {}
        }
        if let Patch::Value(notes) = &self.notes {
            check_notes(v, &field_path(prefix, "notes"), notes);
        }
    }
}

/// Progress entry as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub id: String,
    pub user_id: String,
    pub topic_id: String,
    pub status: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schema for ProgressResponse {
    fn read(fields: &Fields<'_>, v: &mut Validator) -> Self {
        Self {
            id: fields.required_string(v, "id"),
            user_id: fields.required_string(v, "user_id"),
            topic_id: fields.required_string(v, "topic_id"),
            status: fields.required_string(v, "status"),
            notes: fields.string_or(v, "notes", ""),
            created_at: fields.required_datetime(v, "created_at"),
            updated_at: fields.required_datetime(v, "updated_at"),
        }
    }

    fn check(&self, v: &mut Validator, prefix: &str) {
        check_references(v, prefix, &self.user_id, &self.topic_id);
        check_status(v, &field_path(prefix, "status"), &self.status);
        check_notes(v, &field_path(prefix, "notes"), &self.notes);
    }
}

/// Stored form of a progress entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressDocument {
    pub user_id: String,
    pub topic_id: String,
    pub status: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressDocument {
    pub fn new(input: ProgressCreate, now: DateTime<Utc>) -> Self {
        Self {
            user_id: input.user_id,
            topic_id: input.topic_id,
            status: input.status,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_response(self, id: String) -> ProgressResponse {
        ProgressResponse {
            id,
            user_id: self.user_id,
            topic_id: self.topic_id,
            status: self.status,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_progress_create_valid() {
        let progress = ProgressCreate::with_notes(
            "user123",
            "js-closures",
            "in-progress",
            "Studying closures",
        )
        .expect("valid progress");

        assert_eq!(progress.user_id, "user123");
        assert_eq!(progress.topic_id, "js-closures");
        assert_eq!(progress.status, "in-progress");
        assert_eq!(progress.notes, "Studying closures");
    }

    #[test]
    fn test_progress_default_notes() {
        let progress = ProgressCreate::new("user123", "js-closures", "not-started").unwrap();
        assert_eq!(progress.notes, "");

        let from_json = ProgressCreate::from_json(&json!({
            "user_id": "user123",
            "topic_id": "js-closures",
            "status": "not-started"
        }))
        .unwrap();
        assert_eq!(from_json.notes, "");
    }

    #[test]
    fn test_progress_missing_required_fields() {
        let err = ProgressCreate::from_json(&json!({ "user_id": "user123" })).unwrap_err();
        assert!(err.has("topic_id", Rule::Required));
        assert!(err.has("status", Rule::Required));
        assert_eq!(err.errors().len(), 2);
    }

    #[test]
    fn test_progress_status_too_long() {
        let err = ProgressCreate::new("user123", "topic123", "a".repeat(51)).unwrap_err();
        assert!(err.has("status", Rule::MaxLength));
    }

    #[test]
    fn test_progress_notes_too_long() {
        let err = ProgressCreate::with_notes("user123", "topic123", "completed", "a".repeat(501))
            .unwrap_err();
        assert!(err.has("notes", Rule::MaxLength));
    }

    #[test]
    fn test_progress_reference_bounds() {
        assert!(ProgressCreate::new("a".repeat(100), "t", "completed").is_ok());
        let err = ProgressCreate::new("a".repeat(101), "b".repeat(101), "completed").unwrap_err();
        assert!(err.has("user_id", Rule::MaxLength));
        assert!(err.has("topic_id", Rule::MaxLength));
    }

    #[test]
    fn test_update_only_status() {
        let update = ProgressUpdate::status("completed").unwrap();
        assert_eq!(update.status, Patch::Value("completed".to_string()));
        assert!(update.notes.is_absent());
        assert_ne!(update.notes, Patch::Value(String::new()));
    }

    #[test]
    fn test_update_only_notes() {
        let update = ProgressUpdate::notes("Adding more information").unwrap();
        assert!(update.status.is_absent());
        assert_eq!(update.notes.value().map(String::as_str), Some("Adding more information"));
    }

    #[test]
    fn test_update_all_fields() {
        let update = ProgressUpdate::from_json(&json!({
            "status": "in-progress",
            "notes": "Continuing"
        }))
        .unwrap();
        assert_eq!(update.status.value().map(String::as_str), Some("in-progress"));
        assert_eq!(update.notes.value().map(String::as_str), Some("Continuing"));
    }

    #[test]
    fn test_update_from_json_tri_state() {
        let absent = ProgressUpdate::from_json(&json!({})).unwrap();
        assert!(absent.is_empty());

        let cleared = ProgressUpdate::from_json(&json!({ "notes": null })).unwrap();
        assert!(cleared.notes.is_null());

        let empty = ProgressUpdate::from_json(&json!({ "notes": "" })).unwrap();
        assert_eq!(empty.notes, Patch::Value(String::new()));
    }

    #[test]
    fn test_update_rejects_null_status_and_long_fields() {
        let err = ProgressUpdate::from_json(&json!({ "status": null })).unwrap_err();
        assert!(err.has("status", Rule::NotNull));

        let err = ProgressUpdate::new(
            Patch::Value("a".repeat(51)),
            Patch::Value("b".repeat(501)),
        )
        .unwrap_err();
        assert!(err.has("status", Rule::MaxLength));
        assert!(err.has("notes", Rule::MaxLength));
    }

    #[test]
    fn test_update_apply() {
        let now = Utc::now();
        let mut doc = ProgressDocument::new(
            ProgressCreate::with_notes("u1", "t1", "in-progress", "halfway").unwrap(),
            now,
        );

        assert!(!ProgressUpdate::default().apply(&mut doc));
        assert_eq!(doc.notes, "halfway");

        assert!(ProgressUpdate::status("completed").unwrap().apply(&mut doc));
        assert_eq!(doc.status, "completed");
        assert_eq!(doc.notes, "halfway");

        let clear = ProgressUpdate::new(Patch::Absent, Patch::Null).unwrap();
        assert!(clear.apply(&mut doc));
        assert_eq!(doc.notes, "");
        assert!(!clear.apply(&mut doc));
    }

    #[test]
    fn test_progress_response_valid() {
        let now = Utc::now();
        let response = ProgressDocument::new(
            ProgressCreate::with_notes("user789", "sql-joins", "completed", "Understood").unwrap(),
            now,
        )
        .into_response("progress123".to_string());

        assert!(response.validate().is_ok());
        assert_eq!(response.id, "progress123");
        assert_eq!(response.created_at, now);
        assert_eq!(response.updated_at, now);
    }

    #[test]
    fn test_progress_response_from_json_requires_timestamps() {
        let err = ProgressResponse::from_json(&json!({
            "id": "p1",
            "user_id": "u1",
            "topic_id": "t1",
            "status": "completed",
            "created_at": "not a date"
        }))
        .unwrap_err();
        assert!(err.has("created_at", Rule::Datetime));
        assert!(err.has("updated_at", Rule::Required));
    }
}
