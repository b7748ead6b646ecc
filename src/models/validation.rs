//! Validation engine
//!
//! Every projection is built through a [`Validator`], which records each
//! failed rule as a [`FieldError`] instead of stopping at the first one.
//! A field that already failed is skipped by the rules that follow, so a
//! missing `details` list reports `required` and nothing else.
//!
//! Raw input arrives as JSON. [`Fields`] reads typed values out of a JSON
//! object and records presence and type failures into the same validator,
//! which lets one construction attempt report shape and rule problems
//! together.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::Patch;

static SLUG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").expect("slug pattern is valid"));

// Letters and digits from any script are allowed (RFC 6531 local parts,
// internationalized domain labels).
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[\p{L}\p{M}\p{N}.!#$%&'*+/=?^_`{|}~-]+@[\p{L}\p{N}](?:[\p{L}\p{M}\p{N}-]{0,61}[\p{L}\p{M}\p{N}])?(?:\.[\p{L}\p{N}](?:[\p{L}\p{M}\p{N}-]{0,61}[\p{L}\p{M}\p{N}])?)+$",
    )
    .expect("email pattern is valid")
});

/// Longest accepted email address (RFC 5321 path limit minus the brackets)
const EMAIL_MAX_CHARS: usize = 254;

/// Longest accepted local part of an email address
const EMAIL_LOCAL_MAX_CHARS: usize = 64;

/// The rule a field violated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Field is missing
    Required,
    /// Field has the wrong JSON type
    Type,
    /// String is longer than allowed
    MaxLength,
    /// String is shorter than allowed
    MinLength,
    /// String does not match the identifier pattern
    Pattern,
    /// List has no elements
    NonEmpty,
    /// List has only blank elements
    NotBlank,
    /// String is not an email address
    Email,
    /// Field was explicitly null where a value is required
    NotNull,
    /// String is not an RFC 3339 timestamp
    Datetime,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Type => "type",
            Rule::MaxLength => "max_length",
            Rule::MinLength => "min_length",
            Rule::Pattern => "pattern",
            Rule::NonEmpty => "non_empty",
            Rule::NotBlank => "not_blank",
            Rule::Email => "email",
            Rule::NotNull => "not_null",
            Rule::Datetime => "datetime",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single violated rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the field, e.g. `topics[2].title`
    pub field_path: String,
    pub rule: Rule,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field_path.is_empty() {
            write!(f, "{} ({})", self.message, self.rule)
        } else {
            write!(f, "{}: {} ({})", self.field_path, self.message, self.rule)
        }
    }
}

/// Every rule violated by one construction attempt, in evaluation order.
///
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

impl ValidationError {
    /// Error with a single violation
    pub fn single(field_path: impl Into<String>, rule: Rule, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field_path: field_path.into(),
                rule,
                message: message.into(),
            }],
        }
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    /// Check whether `field_path` violated `rule`
    pub fn has(&self, field_path: &str, rule: Rule) -> bool {
        self.errors
            .iter()
            .any(|e| e.field_path == field_path && e.rule == rule)
    }

    /// Check whether `field_path` violated any rule
    pub fn has_field(&self, field_path: &str) -> bool {
        self.errors.iter().any(|e| e.field_path == field_path)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed")?;
        for (i, error) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}", sep, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Join a parent path and a field name
pub fn field_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// Path of one element of a list field
pub fn index_path(list_path: &str, index: usize) -> String {
    format!("{}[{}]", list_path, index)
}

/// Rule accumulator
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation
    pub fn push(&mut self, field_path: impl Into<String>, rule: Rule, message: impl Into<String>) {
        self.errors.push(FieldError {
            field_path: field_path.into(),
            rule,
            message: message.into(),
        });
    }

    /// Check if any rule failed for this field (or one of its elements)
    pub fn has_failed(&self, field_path: &str) -> bool {
        self.errors.iter().any(|e| {
            e.field_path == field_path
                || e.field_path
                    .strip_prefix(field_path)
                    .is_some_and(|rest| rest.starts_with('['))
        })
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Upper bound on character count, inclusive
    pub fn max_chars(&mut self, field_path: &str, value: &str, max: usize) {
        if self.has_failed(field_path) {
            return;
        }
        if value.chars().count() > max {
            self.push(
                field_path,
                Rule::MaxLength,
                format!("must be at most {} characters", max),
            );
        }
    }

    /// Lower bound on character count, inclusive
    pub fn min_chars(&mut self, field_path: &str, value: &str, min: usize) {
        if self.has_failed(field_path) {
            return;
        }
        if value.chars().count() < min {
            let message = if min == 1 {
                "must not be empty".to_string()
            } else {
                format!("must be at least {} characters", min)
            };
            self.push(field_path, Rule::MinLength, message);
        }
    }

    /// Lowercase ASCII letters, digits and hyphens, at least one character
    pub fn slug(&mut self, field_path: &str, value: &str) {
        if self.has_failed(field_path) {
            return;
        }
        if !SLUG_PATTERN.is_match(value) {
            self.push(
                field_path,
                Rule::Pattern,
                "must contain only lowercase letters, digits and hyphens",
            );
        }
    }

    pub fn email(&mut self, field_path: &str, value: &str) {
        if self.has_failed(field_path) {
            return;
        }
        if !is_valid_email(value) {
            self.push(field_path, Rule::Email, "must be a valid email address");
        }
    }

    /// At least one element, and at least one element with content after trimming
    pub fn non_blank_entries(&mut self, field_path: &str, values: &[String]) {
        if self.has_failed(field_path) {
            return;
        }
        if values.is_empty() {
            self.push(field_path, Rule::NonEmpty, "must contain at least one entry");
            return;
        }
        if values.iter().all(|value| value.trim().is_empty()) {
            self.push(
                field_path,
                Rule::NotBlank,
                "must contain at least one non-blank entry",
            );
        }
    }

    /// Hand back `value` if nothing failed
    pub fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError { errors: self.errors })
        }
    }
}

/// Check email address syntax
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().count() > EMAIL_MAX_CHARS || !EMAIL_PATTERN.is_match(value) {
        return false;
    }
    let Some((local, _)) = value.rsplit_once('@') else {
        return false;
    };
    local.chars().count() <= EMAIL_LOCAL_MAX_CHARS
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
}

/// A projection with declared rules.
///
/// `read` pulls raw values out of a JSON object (recording presence and type
/// failures), `check` applies the field and cross-field rules. Both write into
/// the same validator so one attempt reports everything.
pub trait Schema: Sized {
    /// Read field values, substituting defaults for anything that failed
    fn read(fields: &Fields<'_>, v: &mut Validator) -> Self;

    /// Apply rules to the values, reporting paths under `prefix`
    fn check(&self, v: &mut Validator, prefix: &str);

    /// Build from a raw JSON object
    fn from_json(value: &Value) -> Result<Self, ValidationError> {
        Self::from_json_at(value, "")
    }

    /// Build from a JSON object nested at `prefix` of a larger document
    fn from_json_at(value: &Value, prefix: &str) -> Result<Self, ValidationError> {
        let fields = Fields::at(value, prefix)?;
        let mut v = Validator::new();
        let record = Self::read(&fields, &mut v);
        record.check(&mut v, prefix);
        v.finish(record)
    }

    /// Re-check rules on an already typed value
    fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        self.check(&mut v, "");
        v.finish(())
    }

    /// Validate and hand back `self`
    fn validated(self) -> Result<Self, ValidationError> {
        self.validate()?;
        Ok(self)
    }
}

/// Typed reader over a JSON object
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    map: &'a Map<String, Value>,
    prefix: String,
}

impl<'a> Fields<'a> {
    /// Reader over a top-level object
    pub fn root(value: &'a Value) -> Result<Self, ValidationError> {
        Self::at(value, "")
    }

    /// Reader over an object nested at `prefix`
    pub fn at(value: &'a Value, prefix: impl Into<String>) -> Result<Self, ValidationError> {
        let prefix = prefix.into();
        match value.as_object() {
            Some(map) => Ok(Self { map, prefix }),
            None => Err(ValidationError::single(
                prefix,
                Rule::Type,
                format!("expected an object, found {}", json_kind(value)),
            )),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Full path of a field of this object
    pub fn path(&self, name: &str) -> String {
        field_path(&self.prefix, name)
    }

    /// Check if the key is present (null counts as present)
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Required string; empty placeholder on failure
    pub fn required_string(&self, v: &mut Validator, name: &str) -> String {
        match self.map.get(name) {
            None => {
                v.push(self.path(name), Rule::Required, "field required");
                String::new()
            }
            Some(value) => self.string_value(v, name, value).unwrap_or_default(),
        }
    }

    /// Optional string with a default for absence
    pub fn string_or(&self, v: &mut Validator, name: &str, default: &str) -> String {
        match self.map.get(name) {
            None => default.to_string(),
            Some(value) => self
                .string_value(v, name, value)
                .unwrap_or_else(|| default.to_string()),
        }
    }

    /// Tri-state string for partial updates
    pub fn patch_string(&self, v: &mut Validator, name: &str) -> Patch<String> {
        match self.map.get(name) {
            None => Patch::Absent,
            Some(Value::Null) => Patch::Null,
            Some(value) => match self.string_value(v, name, value) {
                Some(s) => Patch::Value(s),
                None => Patch::Absent,
            },
        }
    }

    /// Optional boolean with a default for absence
    pub fn bool_or(&self, v: &mut Validator, name: &str, default: bool) -> bool {
        match self.map.get(name) {
            None => default,
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                v.push(
                    self.path(name),
                    Rule::Type,
                    format!("expected a boolean, found {}", json_kind(other)),
                );
                default
            }
        }
    }

    /// Required list of strings
    pub fn required_string_list(&self, v: &mut Validator, name: &str) -> Vec<String> {
        match self.map.get(name) {
            None => {
                v.push(self.path(name), Rule::Required, "field required");
                Vec::new()
            }
            Some(value) => self.string_list_value(v, name, value),
        }
    }

    /// List of strings, empty when absent
    pub fn string_list_or_empty(&self, v: &mut Validator, name: &str) -> Vec<String> {
        match self.map.get(name) {
            None => Vec::new(),
            Some(value) => self.string_list_value(v, name, value),
        }
    }

    /// Required RFC 3339 timestamp; the Unix epoch on failure
    pub fn required_datetime(&self, v: &mut Validator, name: &str) -> DateTime<Utc> {
        let raw = match self.map.get(name) {
            None => {
                v.push(self.path(name), Rule::Required, "field required");
                return DateTime::<Utc>::default();
            }
            Some(value) => match self.string_value(v, name, value) {
                Some(raw) => raw,
                None => return DateTime::<Utc>::default(),
            },
        };

        match DateTime::parse_from_rfc3339(&raw) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(_) => {
                v.push(
                    self.path(name),
                    Rule::Datetime,
                    "must be an RFC 3339 timestamp",
                );
                DateTime::<Utc>::default()
            }
        }
    }

    /// List of nested objects, empty when absent
    pub fn objects_or_empty(&self, v: &mut Validator, name: &str) -> Vec<Fields<'a>> {
        let list_path = self.path(name);
        let items = match self.map.get(name) {
            None => return Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => {
                v.push(
                    list_path,
                    Rule::Type,
                    format!("expected a list, found {}", json_kind(other)),
                );
                return Vec::new();
            }
        };

        let mut nested = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match Fields::at(item, index_path(&list_path, i)) {
                Ok(fields) => nested.push(fields),
                Err(e) => {
                    for error in e.into_errors() {
                        v.push(error.field_path, error.rule, error.message);
                    }
                }
            }
        }
        nested
    }

    fn string_value(&self, v: &mut Validator, name: &str, value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            other => {
                v.push(
                    self.path(name),
                    Rule::Type,
                    format!("expected a string, found {}", json_kind(other)),
                );
                None
            }
        }
    }

    fn string_list_value(&self, v: &mut Validator, name: &str, value: &Value) -> Vec<String> {
        let list_path = self.path(name);
        let Value::Array(items) = value else {
            v.push(
                list_path,
                Rule::Type,
                format!("expected a list of strings, found {}", json_kind(value)),
            );
            return Vec::new();
        };

        let mut strings = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match item {
                Value::String(s) => strings.push(s.clone()),
                other => v.push(
                    index_path(&list_path, i),
                    Rule::Type,
                    format!("expected a string, found {}", json_kind(other)),
                ),
            }
        }
        strings
    }
}

/// Human name of a JSON value's type
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_max_chars_counts_characters() {
        let mut v = Validator::new();
        v.max_chars("title", "ñandú", 5);
        assert!(v.is_valid());

        v.max_chars("title", "ñandús", 5);
        let err = v.finish(()).unwrap_err();
        assert!(err.has("title", Rule::MaxLength));
    }

    #[test]
    fn test_min_chars_empty_message() {
        let mut v = Validator::new();
        v.min_chars("title", "", 1);
        let err = v.finish(()).unwrap_err();
        assert_eq!(err.errors()[0].message, "must not be empty");
        assert_eq!(err.errors()[0].rule, Rule::MinLength);
    }

    #[test]
    fn test_slug_pattern() {
        let mut v = Validator::new();
        v.slug("a", "js-react-2024");
        v.slug("b", "js");
        assert!(v.is_valid());

        for bad in ["JS React", "js_react", "", "js react", "Js"] {
            let mut v = Validator::new();
            v.slug("category_id", bad);
            assert!(!v.is_valid(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_email_syntax() {
        for good in ["test@example.com", "first.last+tag@sub.example.org", "a@b.co"] {
            assert!(is_valid_email(good), "{} should be accepted", good);
        }
        for bad in [
            "invalid-email",
            "@example.com",
            "user@",
            "user@localhost",
            "user@@example.com",
            ".user@example.com",
            "us..er@example.com",
            "user@-example.com",
            "user name@example.com",
        ] {
            assert!(!is_valid_email(bad), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_internationalized_email() {
        for good in [
            "usuario@correo.españa.es",
            "josé.garcía@example.com",
            "用户@例子.中国",
        ] {
            assert!(is_valid_email(good), "{} should be accepted", good);
        }
        for bad in ["usuario@-españa.es", "usu ario@españa.es", "usuario@españa"] {
            assert!(!is_valid_email(bad), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_non_blank_entries() {
        let mut v = Validator::new();
        v.non_blank_entries("details", &[]);
        assert!(v.finish(()).unwrap_err().has("details", Rule::NonEmpty));

        let mut v = Validator::new();
        v.non_blank_entries("details", &["   ".to_string(), String::new()]);
        let err = v.finish(()).unwrap_err();
        assert!(err.has("details", Rule::NotBlank));
        assert!(!err.has("details", Rule::NonEmpty));

        let mut v = Validator::new();
        v.non_blank_entries("details", &["".to_string(), "x".to_string()]);
        assert!(v.is_valid());
    }

    #[test]
    fn test_failed_field_skips_later_rules() {
        let mut v = Validator::new();
        v.push("details", Rule::Required, "field required");
        v.non_blank_entries("details", &[]);
        let err = v.finish(()).unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.errors()[0].rule, Rule::Required);
    }

    #[test]
    fn test_failed_element_counts_as_failed_list() {
        let mut v = Validator::new();
        v.push("details[1]", Rule::Type, "expected a string");
        assert!(v.has_failed("details"));
        assert!(!v.has_failed("detail"));
    }

    #[test]
    fn test_errors_kept_in_evaluation_order() {
        let mut v = Validator::new();
        v.max_chars("a", "xx", 1);
        v.slug("b", "B");
        v.email("c", "nope");
        let err = v.finish(()).unwrap_err();
        let paths: Vec<_> = err.errors().iter().map(|e| e.field_path.as_str()).collect();
        assert_eq!(paths, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_fields_root_rejects_non_object() {
        let err = Fields::root(&json!(["not", "an", "object"])).unwrap_err();
        assert!(err.has("", Rule::Type));
    }

    #[test]
    fn test_fields_required_string() {
        let value = json!({ "title": "Closures", "count": 3 });
        let fields = Fields::root(&value).unwrap();
        let mut v = Validator::new();

        assert_eq!(fields.required_string(&mut v, "title"), "Closures");
        assert_eq!(fields.required_string(&mut v, "count"), "");
        assert_eq!(fields.required_string(&mut v, "missing"), "");

        let err = v.finish(()).unwrap_err();
        assert!(err.has("count", Rule::Type));
        assert!(err.has("missing", Rule::Required));
    }

    #[test]
    fn test_fields_patch_string_tri_state() {
        let value = json!({ "status": "completed", "notes": null });
        let fields = Fields::root(&value).unwrap();
        let mut v = Validator::new();

        assert_eq!(
            fields.patch_string(&mut v, "status"),
            Patch::Value("completed".to_string())
        );
        assert_eq!(fields.patch_string(&mut v, "notes"), Patch::Null);
        assert_eq!(fields.patch_string(&mut v, "other"), Patch::Absent);
        assert!(v.is_valid());
    }

    #[test]
    fn test_fields_string_list_reports_element_paths() {
        let value = json!({ "details": ["ok", 4, "fine", null] });
        let fields = Fields::root(&value).unwrap();
        let mut v = Validator::new();

        let details = fields.required_string_list(&mut v, "details");
        assert_eq!(details, vec!["ok".to_string(), "fine".to_string()]);

        let err = v.finish(()).unwrap_err();
        assert!(err.has("details[1]", Rule::Type));
        assert!(err.has("details[3]", Rule::Type));
    }

    #[test]
    fn test_fields_datetime() {
        let value = json!({ "ok": "2024-05-01T10:00:00Z", "bad": "yesterday" });
        let fields = Fields::root(&value).unwrap();
        let mut v = Validator::new();

        let ok = fields.required_datetime(&mut v, "ok");
        assert_eq!(ok.to_rfc3339(), "2024-05-01T10:00:00+00:00");
        fields.required_datetime(&mut v, "bad");

        let err = v.finish(()).unwrap_err();
        assert!(err.has("bad", Rule::Datetime));
    }

    #[test]
    fn test_nested_objects_carry_prefix() {
        let value = json!({ "topics": [{ "title": "a" }, 7] });
        let fields = Fields::root(&value).unwrap();
        let mut v = Validator::new();

        let nested = fields.objects_or_empty(&mut v, "topics");
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].path("title"), "topics[0].title");

        let err = v.finish(()).unwrap_err();
        assert!(err.has("topics[1]", Rule::Type));
    }

    #[test]
    fn test_validation_error_serializes_as_list() {
        let err = ValidationError::single("email", Rule::Email, "must be a valid email address");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(
            json,
            json!([{
                "field_path": "email",
                "rule": "email",
                "message": "must be a valid email address"
            }])
        );
    }

    #[test]
    fn test_validation_error_display() {
        let mut v = Validator::new();
        v.push("title", Rule::Required, "field required");
        v.push("details", Rule::NonEmpty, "must contain at least one entry");
        let err = v.finish(()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation failed: title: field required (required); details: must contain at least one entry (non_empty)"
        );
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(50))]

            #[test]
            fn slug_accepts_generated_identifiers(id in "[a-z0-9-]{1,50}") {
                let mut v = Validator::new();
                v.slug("category_id", &id);
                prop_assert!(v.is_valid());
            }

            #[test]
            fn slug_rejects_any_uppercase_or_space(
                head in "[a-z0-9-]{0,10}",
                bad in "[A-Z _.]",
                tail in "[a-z0-9-]{0,10}",
            ) {
                let mut v = Validator::new();
                v.slug("category_id", &format!("{}{}{}", head, bad, tail));
                prop_assert!(!v.is_valid());
            }

            #[test]
            fn blank_only_details_rejected(blanks in proptest::collection::vec("[ \t\n]{0,5}", 1..6)) {
                let mut v = Validator::new();
                v.non_blank_entries("details", &blanks);
                let err = v.finish(()).unwrap_err();
                prop_assert!(err.has("details", Rule::NotBlank));
            }

            #[test]
            fn max_chars_boundary(len in 0usize..200) {
                let value = "a".repeat(len);
                let mut v = Validator::new();
                v.max_chars("title", &value, 100);
                prop_assert_eq!(v.is_valid(), len <= 100);
            }
        }
    }
}
