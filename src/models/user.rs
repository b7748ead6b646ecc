//! User model
//!
//! `UserCreate` is the only projection that carries a password. The password
//! is never serialized; the store keeps an Argon2id hash in `UserDocument`,
//! and `UserResponse` has no password field at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::validation::{field_path, Fields, Schema, ValidationError, Validator};

/// Longest accepted username
pub const USERNAME_MAX_CHARS: usize = 50;

/// Shortest accepted password
pub const PASSWORD_MIN_CHARS: usize = 8;

pub fn check_username(v: &mut Validator, path: &str, username: &str) {
    v.max_chars(path, username, USERNAME_MAX_CHARS);
}

pub fn check_email(v: &mut Validator, path: &str, email: &str) {
    v.email(path, email);
}

/// User registration input
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    /// Plaintext password (write-only)
    #[serde(skip_serializing)]
    pub password: String,
}

fn default_is_active() -> bool {
    true
}

impl UserCreate {
    /// Active user with the given credentials
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self {
            username: username.into(),
            email: email.into(),
            is_active: true,
            password: password.into(),
        }
        .validated()
    }
}

impl fmt::Debug for UserCreate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCreate")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("is_active", &self.is_active)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Schema for UserCreate {
    fn read(fields: &Fields<'_>, v: &mut Validator) -> Self {
        Self {
            username: fields.required_string(v, "username"),
            email: fields.required_string(v, "email"),
            is_active: fields.bool_or(v, "is_active", true),
            password: fields.required_string(v, "password"),
        }
    }

    fn check(&self, v: &mut Validator, prefix: &str) {
        check_username(v, &field_path(prefix, "username"), &self.username);
        check_email(v, &field_path(prefix, "email"), &self.email);
        v.min_chars(&field_path(prefix, "password"), &self.password, PASSWORD_MIN_CHARS);
    }
}

/// User as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub is_active: bool,
}

impl Schema for UserResponse {
    fn read(fields: &Fields<'_>, v: &mut Validator) -> Self {
        Self {
            id: fields.required_string(v, "id"),
            username: fields.required_string(v, "username"),
            email: fields.required_string(v, "email"),
            is_active: fields.bool_or(v, "is_active", true),
        }
    }

    fn check(&self, v: &mut Validator, prefix: &str) {
        check_username(v, &field_path(prefix, "username"), &self.username);
        check_email(v, &field_path(prefix, "email"), &self.email);
    }
}

/// Stored form of a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDocument {
    pub username: String,
    pub email: String,
    pub is_active: bool,
    /// Argon2id PHC string
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserDocument {
    /// Build from a validated registration; the caller hashes the password
    pub fn new(input: UserCreate, password_hash: String, created_at: DateTime<Utc>) -> Self {
        Self {
            username: input.username,
            email: input.email,
            is_active: input.is_active,
            password_hash,
            created_at,
        }
    }

    pub fn into_response(self, id: String) -> UserResponse {
        UserResponse {
            id,
            username: self.username,
            email: self.email,
            is_active: self.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rule;
    use serde_json::json;

    #[test]
    fn test_user_response_valid() {
        let user = UserResponse {
            id: "u1".to_string(),
            username: "testuser".to_string(),
            email: "testuser@example.com".to_string(),
            is_active: true,
        }
        .validated()
        .expect("valid user");

        assert_eq!(user.username, "testuser");
        assert!(user.is_active);
    }

    #[test]
    fn test_invalid_email_rejected() {
        let err = UserCreate::new("testuser", "invalid-email", "securepass123").unwrap_err();
        assert!(err.has("email", Rule::Email));
    }

    #[test]
    fn test_user_create_valid() {
        let user = UserCreate::new("testuser", "test@example.com", "securepass123")
            .expect("valid user");
        assert_eq!(user.password, "securepass123");
        assert!(user.is_active);
    }

    #[test]
    fn test_user_create_short_password() {
        let err = UserCreate::new("testuser", "test@example.com", "short").unwrap_err();
        assert!(err.has("password", Rule::MinLength));
    }

    #[test]
    fn test_password_boundary() {
        assert!(UserCreate::new("u", "u@example.com", "12345678").is_ok());
        assert!(UserCreate::new("u", "u@example.com", "1234567").is_err());
    }

    #[test]
    fn test_username_too_long() {
        let err = UserCreate::new("a".repeat(51), "test@example.com", "securepass123").unwrap_err();
        assert!(err.has("username", Rule::MaxLength));
    }

    #[test]
    fn test_user_create_from_json_defaults_active() {
        let user = UserCreate::from_json(&json!({
            "username": "testuser",
            "email": "test@example.com",
            "password": "securepass123"
        }))
        .unwrap();
        assert!(user.is_active);

        let inactive = UserCreate::from_json(&json!({
            "username": "testuser",
            "email": "test@example.com",
            "password": "securepass123",
            "is_active": false
        }))
        .unwrap();
        assert!(!inactive.is_active);
    }

    #[test]
    fn test_password_never_serialized() {
        let user = UserCreate::new("testuser", "test@example.com", "securepass123").unwrap();

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert!(!format!("{:?}", user).contains("securepass123"));
    }

    #[test]
    fn test_response_projection_drops_password() {
        let user = UserCreate::new("testuser", "test@example.com", "securepass123").unwrap();
        let doc = UserDocument::new(user, "$argon2id$hash".to_string(), Utc::now());
        let response = doc.into_response("u1".to_string());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            json!({
                "id": "u1",
                "username": "testuser",
                "email": "test@example.com",
                "is_active": true
            })
        );
    }
}
