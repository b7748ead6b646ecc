//! User service
//!
//! Registration and lookup. Usernames and email addresses are unique across
//! users; passwords are stored only as Argon2id hashes.

use crate::db::repositories::{collections, encode, DynDocumentRepository};
use crate::models::{Schema, UserCreate, UserDocument, UserResponse, ValidationError};
use crate::services::password::hash_password;
use anyhow::Context;
use chrono::Utc;
use uuid::Uuid;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Validation error (invalid input)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Username or email already taken
    #[error("User already exists: {0}")]
    UserExists(String),

    /// User not found
    #[error("User not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service
pub struct UserService {
    repo: DynDocumentRepository,
}

impl UserService {
    pub fn new(repo: DynDocumentRepository) -> Self {
        Self { repo }
    }

    /// Register a new user
    ///
    /// # Errors
    /// - `UserExists` if the username or email is already registered
    pub async fn register(&self, input: UserCreate) -> Result<UserResponse, UserServiceError> {
        input.validate()?;

        let existing = self
            .repo
            .list(collections::USERS)
            .await
            .context("Failed to list users")?;
        for doc in &existing {
            let user: UserDocument = doc.decode()?;
            if user.username == input.username {
                return Err(UserServiceError::UserExists(format!(
                    "username '{}'",
                    input.username
                )));
            }
            if user.email.eq_ignore_ascii_case(&input.email) {
                return Err(UserServiceError::UserExists(format!("email '{}'", input.email)));
            }
        }

        let password_hash = hash_password(&input.password)?;
        let id = Uuid::new_v4().to_string();
        let doc = UserDocument::new(input, password_hash, Utc::now());

        self.repo
            .put(collections::USERS, &id, &encode(&doc)?)
            .await
            .context("Failed to store user")?;

        tracing::info!("Registered user {} (id: {})", doc.username, id);
        Ok(doc.into_response(id))
    }

    /// Look up a user by id
    pub async fn get(&self, id: &str) -> Result<UserResponse, UserServiceError> {
        let doc = self
            .repo
            .get(collections::USERS, id)
            .await
            .with_context(|| format!("Failed to get user {}", id))?
            .ok_or_else(|| UserServiceError::NotFound(id.to_string()))?;

        let user: UserDocument = doc.decode()?;
        Ok(user.into_response(doc.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations, SqlxDocumentRepository};
    use argon2::password_hash::{PasswordHash, PasswordVerifier};
    use argon2::Argon2;

    async fn setup() -> (UserService, DynDocumentRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxDocumentRepository::boxed(pool);
        (UserService::new(repo.clone()), repo)
    }

    fn alice() -> UserCreate {
        UserCreate::new("alice", "alice@example.com", "securepass123").unwrap()
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let (service, _) = setup().await;

        let user = service.register(alice()).await.expect("register failed");
        assert_eq!(user.username, "alice");
        assert!(user.is_active);
        assert!(Uuid::parse_str(&user.id).is_ok());

        let fetched = service.get(&user.id).await.unwrap();
        assert_eq!(fetched, user);
    }

    #[tokio::test]
    async fn test_register_stores_hash_only() {
        let (service, repo) = setup().await;

        let user = service.register(alice()).await.unwrap();
        let doc = repo.get(collections::USERS, &user.id).await.unwrap().unwrap();

        assert!(doc.fields.get("password").is_none());
        let hash = doc.fields["password_hash"].as_str().unwrap();
        assert!(hash.starts_with("$argon2id$"));
        let parsed = PasswordHash::new(hash).expect("stored hash is a PHC string");
        assert!(Argon2::default()
            .verify_password(b"securepass123", &parsed)
            .is_ok());
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let (service, _) = setup().await;
        service.register(alice()).await.unwrap();

        let again = UserCreate::new("alice", "other@example.com", "securepass123").unwrap();
        let err = service.register(again).await.unwrap_err();
        assert!(matches!(err, UserServiceError::UserExists(_)));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_case_insensitive() {
        let (service, _) = setup().await;
        service.register(alice()).await.unwrap();

        let again = UserCreate::new("alice2", "Alice@Example.com", "securepass123").unwrap();
        let err = service.register(again).await.unwrap_err();
        assert!(matches!(err, UserServiceError::UserExists(_)));
    }

    #[tokio::test]
    async fn test_register_rechecks_rules() {
        let (service, _) = setup().await;

        // built without going through `new`
        let input = UserCreate {
            username: "bob".to_string(),
            email: "not-an-email".to_string(),
            is_active: true,
            password: "short".to_string(),
        };
        assert!(input.validate().is_err());

        let err = service.register(input).await.unwrap_err();
        assert!(matches!(err, UserServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let (service, _) = setup().await;
        let err = service.get("nope").await.unwrap_err();
        assert!(matches!(err, UserServiceError::NotFound(_)));
    }
}
