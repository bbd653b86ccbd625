/// Credential Store
///
/// User records and the narrow repository interface the auth flow needs.
/// `token_version` is the single source of truth for refresh-token validity;
/// it only ever moves up, through `increment_token_version`.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

pub use memory::InMemoryUserRepository;
pub use postgres::PgUserRepository;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub token_version: i32,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied at signup. The id, version and timestamp are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

impl NewUser {
    /// Username defaults to the local part of the email.
    pub fn new(email: String, password_hash: String) -> Self {
        let username = email.split('@').next().unwrap_or_default().to_string();
        Self {
            email,
            username,
            password_hash,
        }
    }
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub username: String,
    pub token_version: i32,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            username: user.username.clone(),
            token_version: user.token_version,
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Insert a new user with token version 0.
    /// Fails with `AuthError::DuplicateAccount` when the email is taken.
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    /// Atomically bump the user's token version by one and return the new value.
    /// Fails with `DatabaseError::NotFound` for an unknown id.
    async fn increment_token_version(&self, id: Uuid) -> Result<i32, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_from_email() {
        let new_user = NewUser::new("ursula@example.com".to_string(), "hash".to_string());
        assert_eq!(new_user.username, "ursula");
    }

    #[test]
    fn test_profile_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "ursula@example.com".to_string(),
            username: "ursula".to_string(),
            password_hash: "$2b$04$secret".to_string(),
            token_version: 3,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(UserProfile::from(&user)).unwrap();

        assert_eq!(json["token_version"], 3);
        assert!(json.get("password_hash").is_none());
    }
}
