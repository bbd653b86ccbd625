use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{NewUser, User, UserRepository};
use crate::error::{AppError, AuthError, DatabaseError};

/// Process-local user store used by tests and single-node demos.
///
/// Every mutation holds the write lock for its whole read-modify-write, so
/// concurrent increments for the same user never lose an update.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> AppError {
    AppError::Internal("user store lock poisoned".to_string())
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().map_err(poisoned)?;
        if users.values().any(|u| u.email == new_user.email) {
            return Err(AuthError::DuplicateAccount.into());
        }

        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            username: new_user.username,
            password_hash: new_user.password_hash,
            token_version: 0,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn increment_token_version(&self, id: Uuid) -> Result<i32, AppError> {
        let mut users = self.users.write().map_err(poisoned)?;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))?;
        user.token_version += 1;
        Ok(user.token_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_user(email: &str) -> NewUser {
        NewUser::new(email.to_string(), "hash".to_string())
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(new_user("a@example.com")).await.unwrap();

        assert_eq!(user.token_version, 0);
        let by_id = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@example.com");
        let by_email = repo.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert!(repo.find_by_email("b@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("a@example.com")).await.unwrap();

        let err = repo.create(new_user("a@example.com")).await.unwrap_err();
        assert_eq!(err.auth_kind(), Some(AuthError::DuplicateAccount));
    }

    #[tokio::test]
    async fn test_increment_unknown_user() {
        let repo = InMemoryUserRepository::new();
        let err = repo.increment_token_version(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::Database(DatabaseError::NotFound(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_not_lost() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let user = repo.create(new_user("a@example.com")).await.unwrap();
        let user_id = user.id;

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.increment_token_version(user_id).await })
            })
            .collect();

        let mut versions = Vec::new();
        for handle in handles {
            versions.push(handle.await.unwrap().unwrap());
        }
        versions.sort_unstable();
        versions.dedup();

        // every revocation observed a distinct, strictly higher version
        assert_eq!(versions.len(), 50);
        let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.token_version, 50);
    }
}
