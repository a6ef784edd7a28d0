//! User service - Out-of-band staff provisioning.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::domain::{Password, User, UserRole};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

static USERNAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]{1,64}$").expect("valid username pattern"));

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Create a staff user with a hashed credential
    async fn create_user(&self, username: &str, password: &str, role: &str) -> AppResult<User>;

    /// List all staff users
    async fn list_users(&self) -> AppResult<Vec<User>>;
}

/// Concrete implementation of UserService using Unit of Work.
pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> UserManager<U> {
    /// Create new user service instance with Unit of Work
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn create_user(&self, username: &str, password: &str, role: &str) -> AppResult<User> {
        let username = username.trim();
        if !USERNAME.is_match(username) {
            return Err(AppError::validation(
                "Username must be 1-64 letters, digits, '.', '_' or '-'",
            ));
        }
        let role: UserRole = role.trim().parse()?;
        let password_hash = Password::new(password)?.into_string();

        if self.uow.users().find_by_username(username).await?.is_some() {
            return Err(AppError::validation(format!(
                "Username '{}' is already taken",
                username
            )));
        }

        let user = self
            .uow
            .users()
            .create(username.to_string(), password_hash, role)
            .await?;

        tracing::info!(username = %user.username, role = %user.role, "User provisioned");
        Ok(user)
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.uow.users().list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{MockOrderRepository, MockUserRepository};
    use crate::services::test_support::StubUnitOfWork;

    fn manager(users: MockUserRepository) -> UserManager<StubUnitOfWork> {
        UserManager::new(Arc::new(StubUnitOfWork::new(MockOrderRepository::new(), users)))
    }

    #[tokio::test]
    async fn test_create_user_hashes_password() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_username().returning(|_| Ok(None));
        users
            .expect_create()
            .withf(|name, hash, role| {
                name == "meera"
                    && hash.starts_with("$argon2")
                    && Password::from_hash(hash.clone()).verify("s3cret-pass")
                    && *role == UserRole::Design
            })
            .times(1)
            .returning(|username, password_hash, role| {
                Ok(User {
                    id: uuid::Uuid::new_v4(),
                    username,
                    password_hash,
                    role,
                    created_at: chrono::Utc::now(),
                })
            });

        let user = manager(users)
            .create_user("meera", "s3cret-pass", "design")
            .await
            .unwrap();
        assert_eq!(user.role, UserRole::Design);
    }

    #[tokio::test]
    async fn test_create_user_rejects_bad_input() {
        let mut users = MockUserRepository::new();
        users.expect_create().never();
        let service = manager(users);

        assert!(service.create_user("bad name", "s3cret-pass", "design").await.is_err());
        assert!(service.create_user("meera", "short", "design").await.is_err());
        assert!(service.create_user("meera", "s3cret-pass", "janitor").await.is_err());
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_username().returning(|username| {
            Ok(Some(User {
                id: uuid::Uuid::new_v4(),
                username: username.to_string(),
                password_hash: String::new(),
                role: UserRole::Printing,
                created_at: chrono::Utc::now(),
            }))
        });
        users.expect_create().never();

        let err = manager(users)
            .create_user("pooja", "s3cret-pass", "printing")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("already taken")));
    }
}
