//! User repository implementation.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::{User, UserRole};
use crate::errors::{AppResult, StoreResultExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// Users are provisioned out-of-band; the service layer only reads them.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by unique username
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find a user holding the given role
    async fn find_with_role(&self, username: &str, role: UserRole) -> AppResult<Option<User>>;

    /// Create a new user with an already-hashed credential
    async fn create(&self, username: String, password_hash: String, role: UserRole)
        -> AppResult<User>;

    /// List all users ordered by username
    async fn list(&self) -> AppResult<Vec<User>>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .store_context("find_user_by_username", username)?;

        result.map(User::try_from).transpose()
    }

    async fn find_with_role(&self, username: &str, role: UserRole) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .filter(user::Column::Role.eq(role.as_str()))
            .one(&self.db)
            .await
            .store_context("find_user_with_role", username)?;

        result.map(User::try_from).transpose()
    }

    async fn create(
        &self,
        username: String,
        password_hash: String,
        role: UserRole,
    ) -> AppResult<User> {
        let key = username.clone();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username),
            password_hash: Set(password_hash),
            role: Set(role.as_str().to_string()),
            created_at: Set(chrono::Utc::now()),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .store_context("create_user", &key)?;
        User::try_from(model)
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .order_by_asc(user::Column::Username)
            .all(&self.db)
            .await
            .store_context("list_users", "*")?;

        models.into_iter().map(User::try_from).collect()
    }
}
