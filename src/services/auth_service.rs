//! Authentication service - Staff credential check.
//!
//! Returns the staff identity (username and role) for a valid credential.
//! There are no sessions or tokens; callers act on the returned role.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{Password, StaffIdentity};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Verify a username/password pair
    async fn login(&self, username: &str, password: &str) -> AppResult<StaffIdentity>;
}

/// Concrete implementation of AuthService using Unit of Work.
pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> Authenticator<U> {
    /// Create new auth service instance with Unit of Work
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn login(&self, username: &str, password: &str) -> AppResult<StaffIdentity> {
        let user = self.uow.users().find_by_username(username.trim()).await?;

        // Unknown users still pay for one hash verification
        let stored = match &user {
            Some(user) => Password::from_hash(user.password_hash.clone()),
            None => Password::dummy(),
        };
        let password_valid = stored.verify(password);

        match user {
            Some(user) if password_valid => {
                tracing::info!(username = %user.username, role = %user.role, "Staff login");
                Ok(StaffIdentity::from(&user))
            }
            _ => {
                tracing::warn!(username = %username.trim(), "Rejected login");
                Err(AppError::InvalidCredentials)
            }
        }
    }
}
