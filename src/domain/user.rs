//! Staff user entity and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::stage::Stage;
use crate::config::{
    ROLE_ADMIN, ROLE_CUSTOMER, ROLE_DESIGN, ROLE_FUSING, ROLE_PRINTING, ROLE_SHIPPING,
    ROLE_STITCHING,
};
use crate::errors::AppError;

/// Staff roles. Every role except `admin` and `customer` owns one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Customer,
    Design,
    Printing,
    Fusing,
    Stitching,
    Shipping,
}

impl UserRole {
    /// Stage this role works on, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            UserRole::Admin | UserRole::Customer => None,
            UserRole::Design => Some(Stage::Design),
            UserRole::Printing => Some(Stage::Printing),
            UserRole::Fusing => Some(Stage::Fusing),
            UserRole::Stitching => Some(Stage::Stitching),
            UserRole::Shipping => Some(Stage::Shipping),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => ROLE_ADMIN,
            UserRole::Customer => ROLE_CUSTOMER,
            UserRole::Design => ROLE_DESIGN,
            UserRole::Printing => ROLE_PRINTING,
            UserRole::Fusing => ROLE_FUSING,
            UserRole::Stitching => ROLE_STITCHING,
            UserRole::Shipping => ROLE_SHIPPING,
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_ADMIN => Ok(UserRole::Admin),
            ROLE_CUSTOMER => Ok(UserRole::Customer),
            ROLE_DESIGN => Ok(UserRole::Design),
            ROLE_PRINTING => Ok(UserRole::Printing),
            ROLE_FUSING => Ok(UserRole::Fusing),
            ROLE_STITCHING => Ok(UserRole::Stitching),
            ROLE_SHIPPING => Ok(UserRole::Shipping),
            other => Err(AppError::validation(format!("Unknown role '{}'", other))),
        }
    }
}

impl From<Stage> for UserRole {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Design => UserRole::Design,
            Stage::Printing => UserRole::Printing,
            Stage::Fusing => UserRole::Fusing,
            Stage::Stitching => UserRole::Stitching,
            Stage::Shipping => UserRole::Shipping,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Staff user entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful credential check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StaffIdentity {
    #[schema(example = "meera")]
    pub username: String,
    pub role: UserRole,
}

impl From<&User> for StaffIdentity {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            role: user.role,
        }
    }
}
