use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// User role enum matching database enum.
///
/// Roles are ordered by privilege: every role can do what the roles below it can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Reporter,
    Technician,
    Administrator,
}

impl UserRole {
    /// Privilege rank, higher is more privileged
    pub fn rank(self) -> u8 {
        match self {
            UserRole::Reporter => 1,
            UserRole::Technician => 2,
            UserRole::Administrator => 3,
        }
    }

    /// Whether this role grants at least the privileges of `minimum`
    pub fn includes(self, minimum: UserRole) -> bool {
        self.rank() >= minimum.rank()
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Reporter => write!(f, "REPORTER"),
            UserRole::Technician => write!(f, "TECHNICIAN"),
            UserRole::Administrator => write!(f, "ADMINISTRATOR"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "REPORTER" => Ok(UserRole::Reporter),
            "TECHNICIAN" => Ok(UserRole::Technician),
            "ADMINISTRATOR" => Ok(UserRole::Administrator),
            other => Err(format!(
                "role must be one of REPORTER, TECHNICIAN, ADMINISTRATOR (got '{}')",
                other
            )),
        }
    }
}

/// Database model for user
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub password_hash: String,
    pub role: UserRole,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}
