use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::users::models::{User, UserRole};

/// Public view of a user (never includes the password hash)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponseDto {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub role: UserRole,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponseDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            display_name: u.display_name,
            role: u.role,
            is_banned: u.is_banned,
            created_at: u.created_at,
        }
    }
}

/// Request DTO for banning or unbanning a user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetBanDto {
    pub banned: bool,
}

/// Request DTO for changing a user's role
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetRoleDto {
    pub role: UserRole,
}
