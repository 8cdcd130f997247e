use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::users::models::{User, UserRole};

/// Identity resolved for the current request.
///
/// Built by the auth middleware from the token subject and the stored user
/// record, so role and ban state are as current as the last database read.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub role: UserRole,
    pub is_banned: bool,
}

impl AuthenticatedUser {
    pub fn is_administrator(&self) -> bool {
        self.role == UserRole::Administrator
    }

    /// Technicians and administrators operate on any report
    pub fn is_technician_or_above(&self) -> bool {
        self.role.includes(UserRole::Technician)
    }

    pub fn is_banned(&self) -> bool {
        self.is_banned
    }
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
            is_banned: user.is_banned,
        }
    }
}

/// Claims carried by access tokens issued by this service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub iss: String,
    pub iat: u64,
    pub exp: u64,
}
