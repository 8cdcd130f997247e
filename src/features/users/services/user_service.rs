use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::policy::{authorize, Operation};
use crate::features::users::dtos::UserResponseDto;
use crate::features::users::models::UserRole;
use crate::features::users::repositories::UserRepository;
use crate::shared::clock;

/// Service for account lookups and administrator-only account changes
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Profile of the calling user
    pub async fn get_me(&self, caller: &AuthenticatedUser) -> Result<UserResponseDto> {
        self.users
            .find_by_id(caller.id)
            .await?
            .map(UserResponseDto::from)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", caller.id)))
    }

    pub async fn list(&self, caller: &AuthenticatedUser) -> Result<Vec<UserResponseDto>> {
        authorize(caller, Operation::ListUsers)?;

        let users = self.users.list().await?;
        Ok(users.into_iter().map(UserResponseDto::from).collect())
    }

    pub async fn set_banned(
        &self,
        caller: &AuthenticatedUser,
        user_id: Uuid,
        banned: bool,
    ) -> Result<UserResponseDto> {
        authorize(caller, Operation::BanUser)?;

        if caller.id == user_id {
            return Err(AppError::Forbidden(
                "Administrators cannot ban themselves".to_string(),
            ));
        }

        let existing = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let user = self
            .users
            .set_banned(user_id, banned, clock::next_after(existing.updated_at))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        tracing::info!(
            "User {} {} by {}",
            user_id,
            if banned { "banned" } else { "unbanned" },
            caller.id
        );

        Ok(user.into())
    }

    pub async fn set_role(
        &self,
        caller: &AuthenticatedUser,
        user_id: Uuid,
        role: UserRole,
    ) -> Result<UserResponseDto> {
        authorize(caller, Operation::ChangeUserRole)?;

        if caller.id == user_id {
            return Err(AppError::Forbidden(
                "Administrators cannot change their own role".to_string(),
            ));
        }

        let existing = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let user = self
            .users
            .set_role(user_id, role, clock::next_after(existing.updated_at))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        tracing::info!(
            "User {} role changed {} -> {} by {}",
            user_id,
            existing.role,
            role,
            caller.id
        );

        Ok(user.into())
    }
}
