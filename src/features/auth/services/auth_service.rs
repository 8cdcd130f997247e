use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{AuthResponseDto, LoginRequestDto, RegisterRequestDto};
use crate::features::auth::password::{hash_password, verify_password};
use crate::features::auth::services::token_service::TokenService;
use crate::features::users::models::{CreateUser, User, UserRole};
use crate::features::users::repositories::UserRepository;
use crate::shared::clock;
use std::sync::Arc;
use uuid::Uuid;

/// Service for authentication operations (register, login)
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    token_service: Arc<TokenService>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, token_service: Arc<TokenService>) -> Self {
        Self {
            users,
            token_service,
        }
    }

    /// Register a new reporter account and sign them in
    pub async fn register(&self, dto: RegisterRequestDto) -> Result<AuthResponseDto> {
        let email = normalize_email(&dto.email);

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password = dto.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))??;

        let user = self
            .users
            .create(&CreateUser {
                id: Uuid::now_v7(),
                email,
                display_name: dto
                    .display_name
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty()),
                password_hash,
                role: UserRole::Reporter,
                created_at: clock::now(),
            })
            .await?;

        tracing::info!("Registered user: {}", user.id);

        self.sign_in(user)
    }

    /// Login with email and password.
    ///
    /// Banned users may still sign in; their mutating requests are rejected later.
    pub async fn login(&self, dto: LoginRequestDto) -> Result<AuthResponseDto> {
        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let user = self
            .users
            .find_by_email(&normalize_email(&dto.email))
            .await?
            .ok_or_else(invalid)?;

        let password = dto.password;
        let stored_hash = user.password_hash.clone();
        let password_valid =
            tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
                .await
                .map_err(|e| {
                    AppError::Internal(format!("Password verification task failed: {}", e))
                })??;

        if !password_valid {
            tracing::debug!("Failed login attempt for user: {}", user.id);
            return Err(invalid());
        }

        if user.is_banned {
            tracing::info!("Banned user signed in: {}", user.id);
        }

        self.sign_in(user)
    }

    fn sign_in(&self, user: User) -> Result<AuthResponseDto> {
        let token = self.token_service.issue(&user)?;

        Ok(AuthResponseDto {
            access_token: token.token,
            token_type: "Bearer".to_string(),
            expires_in: token.expires_in,
            user: user.into(),
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
