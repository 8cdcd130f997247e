use crate::features::auth::handlers;
use crate::features::auth::services::AuthService;
use axum::{routing::post, Router};
use std::sync::Arc;

/// Public auth routes (no authentication required)
pub fn public_routes(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/api/users/auth/register", post(handlers::register))
        .route("/api/users/auth/login", post(handlers::login))
        .with_state(service)
}
