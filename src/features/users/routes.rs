use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};

use crate::features::users::handlers;
use crate::features::users::services::UserService;

/// Protected user routes (auth middleware applied by caller)
pub fn routes(service: Arc<UserService>) -> Router {
    Router::new()
        .route("/api/users", get(handlers::list_users))
        .route("/api/users/me", get(handlers::get_me))
        .route("/api/users/{id}/ban", put(handlers::set_ban))
        .route("/api/users/{id}/role", put(handlers::set_role))
        .with_state(service)
}
