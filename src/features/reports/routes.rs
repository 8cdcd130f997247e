use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::features::reports::handlers;
use crate::features::reports::services::ReportService;

/// Protected report routes (auth middleware applied by caller)
pub fn routes(service: Arc<ReportService>) -> Router {
    Router::new()
        .route(
            "/api/reports",
            post(handlers::create_report).get(handlers::list_reports),
        )
        .route("/api/reports/user-reports", get(handlers::list_user_reports))
        .route("/api/reports/export", get(handlers::export_reports))
        .route(
            "/api/reports/{id}",
            get(handlers::get_report).put(handlers::update_report),
        )
        .route("/api/reports/{id}/photos", post(handlers::add_photo))
        .route(
            "/api/reports/{id}/photos/{index}",
            delete(handlers::remove_photo),
        )
        .with_state(service)
}
