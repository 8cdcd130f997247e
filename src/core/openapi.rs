use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::reports::{
    dtos as reports_dtos, handlers as reports_handlers, models as reports_models,
};
use crate::features::users::{dtos as users_dtos, handlers as users_handlers, models as users_models};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::register,
        auth::handlers::login,
        // Users
        users_handlers::get_me,
        users_handlers::list_users,
        users_handlers::set_ban,
        users_handlers::set_role,
        // Reports
        reports_handlers::create_report,
        reports_handlers::list_reports,
        reports_handlers::list_user_reports,
        reports_handlers::export_reports,
        reports_handlers::get_report,
        reports_handlers::update_report,
        reports_handlers::add_photo,
        reports_handlers::remove_photo,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Auth
            auth::dtos::RegisterRequestDto,
            auth::dtos::LoginRequestDto,
            auth::dtos::AuthResponseDto,
            ApiResponse<auth::dtos::AuthResponseDto>,
            // Users
            users_models::UserRole,
            users_dtos::UserResponseDto,
            users_dtos::SetBanDto,
            users_dtos::SetRoleDto,
            ApiResponse<users_dtos::UserResponseDto>,
            ApiResponse<Vec<users_dtos::UserResponseDto>>,
            // Reports
            reports_models::IssueType,
            reports_models::ReportSeverity,
            reports_models::ReportStatus,
            reports_models::Coordinates,
            reports_models::Location,
            reports_dtos::CreateReportDto,
            reports_dtos::UpdateReportDto,
            reports_dtos::AddPhotoDto,
            reports_dtos::ReportResponseDto,
            reports_dtos::ReportSummaryDto,
            ApiResponse<reports_dtos::ReportResponseDto>,
            ApiResponse<Vec<reports_dtos::ReportSummaryDto>>,
        )
    ),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "users", description = "Accounts, roles and bans"),
        (name = "reports", description = "Water issue reports, lifecycle and export"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Tirta API",
        version = "0.1.0",
        description = "API documentation for Tirta water issue reporting",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
