use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::policy::{authorize, Operation};
use crate::features::reports::dtos::{
    AddPhotoDto, CreateReportDto, ReportQueryParams, ReportResponseDto, ReportSummaryDto,
    UpdateReportDto,
};
use crate::features::reports::lifecycle::ChangeRequest;
use crate::features::reports::models::NewReport;
use crate::features::reports::services::{Listing, ReportService};
use crate::shared::types::{ApiResponse, Meta};

/// Submit a report as the authenticated user
#[utoipa::path(
    post,
    path = "/api/reports",
    request_body = CreateReportDto,
    responses(
        (status = 201, description = "Report created", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - banned user")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn create_report(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    AppJson(dto): AppJson<CreateReportDto>,
) -> Result<(StatusCode, Json<ApiResponse<ReportResponseDto>>)> {
    // Role and ban checks come before any field is looked at
    authorize(&user, Operation::CreateReport)?;
    let report = NewReport::try_from(dto)?;
    let record = service.create(&user, report).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(record.into()), None, None)),
    ))
}

async fn list_page(
    service: &ReportService,
    user: &AuthenticatedUser,
    listing: Listing,
    params: &ReportQueryParams,
) -> Result<Json<ApiResponse<Vec<ReportSummaryDto>>>> {
    authorize(user, listing.operation())?;
    let query = params.to_query()?;
    let records = service.list(user, listing, &query).await?;
    let total = records.len() as i64;

    let page: Vec<ReportSummaryDto> = params
        .pagination()
        .paginate(records)
        .into_iter()
        .map(ReportSummaryDto::from)
        .collect();

    Ok(Json(ApiResponse::success(
        Some(page),
        None,
        Some(Meta { total }),
    )))
}

/// List all reports (technician or administrator)
#[utoipa::path(
    get,
    path = "/api/reports",
    params(ReportQueryParams),
    responses(
        (status = 200, description = "Filtered reports", body = ApiResponse<Vec<ReportSummaryDto>>),
        (status = 400, description = "Invalid filter value"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Technician access required")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn list_reports(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    Query(params): Query<ReportQueryParams>,
) -> Result<Json<ApiResponse<Vec<ReportSummaryDto>>>> {
    list_page(&service, &user, Listing::All, &params).await
}

/// List the authenticated user's own reports
#[utoipa::path(
    get,
    path = "/api/reports/user-reports",
    params(ReportQueryParams),
    responses(
        (status = 200, description = "Caller's reports", body = ApiResponse<Vec<ReportSummaryDto>>),
        (status = 400, description = "Invalid filter value"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn list_user_reports(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    Query(params): Query<ReportQueryParams>,
) -> Result<Json<ApiResponse<Vec<ReportSummaryDto>>>> {
    list_page(&service, &user, Listing::Own, &params).await
}

/// Export the filtered operator listing as CSV
#[utoipa::path(
    get,
    path = "/api/reports/export",
    params(ReportQueryParams),
    responses(
        (status = 200, description = "CSV export", content_type = "text/csv", body = String),
        (status = 400, description = "Invalid filter value"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Technician access required")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn export_reports(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    Query(params): Query<ReportQueryParams>,
) -> Result<impl IntoResponse> {
    authorize(&user, Operation::ExportReports)?;
    let query = params.to_query()?;
    let csv = service.export_csv(&user, &query).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"reports.csv\"",
            ),
        ],
        csv,
    ))
}

/// Get a report by ID
#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report found", body = ApiResponse<ReportResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn get_report(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    let record = service.get(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(record.into()), None, None)))
}

/// Change status and/or assignee (technician or administrator)
#[utoipa::path(
    put,
    path = "/api/reports/{id}",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    request_body = UpdateReportDto,
    responses(
        (status = 200, description = "Report updated", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Invalid status or assignee"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Technician access required"),
        (status = 404, description = "Report not found"),
        (status = 409, description = "Status cannot move backwards")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn update_report(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateReportDto>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    authorize(&user, Operation::UpdateReport)?;
    let request = ChangeRequest::parse(dto.status.as_deref(), dto.assignee)?;
    let record = service.update(&user, id, request).await?;
    Ok(Json(ApiResponse::success(Some(record.into()), None, None)))
}

/// Append a photo (technician or administrator)
#[utoipa::path(
    post,
    path = "/api/reports/{id}/photos",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    request_body = AddPhotoDto,
    responses(
        (status = 200, description = "Photo appended", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Invalid photo or photo limit reached"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Technician access required"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn add_photo(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<AddPhotoDto>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    let record = service.append_photo(&user, id, dto.photo).await?;
    Ok(Json(ApiResponse::success(Some(record.into()), None, None)))
}

/// Remove the photo at an index (technician or administrator)
#[utoipa::path(
    delete,
    path = "/api/reports/{id}/photos/{index}",
    params(
        ("id" = Uuid, Path, description = "Report ID"),
        ("index" = usize, Path, description = "Zero-based photo position")
    ),
    responses(
        (status = 200, description = "Photo removed", body = ApiResponse<ReportResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Technician access required"),
        (status = 404, description = "Report or photo not found")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn remove_photo(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    let record = service.remove_photo(&user, id, index).await?;
    Ok(Json(ApiResponse::success(Some(record.into()), None, None)))
}
