use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{field_messages, AppError, Result};
use crate::features::reports::models::{
    Coordinates, IssueType, Location, NewReport, ReportRecord, ReportSeverity, ReportStatus,
};
use crate::features::reports::query::{RawReportQuery, ReportQuery};
use crate::shared::constants::{
    DEFAULT_PAGE_SIZE, MAX_ADDRESS_LEN, MAX_DESCRIPTION_LEN, MAX_PHOTOS_PER_REPORT,
};
use crate::shared::types::PaginationQuery;
use crate::shared::validation::validate_photo_payload;

// =============================================================================
// REQUESTS
// =============================================================================

/// Request body for submitting a report.
///
/// Enum fields are taken as strings so a missing or unknown value is reported
/// per field alongside every other problem in the body.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateReportDto {
    /// LEAKAGE, WATER_QUALITY_PROBLEM or OTHER
    #[schema(example = "LEAKAGE")]
    pub issue_type: Option<String>,
    /// LOW, MEDIUM, HIGH or CRITICAL
    #[schema(example = "HIGH")]
    pub severity: Option<String>,
    #[validate(length(max = (MAX_DESCRIPTION_LEN as u64), message = "must be at most 5000 characters"))]
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[validate(length(max = (MAX_ADDRESS_LEN as u64), message = "must be at most 500 characters"))]
    pub address: Option<String>,
    /// Base64 image data URLs or bare base64
    #[serde(default)]
    #[validate(length(max = (MAX_PHOTOS_PER_REPORT as u64), message = "at most 10 photos per report"))]
    pub photos: Vec<String>,
}

impl TryFrom<CreateReportDto> for NewReport {
    type Error = AppError;

    fn try_from(dto: CreateReportDto) -> Result<Self> {
        let mut errors = match dto.validate() {
            Ok(()) => Vec::new(),
            Err(e) => field_messages(&e),
        };

        let issue_type = match dto.issue_type.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push("issue_type: is required".to_string());
                None
            }
            Some(value) => value
                .parse::<IssueType>()
                .map_err(|e| errors.push(e))
                .ok(),
        };

        let severity = match dto.severity.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push("severity: is required".to_string());
                None
            }
            Some(value) => value
                .parse::<ReportSeverity>()
                .map_err(|e| errors.push(e))
                .ok(),
        };

        let description = dto.description.as_deref().map(str::trim).unwrap_or("");
        if description.is_empty() {
            errors.push("description: is required".to_string());
        }

        let coordinates = match (dto.latitude, dto.longitude) {
            (Some(latitude), Some(longitude)) => Coordinates::new(latitude, longitude)
                .map_err(|e| errors.push(e))
                .ok(),
            (None, None) => None,
            _ => {
                errors.push(
                    "location: latitude and longitude must be provided together".to_string(),
                );
                None
            }
        };

        let location = Location::from_parts(coordinates, dto.address);
        let coordinates_rejected = dto.latitude.is_some() || dto.longitude.is_some();
        if location.is_none() && !coordinates_rejected {
            errors.push("location: coordinates or an address is required".to_string());
        }

        for (index, photo) in dto.photos.iter().enumerate() {
            if let Err(e) = validate_photo_payload(photo) {
                errors.push(format!("photos[{}]: {}", index, e));
            }
        }

        match (issue_type, severity, location) {
            (Some(issue_type), Some(severity), Some(location)) if errors.is_empty() => {
                Ok(NewReport {
                    issue_type,
                    severity,
                    description: description.to_string(),
                    location,
                    photos: dto.photos,
                })
            }
            _ => Err(AppError::Validation(errors)),
        }
    }
}

/// Request body for a report update. Absent fields are left unchanged;
/// `"assignee": null` clears the assignee.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateReportDto {
    /// PENDING, IN_PROGRESS or RESOLVED
    #[schema(example = "IN_PROGRESS")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    #[schema(value_type = Option<String>, example = "Field crew 3")]
    pub assignee: Option<Option<String>>,
}

/// Distinguish a field sent as `null` from a field left out
fn present_or_null<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddPhotoDto {
    /// Base64 image data URL or bare base64
    pub photo: String,
}

/// Filter, sort and pagination parameters for report listings
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ReportQueryParams {
    /// Case-insensitive text in description, address, owner or id
    pub search: Option<String>,
    /// Status filter or "all"
    pub status: Option<String>,
    /// Severity filter or "all"
    pub severity: Option<String>,
    /// Issue type filter or "all"
    pub issue_type: Option<String>,
    /// created_at or severity; input order when omitted
    pub sort_by: Option<String>,
    /// asc or desc (default: desc)
    pub sort_dir: Option<String>,
    /// Page number (1-indexed, default: 1). Ignored by export.
    #[param(minimum = 1)]
    pub page: Option<i64>,
    /// Items per page (default: 10, max: 100). Ignored by export.
    #[param(minimum = 1, maximum = 100)]
    pub page_size: Option<i64>,
}

impl ReportQueryParams {
    pub fn to_query(&self) -> Result<ReportQuery> {
        ReportQuery::parse(RawReportQuery {
            search: self.search.as_deref(),
            status: self.status.as_deref(),
            severity: self.severity.as_deref(),
            issue_type: self.issue_type.as_deref(),
            sort_by: self.sort_by.as_deref(),
            sort_dir: self.sort_dir.as_deref(),
        })
    }

    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page.unwrap_or(1),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Full report, including photo payloads
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportResponseDto {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_email: String,
    pub owner_display_name: Option<String>,
    pub issue_type: IssueType,
    pub severity: ReportSeverity,
    pub description: String,
    pub location: Location,
    pub photos: Vec<String>,
    pub status: ReportStatus,
    pub assignee: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReportRecord> for ReportResponseDto {
    fn from(record: ReportRecord) -> Self {
        let r = record.report;
        Self {
            id: r.id,
            owner_id: r.owner_id,
            owner_email: record.owner.email,
            owner_display_name: record.owner.display_name,
            issue_type: r.issue_type,
            severity: r.severity,
            description: r.description,
            location: r.location,
            photos: r.photos,
            status: r.status,
            assignee: r.assignee,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Listing row; photos are summarized as a count
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportSummaryDto {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_email: String,
    pub owner_display_name: Option<String>,
    pub issue_type: IssueType,
    pub severity: ReportSeverity,
    pub description: String,
    pub location: Location,
    pub photo_count: usize,
    pub status: ReportStatus,
    pub assignee: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReportRecord> for ReportSummaryDto {
    fn from(record: ReportRecord) -> Self {
        let r = record.report;
        Self {
            id: r.id,
            owner_id: r.owner_id,
            owner_email: record.owner.email,
            owner_display_name: record.owner.display_name,
            issue_type: r.issue_type,
            severity: r.severity,
            description: r.description,
            location: r.location,
            photo_count: r.photos.len(),
            status: r.status,
            assignee: r.assignee,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
