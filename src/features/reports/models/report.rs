use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::reports::models::{Coordinates, Location};

/// Report status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "report_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Pending,
    InProgress,
    Resolved,
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Pending => write!(f, "PENDING"),
            ReportStatus::InProgress => write!(f, "IN_PROGRESS"),
            ReportStatus::Resolved => write!(f, "RESOLVED"),
        }
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "PENDING" => Ok(ReportStatus::Pending),
            "IN_PROGRESS" => Ok(ReportStatus::InProgress),
            "RESOLVED" => Ok(ReportStatus::Resolved),
            _ => Err(format!(
                "status must be one of PENDING, IN_PROGRESS, RESOLVED (got '{}')",
                s
            )),
        }
    }
}

/// Report severity enum matching database enum.
///
/// Totally ordered LOW < MEDIUM < HIGH < CRITICAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "report_severity", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReportSeverity {
    /// Numeric rank 1..=4 used for sorting
    pub fn rank(self) -> u8 {
        match self {
            ReportSeverity::Low => 1,
            ReportSeverity::Medium => 2,
            ReportSeverity::High => 3,
            ReportSeverity::Critical => 4,
        }
    }
}

impl std::fmt::Display for ReportSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportSeverity::Low => write!(f, "LOW"),
            ReportSeverity::Medium => write!(f, "MEDIUM"),
            ReportSeverity::High => write!(f, "HIGH"),
            ReportSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl std::str::FromStr for ReportSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "LOW" => Ok(ReportSeverity::Low),
            "MEDIUM" => Ok(ReportSeverity::Medium),
            "HIGH" => Ok(ReportSeverity::High),
            "CRITICAL" => Ok(ReportSeverity::Critical),
            _ => Err(format!(
                "severity must be one of LOW, MEDIUM, HIGH, CRITICAL (got '{}')",
                s
            )),
        }
    }
}

/// Issue classification enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "issue_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    Leakage,
    WaterQualityProblem,
    Other,
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueType::Leakage => write!(f, "LEAKAGE"),
            IssueType::WaterQualityProblem => write!(f, "WATER_QUALITY_PROBLEM"),
            IssueType::Other => write!(f, "OTHER"),
        }
    }
}

impl std::str::FromStr for IssueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "LEAKAGE" => Ok(IssueType::Leakage),
            "WATER_QUALITY_PROBLEM" => Ok(IssueType::WaterQualityProblem),
            "OTHER" => Ok(IssueType::Other),
            _ => Err(format!(
                "issue_type must be one of LEAKAGE, WATER_QUALITY_PROBLEM, OTHER (got '{}')",
                s
            )),
        }
    }
}

/// Accept "in_progress", "In-Progress" and "IN_PROGRESS" alike
fn normalize_token(s: &str) -> String {
    s.trim().replace('-', "_").to_ascii_uppercase()
}

/// A submitted water-issue report
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub issue_type: IssueType,
    pub severity: ReportSeverity,
    pub description: String,
    pub location: Location,
    /// Encoded image payloads, in submission order
    pub photos: Vec<String>,
    pub status: ReportStatus,
    pub assignee: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contact details of the reporting user, joined from `users`
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOwner {
    pub email: String,
    pub display_name: Option<String>,
}

/// A report together with its owner's contact details.
///
/// This is what listings, search and notifications operate on.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRecord {
    pub report: Report,
    pub owner: ReportOwner,
}

/// Validated data for a new report
#[derive(Debug, Clone)]
pub struct NewReport {
    pub issue_type: IssueType,
    pub severity: ReportSeverity,
    pub description: String,
    pub location: Location,
    pub photos: Vec<String>,
}

/// Data for inserting a new report row
#[derive(Debug, Clone)]
pub struct CreateReport {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub report: NewReport,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

/// Database row for a report joined with its owner
#[derive(Debug, Clone, FromRow)]
pub struct ReportRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub issue_type: IssueType,
    pub severity: ReportSeverity,
    pub description: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub photos: Vec<String>,
    pub status: ReportStatus,
    pub assignee: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_email: String,
    pub owner_display_name: Option<String>,
}

impl TryFrom<ReportRow> for ReportRecord {
    type Error = AppError;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        let coordinates = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            (None, None) => None,
            _ => {
                return Err(AppError::Internal(format!(
                    "Report {} has a partial coordinate pair",
                    row.id
                )))
            }
        };

        let location = Location::from_parts(coordinates, row.address).ok_or_else(|| {
            AppError::Internal(format!("Report {} has no stored location", row.id))
        })?;

        Ok(ReportRecord {
            report: Report {
                id: row.id,
                owner_id: row.owner_id,
                issue_type: row.issue_type,
                severity: row.severity,
                description: row.description,
                location,
                photos: row.photos,
                status: row.status,
                assignee: row.assignee,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            owner: ReportOwner {
                email: row.owner_email,
                display_name: row.owner_display_name,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::clock;

    fn row(latitude: Option<f64>, longitude: Option<f64>, address: Option<&str>) -> ReportRow {
        let now = clock::now();
        ReportRow {
            id: Uuid::now_v7(),
            owner_id: Uuid::now_v7(),
            issue_type: IssueType::Leakage,
            severity: ReportSeverity::High,
            description: "pipe burst".to_string(),
            latitude,
            longitude,
            address: address.map(String::from),
            photos: vec![],
            status: ReportStatus::Pending,
            assignee: None,
            created_at: now,
            updated_at: now,
            owner_email: "a@x.com".to_string(),
            owner_display_name: None,
        }
    }

    #[test]
    fn test_enum_tokens_parse_case_insensitively() {
        assert_eq!("in_progress".parse::<ReportStatus>(), Ok(ReportStatus::InProgress));
        assert_eq!("In-Progress".parse::<ReportStatus>(), Ok(ReportStatus::InProgress));
        assert_eq!("critical".parse::<ReportSeverity>(), Ok(ReportSeverity::Critical));
        assert_eq!(
            "water_quality_problem".parse::<IssueType>(),
            Ok(IssueType::WaterQualityProblem)
        );
        assert!("DONE".parse::<ReportStatus>().is_err());
    }

    #[test]
    fn test_enum_serialization_uses_upper_case_tokens() {
        assert_eq!(
            serde_json::to_string(&ReportStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(
            serde_json::to_string(&IssueType::WaterQualityProblem).unwrap(),
            "\"WATER_QUALITY_PROBLEM\""
        );
        assert_eq!(ReportSeverity::Critical.to_string(), "CRITICAL");
    }

    #[test]
    fn test_severity_rank_order() {
        let ranks: Vec<u8> = [
            ReportSeverity::Low,
            ReportSeverity::Medium,
            ReportSeverity::High,
            ReportSeverity::Critical,
        ]
        .iter()
        .map(|s| s.rank())
        .collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_row_into_record_builds_location_variant() {
        let record = ReportRecord::try_from(row(Some(1.0), Some(2.0), Some("5 Elm St"))).unwrap();
        assert!(matches!(record.report.location, Location::Both { .. }));

        let record = ReportRecord::try_from(row(None, None, Some("5 Elm St"))).unwrap();
        assert!(matches!(record.report.location, Location::AddressOnly { .. }));
    }

    #[test]
    fn test_row_without_location_is_internal_error() {
        assert!(matches!(
            ReportRecord::try_from(row(None, None, None)),
            Err(AppError::Internal(_))
        ));
        assert!(matches!(
            ReportRecord::try_from(row(Some(1.0), None, Some("x"))),
            Err(AppError::Internal(_))
        ));
    }
}
