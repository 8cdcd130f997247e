use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{CreateReport, ReportRecord, ReportRow, ReportStatus};

/// Which reports a listing may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportScope {
    All,
    OwnedBy(Uuid),
}

/// Storage for reports. Listings come back newest first.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn create(&self, data: &CreateReport) -> Result<ReportRecord>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ReportRecord>>;

    async fn list(&self, scope: ReportScope) -> Result<Vec<ReportRecord>>;

    /// Write status and assignee in one statement
    async fn update_status_and_assignee(
        &self,
        id: Uuid,
        status: ReportStatus,
        assignee: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<ReportRecord>>;

    async fn replace_photos(
        &self,
        id: Uuid,
        photos: &[String],
        updated_at: DateTime<Utc>,
    ) -> Result<Option<ReportRecord>>;
}

/// Columns of `r` (reports) joined with `u` (users)
const RECORD_COLUMNS: &str = r#"
    r.id, r.owner_id, r.issue_type, r.severity, r.description,
    r.latitude, r.longitude, r.address, r.photos, r.status, r.assignee,
    r.created_at, r.updated_at,
    u.email AS owner_email, u.display_name AS owner_display_name
"#;

/// Postgres-backed report storage
pub struct PgReportRepository {
    pool: PgPool,
}

impl PgReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn into_records(rows: Vec<ReportRow>) -> Result<Vec<ReportRecord>> {
        rows.into_iter().map(ReportRecord::try_from).collect()
    }
}

#[async_trait]
impl ReportRepository for PgReportRepository {
    async fn create(&self, data: &CreateReport) -> Result<ReportRecord> {
        let coordinates = data.report.location.coordinates();
        let query = format!(
            r#"
            WITH inserted AS (
                INSERT INTO reports (
                    id, owner_id, issue_type, severity, description,
                    latitude, longitude, address, photos, status, assignee,
                    created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NULL, $11, $11)
                RETURNING *
            )
            SELECT {}
            FROM inserted r
            JOIN users u ON u.id = r.owner_id
            "#,
            RECORD_COLUMNS
        );

        let row = sqlx::query_as::<_, ReportRow>(&query)
            .bind(data.id)
            .bind(data.owner_id)
            .bind(data.report.issue_type)
            .bind(data.report.severity)
            .bind(&data.report.description)
            .bind(coordinates.map(|c| c.latitude))
            .bind(coordinates.map(|c| c.longitude))
            .bind(data.report.location.address())
            .bind(&data.report.photos)
            .bind(data.status)
            .bind(data.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create report: {:?}", e);
                AppError::Database(e)
            })?;

        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ReportRecord>> {
        let query = format!(
            r#"
            SELECT {}
            FROM reports r
            JOIN users u ON u.id = r.owner_id
            WHERE r.id = $1
            "#,
            RECORD_COLUMNS
        );

        let row = sqlx::query_as::<_, ReportRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get report: {:?}", e);
                AppError::Database(e)
            })?;

        row.map(ReportRecord::try_from).transpose()
    }

    async fn list(&self, scope: ReportScope) -> Result<Vec<ReportRecord>> {
        let rows = match scope {
            ReportScope::All => {
                let query = format!(
                    r#"
                    SELECT {}
                    FROM reports r
                    JOIN users u ON u.id = r.owner_id
                    ORDER BY r.created_at DESC, r.id DESC
                    "#,
                    RECORD_COLUMNS
                );
                sqlx::query_as::<_, ReportRow>(&query)
                    .fetch_all(&self.pool)
                    .await
            }
            ReportScope::OwnedBy(owner_id) => {
                let query = format!(
                    r#"
                    SELECT {}
                    FROM reports r
                    JOIN users u ON u.id = r.owner_id
                    WHERE r.owner_id = $1
                    ORDER BY r.created_at DESC, r.id DESC
                    "#,
                    RECORD_COLUMNS
                );
                sqlx::query_as::<_, ReportRow>(&query)
                    .bind(owner_id)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| {
            tracing::error!("Failed to list reports: {:?}", e);
            AppError::Database(e)
        })?;

        Self::into_records(rows)
    }

    async fn update_status_and_assignee(
        &self,
        id: Uuid,
        status: ReportStatus,
        assignee: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<ReportRecord>> {
        let query = format!(
            r#"
            WITH updated AS (
                UPDATE reports
                SET status = $2, assignee = $3, updated_at = $4
                WHERE id = $1
                RETURNING *
            )
            SELECT {}
            FROM updated r
            JOIN users u ON u.id = r.owner_id
            "#,
            RECORD_COLUMNS
        );

        let row = sqlx::query_as::<_, ReportRow>(&query)
            .bind(id)
            .bind(status)
            .bind(assignee)
            .bind(updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update report: {:?}", e);
                AppError::Database(e)
            })?;

        row.map(ReportRecord::try_from).transpose()
    }

    async fn replace_photos(
        &self,
        id: Uuid,
        photos: &[String],
        updated_at: DateTime<Utc>,
    ) -> Result<Option<ReportRecord>> {
        let query = format!(
            r#"
            WITH updated AS (
                UPDATE reports
                SET photos = $2, updated_at = $3
                WHERE id = $1
                RETURNING *
            )
            SELECT {}
            FROM updated r
            JOIN users u ON u.id = r.owner_id
            "#,
            RECORD_COLUMNS
        );

        let row = sqlx::query_as::<_, ReportRow>(&query)
            .bind(id)
            .bind(photos)
            .bind(updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update report photos: {:?}", e);
                AppError::Database(e)
            })?;

        row.map(ReportRecord::try_from).transpose()
    }
}
