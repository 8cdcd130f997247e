use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::policy::{authorize, can_view_report, Operation};
use crate::features::reports::export::reports_to_csv;
use crate::features::reports::lifecycle::{self, ChangeRequest, ReportStatusChanged};
use crate::features::reports::models::{CreateReport, NewReport, ReportRecord, ReportStatus};
use crate::features::reports::query::ReportQuery;
use crate::features::reports::repositories::{ReportRepository, ReportScope};
use crate::shared::clock;
use crate::shared::constants::MAX_PHOTOS_PER_REPORT;
use crate::shared::validation::validate_photo_payload;

use super::notification_service::{self, ReportNotifier};

/// Which reports a listing covers, from the caller's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    /// Every report (operators)
    All,
    /// Only the caller's own reports
    Own,
}

impl Listing {
    /// Operation checked before a listing of this kind is served
    pub fn operation(self) -> Operation {
        match self {
            Listing::All => Operation::ListAllReports,
            Listing::Own => Operation::ListOwnReports,
        }
    }
}

/// Service for report operations
pub struct ReportService {
    reports: Arc<dyn ReportRepository>,
    notifier: Arc<dyn ReportNotifier>,
    notification_timeout: Duration,
}

impl ReportService {
    pub fn new(
        reports: Arc<dyn ReportRepository>,
        notifier: Arc<dyn ReportNotifier>,
        notification_timeout: Duration,
    ) -> Self {
        Self {
            reports,
            notifier,
            notification_timeout,
        }
    }

    /// Submit a report as the caller. Starts PENDING with no assignee.
    pub async fn create(
        &self,
        caller: &AuthenticatedUser,
        report: NewReport,
    ) -> Result<ReportRecord> {
        authorize(caller, Operation::CreateReport)?;

        let data = CreateReport {
            id: Uuid::now_v7(),
            owner_id: caller.id,
            report,
            status: ReportStatus::Pending,
            created_at: clock::now(),
        };

        let record = self.reports.create(&data).await?;

        tracing::info!(
            "Created report {} ({}, {}) by {}",
            record.report.id,
            record.report.issue_type,
            record.report.severity,
            caller.id
        );

        Ok(record)
    }

    /// Fetch one report. Reports the caller may not see are `NotFound`.
    pub async fn get(&self, caller: &AuthenticatedUser, id: Uuid) -> Result<ReportRecord> {
        authorize(caller, Operation::ViewReport)?;

        let record = self.find(id).await?;
        if !can_view_report(caller, record.report.owner_id) {
            tracing::debug!("User {} denied view of report {}", caller.id, id);
            return Err(not_found(id));
        }

        Ok(record)
    }

    /// Filtered and sorted listing. The scope is derived from the caller.
    pub async fn list(
        &self,
        caller: &AuthenticatedUser,
        listing: Listing,
        query: &ReportQuery,
    ) -> Result<Vec<ReportRecord>> {
        authorize(caller, listing.operation())?;
        let scope = match listing {
            Listing::All => ReportScope::All,
            Listing::Own => ReportScope::OwnedBy(caller.id),
        };

        let records = self.reports.list(scope).await?;
        Ok(query.apply(&records))
    }

    /// CSV of the filtered and sorted operator listing
    pub async fn export_csv(
        &self,
        caller: &AuthenticatedUser,
        query: &ReportQuery,
    ) -> Result<String> {
        authorize(caller, Operation::ExportReports)?;

        let records = self.reports.list(ReportScope::All).await?;
        let selected = query.apply(&records);

        tracing::info!("User {} exported {} reports", caller.id, selected.len());

        Ok(reports_to_csv(&selected))
    }

    /// Apply a status and/or assignee change in one write.
    ///
    /// A status change is announced to the notifier after the write succeeds.
    pub async fn update(
        &self,
        caller: &AuthenticatedUser,
        id: Uuid,
        request: ChangeRequest,
    ) -> Result<ReportRecord> {
        authorize(caller, Operation::UpdateReport)?;

        let current = self.find(id).await?;
        let planned = lifecycle::plan(&current.report, &request)?;

        let updated = self
            .reports
            .update_status_and_assignee(
                id,
                planned.status,
                planned.assignee.as_deref(),
                planned.updated_at,
            )
            .await?
            .ok_or_else(|| not_found(id))?;

        if planned.status_changed() {
            tracing::info!(
                "Report {} status {} -> {} by {}",
                id,
                planned.previous_status,
                planned.status,
                caller.id
            );
            notification_service::dispatch(
                Arc::clone(&self.notifier),
                ReportStatusChanged::new(planned.previous_status, &updated),
                self.notification_timeout,
            );
        } else {
            tracing::info!("Report {} updated by {}", id, caller.id);
        }

        Ok(updated)
    }

    pub async fn append_photo(
        &self,
        caller: &AuthenticatedUser,
        id: Uuid,
        photo: String,
    ) -> Result<ReportRecord> {
        authorize(caller, Operation::ManagePhotos)?;
        validate_photo_payload(&photo).map_err(|e| AppError::validation(format!("photo: {}", e)))?;

        let current = self.find(id).await?;
        if current.report.photos.len() >= MAX_PHOTOS_PER_REPORT {
            return Err(AppError::validation(format!(
                "photos: at most {} photos per report",
                MAX_PHOTOS_PER_REPORT
            )));
        }

        let mut photos = current.report.photos;
        photos.push(photo);

        let updated = self
            .reports
            .replace_photos(id, &photos, clock::next_after(current.report.updated_at))
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!("Photo added to report {} by {}", id, caller.id);

        Ok(updated)
    }

    pub async fn remove_photo(
        &self,
        caller: &AuthenticatedUser,
        id: Uuid,
        index: usize,
    ) -> Result<ReportRecord> {
        authorize(caller, Operation::ManagePhotos)?;

        let current = self.find(id).await?;
        let mut photos = current.report.photos;
        if index >= photos.len() {
            return Err(AppError::NotFound(format!(
                "Photo {} not found on report {}",
                index, id
            )));
        }
        photos.remove(index);

        let updated = self
            .reports
            .replace_photos(id, &photos, clock::next_after(current.report.updated_at))
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!("Photo {} removed from report {} by {}", index, id, caller.id);

        Ok(updated)
    }

    async fn find(&self, id: Uuid) -> Result<ReportRecord> {
        self.reports.find_by_id(id).await?.ok_or_else(|| not_found(id))
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Report {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reports::models::{Coordinates, IssueType, Location, ReportSeverity};
    use crate::features::reports::query::RawReportQuery;
    use crate::features::users::models::UserRole;
    use crate::shared::test_helpers::{
        create_user, ChannelNotifier, FailingNotifier, InMemoryReportRepository,
        InMemoryUserRepository,
    };
    use fake::faker::lorem::en::Sentence;
    use fake::Fake;

    const PHOTO_A: &str = "data:image/png;base64,QUFBQQ==";
    const PHOTO_B: &str = "QkJCQg==";
    const PHOTO_C: &str = "data:image/jpeg;base64,Q0NDQw==";

    struct Setup {
        service: ReportService,
        users: Arc<InMemoryUserRepository>,
    }

    fn setup_with(notifier: Arc<dyn ReportNotifier>) -> Setup {
        let users = Arc::new(InMemoryUserRepository::default());
        let reports = Arc::new(InMemoryReportRepository::new(users.clone()));
        Setup {
            service: ReportService::new(reports, notifier, Duration::from_secs(1)),
            users,
        }
    }

    fn setup() -> Setup {
        setup_with(Arc::new(notification_service::LogNotifier))
    }

    async fn seeded(setup: &Setup, email: &str, role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser::from(setup.users.seed(email, role).await)
    }

    fn new_report(severity: ReportSeverity) -> NewReport {
        NewReport {
            issue_type: IssueType::Leakage,
            severity,
            description: Sentence(3..8).fake(),
            location: Location::CoordinatesOnly {
                coordinates: Coordinates::new(-6.9, 107.6).unwrap(),
            },
            photos: vec![],
        }
    }

    fn change(status: Option<&str>, assignee: Option<Option<&str>>) -> ChangeRequest {
        ChangeRequest::parse(status, assignee.map(|a| a.map(String::from))).unwrap()
    }

    // Reporter submits; technician picks it up; administrator resolves.
    #[tokio::test]
    async fn test_full_lifecycle_scenario() {
        let setup = setup();
        let reporter = seeded(&setup, "r@x.com", UserRole::Reporter).await;
        let technician = seeded(&setup, "t@x.com", UserRole::Technician).await;
        let admin = seeded(&setup, "a@x.com", UserRole::Administrator).await;

        let created = setup
            .service
            .create(&reporter, new_report(ReportSeverity::High))
            .await
            .unwrap();
        assert_eq!(created.report.status, ReportStatus::Pending);
        assert_eq!(created.report.assignee, None);
        assert_eq!(created.report.created_at, created.report.updated_at);
        assert_eq!(created.owner.email, "r@x.com");

        let id = created.report.id;
        let in_progress = setup
            .service
            .update(&technician, id, change(Some("IN_PROGRESS"), Some(Some("crew-4"))))
            .await
            .unwrap();
        assert_eq!(in_progress.report.status, ReportStatus::InProgress);
        assert_eq!(in_progress.report.assignee.as_deref(), Some("crew-4"));
        assert!(in_progress.report.updated_at > created.report.updated_at);

        let resolved = setup
            .service
            .update(&admin, id, change(Some("RESOLVED"), None))
            .await
            .unwrap();
        assert_eq!(resolved.report.status, ReportStatus::Resolved);
        assert_eq!(resolved.report.assignee.as_deref(), Some("crew-4"));
        assert!(resolved.report.updated_at > in_progress.report.updated_at);

        let seen = setup.service.get(&reporter, id).await.unwrap();
        assert_eq!(seen.report.status, ReportStatus::Resolved);
    }

    #[tokio::test]
    async fn test_reporter_cannot_update_status() {
        let setup = setup();
        let reporter = seeded(&setup, "r@x.com", UserRole::Reporter).await;
        let created = setup
            .service
            .create(&reporter, new_report(ReportSeverity::Low))
            .await
            .unwrap();

        let err = setup
            .service
            .update(&reporter, created.report.id, change(Some("RESOLVED"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let unchanged = setup.service.get(&reporter, created.report.id).await.unwrap();
        assert_eq!(unchanged, created);
    }

    #[tokio::test]
    async fn test_reporter_listing_is_scoped_to_self() {
        let setup = setup();
        let alice = seeded(&setup, "alice@x.com", UserRole::Reporter).await;
        let bob = seeded(&setup, "bob@x.com", UserRole::Reporter).await;

        setup
            .service
            .create(&alice, new_report(ReportSeverity::Low))
            .await
            .unwrap();
        let bobs = setup
            .service
            .create(&bob, new_report(ReportSeverity::Medium))
            .await
            .unwrap();

        let own = setup
            .service
            .list(&alice, Listing::Own, &ReportQuery::default())
            .await
            .unwrap();
        assert_eq!(own.len(), 1);
        assert!(own.iter().all(|r| r.report.owner_id == alice.id));

        let err = setup
            .service
            .list(&alice, Listing::All, &ReportQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = setup.service.get(&alice, bobs.report.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_resolved_cannot_reopen() {
        let setup = setup();
        let reporter = seeded(&setup, "r@x.com", UserRole::Reporter).await;
        let technician = seeded(&setup, "t@x.com", UserRole::Technician).await;
        let id = setup
            .service
            .create(&reporter, new_report(ReportSeverity::Critical))
            .await
            .unwrap()
            .report
            .id;

        setup
            .service
            .update(&technician, id, change(Some("RESOLVED"), None))
            .await
            .unwrap();

        let err = setup
            .service
            .update(&technician, id, change(Some("PENDING"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));

        let stored = setup.service.get(&technician, id).await.unwrap();
        assert_eq!(stored.report.status, ReportStatus::Resolved);
    }

    #[tokio::test]
    async fn test_operator_listing_sorted_by_severity() {
        let setup = setup();
        let reporter = seeded(&setup, "r@x.com", UserRole::Reporter).await;
        let technician = seeded(&setup, "t@x.com", UserRole::Technician).await;

        for severity in [
            ReportSeverity::Medium,
            ReportSeverity::Critical,
            ReportSeverity::Low,
            ReportSeverity::High,
        ] {
            setup
                .service
                .create(&reporter, new_report(severity))
                .await
                .unwrap();
        }

        let query = ReportQuery::parse(RawReportQuery {
            sort_by: Some("severity"),
            sort_dir: Some("desc"),
            ..Default::default()
        })
        .unwrap();
        let listed = setup
            .service
            .list(&technician, Listing::All, &query)
            .await
            .unwrap();

        let severities: Vec<ReportSeverity> = listed.iter().map(|r| r.report.severity).collect();
        assert_eq!(
            severities,
            vec![
                ReportSeverity::Critical,
                ReportSeverity::High,
                ReportSeverity::Medium,
                ReportSeverity::Low
            ]
        );
    }

    #[tokio::test]
    async fn test_banned_technician_cannot_update_but_can_read() {
        let setup = setup();
        let reporter = seeded(&setup, "r@x.com", UserRole::Reporter).await;
        let id = setup
            .service
            .create(&reporter, new_report(ReportSeverity::Low))
            .await
            .unwrap()
            .report
            .id;

        let mut technician = create_user(UserRole::Technician);
        technician.is_banned = true;

        let err = setup
            .service
            .update(&technician, id, change(Some("IN_PROGRESS"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        assert!(setup.service.get(&technician, id).await.is_ok());
    }

    #[tokio::test]
    async fn test_banned_reporter_cannot_create() {
        let setup = setup();
        let mut reporter = seeded(&setup, "r@x.com", UserRole::Reporter).await;
        reporter.is_banned = true;

        let err = setup
            .service
            .create(&reporter, new_report(ReportSeverity::Low))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_update_unknown_report_not_found() {
        let setup = setup();
        let technician = create_user(UserRole::Technician);

        let err = setup
            .service
            .update(&technician, Uuid::now_v7(), change(Some("RESOLVED"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_status_change_notifies_after_commit() {
        let (notifier, mut rx) = ChannelNotifier::new();
        let setup = setup_with(Arc::new(notifier));
        let reporter = seeded(&setup, "r@x.com", UserRole::Reporter).await;
        let technician = seeded(&setup, "t@x.com", UserRole::Technician).await;
        let id = setup
            .service
            .create(&reporter, new_report(ReportSeverity::High))
            .await
            .unwrap()
            .report
            .id;

        setup
            .service
            .update(&technician, id, change(Some("IN_PROGRESS"), None))
            .await
            .unwrap();

        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.report_id, id);
        assert_eq!(event.previous_status, ReportStatus::Pending);
        assert_eq!(event.new_status, ReportStatus::InProgress);
        assert_eq!(event.owner_email, "r@x.com");
    }

    #[tokio::test]
    async fn test_assignee_only_change_does_not_notify() {
        let (notifier, mut rx) = ChannelNotifier::new();
        let setup = setup_with(Arc::new(notifier));
        let reporter = seeded(&setup, "r@x.com", UserRole::Reporter).await;
        let technician = seeded(&setup, "t@x.com", UserRole::Technician).await;
        let id = setup
            .service
            .create(&reporter, new_report(ReportSeverity::High))
            .await
            .unwrap()
            .report
            .id;

        let updated = setup
            .service
            .update(&technician, id, change(Some("PENDING"), Some(Some("crew-9"))))
            .await
            .unwrap();
        assert_eq!(updated.report.assignee.as_deref(), Some("crew-9"));

        let cleared = setup
            .service
            .update(&technician, id, change(None, Some(None)))
            .await
            .unwrap();
        assert_eq!(cleared.report.assignee, None);

        let waited = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_notifier_failure_keeps_update() {
        let setup = setup_with(Arc::new(FailingNotifier));
        let reporter = seeded(&setup, "r@x.com", UserRole::Reporter).await;
        let technician = seeded(&setup, "t@x.com", UserRole::Technician).await;
        let id = setup
            .service
            .create(&reporter, new_report(ReportSeverity::High))
            .await
            .unwrap()
            .report
            .id;

        let updated = setup
            .service
            .update(&technician, id, change(Some("RESOLVED"), None))
            .await
            .unwrap();
        assert_eq!(updated.report.status, ReportStatus::Resolved);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let stored = setup.service.get(&technician, id).await.unwrap();
        assert_eq!(stored.report.status, ReportStatus::Resolved);
    }

    #[tokio::test]
    async fn test_photo_append_and_remove_keep_order() {
        let setup = setup();
        let reporter = seeded(&setup, "r@x.com", UserRole::Reporter).await;
        let technician = seeded(&setup, "t@x.com", UserRole::Technician).await;
        let id = setup
            .service
            .create(&reporter, new_report(ReportSeverity::Medium))
            .await
            .unwrap()
            .report
            .id;

        for photo in [PHOTO_A, PHOTO_B, PHOTO_C] {
            setup
                .service
                .append_photo(&technician, id, photo.to_string())
                .await
                .unwrap();
        }

        let after_remove = setup.service.remove_photo(&technician, id, 1).await.unwrap();
        assert_eq!(after_remove.report.photos, vec![PHOTO_A, PHOTO_C]);

        let err = setup
            .service
            .remove_photo(&technician, id, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = setup
            .service
            .append_photo(&reporter, id, PHOTO_A.to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_photo_limit_enforced() {
        let setup = setup();
        let reporter = seeded(&setup, "r@x.com", UserRole::Reporter).await;
        let technician = seeded(&setup, "t@x.com", UserRole::Technician).await;
        let mut report = new_report(ReportSeverity::Medium);
        report.photos = vec![PHOTO_B.to_string(); MAX_PHOTOS_PER_REPORT];
        let id = setup
            .service
            .create(&reporter, report)
            .await
            .unwrap()
            .report
            .id;

        let err = setup
            .service
            .append_photo(&technician, id, PHOTO_A.to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = setup
            .service
            .append_photo(&technician, id, "data:text/plain;base64,QQ==".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_export_requires_operator_and_respects_filters() {
        let setup = setup();
        let reporter = seeded(&setup, "r@x.com", UserRole::Reporter).await;
        let technician = seeded(&setup, "t@x.com", UserRole::Technician).await;

        for severity in [ReportSeverity::Low, ReportSeverity::Critical] {
            setup
                .service
                .create(&reporter, new_report(severity))
                .await
                .unwrap();
        }

        let err = setup
            .service
            .export_csv(&reporter, &ReportQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let query = ReportQuery::parse(RawReportQuery {
            severity: Some("CRITICAL"),
            ..Default::default()
        })
        .unwrap();
        let csv = setup.service.export_csv(&technician, &query).await.unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.contains("CRITICAL"));
    }
}
