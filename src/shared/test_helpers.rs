use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, Router};
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::reports::lifecycle::ReportStatusChanged;
use crate::features::reports::models::{
    CreateReport, Report, ReportOwner, ReportRecord, ReportStatus,
};
use crate::features::reports::repositories::{ReportRepository, ReportScope};
use crate::features::reports::services::ReportNotifier;
use crate::features::users::models::{CreateUser, User, UserRole};
use crate::features::users::repositories::UserRepository;
use crate::shared::clock;

// =============================================================================
// IDENTITIES
// =============================================================================

/// An authenticated caller that exists only in the request
pub fn create_user(role: UserRole) -> AuthenticatedUser {
    let id = Uuid::now_v7();
    AuthenticatedUser {
        id,
        email: format!("{}@test.local", id.simple()),
        display_name: None,
        role,
        is_banned: false,
    }
}

pub fn create_stored_user(email: &str, role: UserRole) -> User {
    let now = clock::now();
    User {
        id: Uuid::now_v7(),
        email: email.to_lowercase(),
        display_name: None,
        password_hash: "not-a-real-hash".to_string(),
        role,
        is_banned: false,
        created_at: now,
        updated_at: now,
    }
}

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-secret-that-is-at-least-32-characters".to_string(),
        issuer: "tirta-core-test".to_string(),
        token_ttl: Duration::from_secs(3600),
        jwt_leeway: Duration::from_secs(60),
    }
}

// =============================================================================
// REPOSITORIES
// =============================================================================

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    /// Store a user directly, bypassing registration
    pub async fn seed(&self, email: &str, role: UserRole) -> User {
        let user = create_stored_user(email, role);
        self.users.write().await.push(user.clone());
        user
    }

    async fn modify(
        &self,
        id: Uuid,
        updated_at: DateTime<Utc>,
        change: impl FnOnce(&mut User),
    ) -> Option<User> {
        let mut users = self.users.write().await;
        let user = users.iter_mut().find(|u| u.id == id)?;
        change(user);
        user.updated_at = updated_at;
        Some(user.clone())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, data: &CreateUser) -> Result<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == data.email) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let user = User {
            id: data.id,
            email: data.email.clone(),
            display_name: data.display_name.clone(),
            password_hash: data.password_hash.clone(),
            role: data.role,
            is_banned: false,
            created_at: data.created_at,
            updated_at: data.created_at,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>> {
        let mut users = self.users.read().await.clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn set_banned(
        &self,
        id: Uuid,
        is_banned: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>> {
        Ok(self
            .modify(id, updated_at, |u| u.is_banned = is_banned)
            .await)
    }

    async fn set_role(
        &self,
        id: Uuid,
        role: UserRole,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>> {
        Ok(self.modify(id, updated_at, |u| u.role = role).await)
    }
}

/// Report storage joined against an in-memory user store
pub struct InMemoryReportRepository {
    users: Arc<InMemoryUserRepository>,
    reports: RwLock<Vec<Report>>,
}

impl InMemoryReportRepository {
    pub fn new(users: Arc<InMemoryUserRepository>) -> Self {
        Self {
            users,
            reports: RwLock::new(Vec::new()),
        }
    }

    async fn with_owner(&self, report: Report) -> Result<ReportRecord> {
        let owner = self
            .users
            .find_by_id(report.owner_id)
            .await?
            .ok_or(AppError::Database(sqlx::Error::RowNotFound))?;

        Ok(ReportRecord {
            report,
            owner: ReportOwner {
                email: owner.email,
                display_name: owner.display_name,
            },
        })
    }

    async fn modify(
        &self,
        id: Uuid,
        updated_at: DateTime<Utc>,
        change: impl FnOnce(&mut Report),
    ) -> Result<Option<ReportRecord>> {
        let updated = {
            let mut reports = self.reports.write().await;
            match reports.iter_mut().find(|r| r.id == id) {
                Some(report) => {
                    change(report);
                    report.updated_at = updated_at;
                    report.clone()
                }
                None => return Ok(None),
            }
        };
        self.with_owner(updated).await.map(Some)
    }
}

#[async_trait]
impl ReportRepository for InMemoryReportRepository {
    async fn create(&self, data: &CreateReport) -> Result<ReportRecord> {
        let report = Report {
            id: data.id,
            owner_id: data.owner_id,
            issue_type: data.report.issue_type,
            severity: data.report.severity,
            description: data.report.description.clone(),
            location: data.report.location.clone(),
            photos: data.report.photos.clone(),
            status: data.status,
            assignee: None,
            created_at: data.created_at,
            updated_at: data.created_at,
        };

        let record = self.with_owner(report.clone()).await?;
        self.reports.write().await.push(report);
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ReportRecord>> {
        let found = self.reports.read().await.iter().find(|r| r.id == id).cloned();
        match found {
            Some(report) => self.with_owner(report).await.map(Some),
            None => Ok(None),
        }
    }

    async fn list(&self, scope: ReportScope) -> Result<Vec<ReportRecord>> {
        let mut selected: Vec<Report> = self
            .reports
            .read()
            .await
            .iter()
            .filter(|r| match scope {
                ReportScope::All => true,
                ReportScope::OwnedBy(owner_id) => r.owner_id == owner_id,
            })
            .cloned()
            .collect();
        selected.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        let mut records = Vec::with_capacity(selected.len());
        for report in selected {
            records.push(self.with_owner(report).await?);
        }
        Ok(records)
    }

    async fn update_status_and_assignee(
        &self,
        id: Uuid,
        status: ReportStatus,
        assignee: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<ReportRecord>> {
        let assignee = assignee.map(String::from);
        self.modify(id, updated_at, |r| {
            r.status = status;
            r.assignee = assignee;
        })
        .await
    }

    async fn replace_photos(
        &self,
        id: Uuid,
        photos: &[String],
        updated_at: DateTime<Utc>,
    ) -> Result<Option<ReportRecord>> {
        let photos = photos.to_vec();
        self.modify(id, updated_at, |r| r.photos = photos).await
    }
}

// =============================================================================
// NOTIFIERS
// =============================================================================

/// Forwards every event into a channel the test can await
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<ReportStatusChanged>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReportStatusChanged>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ReportNotifier for ChannelNotifier {
    async fn notify(&self, event: &ReportStatusChanged) -> Result<()> {
        self.tx
            .send(event.clone())
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}

pub struct FailingNotifier;

#[async_trait]
impl ReportNotifier for FailingNotifier {
    async fn notify(&self, _event: &ReportStatusChanged) -> Result<()> {
        Err(AppError::ExternalService("webhook unreachable".to_string()))
    }
}

// =============================================================================
// ROUTER AUTH
// =============================================================================

/// Inject a fixed caller into every request, standing in for the auth middleware
pub fn with_auth(router: Router, user: AuthenticatedUser) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let user = user.clone();
            async move {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
        },
    ))
}
