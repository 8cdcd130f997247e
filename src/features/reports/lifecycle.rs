//! Report status state machine and update planning.
//!
//! PENDING -> IN_PROGRESS -> RESOLVED. Any forward move is legal, including
//! PENDING -> RESOLVED. Re-applying the current status is a no-op.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{Report, ReportRecord, ReportStatus};
use crate::shared::clock;
use crate::shared::constants::MAX_ASSIGNEE_LEN;

impl ReportStatus {
    fn stage(self) -> u8 {
        match self {
            ReportStatus::Pending => 0,
            ReportStatus::InProgress => 1,
            ReportStatus::Resolved => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == ReportStatus::Resolved
    }

    pub fn can_transition_to(self, next: ReportStatus) -> bool {
        next.stage() >= self.stage()
    }
}

pub fn check_transition(from: ReportStatus, to: ReportStatus) -> Result<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition(format!(
            "Cannot move report from {} back to {}",
            from, to
        )))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssigneeChange {
    Keep,
    Clear,
    Set(String),
}

/// Parsed and validated `{status?, assignee?}` update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRequest {
    pub status: Option<ReportStatus>,
    pub assignee: AssigneeChange,
}

impl ChangeRequest {
    /// `assignee`: outer `None` when the field was absent, inner `None` for
    /// an explicit null. Blank labels clear the assignee.
    pub fn parse(status: Option<&str>, assignee: Option<Option<String>>) -> Result<Self> {
        let status = status
            .map(|s| s.parse::<ReportStatus>())
            .transpose()
            .map_err(AppError::validation)?;

        let assignee = match assignee {
            None => AssigneeChange::Keep,
            Some(None) => AssigneeChange::Clear,
            Some(Some(label)) => {
                let label = label.trim();
                if label.is_empty() {
                    AssigneeChange::Clear
                } else if label.chars().count() > MAX_ASSIGNEE_LEN {
                    return Err(AppError::validation(format!(
                        "assignee: must be at most {} characters",
                        MAX_ASSIGNEE_LEN
                    )));
                } else {
                    AssigneeChange::Set(label.to_string())
                }
            }
        };

        if status.is_none() && assignee == AssigneeChange::Keep {
            return Err(AppError::validation(
                "body: at least one of status or assignee is required",
            ));
        }

        Ok(Self { status, assignee })
    }
}

/// The row values an accepted update will write
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChange {
    pub previous_status: ReportStatus,
    pub status: ReportStatus,
    pub assignee: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl PlannedChange {
    pub fn status_changed(&self) -> bool {
        self.previous_status != self.status
    }
}

/// Merge a change request into the current report state
pub fn plan(current: &Report, request: &ChangeRequest) -> Result<PlannedChange> {
    let status = match request.status {
        Some(next) => {
            check_transition(current.status, next)?;
            next
        }
        None => current.status,
    };

    let assignee = match &request.assignee {
        AssigneeChange::Keep => current.assignee.clone(),
        AssigneeChange::Clear => None,
        AssigneeChange::Set(label) => Some(label.clone()),
    };

    Ok(PlannedChange {
        previous_status: current.status,
        status,
        assignee,
        updated_at: clock::next_after(current.updated_at),
    })
}

/// Emitted after a committed update that changed the status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportStatusChanged {
    pub report_id: Uuid,
    pub previous_status: ReportStatus,
    pub new_status: ReportStatus,
    pub assignee: Option<String>,
    pub owner_email: String,
    pub owner_display_name: Option<String>,
    pub changed_at: DateTime<Utc>,
}

impl ReportStatusChanged {
    pub fn new(previous_status: ReportStatus, record: &ReportRecord) -> Self {
        Self {
            report_id: record.report.id,
            previous_status,
            new_status: record.report.status,
            assignee: record.report.assignee.clone(),
            owner_email: record.owner.email.clone(),
            owner_display_name: record.owner.display_name.clone(),
            changed_at: record.report.updated_at,
        }
    }
}
