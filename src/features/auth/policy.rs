//! Authorization matrix for every protected operation.
//!
//! All role and ban checks go through [`authorize`]; handlers and services name
//! the [`Operation`] they perform instead of inspecting roles themselves.
//!
//! | Operation          | REPORTER    | TECHNICIAN | ADMINISTRATOR |
//! |--------------------|-------------|------------|---------------|
//! | CreateReport       | yes (self)  | yes        | yes           |
//! | ListOwnReports     | yes         | yes        | yes           |
//! | ViewReport         | own only    | any        | any           |
//! | ListAllReports     | no          | yes        | yes           |
//! | ExportReports      | no          | yes        | yes           |
//! | UpdateReport       | no          | yes        | yes           |
//! | ManagePhotos       | no          | yes        | yes           |
//! | BanUser            | no          | no         | yes           |
//! | ChangeUserRole     | no          | no         | yes           |
//! | ListUsers          | no          | no         | yes           |
//!
//! Banned users keep read access but every mutating operation is rejected.

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::users::models::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateReport,
    ListOwnReports,
    ViewReport,
    ListAllReports,
    ExportReports,
    UpdateReport,
    ManagePhotos,
    BanUser,
    ChangeUserRole,
    ListUsers,
}

impl Operation {
    pub const ALL: [Operation; 10] = [
        Operation::CreateReport,
        Operation::ListOwnReports,
        Operation::ViewReport,
        Operation::ListAllReports,
        Operation::ExportReports,
        Operation::UpdateReport,
        Operation::ManagePhotos,
        Operation::BanUser,
        Operation::ChangeUserRole,
        Operation::ListUsers,
    ];

    /// Lowest role allowed to perform the operation
    pub fn minimum_role(self) -> UserRole {
        match self {
            Operation::CreateReport | Operation::ListOwnReports | Operation::ViewReport => {
                UserRole::Reporter
            }
            Operation::ListAllReports
            | Operation::ExportReports
            | Operation::UpdateReport
            | Operation::ManagePhotos => UserRole::Technician,
            Operation::BanUser | Operation::ChangeUserRole | Operation::ListUsers => {
                UserRole::Administrator
            }
        }
    }

    pub fn is_mutating(self) -> bool {
        matches!(
            self,
            Operation::CreateReport
                | Operation::UpdateReport
                | Operation::ManagePhotos
                | Operation::BanUser
                | Operation::ChangeUserRole
        )
    }

    fn describe(self) -> &'static str {
        match self {
            Operation::CreateReport => "create reports",
            Operation::ListOwnReports => "list your reports",
            Operation::ViewReport => "view reports",
            Operation::ListAllReports => "list all reports",
            Operation::ExportReports => "export reports",
            Operation::UpdateReport => "change report status or assignment",
            Operation::ManagePhotos => "change report photos",
            Operation::BanUser => "ban or unban users",
            Operation::ChangeUserRole => "change user roles",
            Operation::ListUsers => "list users",
        }
    }
}

/// Check `user` against the matrix for `operation`.
pub fn authorize(user: &AuthenticatedUser, operation: Operation) -> Result<()> {
    if operation.is_mutating() && user.is_banned() {
        tracing::warn!(
            user_id = %user.id,
            ?operation,
            "Rejected mutating operation from banned user"
        );
        return Err(AppError::Forbidden("Account is banned".to_string()));
    }

    let minimum = operation.minimum_role();
    if !user.role.includes(minimum) {
        tracing::debug!(
            user_id = %user.id,
            role = %user.role,
            ?operation,
            "Rejected operation below minimum role"
        );
        return Err(AppError::Forbidden(format!(
            "{} role required to {}",
            minimum,
            operation.describe()
        )));
    }

    Ok(())
}

/// Whether `user` may see a report owned by `owner_id`.
///
/// Operators see every report, reporters only their own.
pub fn can_view_report(user: &AuthenticatedUser, owner_id: Uuid) -> bool {
    user.is_technician_or_above() || user.id == owner_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::create_user;

    const ROLES: [UserRole; 3] = [
        UserRole::Reporter,
        UserRole::Technician,
        UserRole::Administrator,
    ];

    #[test]
    fn test_matrix_below_minimum_is_forbidden_and_at_or_above_proceeds() {
        for operation in Operation::ALL {
            for role in ROLES {
                let user = create_user(role);
                let result = authorize(&user, operation);

                if role.includes(operation.minimum_role()) {
                    assert!(result.is_ok(), "{:?} should allow {:?}", role, operation);
                } else {
                    assert!(
                        matches!(result, Err(AppError::Forbidden(_))),
                        "{:?} should be forbidden for {:?}",
                        role,
                        operation
                    );
                }
            }
        }
    }

    #[test]
    fn test_matrix_rows() {
        assert_eq!(Operation::CreateReport.minimum_role(), UserRole::Reporter);
        assert_eq!(Operation::ListOwnReports.minimum_role(), UserRole::Reporter);
        assert_eq!(Operation::ListAllReports.minimum_role(), UserRole::Technician);
        assert_eq!(Operation::UpdateReport.minimum_role(), UserRole::Technician);
        assert_eq!(Operation::BanUser.minimum_role(), UserRole::Administrator);
    }

    #[test]
    fn test_banned_user_rejected_for_mutations_only() {
        for role in ROLES {
            let mut user = create_user(role);
            user.is_banned = true;

            for operation in Operation::ALL {
                let result = authorize(&user, operation);
                if operation.is_mutating() {
                    assert!(matches!(result, Err(AppError::Forbidden(_))));
                } else if role.includes(operation.minimum_role()) {
                    assert!(result.is_ok());
                }
            }
        }
    }

    #[test]
    fn test_can_view_report() {
        let reporter = create_user(UserRole::Reporter);
        let technician = create_user(UserRole::Technician);
        let other_owner = Uuid::now_v7();

        assert!(can_view_report(&reporter, reporter.id));
        assert!(!can_view_report(&reporter, other_owner));
        assert!(can_view_report(&technician, other_owner));
    }
}
