mod notification_service;
mod report_service;

pub use notification_service::{notifier_from_config, ReportNotifier};
pub use report_service::{Listing, ReportService};
