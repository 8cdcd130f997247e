mod location;
mod report;

pub use location::{Coordinates, Location};
pub use report::{
    CreateReport, IssueType, NewReport, Report, ReportOwner, ReportRecord, ReportRow,
    ReportSeverity, ReportStatus,
};
