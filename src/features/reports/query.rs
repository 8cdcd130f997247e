//! In-memory filter and sort over report records.
//!
//! Filters are conjunctive. Sorting is stable in both directions, and
//! without a sort key the input order is kept.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{IssueType, ReportRecord, ReportSeverity, ReportStatus};
use crate::shared::constants::FILTER_ALL;

/// A single enum filter; `All` imposes no constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter<T> {
    #[default]
    All,
    Only(T),
}

impl<T> Filter<T>
where
    T: FromStr<Err = String> + PartialEq + Copy,
{
    /// Absent, blank and `"all"` mean no constraint
    pub fn parse(raw: Option<&str>) -> std::result::Result<Self, String> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Filter::All),
            Some(value) if value.eq_ignore_ascii_case(FILTER_ALL) => Ok(Filter::All),
            Some(value) => value.parse().map(Filter::Only),
        }
    }

    fn accepts(&self, value: T) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(expected) => *expected == value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    Severity,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created_at" | "createdat" => Ok(SortKey::CreatedAt),
            "severity" => Ok(SortKey::Severity),
            _ => Err(format!(
                "sort_by must be created_at or severity (got '{}')",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(format!("sort_dir must be asc or desc (got '{}')", s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportQuery {
    /// Case-insensitive substring, stored lower-cased
    pub text: Option<String>,
    pub status: Filter<ReportStatus>,
    pub severity: Filter<ReportSeverity>,
    pub issue_type: Filter<IssueType>,
    pub sort_by: Option<SortKey>,
    pub sort_dir: SortDirection,
}

/// Raw query string values before validation
#[derive(Debug, Clone, Copy, Default)]
pub struct RawReportQuery<'a> {
    pub search: Option<&'a str>,
    pub status: Option<&'a str>,
    pub severity: Option<&'a str>,
    pub issue_type: Option<&'a str>,
    pub sort_by: Option<&'a str>,
    pub sort_dir: Option<&'a str>,
}

impl ReportQuery {
    /// Validate raw values, collecting every offending parameter
    pub fn parse(raw: RawReportQuery<'_>) -> Result<Self> {
        let mut errors = Vec::new();

        let status: Filter<ReportStatus> = Filter::parse(raw.status).unwrap_or_else(|e| {
            errors.push(e);
            Filter::All
        });
        let severity: Filter<ReportSeverity> = Filter::parse(raw.severity).unwrap_or_else(|e| {
            errors.push(e);
            Filter::All
        });
        let issue_type: Filter<IssueType> = Filter::parse(raw.issue_type).unwrap_or_else(|e| {
            errors.push(e);
            Filter::All
        });

        let sort_by = match raw.sort_by.map(str::trim).filter(|s| !s.is_empty()) {
            None => None,
            Some(value) => match value.parse::<SortKey>() {
                Ok(key) => Some(key),
                Err(e) => {
                    errors.push(e);
                    None
                }
            },
        };

        let sort_dir = match raw.sort_dir.map(str::trim).filter(|s| !s.is_empty()) {
            None => SortDirection::default(),
            Some(value) => value.parse::<SortDirection>().unwrap_or_else(|e| {
                errors.push(e);
                SortDirection::default()
            }),
        };

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let text = raw
            .search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        Ok(Self {
            text,
            status,
            severity,
            issue_type,
            sort_by,
            sort_dir,
        })
    }

    pub fn matches(&self, record: &ReportRecord) -> bool {
        let report = &record.report;

        self.status.accepts(report.status)
            && self.severity.accepts(report.severity)
            && self.issue_type.accepts(report.issue_type)
            && self.text.as_deref().map_or(true, |text| {
                contains_folded(&report.description, text)
                    || report
                        .location
                        .address()
                        .is_some_and(|a| contains_folded(a, text))
                    || contains_folded(&record.owner.email, text)
                    || record
                        .owner
                        .display_name
                        .as_deref()
                        .is_some_and(|n| contains_folded(n, text))
                    || report.id.to_string().contains(text)
            })
    }

    fn compare(&self, a: &ReportRecord, b: &ReportRecord) -> Ordering {
        let ordering = match self.sort_by {
            None => return Ordering::Equal,
            Some(SortKey::CreatedAt) => a.report.created_at.cmp(&b.report.created_at),
            Some(SortKey::Severity) => a.report.severity.rank().cmp(&b.report.severity.rank()),
        };

        match self.sort_dir {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    /// Filter then sort, returning a new vector
    pub fn apply(&self, records: &[ReportRecord]) -> Vec<ReportRecord> {
        let mut selected: Vec<ReportRecord> = records
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect();

        // `sort_by` is stable, so ties keep their input order
        selected.sort_by(|a, b| self.compare(a, b));
        selected
    }
}

fn contains_folded(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}
