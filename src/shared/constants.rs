/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// REPORT LIMITS
// =============================================================================

/// Maximum number of photos attached to a single report
pub const MAX_PHOTOS_PER_REPORT: usize = 10;

/// Maximum size of one encoded photo payload, in bytes
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Maximum length of a report description
pub const MAX_DESCRIPTION_LEN: usize = 5000;

/// Maximum length of a free-text address
pub const MAX_ADDRESS_LEN: usize = 500;

/// Maximum length of an assignee label
pub const MAX_ASSIGNEE_LEN: usize = 200;

// =============================================================================
// FILTER SENTINELS
// =============================================================================

/// Query value meaning "no constraint" for enum filters
pub const FILTER_ALL: &str = "all";
