use chrono::{DateTime, DurationRound, TimeDelta, Utc};

/// Current time at the precision Postgres stores (microseconds), so a value
/// written and read back compares equal.
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    now.duration_trunc(TimeDelta::microseconds(1)).unwrap_or(now)
}

/// Timestamp for a mutation of a record last modified at `previous`.
///
/// Always strictly later than `previous`, even when the clock has not moved
/// past it at microsecond precision.
pub fn next_after(previous: DateTime<Utc>) -> DateTime<Utc> {
    let candidate = now();
    if candidate > previous {
        candidate
    } else {
        previous + TimeDelta::microseconds(1)
    }
}
