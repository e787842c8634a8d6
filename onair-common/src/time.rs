//! Wall-clock helpers

use chrono::{DateTime, Datelike, Local, Timelike, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Local hour of day (0-23) and day of month (1-31)
///
/// Narration time-of-day pools and the news calendar are keyed on local
/// time, not UTC.
pub fn local_hour_and_day() -> (u32, u32) {
    let local = Local::now();
    (local.hour(), local.day())
}
