//! Time and timezone utilities
//!
//! All datetimes are stored UTC-normalized. "Today" is computed in the
//! configured workspace timezone and converted to a UTC span before any
//! query or comparison.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Half-open UTC span `[start, end)` of the local calendar day containing
/// `instant`, as observed in `tz`.
pub fn local_day_span(instant: DateTime<Utc>, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = instant.with_timezone(&tz).date_naive().and_time(NaiveTime::MIN);
    // A DST gap at midnight shifts the day start forward
    let start_local = tz
        .from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&midnight));
    let start = start_local.with_timezone(&Utc);
    (start, start + Duration::days(1))
}

/// Half-open UTC span `[start, start + 1 day)` of the UTC calendar day
/// containing `instant`.
pub fn utc_day_span(instant: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = instant.date_naive().and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}
