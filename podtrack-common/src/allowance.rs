//! Task time allowance parsing
//!
//! Podcasts carry a free-text "time allowance" describing how long engineers
//! have to complete post-recording tasks, entered by hand as e.g. "7",
//! "3 days" or "1 week". This module turns that text into a concrete
//! duration; unparseable text yields `None` and callers fall back to their
//! default.

use chrono::Duration;

/// Parse a free-text task time allowance into a duration.
///
/// A bare number is read as days. Recognized units: day(s)/d, week(s)/w.
///
/// # Examples
///
/// ```
/// use podtrack_common::allowance::parse_allowance;
/// use chrono::Duration;
///
/// assert_eq!(parse_allowance("7"), Some(Duration::days(7)));
/// assert_eq!(parse_allowance("3 days"), Some(Duration::days(3)));
/// assert_eq!(parse_allowance("1 week"), Some(Duration::days(7)));
/// assert_eq!(parse_allowance("2w"), Some(Duration::days(14)));
/// assert_eq!(parse_allowance("soon"), None);
/// ```
pub fn parse_allowance(text: &str) -> Option<Duration> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    // Bare number of days
    if let Ok(days) = text.parse::<i64>() {
        return valid_days(days);
    }

    // "<number> <unit>", unit glued or space-separated
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let amount: i64 = digits.parse().ok()?;
    let unit = text[digits.len()..].trim();

    match unit {
        "d" | "day" | "days" => valid_days(amount),
        "w" | "week" | "weeks" => valid_days(amount.checked_mul(7)?),
        _ => None,
    }
}

fn valid_days(days: i64) -> Option<Duration> {
    // Zero or negative allowances are treated as unset
    if days > 0 {
        Some(Duration::days(days))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_number_is_days() {
        assert_eq!(parse_allowance("5"), Some(Duration::days(5)));
        assert_eq!(parse_allowance("  10  "), Some(Duration::days(10)));
    }

    #[test]
    fn day_and_week_units() {
        assert_eq!(parse_allowance("3 days"), Some(Duration::days(3)));
        assert_eq!(parse_allowance("1 day"), Some(Duration::days(1)));
        assert_eq!(parse_allowance("1 week"), Some(Duration::days(7)));
        assert_eq!(parse_allowance("2 weeks"), Some(Duration::days(14)));
        assert_eq!(parse_allowance("4d"), Some(Duration::days(4)));
        assert_eq!(parse_allowance("1W"), Some(Duration::days(7)));
    }

    #[test]
    fn garbage_and_non_positive_yield_none() {
        assert_eq!(parse_allowance(""), None);
        assert_eq!(parse_allowance("soon"), None);
        assert_eq!(parse_allowance("0"), None);
        assert_eq!(parse_allowance("-3"), None);
        assert_eq!(parse_allowance("3 months"), None);
    }
}
