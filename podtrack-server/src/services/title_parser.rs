//! Calendar event title parsing
//!
//! Free-text event titles encode a podcast name plus zero or more episode
//! numbers, in Hebrew or English, e.g.:
//!
//! - "רוני וברק - פרק 33"
//! - "Show - פרק 33 ו-34" / "Show 33 & 34" / "Show 33, 34" / "Show 33-34"
//! - "My Show episode 5" / "Show #33" / "Some Podcast - 33"
//!
//! Pure functions, no I/O.

use once_cell::sync::Lazy;
use regex::Regex;

/// Parsed title: podcast-name candidate plus episode numbers.
///
/// Episode numbers stay text (they are opaque identifiers elsewhere in the
/// system); leading zeros are stripped and duplicates removed preserving
/// first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedTitle {
    pub podcast_name: Option<String>,
    pub episode_numbers: Vec<String>,
    /// True when a hyphen range ("33-35") was expanded into contiguous numbers
    pub is_range: bool,
}

/// Largest hyphen-range span that is expanded into individual episodes.
/// Anything wider is treated as a malformed token and yields no numbers.
const MAX_RANGE_SPAN: u32 = 10;

// Multi: "33 & 34", "33 and 34", "33, 34", "33 / 34"
static PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*(?:&|and|,|/)\s*(\d+)").expect("valid regex"));
// Range: "33-34"
static RANGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*-\s*(\d+)").expect("valid regex"));
// Hebrew "and": "פרק 33 ו-34" or "33 ו-34"
static HEB_AND: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*ו-?\s*(\d+)").expect("valid regex"));
// Explicit labels: "פרק 33", "#33", "episode 33", "ep 33"
static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:פרק|#|episode|ep)\s*(\d+)").expect("valid regex"));
// Single number at end: " - 33" or " 33"
static TRAILING_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-–]\s*(\d+)\s*$").expect("valid regex"));
static TRAILING_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s(\d+)\s*$").expect("valid regex"));

// Episode-number suffixes stripped off the podcast-name candidate
static NAME_SUFFIXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\s*[-–]\s*\d+(\s*[&,/\-]\s*\d+)*\s*$",
        r"\s+פרק\s+\d+(\s*ו-?\s*\d+)*\s*$",
        r"\s*#\d+(\s*#\d+)*\s*$",
        r"(?i)\s+episode\s+\d+.*$",
        r"(?i)\s+ep\s+\d+.*$",
        r"\s+\d+(\s*[&,/\-]\s*\d+)*\s*$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Strip leading zeros but keep the value as text ("033" -> "33", "0" -> "0").
fn normalize_number(raw: &str) -> String {
    let trimmed = raw.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse a calendar event title into a podcast-name candidate and episode
/// numbers. Empty titles yield all-empty output.
pub fn parse_event_title(title: &str) -> ParsedTitle {
    if title.trim().is_empty() {
        return ParsedTitle::default();
    }

    let mut numbers: Vec<String> = Vec::new();
    fn push(numbers: &mut Vec<String>, raw: &str) {
        let n = normalize_number(raw);
        if !numbers.contains(&n) {
            numbers.push(n);
        }
    }

    for caps in PAIR.captures_iter(title) {
        push(&mut numbers, &caps[1]);
        push(&mut numbers, &caps[2]);
    }

    let mut is_range = false;
    let mut saw_range_token = false;
    for caps in RANGE.captures_iter(title) {
        saw_range_token = true;
        let (low, high): (u32, u32) = match (caps[1].parse(), caps[2].parse()) {
            (Ok(l), Ok(h)) => (l, h),
            _ => continue, // number too large to expand
        };
        if low <= high && high - low <= MAX_RANGE_SPAN {
            for n in low..=high {
                push(&mut numbers, &n.to_string());
            }
            if high > low {
                is_range = true;
            }
        }
        // Wider or inverted ranges are malformed tokens: no numbers emitted
    }

    for caps in HEB_AND.captures_iter(title) {
        push(&mut numbers, &caps[1]);
        push(&mut numbers, &caps[2]);
    }

    for caps in MARKER.captures_iter(title) {
        push(&mut numbers, &caps[1]);
    }

    // Trailing bare number only when nothing else matched; a rejected range
    // must not leak its endpoint through this fallback.
    if numbers.is_empty() && !saw_range_token {
        if let Some(caps) = TRAILING_DASH
            .captures(title)
            .or_else(|| TRAILING_BARE.captures(title))
        {
            push(&mut numbers, &caps[1]);
        }
    }

    let podcast_name = if numbers.is_empty() && !saw_range_token {
        clean_candidate(title)
    } else {
        let mut name = title.to_string();
        for suffix in NAME_SUFFIXES.iter() {
            name = suffix.replace(&name, "").into_owned();
        }
        clean_candidate(&name)
    };

    ParsedTitle {
        podcast_name,
        episode_numbers: numbers,
        is_range,
    }
}

/// Trim whitespace and dangling separators left behind by suffix stripping
/// ("רוני וברק -" -> "רוני וברק").
fn clean_candidate(name: &str) -> Option<String> {
    let cleaned = name
        .trim()
        .trim_end_matches(['-', '–', ':', ','])
        .trim()
        .to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_title_yields_nothing() {
        let parsed = parse_event_title("");
        assert_eq!(parsed, ParsedTitle::default());
        let parsed = parse_event_title("   ");
        assert_eq!(parsed.podcast_name, None);
        assert!(parsed.episode_numbers.is_empty());
    }

    #[test]
    fn hebrew_parak_single() {
        let parsed = parse_event_title("רוני וברק - פרק 33");
        assert_eq!(parsed.podcast_name.as_deref(), Some("רוני וברק"));
        assert_eq!(parsed.episode_numbers, vec!["33"]);
        assert!(!parsed.is_range);
    }

    #[test]
    fn hash_marker() {
        let parsed = parse_event_title("Recording: רוני וברק #33");
        assert_eq!(parsed.episode_numbers, vec!["33"]);
    }

    #[test]
    fn english_episode_keyword() {
        let parsed = parse_event_title("My Show episode 5");
        assert_eq!(parsed.episode_numbers, vec!["5"]);
        assert_eq!(parsed.podcast_name.as_deref(), Some("My Show"));
    }

    #[test]
    fn hebrew_conjunction_two_episodes() {
        let parsed = parse_event_title("רוני וברק פרק 33 ו-34");
        assert_eq!(parsed.episode_numbers, vec!["33", "34"]);
    }

    #[test]
    fn ampersand_and_comma_pairs() {
        assert_eq!(parse_event_title("Show 33 & 34").episode_numbers, vec!["33", "34"]);
        let parsed = parse_event_title("Show - 33, 34");
        assert_eq!(parsed.episode_numbers, vec!["33", "34"]);
        assert_eq!(parsed.podcast_name.as_deref(), Some("Show"));
    }

    #[test]
    fn small_range_expands_contiguously() {
        let parsed = parse_event_title("Show 1-5");
        assert_eq!(parsed.episode_numbers, vec!["1", "2", "3", "4", "5"]);
        assert!(parsed.is_range);
        assert_eq!(parsed.podcast_name.as_deref(), Some("Show"));
    }

    #[test]
    fn wide_range_yields_no_numbers() {
        let parsed = parse_event_title("Show 1-100");
        assert!(parsed.episode_numbers.is_empty());
        assert!(!parsed.is_range);
    }

    #[test]
    fn inverted_range_yields_no_numbers() {
        let parsed = parse_event_title("Show 34-33");
        assert!(parsed.episode_numbers.is_empty());
    }

    #[test]
    fn trailing_number_after_dash() {
        let parsed = parse_event_title("Some Podcast - 33");
        assert_eq!(parsed.episode_numbers, vec!["33"]);
        assert_eq!(parsed.podcast_name.as_deref(), Some("Some Podcast"));
    }

    #[test]
    fn no_number_keeps_whole_title() {
        let parsed = parse_event_title("Just a Meeting");
        assert!(parsed.episode_numbers.is_empty());
        assert_eq!(parsed.podcast_name.as_deref(), Some("Just a Meeting"));
    }

    #[test]
    fn duplicates_deduped_in_order() {
        assert_eq!(parse_event_title("Show 33, 33").episode_numbers, vec!["33"]);
    }

    #[test]
    fn leading_zeros_normalized() {
        let parsed = parse_event_title("Show - פרק 033");
        assert_eq!(parsed.episode_numbers, vec!["33"]);
    }

    #[test]
    fn non_latin_non_hebrew_markers_ignored() {
        // Cyrillic marker word is not recognized; text is kept as candidate
        let parsed = parse_event_title("Подкаст эпизод");
        assert!(parsed.episode_numbers.is_empty());
        assert_eq!(parsed.podcast_name.as_deref(), Some("Подкаст эпизод"));
    }

    proptest! {
        #[test]
        fn hebrew_marker_extracts_exactly_n(name in "[A-Za-z]{1,12}( [A-Za-z]{1,12}){0,2}", n in 1u32..10_000) {
            let title = format!("{} פרק {}", name, n);
            let parsed = parse_event_title(&title);
            prop_assert_eq!(parsed.episode_numbers, vec![n.to_string()]);
            prop_assert_eq!(parsed.podcast_name.as_deref(), Some(name.trim()));
        }

        #[test]
        fn hash_marker_extracts_exactly_n(name in "[A-Za-z]{1,12}", n in 1u32..10_000) {
            let title = format!("{} #{}", name, n);
            let parsed = parse_event_title(&title);
            prop_assert_eq!(parsed.episode_numbers, vec![n.to_string()]);
        }

        #[test]
        fn zero_padding_is_stripped(n in 1u32..999, pad in 1usize..3) {
            let title = format!("Show - פרק {}{}", "0".repeat(pad), n);
            let parsed = parse_event_title(&title);
            prop_assert_eq!(parsed.episode_numbers, vec![n.to_string()]);
        }

        #[test]
        fn range_law(a in 1u32..500, span in 0u32..40) {
            let b = a + span;
            let title = format!("Show {}-{}", a, b);
            let parsed = parse_event_title(&title);
            if span <= 10 {
                let expected: Vec<String> = (a..=b).map(|n| n.to_string()).collect();
                prop_assert_eq!(parsed.episode_numbers, expected);
            } else {
                prop_assert!(parsed.episode_numbers.is_empty());
            }
        }

        #[test]
        fn parser_never_panics(title in "\\PC{0,60}") {
            let _ = parse_event_title(&title);
        }
    }
}
