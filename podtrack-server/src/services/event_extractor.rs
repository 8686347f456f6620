//! Calendar event to episode-draft extraction
//!
//! Turns raw calendar events into `EpisodeDraft`s: parses the title for a
//! podcast-name candidate and episode numbers, pulls studio/guests/notes out
//! of location and description, and honors machine-written extended
//! properties, which take precedence over anything parsed from free text.
//! An event naming several episodes ("פרק 33 ו-34") yields one draft per
//! number.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use uuid::Uuid;

use super::title_parser::parse_event_title;

/// Calendar event as returned by the events API
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEvent {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub extended_properties: Option<ExtendedProperties>,
}

/// Event start/end: all-day events carry `date`, timed events `dateTime`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventTime {
    pub date: Option<String>,
    pub date_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtendedProperties {
    pub private: HashMap<String, String>,
    pub shared: HashMap<String, String>,
}

/// Episode draft distilled from a single calendar event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeDraft {
    pub podcast_candidate: Option<String>,
    /// Set when an extended property pins the podcast by id
    pub podcast_id_hint: Option<Uuid>,
    pub episode_number: Option<String>,
    pub recording_date: DateTime<Utc>,
    pub studio: Option<String>,
    pub guest_names: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("event has no start time")]
    MissingStart,
    #[error("unparseable start time: {0}")]
    BadStart(String),
}

// "אורח: דנה", "אורחת - דנה", "Guest: Dana", "guests: A, B" on its own line
static GUEST_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*(?:אורח(?:ים|ות|ת)?|guests?)\s*[:\-]\s*(.+?)\s*$").expect("valid regex")
});
// "Recording with Dana Levi" - weaker marker, consulted after GUEST_LINE
static GUEST_WITH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bwith\s+([^\n]+)").expect("valid regex"));

fn private_prop<'a>(event: &'a RawEvent, keys: &[&str]) -> Option<&'a str> {
    let props = event.extended_properties.as_ref()?;
    for key in keys {
        if let Some(value) = props.private.get(*key) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Resolve the event start to a UTC instant. All-day events are anchored at
/// local midnight in the workspace timezone.
fn start_instant(event: &RawEvent, tz: Tz) -> Result<DateTime<Utc>, ExtractError> {
    let start = event.start.as_ref().ok_or(ExtractError::MissingStart)?;

    if let Some(raw) = start.date_time.as_deref() {
        return DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| ExtractError::BadStart(raw.to_string()));
    }
    if let Some(raw) = start.date.as_deref() {
        let date: NaiveDate = raw
            .parse()
            .map_err(|_| ExtractError::BadStart(raw.to_string()))?;
        let local = date.and_time(NaiveTime::MIN);
        return tz
            .from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| ExtractError::BadStart(raw.to_string()));
    }
    Err(ExtractError::MissingStart)
}

/// Extract episode drafts from one calendar event.
///
/// Extended properties (written back by automation or other tooling) override
/// anything parsed out of the title, location, or description.
pub fn drafts_from_event(event: &RawEvent, tz: Tz) -> Result<Vec<EpisodeDraft>, ExtractError> {
    let recording_date = start_instant(event, tz)?;

    let title = event.summary.as_deref().unwrap_or("");
    let parsed = parse_event_title(title);

    let podcast_id_hint = private_prop(event, &["podcast_id", "podcastId"]).and_then(|raw| {
        match Uuid::parse_str(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!(event_id = ?event.id, "Ignoring malformed podcast id property: {}", raw);
                None
            }
        }
    });
    let podcast_candidate =
        non_empty(private_prop(event, &["podcast_name", "podcastName"])).or(parsed.podcast_name);

    let numbers: Vec<Option<String>> =
        match non_empty(private_prop(event, &["episode_number", "episodeNumber"])) {
            Some(n) => vec![Some(n)],
            None if parsed.episode_numbers.is_empty() => vec![None],
            None => parsed.episode_numbers.into_iter().map(Some).collect(),
        };

    let studio = non_empty(private_prop(event, &["studio"]))
        .or_else(|| non_empty(event.location.as_deref()));
    let guest_names = non_empty(private_prop(event, &["guest_names", "guestNames"])).or_else(|| {
        event.description.as_deref().and_then(|d| {
            GUEST_LINE
                .captures(d)
                .or_else(|| GUEST_WITH.captures(d))
                .map(|caps| caps[1].trim().to_string())
        })
    });
    let notes = non_empty(private_prop(event, &["notes"]))
        .or_else(|| non_empty(event.description.as_deref()));

    Ok(numbers
        .into_iter()
        .map(|episode_number| EpisodeDraft {
            podcast_candidate: podcast_candidate.clone(),
            podcast_id_hint,
            episode_number,
            recording_date,
            studio: studio.clone(),
            guest_names: guest_names.clone(),
            notes: notes.clone(),
        })
        .collect())
}

/// Extract drafts from a batch of events. An unparseable event is logged and
/// skipped rather than failing the whole batch.
pub fn extract_drafts(events: &[RawEvent], tz: Tz) -> Vec<EpisodeDraft> {
    let mut drafts = Vec::new();
    for event in events {
        match drafts_from_event(event, tz) {
            Ok(mut event_drafts) => drafts.append(&mut event_drafts),
            Err(e) => {
                tracing::warn!(event_id = ?event.id, "Skipping calendar event: {}", e);
            }
        }
    }
    drafts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Asia::Jerusalem;

    fn timed_event(summary: &str, start: &str) -> RawEvent {
        RawEvent {
            id: Some("ev1".to_string()),
            summary: Some(summary.to_string()),
            start: Some(EventTime {
                date: None,
                date_time: Some(start.to_string()),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn timed_event_single_draft() {
        let event = timed_event("רוני וברק - פרק 33", "2026-03-15T10:00:00+02:00");
        let drafts = drafts_from_event(&event, Jerusalem).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].podcast_candidate.as_deref(), Some("רוני וברק"));
        assert_eq!(drafts[0].episode_number.as_deref(), Some("33"));
        assert_eq!(drafts[0].recording_date.to_rfc3339(), "2026-03-15T08:00:00+00:00");
    }

    #[test]
    fn multi_episode_title_yields_one_draft_per_number() {
        let event = timed_event("Show פרק 33 ו-34", "2026-03-15T10:00:00Z");
        let drafts = drafts_from_event(&event, Jerusalem).unwrap();
        let numbers: Vec<_> = drafts
            .iter()
            .map(|d| d.episode_number.as_deref().unwrap())
            .collect();
        assert_eq!(numbers, vec!["33", "34"]);
    }

    #[test]
    fn all_day_event_anchored_at_local_midnight() {
        let event = RawEvent {
            summary: Some("Show - 5".to_string()),
            start: Some(EventTime {
                date: Some("2026-07-01".to_string()),
                date_time: None,
            }),
            ..Default::default()
        };
        let drafts = drafts_from_event(&event, Jerusalem).unwrap();
        // Jerusalem is UTC+3 in July
        assert_eq!(drafts[0].recording_date.to_rfc3339(), "2026-06-30T21:00:00+00:00");
    }

    #[test]
    fn extended_properties_take_precedence() {
        let podcast_id = Uuid::new_v4();
        let mut private = HashMap::new();
        private.insert("podcast_id".to_string(), podcast_id.to_string());
        private.insert("episode_number".to_string(), "77".to_string());
        private.insert("studio".to_string(), "Studio B".to_string());
        let mut event = timed_event("Show - פרק 33", "2026-03-15T10:00:00Z");
        event.location = Some("Studio A".to_string());
        event.extended_properties = Some(ExtendedProperties {
            private,
            shared: HashMap::new(),
        });

        let drafts = drafts_from_event(&event, Jerusalem).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].podcast_id_hint, Some(podcast_id));
        assert_eq!(drafts[0].episode_number.as_deref(), Some("77"));
        assert_eq!(drafts[0].studio.as_deref(), Some("Studio B"));
    }

    #[test]
    fn guest_line_extracted_from_description() {
        let mut event = timed_event("Show - 5", "2026-03-15T10:00:00Z");
        event.description = Some("הקלטה רגילה\nאורח: דנה לוי".to_string());
        let drafts = drafts_from_event(&event, Jerusalem).unwrap();
        assert_eq!(drafts[0].guest_names.as_deref(), Some("דנה לוי"));

        event.description = Some("Guests: Dana, Omer".to_string());
        let drafts = drafts_from_event(&event, Jerusalem).unwrap();
        assert_eq!(drafts[0].guest_names.as_deref(), Some("Dana, Omer"));
    }

    #[test]
    fn with_marker_extracted_from_description() {
        let mut event = timed_event("Show - 5", "2026-03-15T10:00:00Z");
        event.description = Some("Recording with Dana Levi".to_string());
        let drafts = drafts_from_event(&event, Jerusalem).unwrap();
        assert_eq!(drafts[0].guest_names.as_deref(), Some("Dana Levi"));

        // Explicit guest line beats the weaker "with" marker
        event.description = Some("Session with the crew\nGuest: Omer".to_string());
        let drafts = drafts_from_event(&event, Jerusalem).unwrap();
        assert_eq!(drafts[0].guest_names.as_deref(), Some("Omer"));
    }

    #[test]
    fn missing_start_is_an_error() {
        let event = RawEvent {
            summary: Some("Show".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            drafts_from_event(&event, Jerusalem),
            Err(ExtractError::MissingStart)
        ));
    }

    #[test]
    fn batch_skips_bad_events() {
        let good = timed_event("Show - 5", "2026-03-15T10:00:00Z");
        let bad = RawEvent::default();
        let drafts = extract_drafts(&[bad, good], Jerusalem);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].episode_number.as_deref(), Some("5"));
    }
}
