//! Podcast resolution
//!
//! Maps a free-text podcast-name candidate from a calendar event to a known
//! podcast. Matching is case-insensitive, in strictness order:
//!
//! 1. exact alias match
//! 2. exact name match
//! 3. substring match in either direction against names and aliases,
//!    longest matched key wins
//!
//! An equal-length substring tie between distinct podcasts is ambiguous and
//! resolves to no match.

use podtrack_common::models::Podcast;

fn norm(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Resolve a candidate name against the known podcasts.
pub fn resolve<'a>(podcasts: &'a [Podcast], candidate: &str) -> Option<&'a Podcast> {
    let needle = norm(candidate);
    if needle.is_empty() {
        return None;
    }

    for podcast in podcasts {
        if podcast.aliases.iter().any(|a| norm(a) == needle) {
            return Some(podcast);
        }
    }
    for podcast in podcasts {
        if norm(&podcast.name) == needle {
            return Some(podcast);
        }
    }

    // Substring pass over every name and alias
    let mut best: Option<(&Podcast, usize)> = None;
    let mut ambiguous = false;
    for podcast in podcasts {
        for key in std::iter::once(podcast.name.as_str()).chain(podcast.aliases.iter().map(String::as_str)) {
            let key = norm(key);
            if key.is_empty() {
                continue;
            }
            if !key.contains(&needle) && !needle.contains(&key) {
                continue;
            }
            let score = key.chars().count();
            match best {
                Some((winner, best_score)) if score == best_score => {
                    if winner.id != podcast.id {
                        ambiguous = true;
                    }
                }
                Some((_, best_score)) if score > best_score => {
                    best = Some((podcast, score));
                    ambiguous = false;
                }
                None => {
                    best = Some((podcast, score));
                }
                _ => {}
            }
        }
    }

    if ambiguous {
        tracing::warn!(candidate = %candidate, "Ambiguous podcast match, leaving unresolved");
        return None;
    }
    best.map(|(podcast, _)| podcast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn podcast(name: &str, aliases: &[&str]) -> Podcast {
        let now = Utc::now();
        Podcast {
            id: Uuid::new_v4(),
            name: name.to_string(),
            host: None,
            default_studio_settings: None,
            tasks_time_allowance: None,
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn alias_beats_name() {
        let a = podcast("Tech Talk", &[]);
        let b = podcast("Other Show", &["tech talk"]);
        let podcasts = vec![a, b.clone()];
        assert_eq!(resolve(&podcasts, "Tech Talk").unwrap().id, b.id);
    }

    #[test]
    fn exact_name_case_insensitive() {
        let a = podcast("רוני וברק", &[]);
        let podcasts = vec![a.clone()];
        assert_eq!(resolve(&podcasts, "רוני וברק").unwrap().id, a.id);
    }

    #[test]
    fn substring_longest_key_wins() {
        let short = podcast("Tech", &[]);
        let long = podcast("Tech Talk Daily", &[]);
        let podcasts = vec![short, long.clone()];
        // Candidate is a substring of the long name and contains the short one
        assert_eq!(resolve(&podcasts, "Tech Talk").unwrap().id, long.id);
    }

    #[test]
    fn equal_length_tie_is_unresolved() {
        let a = podcast("Morning Show", &[]);
        let b = podcast("Evening Show", &[]);
        let podcasts = vec![a, b];
        assert!(resolve(&podcasts, "Show").is_none());
    }

    #[test]
    fn same_podcast_multiple_keys_not_a_tie() {
        let a = podcast("The Daily Grind", &["Daily Grind Show"]);
        let podcasts = vec![a.clone()];
        assert_eq!(resolve(&podcasts, "Daily Grind").unwrap().id, a.id);
    }

    #[test]
    fn no_match_and_empty_candidate() {
        let podcasts = vec![podcast("Tech Talk", &[])];
        assert!(resolve(&podcasts, "Cooking Hour").is_none());
        assert!(resolve(&podcasts, "   ").is_none());
    }
}
