//! Natural-language agenda parsing: create, query and conclude commands.
//!
//! Two recognition paths for creation: an explicit imperative command with
//! pipe-delimited fields (`schedule: call Maria | 10/03/2026 10:00 | follow
//! up`), or a free-text fallback that strips recognized verb/date/time
//! tokens to derive a title. Every function returns a typed payload or a
//! named error; nothing here panics on user input.

pub mod datetime;
pub mod handoff;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use thiserror::Error;

pub use datetime::resolve_datetime;
pub use handoff::{parse_handoff, HandoffDraft};

/// Command verbs that open an explicit pipe-delimited imperative.
const COMMAND_VERBS: &[&str] = &["schedule", "agenda", "appointment"];

/// Phrases that force creation even when an existence query is present.
const ADD_TO_CALENDAR_PHRASES: &[&str] = &[
    "add to calendar",
    "add to my calendar",
    "add it to my calendar",
    "add to the calendar",
    "add to agenda",
    "add to my agenda",
    "put on my calendar",
    "put it on my calendar",
];

/// Phrases that signal an existence query.
const QUERY_PHRASES: &[&str] = &[
    "do i have",
    "what do i have",
    "what's on my",
    "whats on my",
    "what is on my",
    "anything scheduled",
    "any appointments",
    "am i free",
    "what's my schedule",
    "whats my schedule",
];

/// Words stripped from free text when deriving a title.
const TITLE_STOPWORDS: &[&str] = &[
    "schedule", "book", "add", "create", "put", "set", "please", "calendar", "agenda",
    "appointment", "to", "my", "the", "a", "an", "on", "at", "in", "for", "of", "and", "it", "me",
];

/// Named parse failures. Mapped to human recovery prompts by the
/// orchestrator; never surfaced raw.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgendaParseError {
    #[error("missing date/time")]
    MissingDateTime,
    #[error("empty schedule payload")]
    EmptySchedulePayload,
    #[error("missing handoff contact")]
    MissingContact,
    #[error("ambiguous conclusion match")]
    AmbiguousConclusion(Vec<ConcludeCandidate>),
    #[error("no open item matches the conclusion target")]
    NoConclusionMatch,
}

/// A parsed create payload.
#[derive(Debug, Clone, PartialEq)]
pub struct AgendaDraft {
    pub title: String,
    pub starts_at: NaiveDateTime,
    pub description: Option<String>,
    /// Contact named for a chained handoff ("and notify Maria").
    pub notify_contact: Option<String>,
    /// A trailing verification clause was present and deferred.
    pub deferred_query: bool,
}

/// The day window an existence query asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryRange {
    Day(NaiveDate),
    Upcoming,
}

/// A parsed existence query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgendaQuery {
    pub range: QueryRange,
}

/// How a conclusion command names its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConcludeTarget {
    Id(String),
    Title(String),
}

/// A parsed mark-complete command, not yet resolved against open items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcludeCommand {
    pub target: ConcludeTarget,
}

/// An open item offered for conclusion matching.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcludeCandidate {
    pub id: String,
    pub title: String,
}

/// What the agenda parser found in one message.
#[derive(Debug, Clone, PartialEq)]
pub enum AgendaSignal {
    Create(Result<AgendaDraft, AgendaParseError>),
    Query(AgendaQuery),
    Conclude(ConcludeCommand),
    Unrelated,
}

fn contains_phrase(lower: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| lower.contains(p))
}

fn contains_word(lower: &str, word: &str) -> bool {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|t| t == word)
}

/// Detect an existence query and its day window.
pub fn detect_query(text: &str, now: NaiveDateTime) -> Option<AgendaQuery> {
    let lower = text.to_lowercase();
    if !contains_phrase(&lower, QUERY_PHRASES) {
        return None;
    }
    let range = if contains_word(&lower, "today") {
        QueryRange::Day(now.date())
    } else if contains_word(&lower, "tomorrow") {
        QueryRange::Day(now.date() + Duration::days(1))
    } else if let Some(date) = datetime::find_date(&lower, now) {
        QueryRange::Day(date)
    } else {
        QueryRange::Upcoming
    };
    Some(AgendaQuery { range })
}

/// Whether the message carries a creation imperative.
pub fn detect_create_intent(text: &str) -> bool {
    let lower = text.to_lowercase();
    if contains_phrase(&lower, ADD_TO_CALENDAR_PHRASES) {
        return true;
    }
    if let Some((prefix, _)) = lower.split_once(':') {
        if COMMAND_VERBS.contains(&prefix.trim()) {
            return true;
        }
    }
    let first = lower
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_matches(|c: char| !c.is_alphanumeric());
    matches!(first, "schedule" | "book")
}

/// Extract a contact named for a chained handoff ("and notify Maria",
/// "let Maria know").
fn find_notify_contact(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let original: Vec<&str> = text.split_whitespace().collect();
    let words: Vec<&str> = lower.split_whitespace().collect();

    for (i, window) in words.windows(2).enumerate() {
        if window[0] == "notify" {
            let name = original.get(i + 1)?;
            return Some(name.trim_matches(|c: char| !c.is_alphanumeric()).to_string());
        }
        if window[0] == "let" && words.get(i + 2).map(|w| *w == "know").unwrap_or(false) {
            let name = original.get(i + 1)?;
            return Some(name.trim_matches(|c: char| !c.is_alphanumeric()).to_string());
        }
    }
    None
}

/// Drop clauses that carry the deferred verification question, so they do
/// not leak into the derived title.
fn strip_query_clauses(text: &str) -> String {
    text.split(|c| matches!(c, ',' | '.' | '?' | ';'))
        .filter(|clause| {
            let lower = clause.to_lowercase();
            !contains_phrase(&lower, QUERY_PHRASES)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derive a title from free text by stripping recognized verb, filler and
/// date/time tokens.
fn derive_title(text: &str, now: NaiveDateTime) -> String {
    let source = strip_query_clauses(text);
    let words: Vec<&str> = source.split_whitespace().collect();
    let mut kept: Vec<&str> = Vec::new();

    let mut skip_next = false;
    for (i, word) in words.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        let lower = word
            .trim_matches(|c: char| !c.is_alphanumeric() && c != ':' && c != '/')
            .to_lowercase();
        if lower.is_empty() || TITLE_STOPWORDS.contains(&lower.as_str()) {
            continue;
        }
        if datetime::is_schedule_token(&lower, now) {
            continue;
        }
        // Relative amount+unit pairs ("two hours") go together.
        let next = words
            .get(i + 1)
            .map(|w| w.to_lowercase())
            .unwrap_or_default();
        let is_unit = matches!(
            next.trim_matches(|c: char| !c.is_alphanumeric()),
            "hour" | "hours" | "minute" | "minutes" | "min" | "mins" | "day" | "days"
        );
        if is_unit
            && (lower.parse::<u32>().is_ok()
                || matches!(
                    lower.as_str(),
                    "one" | "two"
                        | "three"
                        | "four"
                        | "five"
                        | "six"
                        | "seven"
                        | "eight"
                        | "nine"
                        | "ten"
                        | "eleven"
                        | "twelve"
                ))
        {
            skip_next = true;
            continue;
        }
        kept.push(word.trim_matches(|c: char| {
            !c.is_alphanumeric() && c != '\'' && c != '-'
        }));
    }
    kept.join(" ").trim().to_string()
}

/// Parse a create payload from either recognition path.
pub fn parse_create(text: &str, now: NaiveDateTime) -> Result<AgendaDraft, AgendaParseError> {
    let lower = text.to_lowercase();
    let deferred_query = contains_phrase(&lower, QUERY_PHRASES) || text.contains('?');
    let notify_contact = find_notify_contact(text);

    // Path (a): explicit imperative with pipe-delimited fields.
    if let Some((prefix, rest)) = text.split_once(':') {
        if COMMAND_VERBS.contains(&prefix.trim().to_lowercase().as_str()) && rest.contains('|') {
            let parts: Vec<&str> = rest.split('|').map(str::trim).collect();
            let title = parts.first().copied().unwrap_or_default();
            if title.is_empty() {
                return Err(AgendaParseError::EmptySchedulePayload);
            }
            let when = parts.get(1).copied().unwrap_or_default();
            let starts_at = resolve_datetime(when, now)?;
            let description = parts
                .get(2)
                .filter(|d| !d.is_empty())
                .map(|d| d.to_string());
            return Ok(AgendaDraft {
                title: title.to_string(),
                starts_at,
                description,
                notify_contact,
                deferred_query,
            });
        }
    }

    // Path (b): free-text fallback.
    let starts_at = resolve_datetime(text, now)?;
    let title = derive_title(text, now);
    if title.is_empty() {
        return Err(AgendaParseError::EmptySchedulePayload);
    }
    Ok(AgendaDraft {
        title,
        starts_at,
        description: None,
        notify_contact,
        deferred_query,
    })
}

/// Parse a mark-complete command, if present.
pub fn parse_conclude(text: &str) -> Option<ConcludeCommand> {
    let lower = text.to_lowercase();

    // Explicit record id always wins.
    for token in lower.split_whitespace() {
        if let Some(id) = token.strip_prefix("agenda_entry:") {
            let id = id.trim_matches(|c: char| !c.is_alphanumeric() && c != '_' && c != '-');
            if !id.is_empty() {
                return Some(ConcludeCommand {
                    target: ConcludeTarget::Id(id.to_string()),
                });
            }
        }
    }

    // Byte offsets come from the lowercased copy; `get` keeps slicing safe
    // when lowercasing changed a character's byte length.
    let title_after = |marker: &str| -> Option<String> {
        let idx = lower.find(marker)?;
        let rest = text.get(idx + marker.len()..)?;
        let rest = rest
            .trim()
            .trim_end_matches(|c: char| c.is_ascii_punctuation());
        (!rest.is_empty()).then(|| rest.to_string())
    };

    if let Some(rest) = lower
        .find("mark ")
        .and_then(|idx| text.get(idx + "mark ".len()..))
    {
        let rest_lower = rest.to_lowercase();
        let end = ["as done", "as complete", "as completed", "done", "complete"]
            .iter()
            .filter_map(|suffix| rest_lower.rfind(suffix))
            .min();
        if let Some(title) = end.and_then(|end| rest.get(..end)) {
            let title = title
                .trim()
                .trim_end_matches(|c: char| c.is_ascii_punctuation());
            if !title.is_empty() {
                return Some(ConcludeCommand {
                    target: ConcludeTarget::Title(title.to_string()),
                });
            }
        }
    }

    for marker in ["done with ", "i finished ", "finished "] {
        if let Some(title) = title_after(marker) {
            return Some(ConcludeCommand {
                target: ConcludeTarget::Title(title),
            });
        }
    }

    None
}

/// Resolve a conclusion command against the owner's open items.
///
/// More than one match always returns `AmbiguousConclusion` listing every
/// candidate; this never auto-selects between equally plausible items.
pub fn resolve_conclusion(
    candidates: &[ConcludeCandidate],
    command: &ConcludeCommand,
) -> Result<ConcludeCandidate, AgendaParseError> {
    match &command.target {
        ConcludeTarget::Id(id) => candidates
            .iter()
            .find(|c| c.id == *id || c.id.ends_with(&format!(":{id}")))
            .cloned()
            .ok_or(AgendaParseError::NoConclusionMatch),
        ConcludeTarget::Title(title) => {
            let wanted = title.to_lowercase();

            let exact: Vec<&ConcludeCandidate> = candidates
                .iter()
                .filter(|c| c.title.to_lowercase() == wanted)
                .collect();
            match exact.len() {
                1 => return Ok(exact[0].clone()),
                n if n > 1 => {
                    return Err(AgendaParseError::AmbiguousConclusion(
                        exact.into_iter().cloned().collect(),
                    ))
                }
                _ => {}
            }

            use rapidfuzz::distance::levenshtein;
            let mut scored: Vec<(f64, &ConcludeCandidate)> = candidates
                .iter()
                .map(|c| {
                    let sim = levenshtein::normalized_similarity(
                        wanted.chars(),
                        c.title.to_lowercase().chars(),
                    );
                    (sim, c)
                })
                .filter(|(sim, _)| *sim >= 0.6)
                .collect();
            scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

            match scored.len() {
                0 => Err(AgendaParseError::NoConclusionMatch),
                1 => Ok(scored[0].1.clone()),
                // Multiple plausible fuzzy matches are always listed back,
                // even when one scores higher than the rest.
                _ => Err(AgendaParseError::AmbiguousConclusion(
                    scored.into_iter().map(|(_, c)| c.clone()).collect(),
                )),
            }
        }
    }
}

/// Classify one message's agenda content.
///
/// Priority: conclude > query-vs-create disambiguation. An existence query
/// wins over a create imperative unless an explicit "add to calendar"
/// phrase is present, in which case creation wins and the verification
/// clause is deferred to a follow-up.
pub fn classify(text: &str, now: NaiveDateTime) -> AgendaSignal {
    if let Some(command) = parse_conclude(text) {
        return AgendaSignal::Conclude(command);
    }

    let lower = text.to_lowercase();
    let query = detect_query(text, now);
    let create = detect_create_intent(text);

    match (query, create) {
        (Some(_), true) if contains_phrase(&lower, ADD_TO_CALENDAR_PHRASES) => {
            AgendaSignal::Create(parse_create(text, now))
        }
        (Some(q), _) => AgendaSignal::Query(q),
        (None, true) => AgendaSignal::Create(parse_create(text, now)),
        (None, false) => AgendaSignal::Unrelated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 26)
            .unwrap()
            .and_hms_opt(16, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_explicit_command_round_trip() {
        let draft = parse_create("schedule: call Maria | 10/03/2026 10:00 | follow up", now())
            .expect("should parse");
        assert_eq!(draft.title, "call Maria");
        assert_eq!(
            draft.starts_at,
            NaiveDate::from_ymd_opt(2026, 3, 10)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap()
        );
        assert_eq!(draft.description.as_deref(), Some("follow up"));
    }

    #[test]
    fn test_explicit_command_missing_datetime() {
        let result = parse_create("schedule: call Maria | whenever", now());
        assert_eq!(result, Err(AgendaParseError::MissingDateTime));
    }

    #[test]
    fn test_explicit_command_empty_title() {
        let result = parse_create("schedule: | 10/03/2026 10:00", now());
        assert_eq!(result, Err(AgendaParseError::EmptySchedulePayload));
    }

    #[test]
    fn test_free_text_title_derivation() {
        let draft = parse_create("schedule dentist appointment tomorrow at 10:00", now())
            .expect("should parse");
        assert_eq!(draft.title, "dentist");
        assert_eq!(draft.starts_at.date(), now().date() + Duration::days(1));
    }

    #[test]
    fn test_query_wins_over_create_without_phrase() {
        let signal = classify("do I have anything scheduled tomorrow?", now());
        assert!(matches!(signal, AgendaSignal::Query(_)));
    }

    #[test]
    fn test_add_to_calendar_phrase_forces_creation() {
        let signal = classify(
            "add to my calendar dinner tomorrow at 20:00, do I have anything then?",
            now(),
        );
        match signal {
            AgendaSignal::Create(Ok(draft)) => {
                assert!(draft.deferred_query);
                assert!(draft.title.to_lowercase().contains("dinner"));
            }
            other => panic!("Expected create, got {:?}", other),
        }
    }

    #[test]
    fn test_query_range_today() {
        let query = detect_query("do I have anything today?", now()).unwrap();
        assert_eq!(query.range, QueryRange::Day(now().date()));
    }

    #[test]
    fn test_query_range_upcoming() {
        let query = detect_query("what's on my agenda?", now()).unwrap();
        assert_eq!(query.range, QueryRange::Upcoming);
    }

    #[test]
    fn test_conclude_by_title() {
        let command = parse_conclude("mark call Maria as done").unwrap();
        assert_eq!(
            command.target,
            ConcludeTarget::Title("call Maria".to_string())
        );
    }

    #[test]
    fn test_conclude_by_id() {
        let command = parse_conclude("mark agenda_entry:abc123 done").unwrap();
        assert_eq!(command.target, ConcludeTarget::Id("abc123".to_string()));
    }

    #[test]
    fn test_conclusion_duplicate_titles_are_ambiguous() {
        let candidates = vec![
            ConcludeCandidate {
                id: "agenda_entry:1".into(),
                title: "call Maria".into(),
            },
            ConcludeCandidate {
                id: "agenda_entry:2".into(),
                title: "call Maria".into(),
            },
        ];
        let command = ConcludeCommand {
            target: ConcludeTarget::Title("call Maria".into()),
        };
        match resolve_conclusion(&candidates, &command) {
            Err(AgendaParseError::AmbiguousConclusion(listed)) => {
                assert_eq!(listed.len(), 2);
            }
            other => panic!("Expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_conclusion_fuzzy_single_match() {
        let candidates = vec![
            ConcludeCandidate {
                id: "agenda_entry:1".into(),
                title: "call Maria".into(),
            },
            ConcludeCandidate {
                id: "agenda_entry:2".into(),
                title: "quarterly review".into(),
            },
        ];
        let command = ConcludeCommand {
            target: ConcludeTarget::Title("call maria".into()),
        };
        let resolved = resolve_conclusion(&candidates, &command).unwrap();
        assert_eq!(resolved.id, "agenda_entry:1");
    }

    #[test]
    fn test_conclusion_multiple_fuzzy_matches_are_ambiguous() {
        let candidates = vec![
            ConcludeCandidate {
                id: "agenda_entry:1".into(),
                title: "project kickoff meeting".into(),
            },
            ConcludeCandidate {
                id: "agenda_entry:2".into(),
                title: "project meeting".into(),
            },
        ];
        // A typo'd title that scores above threshold against both; the
        // closer candidate must not be picked silently.
        let command = ConcludeCommand {
            target: ConcludeTarget::Title("project kickof meeting".into()),
        };
        match resolve_conclusion(&candidates, &command) {
            Err(AgendaParseError::AmbiguousConclusion(listed)) => {
                assert_eq!(listed.len(), 2);
            }
            other => panic!("Expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_conclusion_no_match() {
        let candidates = vec![ConcludeCandidate {
            id: "agenda_entry:1".into(),
            title: "call Maria".into(),
        }];
        let command = ConcludeCommand {
            target: ConcludeTarget::Title("water the plants".into()),
        };
        assert_eq!(
            resolve_conclusion(&candidates, &command),
            Err(AgendaParseError::NoConclusionMatch)
        );
    }

    #[test]
    fn test_notify_contact_chained() {
        let draft = parse_create(
            "schedule: team sync | tomorrow 09:30 | weekly, and notify Carla",
            now(),
        )
        .unwrap();
        assert_eq!(draft.notify_contact.as_deref(), Some("Carla"));
    }

    #[test]
    fn test_unrelated_text() {
        assert_eq!(classify("tell me a joke", now()), AgendaSignal::Unrelated);
    }
}
