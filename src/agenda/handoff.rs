//! Parsing of deferred human handoff requests.
//!
//! "send a message to Maria tomorrow at 9:00 saying don't forget the
//! meeting" → contact, body, scheduled time. Shares the date/time
//! machinery with the agenda parser; a request with no time expression
//! is scheduled immediately.

use chrono::NaiveDateTime;

use super::datetime;
use super::AgendaParseError;

/// Markers that introduce the message body.
const BODY_MARKERS: &[&str] = &["saying that ", "saying ", "telling them ", "that says ", ": "];

/// A parsed handoff request.
#[derive(Debug, Clone, PartialEq)]
pub struct HandoffDraft {
    pub contact: String,
    pub body: String,
    pub send_at: NaiveDateTime,
}

/// Extract the contact: the word(s) after "to"/"tell" up to a body marker
/// or schedule token.
fn find_contact(text: &str, now: NaiveDateTime) -> Option<String> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = text.split_whitespace().collect();
    let lower_words: Vec<String> = lower.split_whitespace().map(String::from).collect();

    let start = lower_words.iter().position(|w| w == "to" || w == "tell")? + 1;

    let mut name_words: Vec<&str> = Vec::new();
    for (raw, lower_word) in words.iter().zip(lower_words.iter()).skip(start) {
        let cleaned = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '+' && c != '@');
        if cleaned.is_empty() {
            break;
        }
        if matches!(
            lower_word.trim_matches(|c: char| !c.is_alphanumeric()),
            "saying" | "telling" | "that" | "tomorrow" | "today" | "at" | "in" | "on"
        ) || datetime::is_schedule_token(lower_word, now)
        {
            break;
        }
        name_words.push(cleaned);
        // Contact names are short; phone numbers and handles are one token.
        if name_words.len() == 2 || cleaned.starts_with('+') || cleaned.starts_with('@') {
            break;
        }
    }

    (!name_words.is_empty()).then(|| name_words.join(" "))
}

/// Extract the message body after a body marker, with schedule tokens
/// trimmed off the tail.
fn find_body(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    for marker in BODY_MARKERS {
        let Some(rest) = lower
            .find(marker)
            .and_then(|idx| text.get(idx + marker.len()..))
        else {
            continue;
        };
        let body = rest.trim();
        if !body.is_empty() {
            return Some(body.trim_end_matches(|c: char| c == '.' || c == '!').to_string());
        }
    }
    None
}

/// Parse a handoff request into a typed draft.
pub fn parse_handoff(text: &str, now: NaiveDateTime) -> Result<HandoffDraft, AgendaParseError> {
    let contact = find_contact(text, now).ok_or(AgendaParseError::MissingContact)?;
    let body = find_body(text).ok_or(AgendaParseError::EmptySchedulePayload)?;

    // No time expression → deliver on the next sweep.
    let send_at = datetime::resolve_datetime(text, now).unwrap_or(now);

    Ok(HandoffDraft {
        contact,
        body,
        send_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 26)
            .unwrap()
            .and_hms_opt(16, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_basic_handoff() {
        let draft = parse_handoff(
            "send a message to Maria tomorrow at 9:00 saying don't forget the meeting",
            now(),
        )
        .unwrap();
        assert_eq!(draft.contact, "Maria");
        assert_eq!(draft.body, "don't forget the meeting");
        assert_eq!(draft.send_at.date(), now().date() + Duration::days(1));
    }

    #[test]
    fn test_handoff_without_time_sends_now() {
        let draft = parse_handoff("tell Carla saying the order shipped", now()).unwrap();
        assert_eq!(draft.contact, "Carla");
        assert_eq!(draft.send_at, now());
    }

    #[test]
    fn test_handoff_relative_time() {
        let draft =
            parse_handoff("send a message to Bruno in two hours saying lunch is ready", now())
                .unwrap();
        assert_eq!(draft.contact, "Bruno");
        assert_eq!(draft.send_at, now() + Duration::hours(2));
    }

    #[test]
    fn test_handoff_phone_destination() {
        let draft =
            parse_handoff("send a message to +5511999990000 saying your table is ready", now())
                .unwrap();
        assert_eq!(draft.contact, "+5511999990000");
    }

    #[test]
    fn test_missing_contact() {
        assert_eq!(
            parse_handoff("send a message saying hello", now()),
            Err(AgendaParseError::MissingContact)
        );
    }

    #[test]
    fn test_missing_body() {
        assert_eq!(
            parse_handoff("send a message to Maria tomorrow", now()),
            Err(AgendaParseError::EmptySchedulePayload)
        );
    }
}
