//! Date/time token extraction for agenda and handoff parsing.
//!
//! Hand-built token scanning, no grammar: dates are day-first
//! (`10/03/2026` = 10 March 2026), times are `HH:MM` or compact `15h`,
//! relative expressions (`in two hours`) resolve against an injected
//! fixed "now" so parsing stays deterministic.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use super::AgendaParseError;

/// Number words accepted in relative expressions.
const NUMBER_WORDS: &[(&str, i64)] = &[
    ("a", 1),
    ("an", 1),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
];

/// Default wall-clock time when a date is given without a time.
const DEFAULT_HOUR: u32 = 9;

fn trim_punct(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric() && c != ':' && c != '/')
}

fn tokens(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(trim_punct)
        .filter(|t| !t.is_empty())
        .collect()
}

fn word_amount(token: &str) -> Option<i64> {
    if let Ok(n) = token.parse::<i64>() {
        return (n > 0).then_some(n);
    }
    NUMBER_WORDS
        .iter()
        .find(|(w, _)| *w == token)
        .map(|(_, n)| *n)
}

/// Parse `in <amount> <hours|minutes>` anywhere in the (lowercased) text.
pub fn parse_relative(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let toks = tokens(text);
    for window in toks.windows(3) {
        if window[0] != "in" {
            continue;
        }
        let Some(amount) = word_amount(window[1]) else {
            continue;
        };
        let delta = match window[2] {
            "hour" | "hours" | "hr" | "hrs" => Duration::hours(amount),
            "minute" | "minutes" | "min" | "mins" => Duration::minutes(amount),
            "day" | "days" => Duration::days(amount),
            _ => continue,
        };
        return Some(now + delta);
    }
    None
}

/// Parse a day-first numeric date token (`dd/mm`, `dd/mm/yy`, `dd/mm/yyyy`).
pub fn parse_date_token(token: &str, now: NaiveDateTime) -> Option<NaiveDate> {
    let parts: Vec<&str> = token.split('/').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }
    let day: u32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let year: i32 = match parts.get(2) {
        Some(y) => {
            let raw: i32 = y.parse().ok()?;
            if raw < 100 {
                2000 + raw
            } else {
                raw
            }
        }
        None => now.year(),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Find the first explicit date in the text: a numeric token, `today`,
/// or `tomorrow`.
pub fn find_date(text: &str, now: NaiveDateTime) -> Option<NaiveDate> {
    for token in tokens(text) {
        if token == "today" {
            return Some(now.date());
        }
        if token == "tomorrow" {
            return Some(now.date() + Duration::days(1));
        }
        if let Some(date) = parse_date_token(token, now) {
            return Some(date);
        }
    }
    None
}

/// Find an explicit `HH:MM` clock time.
pub fn find_clock_time(text: &str) -> Option<NaiveTime> {
    for token in tokens(text) {
        let Some((h, m)) = token.split_once(':') else {
            continue;
        };
        let (Ok(hour), Ok(minute)) = (h.parse::<u32>(), m.parse::<u32>()) else {
            continue;
        };
        if let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) {
            return Some(time);
        }
    }
    None
}

/// Find a compact hour token (`15h`, `9h`, `9hs`).
pub fn find_compact_hour(text: &str) -> Option<NaiveTime> {
    for token in tokens(text) {
        let Some(digits) = token
            .strip_suffix("hs")
            .or_else(|| token.strip_suffix('h'))
        else {
            continue;
        };
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if let Ok(hour) = digits.parse::<u32>() {
            if let Some(time) = NaiveTime::from_hms_opt(hour, 0, 0) {
                return Some(time);
            }
        }
    }
    None
}

/// Resolve the date/time expressed in `text` against a fixed `now`.
///
/// Policy:
/// - relative expressions win outright;
/// - explicit `HH:MM` beats the compact `Nh` form;
/// - a time with no date rolls to the next day when that time has already
///   passed; saying "today" supplies an explicit date, which keeps the
///   stated time even when it is in the past;
/// - a date with no time defaults to 09:00.
pub fn resolve_datetime(text: &str, now: NaiveDateTime) -> Result<NaiveDateTime, AgendaParseError> {
    let lower = text.to_lowercase();

    if let Some(resolved) = parse_relative(&lower, now) {
        return Ok(resolved);
    }

    let date = find_date(&lower, now);
    let time = find_clock_time(&lower).or_else(|| find_compact_hour(&lower));

    match (date, time) {
        (Some(date), Some(time)) => Ok(date.and_time(time)),
        (Some(date), None) => {
            Ok(date.and_time(NaiveTime::from_hms_opt(DEFAULT_HOUR, 0, 0).unwrap_or_default()))
        }
        (None, Some(time)) => {
            if time <= now.time() {
                Ok((now.date() + Duration::days(1)).and_time(time))
            } else {
                Ok(now.date().and_time(time))
            }
        }
        (None, None) => Err(AgendaParseError::MissingDateTime),
    }
}

/// Whether a token carries date/time information. Used by the free-text
/// title fallback to strip schedule tokens out of the remaining words.
pub fn is_schedule_token(token: &str, now: NaiveDateTime) -> bool {
    let t = trim_punct(&token.to_lowercase()).to_string();
    t == "today"
        || t == "tomorrow"
        || parse_date_token(&t, now).is_some()
        || find_clock_time(&t).is_some()
        || find_compact_hour(&t).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        // Fixed reference: 2026-08-26 16:00
        NaiveDate::from_ymd_opt(2026, 8, 26)
            .unwrap()
            .and_hms_opt(16, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_day_first_date() {
        let date = parse_date_token("10/03/2026", now()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
    }

    #[test]
    fn test_two_digit_year() {
        let date = parse_date_token("05/12/26", now()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 12, 5).unwrap());
    }

    #[test]
    fn test_date_without_year_uses_current() {
        let date = parse_date_token("15/09", now()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 9, 15).unwrap());
    }

    #[test]
    fn test_invalid_date_rejected() {
        assert!(parse_date_token("32/01/2026", now()).is_none());
        assert!(parse_date_token("10/13/2026", now()).is_none());
        assert!(parse_date_token("abc", now()).is_none());
    }

    #[test]
    fn test_relative_word_amount() {
        let resolved = parse_relative("call me in two hours", now()).unwrap();
        assert_eq!(resolved, now() + Duration::hours(2));
    }

    #[test]
    fn test_relative_digit_minutes() {
        let resolved = parse_relative("remind me in 45 minutes", now()).unwrap();
        assert_eq!(resolved, now() + Duration::minutes(45));
    }

    #[test]
    fn test_relative_an_hour() {
        let resolved = parse_relative("in an hour", now()).unwrap();
        assert_eq!(resolved, now() + Duration::hours(1));
    }

    #[test]
    fn test_clock_beats_compact_hour() {
        // 10:30 explicit wins over 15h compact
        let resolved = resolve_datetime("meeting 15h or rather 10:30 tomorrow", now()).unwrap();
        assert_eq!(resolved.time(), NaiveTime::from_hms_opt(10, 30, 0).unwrap());
    }

    #[test]
    fn test_hour_only_past_rolls_to_next_day() {
        // now is 16:00; 15h already passed
        let resolved = resolve_datetime("dentist at 15h", now()).unwrap();
        assert_eq!(resolved.date(), now().date() + Duration::days(1));
        assert_eq!(resolved.time(), NaiveTime::from_hms_opt(15, 0, 0).unwrap());
    }

    #[test]
    fn test_hour_only_future_stays_today() {
        let resolved = resolve_datetime("dentist at 18h", now()).unwrap();
        assert_eq!(resolved.date(), now().date());
    }

    #[test]
    fn test_today_marker_pins_past_hour() {
        let resolved = resolve_datetime("dentist today at 15h", now()).unwrap();
        assert_eq!(resolved.date(), now().date());
        assert_eq!(resolved.time(), NaiveTime::from_hms_opt(15, 0, 0).unwrap());
    }

    #[test]
    fn test_date_without_time_defaults_morning() {
        let resolved = resolve_datetime("review on 10/03/2026", now()).unwrap();
        assert_eq!(
            resolved,
            NaiveDate::from_ymd_opt(2026, 3, 10)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_tomorrow_with_time() {
        let resolved = resolve_datetime("tomorrow at 8:15", now()).unwrap();
        assert_eq!(resolved.date(), now().date() + Duration::days(1));
        assert_eq!(resolved.time(), NaiveTime::from_hms_opt(8, 15, 0).unwrap());
    }

    #[test]
    fn test_no_datetime_is_error() {
        assert_eq!(
            resolve_datetime("just some text", now()),
            Err(AgendaParseError::MissingDateTime)
        );
    }
}
