//! Campaign brief extraction.
//!
//! Builds the structured field set a creative asset needs from free text,
//! in three passes: explicit `key: value` lines, bounded in-sentence
//! patterns, then keyword inference. Defaults come last and never
//! overwrite a populated field. The brief is cumulative across session
//! turns: explicit fields from a later turn update the brief, inferred
//! hints only fill gaps, so multi-turn clarification converges.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Aspect-format hints: keyword → normalized ratio.
const ASPECT_HINTS: &[(&str, &str)] = &[
    ("story", "9:16"),
    ("stories", "9:16"),
    ("reel", "9:16"),
    ("reels", "9:16"),
    ("vertical", "9:16"),
    ("feed", "4:5"),
    ("portrait", "4:5"),
    ("square", "1:1"),
    ("banner", "16:9"),
    ("landscape", "16:9"),
];

/// Recognized aspect-ratio tokens accepted verbatim.
const ASPECT_TOKENS: &[&str] = &["1:1", "4:5", "9:16", "16:9", "3:4"];

/// Audience-segment hints found in running text.
const AUDIENCE_HINTS: &[&str] = &[
    "general public",
    "young adults",
    "teenagers",
    "teens",
    "parents",
    "families",
    "professionals",
    "seniors",
    "students",
    "athletes",
];

/// The structured field set required before a creative asset can be
/// generated. `objective`, `audience` and `aspect_format` are the required
/// core; the rest enrich the prompt when present.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignBrief {
    pub objective: Option<String>,
    pub audience: Option<String>,
    pub aspect_format: Option<String>,
    pub theme: Option<String>,
    pub offer: Option<String>,
    pub cta: Option<String>,
    pub scene: Option<String>,
}

impl CampaignBrief {
    /// Required fields still missing, in prompt order.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.objective.is_none() {
            missing.push("objective");
        }
        if self.audience.is_none() {
            missing.push("audience");
        }
        if self.aspect_format.is_none() {
            missing.push("format");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_required().is_empty()
    }

    /// Overwrite with every populated field of `other` (explicit updates).
    pub fn merge_explicit(&mut self, other: CampaignBrief) {
        merge(&mut self.objective, other.objective, true);
        merge(&mut self.audience, other.audience, true);
        merge(&mut self.aspect_format, other.aspect_format, true);
        merge(&mut self.theme, other.theme, true);
        merge(&mut self.offer, other.offer, true);
        merge(&mut self.cta, other.cta, true);
        merge(&mut self.scene, other.scene, true);
    }

    /// Fill gaps with populated fields of `other` (inferred hints).
    pub fn merge_inferred(&mut self, other: CampaignBrief) {
        merge(&mut self.objective, other.objective, false);
        merge(&mut self.audience, other.audience, false);
        merge(&mut self.aspect_format, other.aspect_format, false);
        merge(&mut self.theme, other.theme, false);
        merge(&mut self.offer, other.offer, false);
        merge(&mut self.cta, other.cta, false);
        merge(&mut self.scene, other.scene, false);
    }

    /// Fill remaining gaps with defaults. Returns how many defaults were
    /// substituted (zero means the brief converged from user input alone).
    pub fn apply_defaults(&mut self) -> usize {
        let mut substituted = 0;
        for (slot, default) in [
            (&mut self.objective, "engagement"),
            (&mut self.audience, "general public"),
            (&mut self.aspect_format, "4:5"),
            (&mut self.cta, "Learn more"),
        ] {
            if slot.is_none() {
                *slot = Some(default.to_string());
                substituted += 1;
            }
        }
        substituted
    }

    /// One-line rendering for prompts and persisted briefings.
    pub fn summary(&self) -> String {
        let field = |name: &str, value: &Option<String>| {
            value.as_deref().map(|v| format!("{name}: {v}"))
        };
        [
            field("objective", &self.objective),
            field("audience", &self.audience),
            field("format", &self.aspect_format),
            field("theme", &self.theme),
            field("offer", &self.offer),
            field("cta", &self.cta),
            field("scene", &self.scene),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" | ")
    }
}

fn merge(slot: &mut Option<String>, value: Option<String>, overwrite: bool) {
    if let Some(v) = value {
        if overwrite || slot.is_none() {
            *slot = Some(v);
        }
    }
}

fn set_by_key(brief: &mut CampaignBrief, key: &str, value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }
    let slot = match key {
        "objective" | "goal" => &mut brief.objective,
        "audience" | "target" | "public" => &mut brief.audience,
        "format" | "aspect" | "ratio" => &mut brief.aspect_format,
        "theme" | "topic" => &mut brief.theme,
        "offer" | "promotion" | "discount" => &mut brief.offer,
        "cta" | "call to action" => &mut brief.cta,
        "scene" | "setting" => &mut brief.scene,
        _ => return false,
    };
    *slot = Some(value.to_string());
    true
}

/// Pass 1: explicit `key: value` lines (also `key = value`).
fn extract_explicit(text: &str) -> CampaignBrief {
    let mut brief = CampaignBrief::default();
    for line in text.lines() {
        for segment in line.split(|c| matches!(c, ',' | ';')) {
            let Some((key, value)) = segment.split_once(':').or_else(|| segment.split_once('='))
            else {
                continue;
            };
            let key = key.trim().to_lowercase();
            // "format: 4:5" keeps the ratio intact because only the first
            // colon splits.
            set_by_key(&mut brief, &key, value);
        }
    }
    brief
}

/// Capture up to `max_words` after a marker, stopping at punctuation.
fn capture_after<'a>(text: &'a str, lower: &str, marker: &str, max_words: usize) -> Option<String> {
    let idx = lower.find(marker)?;
    let rest = text.get(idx + marker.len()..)?;
    let captured: Vec<&str> = rest
        .split(|c: char| matches!(c, '.' | ',' | ';' | '!' | '?' | '\n'))
        .next()?
        .split_whitespace()
        .take(max_words)
        .collect();
    (!captured.is_empty()).then(|| captured.join(" "))
}

/// Pass 2: bounded in-sentence patterns ("aimed at young parents",
/// "the goal is more leads").
fn extract_patterns(text: &str) -> CampaignBrief {
    let lower = text.to_lowercase();
    let mut brief = CampaignBrief::default();

    for marker in ["the objective is ", "the goal is ", "we want "] {
        if let Some(value) = capture_after(text, &lower, marker, 5) {
            brief.objective.get_or_insert(value);
        }
    }
    for marker in ["aimed at ", "targeting ", "for the ", "made for "] {
        if let Some(value) = capture_after(text, &lower, marker, 4) {
            brief.audience.get_or_insert(value);
        }
    }
    for marker in ["theme is ", "about the ", "inspired by "] {
        if let Some(value) = capture_after(text, &lower, marker, 5) {
            brief.theme.get_or_insert(value);
        }
    }
    for marker in ["showing ", "set in ", "picture of "] {
        if let Some(value) = capture_after(text, &lower, marker, 6) {
            brief.scene.get_or_insert(value);
        }
    }
    brief
}

/// Pass 3: keyword-driven inference — aspect hints, audience segments,
/// discount capture.
fn extract_inferred(text: &str) -> CampaignBrief {
    let lower = text.to_lowercase();
    let mut brief = CampaignBrief::default();

    for token in lower.split_whitespace() {
        let token = token.trim_matches(|c: char| !c.is_ascii_digit() && c != ':' && c != '%');
        if ASPECT_TOKENS.contains(&token) {
            brief.aspect_format.get_or_insert(token.to_string());
        }
        // "20%" or "20% off" → offer
        if let Some(digits) = token.strip_suffix('%') {
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                brief.offer.get_or_insert(format!("{digits}% off"));
            }
        }
    }

    if brief.aspect_format.is_none() {
        for (hint, ratio) in ASPECT_HINTS {
            if lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|w| w == *hint)
            {
                brief.aspect_format = Some(ratio.to_string());
                break;
            }
        }
    }

    for segment in AUDIENCE_HINTS {
        if lower.contains(segment) {
            brief.audience.get_or_insert(segment.to_string());
            break;
        }
    }

    brief
}

/// Extract a brief from a single message: explicit beats patterns beats
/// inference, defaults are not applied here.
pub fn extract_brief(text: &str) -> CampaignBrief {
    let mut brief = extract_explicit(text);
    brief.merge_inferred(extract_patterns(text));
    brief.merge_inferred(extract_inferred(text));
    brief
}

/// Aggregate a brief across user turns, oldest first. Explicit fields from
/// later turns update the brief; inferred hints only fill gaps.
pub fn aggregate_brief<'a, I>(turns: I) -> CampaignBrief
where
    I: IntoIterator<Item = &'a str>,
{
    let mut brief = CampaignBrief::default();
    for turn in turns {
        brief.merge_explicit(extract_explicit(turn));
        brief.merge_inferred(extract_patterns(turn));
        brief.merge_inferred(extract_inferred(turn));
    }
    brief
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_explicit_key_value_lines() {
        let brief = extract_brief("objective: leads\naudience: young parents\nformat: 9:16");
        assert_eq!(brief.objective.as_deref(), Some("leads"));
        assert_eq!(brief.audience.as_deref(), Some("young parents"));
        assert_eq!(brief.aspect_format.as_deref(), Some("9:16"));
    }

    #[test]
    fn test_format_ratio_survives_colon_split() {
        let brief = extract_brief("format: 4:5");
        assert_eq!(brief.aspect_format.as_deref(), Some("4:5"));
    }

    #[test]
    fn test_aspect_hint_inference() {
        let brief = extract_brief("make it a story for the winter launch");
        assert_eq!(brief.aspect_format.as_deref(), Some("9:16"));
    }

    #[test]
    fn test_discount_capture() {
        let brief = extract_brief("promote the sale, 20% off everything this weekend");
        assert_eq!(brief.offer.as_deref(), Some("20% off"));
    }

    #[test]
    fn test_audience_segment_hint() {
        let brief = extract_brief("something that speaks to young adults");
        assert_eq!(brief.audience.as_deref(), Some("young adults"));
    }

    #[test]
    fn test_explicit_beats_inference() {
        let brief = extract_brief("audience: retirees\na post for young adults, square format");
        assert_eq!(brief.audience.as_deref(), Some("retirees"));
        assert_eq!(brief.aspect_format.as_deref(), Some("1:1"));
    }

    #[test]
    fn test_defaults_never_overwrite() {
        let mut brief = extract_brief("objective: leads");
        let substituted = brief.apply_defaults();
        assert_eq!(brief.objective.as_deref(), Some("leads"));
        assert_eq!(brief.audience.as_deref(), Some("general public"));
        assert!(substituted > 0);
    }

    #[test]
    fn test_three_turn_aggregation_converges() {
        let brief = aggregate_brief([
            "objective: leads",
            "audience: general public",
            "format: 4:5",
        ]);
        assert!(brief.is_complete());
        let mut finished = brief.clone();
        assert_eq!(finished.apply_defaults(), 0, "no default substitutions");
        assert_eq!(finished.objective.as_deref(), Some("leads"));
    }

    #[test]
    fn test_later_explicit_turn_updates_field() {
        let brief = aggregate_brief(["format: 4:5", "actually, format: 9:16"]);
        assert_eq!(brief.aspect_format.as_deref(), Some("9:16"));
    }

    #[test]
    fn test_inferred_hint_does_not_reset_explicit() {
        let brief = aggregate_brief(["format: 4:5", "make it feel like a story"]);
        assert_eq!(brief.aspect_format.as_deref(), Some("4:5"));
    }

    #[test]
    fn test_missing_required_ordering() {
        let brief = CampaignBrief::default();
        assert_eq!(brief.missing_required(), vec!["objective", "audience", "format"]);
    }
}
