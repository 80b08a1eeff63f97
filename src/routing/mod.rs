//! Skill routing: an ordered rule list mapping one inbound message to
//! exactly one skill.
//!
//! Rules run top to bottom and the first hit wins, so precedence lives in
//! the list order, not in per-rule scores. The final rule always matches,
//! which keeps the router total: every message routes somewhere.

use chrono::NaiveDateTime;

use crate::agenda::{self, AgendaSignal};

/// Assistant modes a message or session can be pinned to. A mode scopes
/// memory retrieval, campaign history and the persona voice.
pub const RECOGNIZED_MODES: &[&str] = &["lumen", "verve", "solara"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Skill {
    HandoffStatus,
    HandoffSchedule,
    AgendaConclude,
    AgendaCreate,
    AgendaQuery,
    LogoGenerate,
    CampaignPlan,
    CampaignGenerate,
    GeneralChat,
}

impl Skill {
    pub fn as_str(&self) -> &'static str {
        match self {
            Skill::HandoffStatus => "handoff_status",
            Skill::HandoffSchedule => "handoff_schedule",
            Skill::AgendaConclude => "agenda_conclude",
            Skill::AgendaCreate => "agenda_create",
            Skill::AgendaQuery => "agenda_query",
            Skill::LogoGenerate => "logo_generate",
            Skill::CampaignPlan => "campaign_plan",
            Skill::CampaignGenerate => "campaign_generate",
            Skill::GeneralChat => "general_chat",
        }
    }
}

/// The routing outcome for one message.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDecision {
    pub skill: Skill,
    pub confidence: f32,
    /// Mode inferred from the message text, if any.
    pub mode: Option<String>,
    pub rationale: &'static str,
}

const HANDOFF_STATUS_PHRASES: &[&str] = &[
    "message status",
    "did my message",
    "was my message",
    "was the message",
    "pending messages",
    "scheduled messages",
    "outgoing messages",
    "handoff status",
];

const HANDOFF_REQUEST_PHRASES: &[&str] = &[
    "send a message to",
    "send message to",
    "text ",
    "message ",
    "remind ",
    "tell ",
    "let ",
];

const LOGO_PHRASES: &[&str] = &["logo"];

const CAMPAIGN_PLAN_PHRASES: &[&str] = &[
    "plan a campaign",
    "campaign plan",
    "campaign ideas",
    "plan the campaign",
    "campaign strategy",
];

const CAMPAIGN_PHRASES: &[&str] = &[
    "campaign",
    "generate an image",
    "generate image",
    "create an ad",
    "make an ad",
    "creative for",
    "visual for",
    "promo image",
];

fn contains_phrase(lower: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| lower.contains(p))
}

/// Whether the message asks about the state of scheduled messages.
fn wants_handoff_status(lower: &str) -> bool {
    contains_phrase(lower, HANDOFF_STATUS_PHRASES)
}

/// Whether the message asks to deliver a message to someone else.
///
/// Phrase hit alone is not enough: the parse must also find a contact,
/// otherwise "tell me a joke" would route here.
fn wants_handoff(text: &str, lower: &str, now: NaiveDateTime) -> bool {
    contains_phrase(lower, HANDOFF_REQUEST_PHRASES)
        && agenda::parse_handoff(text, now).is_ok()
}

/// Route one message. Total: always returns exactly one decision.
pub fn route(text: &str, now: NaiveDateTime) -> RouteDecision {
    let lower = text.to_lowercase();
    let mode = infer_mode(&lower);

    let decision = |skill, confidence, rationale| RouteDecision {
        skill,
        confidence,
        mode: mode.clone(),
        rationale,
    };

    // A complete, parseable request outranks a status phrase; genuine
    // status queries never parse as a deliverable message.
    if wants_handoff(text, &lower, now) {
        return decision(Skill::HandoffSchedule, 0.9, "deliverable message with a contact");
    }
    if wants_handoff_status(&lower) {
        return decision(Skill::HandoffStatus, 0.9, "status phrase for outgoing messages");
    }

    match agenda::classify(text, now) {
        AgendaSignal::Conclude(_) => {
            return decision(Skill::AgendaConclude, 0.85, "mark-complete command")
        }
        AgendaSignal::Query(_) => {
            return decision(Skill::AgendaQuery, 0.85, "agenda existence query")
        }
        AgendaSignal::Create(_) => {
            return decision(Skill::AgendaCreate, 0.85, "agenda creation imperative")
        }
        AgendaSignal::Unrelated => {}
    }

    if contains_phrase(&lower, LOGO_PHRASES) {
        return decision(Skill::LogoGenerate, 0.8, "logo request");
    }
    if contains_phrase(&lower, CAMPAIGN_PLAN_PHRASES) {
        return decision(Skill::CampaignPlan, 0.8, "campaign planning request");
    }
    if contains_phrase(&lower, CAMPAIGN_PHRASES) {
        return decision(Skill::CampaignGenerate, 0.75, "campaign creative request");
    }

    decision(Skill::GeneralChat, 0.3, "no skill phrase matched")
}

/// Infer a mode mention from the message text.
fn infer_mode(lower: &str) -> Option<String> {
    RECOGNIZED_MODES
        .iter()
        .find(|m| {
            lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|t| t == **m)
        })
        .map(|m| m.to_string())
}

/// Resolve the effective mode for a turn.
///
/// Priority: explicit hint > mention in the message > the session's pinned
/// mode. An explicit or inferred mode never clears an existing one; a turn
/// with no mode signal inherits the session's.
pub fn resolve_mode(
    explicit: Option<&str>,
    inferred: Option<&str>,
    session_mode: Option<&str>,
) -> Option<String> {
    explicit
        .or(inferred)
        .or(session_mode)
        .map(|m| m.to_lowercase())
}
