//! Chat orchestration: session resolution, routing, skill dispatch and
//! reply persistence.
//!
//! Every terminal branch persists the assistant reply before returning.
//! Secondary effects (calendar mirroring, long-memory indexing) run on
//! spawned tasks and only ever log their failures.

pub mod persona;
pub mod sanitize;

use std::sync::Arc;
use std::time::Instant;

use async_stream::stream;
use chrono::{DateTime, Duration, Local, LocalResult, NaiveDateTime, TimeZone, Utc};
use futures::stream::Stream;
use surrealdb::RecordId;

use crate::agenda::{self, AgendaParseError, AgendaSignal, ConcludeCandidate, QueryRange};
use crate::campaign::{aggregate_brief, CampaignBrief};
use crate::db::connection::ConciergeDb;
use crate::memory::{LongMemory, MediumEntry, MediumMemory, MemoryIndexRequest};
use crate::models::agenda::{
    create_agenda_entry, entries_in_range, mark_entry_done, open_entries_for_owner, AgendaEntry,
    AgendaEntryCreate, AgendaStatus,
};
use crate::models::campaign::{
    create_campaign, recent_campaigns, CampaignOverlay, CampaignRecordCreate,
};
use crate::models::handoff::{create_handoff_task, tasks_for_owner, HandoffStatus, HandoffTaskCreate};
use crate::models::message::{append_message, ChatMessageCreate, MessageMetadata};
use crate::models::session::{
    create_session, get_session, latest_session_for_owner, touch_session, ChatSession,
    ChatSessionCreate,
};
use crate::models::Role;
use crate::routing::{self, Skill};
use crate::services::{
    CalendarEvent, CalendarSync, CompletionRequest, CompletionService, GeneratedAsset,
    ImageRequest, ImageService, PromptMessage,
};
use crate::variation::{build_seed, select, RecentChoices, VariationPools};
use crate::ConciergeError;

use sanitize::sanitize_reply;

/// One inbound user turn.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub owner: String,
    pub text: String,
    /// Resume this session instead of resolving one.
    pub session_hint: Option<String>,
    /// Explicit mode request, beats any in-message mention.
    pub mode_hint: Option<String>,
    /// Prior user turns supplied out of band, oldest first. They seed the
    /// conversational context and brief aggregation for callers whose
    /// earlier turns never went through this store.
    pub history: Vec<String>,
}

/// The orchestrator's terminal answer for one turn.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub reply_text: String,
    pub media_items: Vec<GeneratedAsset>,
    pub session_id: String,
}

/// Streaming frame. Always terminated by `Done`.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatChunk {
    Text(String),
    Media(GeneratedAsset),
    Done { session_id: String },
}

/// Interpret a wall-clock-naive datetime in the local zone.
pub fn to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => Utc.from_utc_datetime(&naive),
    }
}

fn human_time(dt: &surrealdb::Datetime) -> String {
    DateTime::<Utc>::from(dt.clone().into_inner())
        .with_timezone(&Local)
        .format("%d/%m/%Y %H:%M")
        .to_string()
}

/// Break a reply into word-aligned chunks for streaming.
fn chunk_text(text: &str) -> Vec<String> {
    const TARGET: usize = 48;
    let mut chunks = Vec::new();
    let mut current = String::new();
    for word in text.split_inclusive(' ') {
        current.push_str(word);
        if current.len() >= TARGET {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// An explicit casting preference mentioned in the request text.
fn cast_preference(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    let mentions = |needle: &str| {
        lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|t| t == needle)
    };
    for (needle, preference) in [
        ("woman", "woman"),
        ("female", "woman"),
        ("man", "man"),
        ("male", "man"),
        ("couple", "couple"),
        ("group", "group"),
        ("friends", "friends"),
    ] {
        if mentions(needle) {
            return Some(preference);
        }
    }
    None
}

/// Map a typed parse failure to a human recovery prompt.
fn recovery_prompt(error: &AgendaParseError) -> String {
    match error {
        AgendaParseError::MissingDateTime => {
            "When should I schedule that for? A date and time like \"10/03 10:00\" \
             or \"tomorrow at 9\" works."
                .to_string()
        }
        AgendaParseError::EmptySchedulePayload => {
            "What should I call it? Give me a short title and I'll set it up.".to_string()
        }
        AgendaParseError::MissingContact => {
            "Who should I send that to? A name, phone number or handle works.".to_string()
        }
        AgendaParseError::AmbiguousConclusion(candidates) => ambiguity_listing(candidates),
        AgendaParseError::NoConclusionMatch => {
            "I couldn't find an open item matching that. Ask \"what's on my agenda\" \
             to see what's open."
                .to_string()
        }
    }
}

fn ambiguity_listing(candidates: &[ConcludeCandidate]) -> String {
    let lines: Vec<String> = candidates
        .iter()
        .map(|c| format!("- {} ({})", c.title, c.id))
        .collect();
    format!(
        "More than one open item matches:\n{}\nWhich one did you mean?",
        lines.join("\n")
    )
}

fn agenda_listing(entries: &[AgendaEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("- {} at {}", e.title, human_time(&e.starts_at)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct Orchestrator {
    db: Arc<ConciergeDb>,
    completion: Arc<dyn CompletionService>,
    image: Arc<dyn ImageService>,
    calendar: Arc<dyn CalendarSync>,
    medium: Arc<MediumMemory>,
    long: Arc<LongMemory>,
    session_idle_hours: i64,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Arc<ConciergeDb>,
        completion: Arc<dyn CompletionService>,
        image: Arc<dyn ImageService>,
        calendar: Arc<dyn CalendarSync>,
        medium: Arc<MediumMemory>,
        long: Arc<LongMemory>,
        session_idle_hours: i64,
    ) -> Self {
        Self {
            db,
            completion,
            image,
            calendar,
            medium,
            long,
            session_idle_hours,
        }
    }

    /// Handle one inbound turn end to end.
    pub async fn handle(&self, inbound: Inbound) -> Result<ChatReply, ConciergeError> {
        let started = Instant::now();
        let now_local = Local::now().naive_local();

        let decision = routing::route(&inbound.text, now_local);
        let session = self.resolve_session(&inbound).await?;
        let session_id = session.id.to_string();

        // Only a recognized token counts, as a hint or a mention; anything
        // else neither resolves nor pins, and the stored mode stays put.
        let explicit = inbound
            .mode_hint
            .as_deref()
            .map(str::to_lowercase)
            .filter(|m| routing::RECOGNIZED_MODES.contains(&m.as_str()));
        if explicit.is_none() && inbound.mode_hint.is_some() {
            tracing::debug!("Ignoring unrecognized mode hint: {:?}", inbound.mode_hint);
        }
        let mode = routing::resolve_mode(
            explicit.as_deref(),
            decision.mode.as_deref(),
            session.mode.as_deref(),
        );
        let pin = explicit.as_deref().or(decision.mode.as_deref());
        touch_session(&self.db, &session.id, pin).await?;

        append_message(
            &self.db,
            ChatMessageCreate {
                session: session.id.clone(),
                role: Role::User,
                content: inbound.text.clone(),
                mode: mode.clone(),
                attachments: Vec::new(),
                metadata: None,
            },
        )
        .await?;
        self.remember(
            &inbound.owner,
            &session_id,
            &session.id,
            Role::User,
            &inbound.text,
            mode.clone(),
        )
        .await;

        let (reply_text, media_items) = match decision.skill {
            Skill::HandoffStatus => (self.handoff_status(&inbound.owner).await?, Vec::new()),
            Skill::HandoffSchedule => (
                self.handoff_schedule(&inbound.owner, &inbound.text, now_local)
                    .await?,
                Vec::new(),
            ),
            Skill::AgendaConclude => (
                self.agenda_conclude(&inbound.owner, &inbound.text).await?,
                Vec::new(),
            ),
            Skill::AgendaCreate => (
                self.agenda_create(&inbound.owner, &inbound.text, now_local)
                    .await?,
                Vec::new(),
            ),
            Skill::AgendaQuery => (
                self.agenda_query(&inbound.owner, &inbound.text, now_local)
                    .await?,
                Vec::new(),
            ),
            Skill::LogoGenerate => {
                self.creative_generate(&inbound, &session.id, mode.as_deref(), true)
                    .await?
            }
            Skill::CampaignGenerate => {
                self.creative_generate(&inbound, &session.id, mode.as_deref(), false)
                    .await?
            }
            Skill::CampaignPlan => (
                self.campaign_plan(&inbound, &session.id, mode.as_deref())
                    .await?,
                Vec::new(),
            ),
            Skill::GeneralChat => (
                self.general_chat(&inbound, &session_id, mode.as_deref())
                    .await?,
                Vec::new(),
            ),
        };

        let attachments: Vec<String> = media_items.iter().filter_map(|a| a.url.clone()).collect();
        append_message(
            &self.db,
            ChatMessageCreate {
                session: session.id.clone(),
                role: Role::Assistant,
                content: reply_text.clone(),
                mode: mode.clone(),
                attachments,
                metadata: Some(MessageMetadata {
                    skill: Some(decision.skill.as_str().to_string()),
                    confidence: Some(decision.confidence),
                    latency_ms: Some(started.elapsed().as_millis() as u64),
                }),
            },
        )
        .await?;
        self.remember(
            &inbound.owner,
            &session_id,
            &session.id,
            Role::Assistant,
            &reply_text,
            mode,
        )
        .await;

        Ok(ChatReply {
            reply_text,
            media_items,
            session_id,
        })
    }

    /// Streaming variant: the full pipeline runs once, the reply is chunked.
    pub fn handle_stream(
        self: &Arc<Self>,
        inbound: Inbound,
    ) -> impl Stream<Item = Result<ChatChunk, ConciergeError>> + Send {
        let this = Arc::clone(self);
        stream! {
            match this.handle(inbound).await {
                Ok(reply) => {
                    for chunk in chunk_text(&reply.reply_text) {
                        yield Ok(ChatChunk::Text(chunk));
                    }
                    for asset in reply.media_items {
                        yield Ok(ChatChunk::Media(asset));
                    }
                    yield Ok(ChatChunk::Done { session_id: reply.session_id });
                }
                Err(e) => yield Err(e),
            }
        }
    }

    /// Resolve the session for a turn: an explicit hint wins; otherwise the
    /// owner's latest session is resumed when it falls inside the idle
    /// window, else a fresh one is created.
    async fn resolve_session(&self, inbound: &Inbound) -> Result<ChatSession, ConciergeError> {
        if let Some(hint) = &inbound.session_hint {
            let key = hint.strip_prefix("chat_session:").unwrap_or(hint);
            if let Some(session) = get_session(&self.db, key).await? {
                return Ok(session);
            }
            return Err(ConciergeError::NotFound {
                entity_type: "chat_session".to_string(),
                id: hint.clone(),
            });
        }

        if let Some(latest) = latest_session_for_owner(&self.db, &inbound.owner).await? {
            let last_seen = DateTime::<Utc>::from(latest.last_message_at.clone().into_inner());
            if Utc::now() - last_seen <= Duration::hours(self.session_idle_hours) {
                return Ok(latest);
            }
        }

        create_session(
            &self.db,
            ChatSessionCreate {
                owner: inbound.owner.clone(),
                mode: None,
            },
        )
        .await
    }

    /// Record a turn in the medium tier and index it into long memory on a
    /// detached task.
    async fn remember(
        &self,
        owner: &str,
        session_key: &str,
        session_id: &RecordId,
        role: Role,
        content: &str,
        mode: Option<String>,
    ) {
        self.medium
            .push(
                session_key,
                MediumEntry {
                    role,
                    content: content.to_string(),
                    at: Utc::now(),
                },
            )
            .await;

        let long = Arc::clone(&self.long);
        let request = MemoryIndexRequest {
            owner: owner.to_string(),
            session: Some(session_id.clone()),
            role,
            content: content.to_string(),
            mode,
        };
        tokio::spawn(async move {
            if let Err(e) = long.index(request).await {
                tracing::warn!("Long-memory indexing failed: {}", e);
            }
        });
    }

    async fn handoff_status(&self, owner: &str) -> Result<String, ConciergeError> {
        let tasks = tasks_for_owner(&self.db, owner, 10).await?;
        if tasks.is_empty() {
            return Ok("You have no scheduled messages.".to_string());
        }
        let lines: Vec<String> = tasks
            .iter()
            .map(|t| {
                let status = match t.status {
                    HandoffStatus::Pending => "pending",
                    HandoffStatus::Sending => "sending",
                    HandoffStatus::Sent => "sent",
                    HandoffStatus::Failed => "failed",
                };
                format!(
                    "- to {} at {}: \"{}\" [{}]",
                    t.contact,
                    human_time(&t.scheduled_at),
                    t.body,
                    status
                )
            })
            .collect();
        Ok(format!("Your recent messages:\n{}", lines.join("\n")))
    }

    async fn handoff_schedule(
        &self,
        owner: &str,
        text: &str,
        now: NaiveDateTime,
    ) -> Result<String, ConciergeError> {
        let draft = match agenda::parse_handoff(text, now) {
            Ok(draft) => draft,
            Err(e) => return Ok(recovery_prompt(&e)),
        };
        let task = create_handoff_task(
            &self.db,
            HandoffTaskCreate {
                owner: owner.to_string(),
                contact: draft.contact.clone(),
                body: draft.body.clone(),
                scheduled_at: surrealdb::Datetime::from(to_utc(draft.send_at)),
                status: HandoffStatus::Pending,
            },
        )
        .await?;
        Ok(format!(
            "Scheduled: your message to {} will go out at {}.",
            draft.contact,
            human_time(&task.scheduled_at)
        ))
    }

    async fn agenda_conclude(&self, owner: &str, text: &str) -> Result<String, ConciergeError> {
        let Some(command) = agenda::parse_conclude(text) else {
            return Ok("Which item should I mark as done?".to_string());
        };
        let open = open_entries_for_owner(&self.db, owner).await?;
        let candidates: Vec<ConcludeCandidate> = open
            .iter()
            .map(|e| ConcludeCandidate {
                id: e.id.to_string(),
                title: e.title.clone(),
            })
            .collect();

        match agenda::resolve_conclusion(&candidates, &command) {
            Ok(chosen) => {
                let entry = open
                    .iter()
                    .find(|e| e.id.to_string() == chosen.id)
                    .ok_or_else(|| ConciergeError::NotFound {
                        entity_type: "agenda_entry".to_string(),
                        id: chosen.id.clone(),
                    })?;
                mark_entry_done(&self.db, &entry.id).await?;
                Ok(format!("Done — marked \"{}\" as complete.", chosen.title))
            }
            Err(e) => Ok(recovery_prompt(&e)),
        }
    }

    async fn agenda_create(
        &self,
        owner: &str,
        text: &str,
        now: NaiveDateTime,
    ) -> Result<String, ConciergeError> {
        let draft = match agenda::classify(text, now) {
            AgendaSignal::Create(Ok(draft)) => draft,
            AgendaSignal::Create(Err(e)) => return Ok(recovery_prompt(&e)),
            _ => return Ok("What would you like me to schedule?".to_string()),
        };

        let starts_utc = to_utc(draft.starts_at);
        let entry = create_agenda_entry(
            &self.db,
            AgendaEntryCreate {
                owner: owner.to_string(),
                title: draft.title.clone(),
                description: draft.description.clone(),
                starts_at: surrealdb::Datetime::from(starts_utc),
                status: AgendaStatus::Open,
            },
        )
        .await?;

        // External mirror is best-effort and off the request path.
        let calendar = Arc::clone(&self.calendar);
        let owner_copy = owner.to_string();
        let event = CalendarEvent {
            title: draft.title.clone(),
            description: draft.description.clone(),
            starts_at: starts_utc,
        };
        tokio::spawn(async move {
            if let Err(e) = calendar.mirror(&owner_copy, event).await {
                tracing::warn!("Calendar mirror failed: {}", e);
            }
        });

        let mut reply = format!(
            "Scheduled \"{}\" for {}.",
            entry.title,
            human_time(&entry.starts_at)
        );

        if let Some(contact) = &draft.notify_contact {
            create_handoff_task(
                &self.db,
                HandoffTaskCreate {
                    owner: owner.to_string(),
                    contact: contact.clone(),
                    body: format!(
                        "Heads up: \"{}\" is scheduled for {}.",
                        entry.title,
                        human_time(&entry.starts_at)
                    ),
                    scheduled_at: surrealdb::Datetime::from(Utc::now()),
                    status: HandoffStatus::Pending,
                },
            )
            .await?;
            reply.push_str(&format!(" I'll also message {contact} about it."));
        }

        if draft.deferred_query {
            let day_start = to_utc(
                draft
                    .starts_at
                    .date()
                    .and_hms_opt(0, 0, 0)
                    .unwrap_or(draft.starts_at),
            );
            let others: Vec<AgendaEntry> =
                entries_in_range(&self.db, owner, day_start, day_start + Duration::days(1))
                    .await?
                    .into_iter()
                    .filter(|e| e.id != entry.id)
                    .collect();
            if others.is_empty() {
                reply.push_str(" Nothing else is scheduled that day.");
            } else {
                reply.push_str(&format!(
                    "\nThat day you also have:\n{}",
                    agenda_listing(&others)
                ));
            }
        }

        Ok(reply)
    }

    async fn agenda_query(
        &self,
        owner: &str,
        text: &str,
        now: NaiveDateTime,
    ) -> Result<String, ConciergeError> {
        let Some(query) = agenda::detect_query(text, now) else {
            return Ok("Which day would you like me to check?".to_string());
        };
        match query.range {
            QueryRange::Day(date) => {
                let from = to_utc(date.and_hms_opt(0, 0, 0).unwrap_or(now));
                let entries = entries_in_range(&self.db, owner, from, from + Duration::days(1))
                    .await?;
                if entries.is_empty() {
                    Ok(format!("You're free on {}.", date.format("%d/%m/%Y")))
                } else {
                    Ok(format!(
                        "On {} you have:\n{}",
                        date.format("%d/%m/%Y"),
                        agenda_listing(&entries)
                    ))
                }
            }
            QueryRange::Upcoming => {
                let entries = open_entries_for_owner(&self.db, owner).await?;
                if entries.is_empty() {
                    Ok("Nothing on your agenda right now.".to_string())
                } else {
                    Ok(format!("Coming up:\n{}", agenda_listing(&entries)))
                }
            }
        }
    }

    async fn creative_generate(
        &self,
        inbound: &Inbound,
        session: &RecordId,
        mode: Option<&str>,
        logo: bool,
    ) -> Result<(String, Vec<GeneratedAsset>), ConciergeError> {
        let turns = crate::models::message::user_turns(&self.db, session).await?;
        let mut brief = aggregate_brief(
            inbound
                .history
                .iter()
                .chain(turns.iter())
                .map(String::as_str),
        );
        let assumed = brief.missing_required();
        brief.apply_defaults();

        if !self.image.is_available() {
            return Ok((
                format!(
                    "Image generation isn't configured, so I can't render this yet. \
                     Here's the brief I have: {}.",
                    brief.summary()
                ),
                Vec::new(),
            ));
        }

        let records = recent_campaigns(&self.db, &inbound.owner, mode, 8).await?;
        let mut recent = RecentChoices::default();
        for record in &records {
            if let Some(o) = &record.overlay {
                if let Some(v) = &o.cast {
                    recent.cast.push(v.clone());
                }
                if let Some(v) = &o.scene {
                    recent.scene.push(v.clone());
                }
                if let Some(v) = &o.framing {
                    recent.framing.push(v.clone());
                }
                if let Some(v) = &o.appearance {
                    recent.appearance.push(v.clone());
                }
                if let Some(v) = &o.mood {
                    recent.mood.push(v.clone());
                }
            }
        }

        let token = uuid::Uuid::new_v4().to_string();
        let seed = build_seed(mode, &brief, &token);
        let choice = select(
            &VariationPools::defaults(),
            &seed,
            &recent,
            cast_preference(&inbound.text),
        );

        let prompt = if logo {
            compose_logo_prompt(&brief, mode)
        } else {
            format!(
                "{} Scene: {} with {}, {} wearing {}, mood {}.",
                compose_base_prompt(&brief, mode),
                choice.scene,
                choice.cast,
                choice.framing,
                choice.appearance,
                choice.mood
            )
        };

        let asset = match self
            .image
            .generate(ImageRequest {
                prompt,
                size: None,
            })
            .await
        {
            Ok(asset) => asset,
            Err(first_err) => {
                // One retry with a simplified prompt.
                tracing::warn!("Image generation failed, retrying simplified: {}", first_err);
                let simplified = if logo {
                    compose_logo_prompt(&brief, mode)
                } else {
                    compose_base_prompt(&brief, mode)
                };
                match self
                    .image
                    .generate(ImageRequest {
                        prompt: simplified,
                        size: None,
                    })
                    .await
                {
                    Ok(asset) => asset,
                    Err(e) => {
                        tracing::warn!("Image retry failed: {}", e);
                        return Ok((
                            "I couldn't generate the image right now. Want me to try \
                             again in a bit?"
                                .to_string(),
                            Vec::new(),
                        ));
                    }
                }
            }
        };

        let overlay = if logo {
            CampaignOverlay {
                offer: brief.offer.clone(),
                cta: brief.cta.clone(),
                ..Default::default()
            }
        } else {
            CampaignOverlay {
                headline: brief.theme.clone(),
                offer: brief.offer.clone(),
                cta: brief.cta.clone(),
                cast: Some(choice.cast.clone()),
                scene: Some(choice.scene.clone()),
                framing: Some(choice.framing.clone()),
                appearance: Some(choice.appearance.clone()),
                mood: Some(choice.mood.clone()),
            }
        };
        let title = brief
            .theme
            .clone()
            .or_else(|| brief.objective.clone())
            .unwrap_or_else(|| if logo { "logo" } else { "campaign" }.to_string());
        create_campaign(
            &self.db,
            CampaignRecordCreate {
                owner: inbound.owner.clone(),
                mode: mode.map(String::from),
                title,
                briefing: brief.summary(),
                asset_ref: asset.url.clone(),
                overlay: Some(overlay),
                metadata: Some(serde_json::json!({ "variation_token": token })),
            },
        )
        .await?;

        let mut reply = if logo {
            "Here's a logo concept for you.".to_string()
        } else {
            "Here's your creative.".to_string()
        };
        if !assumed.is_empty() {
            reply.push_str(&format!(
                " I filled in defaults for: {}. Tell me if you'd like them changed.",
                assumed.join(", ")
            ));
        }
        Ok((reply, vec![asset]))
    }

    async fn campaign_plan(
        &self,
        inbound: &Inbound,
        session: &RecordId,
        mode: Option<&str>,
    ) -> Result<String, ConciergeError> {
        let turns = crate::models::message::user_turns(&self.db, session).await?;
        let brief = aggregate_brief(
            inbound
                .history
                .iter()
                .chain(turns.iter())
                .map(String::as_str),
        );

        if !brief.is_complete() {
            let known = brief.summary();
            let missing = brief.missing_required().join(", ");
            return Ok(if known.is_empty() {
                format!("To plan this campaign I still need: {missing}.")
            } else {
                format!(
                    "So far I have {known}. To plan this campaign I still need: {missing}."
                )
            });
        }

        let request = CompletionRequest {
            messages: vec![
                PromptMessage::system(persona::system_prompt(mode)),
                PromptMessage::user(format!(
                    "Draft a short 3-step campaign plan for this brief, no preamble: {}",
                    brief.summary()
                )),
            ],
            temperature: Some(0.7),
            max_tokens: Some(400),
        };
        match self.completion.complete(request).await {
            Ok(text) => Ok(sanitize_reply(&text)),
            Err(e) => {
                tracing::warn!("Completion failed for campaign plan: {}", e);
                Ok(format!(
                    "Here's the brief, ready to go: {}. I can generate the creative \
                     whenever you are.",
                    brief.summary()
                ))
            }
        }
    }

    async fn general_chat(
        &self,
        inbound: &Inbound,
        session_key: &str,
        mode: Option<&str>,
    ) -> Result<String, ConciergeError> {
        let mut messages = vec![PromptMessage::system(persona::system_prompt(mode))];

        match self
            .long
            .recall(&inbound.owner, mode, &inbound.text, 5)
            .await
        {
            Ok(memories) => {
                if let Some(block) = persona::memory_block(&memories) {
                    messages.push(PromptMessage::system(block));
                }
            }
            Err(e) => tracing::warn!("Memory recall failed: {}", e),
        }

        // Caller-supplied turns come before anything this store recorded.
        for turn in &inbound.history {
            messages.push(PromptMessage::user(turn.clone()));
        }

        // Medium tier is most-recent-first; the completion wants oldest
        // first and already includes the current turn.
        let window = self.medium.recent(session_key).await;
        for entry in window.iter().rev() {
            messages.push(match entry.role {
                Role::User => PromptMessage::user(entry.content.clone()),
                Role::Assistant => PromptMessage::assistant(entry.content.clone()),
            });
        }
        if window.is_empty() {
            messages.push(PromptMessage::user(inbound.text.clone()));
        }

        let request = CompletionRequest {
            messages,
            temperature: Some(0.7),
            max_tokens: Some(400),
        };
        match self.completion.complete(request).await {
            Ok(text) => Ok(sanitize_reply(&text)),
            Err(ConciergeError::Unavailable(_)) => Ok(
                "Open-ended chat needs a completion backend, and none is configured. \
                 I can still schedule things, check your agenda or send messages for you."
                    .to_string(),
            ),
            Err(e) => {
                // One local fallback, no second service call.
                tracing::warn!("Completion failed for general chat: {}", e);
                Ok(
                    "I'm having trouble reaching my language service right now. I can \
                     still schedule things, check your agenda or send messages for you."
                        .to_string(),
                )
            }
        }
    }
}

fn compose_base_prompt(brief: &CampaignBrief, mode: Option<&str>) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(mode) = mode {
        parts.push(format!("Branded social media creative for '{mode}'."));
    } else {
        parts.push("Social media creative.".to_string());
    }
    if let Some(theme) = &brief.theme {
        parts.push(format!("Theme: {theme}."));
    }
    if let Some(objective) = &brief.objective {
        parts.push(format!("Objective: {objective}."));
    }
    if let Some(audience) = &brief.audience {
        parts.push(format!("Audience: {audience}."));
    }
    if let Some(offer) = &brief.offer {
        parts.push(format!("Featuring the offer: {offer}."));
    }
    if let Some(format_ratio) = &brief.aspect_format {
        parts.push(format!("Aspect ratio {format_ratio}."));
    }
    parts.join(" ")
}

fn compose_logo_prompt(brief: &CampaignBrief, mode: Option<&str>) -> String {
    let subject = mode
        .map(String::from)
        .or_else(|| brief.theme.clone())
        .unwrap_or_else(|| "the brand".to_string());
    format!(
        "Minimalist vector logo for {subject}, flat design, clean background, \
         no text artifacts."
    )
}
