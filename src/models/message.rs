use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use surrealdb::{Datetime, RecordId};

use crate::db::connection::ConciergeDb;
use crate::ConciergeError;

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Per-message bookkeeping: which skill handled it and how long it took.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageMetadata {
    pub skill: Option<String>,
    pub confidence: Option<f32>,
    pub latency_ms: Option<u64>,
}

/// Chat message as stored in database. Append-only, immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: RecordId,
    pub session: RecordId,
    pub role: Role,
    pub content: String,
    pub mode: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
    pub created_at: Datetime,
}

/// Data for appending a new message.
#[derive(Debug, Serialize)]
pub struct ChatMessageCreate {
    pub session: RecordId,
    pub role: Role,
    pub content: String,
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

/// Append a message to a session.
pub async fn append_message(
    db: &ConciergeDb,
    data: ChatMessageCreate,
) -> Result<ChatMessage, ConciergeError> {
    let result: Option<ChatMessage> = db.create("chat_message").content(data).await?;
    result.ok_or_else(|| ConciergeError::Database("Failed to append chat message".into()))
}

/// Most recent messages of a session, oldest first, capped at `limit`.
pub async fn recent_messages(
    db: &ConciergeDb,
    session: &RecordId,
    limit: usize,
) -> Result<Vec<ChatMessage>, ConciergeError> {
    let mut response = db
        .query(format!(
            "SELECT * FROM chat_message WHERE session = $session \
             ORDER BY created_at DESC LIMIT {limit}"
        ))
        .bind(("session", session.clone()))
        .await?;
    let mut messages: Vec<ChatMessage> = response.take(0)?;
    messages.reverse();
    Ok(messages)
}

/// All user-authored message bodies of a session, oldest first.
///
/// Used by the campaign brief aggregator to re-scan prior turns.
pub async fn user_turns(
    db: &ConciergeDb,
    session: &RecordId,
) -> Result<Vec<String>, ConciergeError> {
    #[derive(Deserialize)]
    struct ContentOnly {
        content: String,
    }
    let mut response = db
        .query(
            "SELECT content FROM chat_message WHERE session = $session AND role = 'user' \
             ORDER BY created_at ASC",
        )
        .bind(("session", session.clone()))
        .await?;
    let rows: Vec<ContentOnly> = response.take(0)?;
    Ok(rows.into_iter().map(|r| r.content).collect())
}
