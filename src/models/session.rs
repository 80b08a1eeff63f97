use serde::{Deserialize, Serialize};
use surrealdb::{Datetime, RecordId};

use crate::db::connection::ConciergeDb;
use crate::ConciergeError;

/// Chat session as stored in database.
///
/// Created lazily on the first message of a conversation, or resumed from
/// the owner's latest session when it falls inside the idle window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: RecordId,
    pub owner: String,
    /// Brand/context tag. Only overwritten by an explicit recognized token,
    /// never cleared by inference.
    pub mode: Option<String>,
    pub created_at: Datetime,
    pub updated_at: Datetime,
    pub last_message_at: Datetime,
}

/// Data for creating a new chat session.
#[derive(Debug, Default, Serialize)]
pub struct ChatSessionCreate {
    pub owner: String,
    pub mode: Option<String>,
}

/// Create a new chat session.
pub async fn create_session(
    db: &ConciergeDb,
    data: ChatSessionCreate,
) -> Result<ChatSession, ConciergeError> {
    let result: Option<ChatSession> = db.create("chat_session").content(data).await?;
    result.ok_or_else(|| ConciergeError::Database("Failed to create chat session".into()))
}

/// Get a session by ID (the key part, not the full RecordId).
pub async fn get_session(
    db: &ConciergeDb,
    id: &str,
) -> Result<Option<ChatSession>, ConciergeError> {
    let result: Option<ChatSession> = db.select(("chat_session", id)).await?;
    Ok(result)
}

/// The owner's most recently active session, if any.
pub async fn latest_session_for_owner(
    db: &ConciergeDb,
    owner: &str,
) -> Result<Option<ChatSession>, ConciergeError> {
    let mut response = db
        .query(
            "SELECT * FROM chat_session WHERE owner = $owner \
             ORDER BY last_message_at DESC LIMIT 1",
        )
        .bind(("owner", owner.to_string()))
        .await?;
    let sessions: Vec<ChatSession> = response.take(0)?;
    Ok(sessions.into_iter().next())
}

/// Touch a session on a new turn: bump timestamps and, when an explicit
/// mode was recognized, overwrite the stored mode. A `None` mode leaves the
/// stored value untouched — inference never clears an explicit mode.
pub async fn touch_session(
    db: &ConciergeDb,
    id: &RecordId,
    explicit_mode: Option<&str>,
) -> Result<(), ConciergeError> {
    match explicit_mode {
        Some(mode) => {
            db.query(
                "UPDATE $session SET last_message_at = time::now(), \
                 updated_at = time::now(), mode = $mode",
            )
            .bind(("session", id.clone()))
            .bind(("mode", mode.to_string()))
            .await?;
        }
        None => {
            db.query("UPDATE $session SET last_message_at = time::now(), updated_at = time::now()")
                .bind(("session", id.clone()))
                .await?;
        }
    }
    Ok(())
}
