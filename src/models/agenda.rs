use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::{Datetime, RecordId};

use crate::db::connection::ConciergeDb;
use crate::ConciergeError;

/// Agenda entry lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgendaStatus {
    Open,
    Done,
}

/// Calendar entry as stored in database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgendaEntry {
    pub id: RecordId,
    pub owner: String,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: Datetime,
    pub status: AgendaStatus,
    pub created_at: Datetime,
}

/// Data for creating a new agenda entry.
#[derive(Debug, Serialize)]
pub struct AgendaEntryCreate {
    pub owner: String,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: Datetime,
    pub status: AgendaStatus,
}

/// Create a new agenda entry.
pub async fn create_agenda_entry(
    db: &ConciergeDb,
    data: AgendaEntryCreate,
) -> Result<AgendaEntry, ConciergeError> {
    let result: Option<AgendaEntry> = db.create("agenda_entry").content(data).await?;
    result.ok_or_else(|| ConciergeError::Database("Failed to create agenda entry".into()))
}

/// All open entries for an owner, soonest first.
pub async fn open_entries_for_owner(
    db: &ConciergeDb,
    owner: &str,
) -> Result<Vec<AgendaEntry>, ConciergeError> {
    let mut response = db
        .query(
            "SELECT * FROM agenda_entry WHERE owner = $owner AND status = 'open' \
             ORDER BY starts_at ASC",
        )
        .bind(("owner", owner.to_string()))
        .await?;
    let entries: Vec<AgendaEntry> = response.take(0)?;
    Ok(entries)
}

/// Entries for an owner within a time range, soonest first.
pub async fn entries_in_range(
    db: &ConciergeDb,
    owner: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<AgendaEntry>, ConciergeError> {
    let mut response = db
        .query(
            "SELECT * FROM agenda_entry WHERE owner = $owner \
             AND starts_at >= $from AND starts_at < $to \
             ORDER BY starts_at ASC",
        )
        .bind(("owner", owner.to_string()))
        .bind(("from", Datetime::from(from)))
        .bind(("to", Datetime::from(to)))
        .await?;
    let entries: Vec<AgendaEntry> = response.take(0)?;
    Ok(entries)
}

/// Mark an entry as done. Returns the updated entry if it existed.
pub async fn mark_entry_done(
    db: &ConciergeDb,
    id: &RecordId,
) -> Result<Option<AgendaEntry>, ConciergeError> {
    let mut response = db
        .query("UPDATE $entry SET status = 'done' RETURN AFTER")
        .bind(("entry", id.clone()))
        .await?;
    let entries: Vec<AgendaEntry> = response.take(0)?;
    Ok(entries.into_iter().next())
}
