use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::{Datetime, RecordId};

use crate::db::connection::ConciergeDb;
use crate::ConciergeError;

/// Handoff delivery lifecycle. Transitions are monotonic:
/// `pending → sending → sent | failed`. `sending` is the in-flight claim
/// state that makes the sweep's delivery attempt single-shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandoffStatus {
    Pending,
    Sending,
    Sent,
    Failed,
}

/// Deferred outbound message as stored in database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffTask {
    pub id: RecordId,
    pub owner: String,
    pub contact: String,
    pub body: String,
    pub scheduled_at: Datetime,
    pub status: HandoffStatus,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub created_at: Datetime,
}

/// Data for scheduling a new handoff.
#[derive(Debug, Serialize)]
pub struct HandoffTaskCreate {
    pub owner: String,
    pub contact: String,
    pub body: String,
    pub scheduled_at: Datetime,
    pub status: HandoffStatus,
}

/// Schedule a new handoff task.
pub async fn create_handoff_task(
    db: &ConciergeDb,
    data: HandoffTaskCreate,
) -> Result<HandoffTask, ConciergeError> {
    let result: Option<HandoffTask> = db.create("handoff_task").content(data).await?;
    result.ok_or_else(|| ConciergeError::Database("Failed to create handoff task".into()))
}

/// Tasks for an owner, newest first.
pub async fn tasks_for_owner(
    db: &ConciergeDb,
    owner: &str,
    limit: usize,
) -> Result<Vec<HandoffTask>, ConciergeError> {
    let mut response = db
        .query(format!(
            "SELECT * FROM handoff_task WHERE owner = $owner \
             ORDER BY created_at DESC LIMIT {limit}"
        ))
        .bind(("owner", owner.to_string()))
        .await?;
    let tasks: Vec<HandoffTask> = response.take(0)?;
    Ok(tasks)
}

/// Pending tasks whose scheduled time has passed.
pub async fn due_pending_tasks(
    db: &ConciergeDb,
    now: DateTime<Utc>,
) -> Result<Vec<HandoffTask>, ConciergeError> {
    let mut response = db
        .query(
            "SELECT * FROM handoff_task WHERE status = 'pending' AND scheduled_at <= $now \
             ORDER BY scheduled_at ASC",
        )
        .bind(("now", Datetime::from(now)))
        .await?;
    let tasks: Vec<HandoffTask> = response.take(0)?;
    Ok(tasks)
}

/// Atomically claim a pending task for delivery.
///
/// The `status = 'pending'` guard is the sole coordination point against
/// double-sends: whoever gets the row back owns the delivery attempt.
pub async fn claim_pending(
    db: &ConciergeDb,
    id: &RecordId,
) -> Result<Option<HandoffTask>, ConciergeError> {
    let mut response = db
        .query(
            "UPDATE $task SET status = 'sending', attempts += 1 \
             WHERE status = 'pending' RETURN AFTER",
        )
        .bind(("task", id.clone()))
        .await?;
    let tasks: Vec<HandoffTask> = response.take(0)?;
    Ok(tasks.into_iter().next())
}

/// Finalize a claimed task as delivered.
pub async fn mark_sent(db: &ConciergeDb, id: &RecordId) -> Result<(), ConciergeError> {
    db.query("UPDATE $task SET status = 'sent' WHERE status = 'sending'")
        .bind(("task", id.clone()))
        .await?;
    Ok(())
}

/// Finalize a claimed task as failed, recording the last delivery error.
pub async fn mark_failed(
    db: &ConciergeDb,
    id: &RecordId,
    error: &str,
) -> Result<(), ConciergeError> {
    db.query("UPDATE $task SET status = 'failed', last_error = $error WHERE status = 'sending'")
        .bind(("task", id.clone()))
        .bind(("error", error.to_string()))
        .await?;
    Ok(())
}
