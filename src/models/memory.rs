use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use surrealdb::{Datetime, RecordId};

use crate::db::connection::ConciergeDb;
use crate::models::Role;
use crate::ConciergeError;

/// Long-term memory record as stored in database. Append-only.
///
/// The embedding, when present, is always normalized to the fixed
/// dimension (`memory::EMBEDDING_DIM`) before writing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: RecordId,
    pub owner: String,
    pub session: Option<RecordId>,
    pub role: Role,
    pub content: String,
    pub mode: Option<String>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    pub created_at: Datetime,
}

/// Data for indexing a new memory record.
#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct MemoryRecordCreate {
    pub owner: String,
    pub session: Option<RecordId>,
    pub role: Role,
    pub content: String,
    pub mode: Option<String>,
    pub embedding: Option<Vec<f32>>,
    pub metadata: Option<serde_json::Value>,
}

/// Append a memory record.
pub async fn create_memory_record(
    db: &ConciergeDb,
    data: MemoryRecordCreate,
) -> Result<MemoryRecord, ConciergeError> {
    let result: Option<MemoryRecord> = db.create("memory_record").content(data).await?;
    result.ok_or_else(|| ConciergeError::Database("Failed to create memory record".into()))
}
