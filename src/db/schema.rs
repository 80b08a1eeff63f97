use crate::db::connection::ConciergeDb;
use crate::ConciergeError;

/// Core conversation tables: sessions, messages, agenda entries, handoff tasks, campaigns.
const SCHEMA_001: &str = include_str!("migrations/001_core_tables.surql");

/// Long-term memory records + BM25 full-text index for hybrid retrieval.
const SCHEMA_002: &str = include_str!("migrations/002_memory_search.surql");

/// Apply the database schema to an initialized database connection.
///
/// Executes all DEFINE statements in order. Every statement is
/// `IF NOT EXISTS`, so re-applying on startup is safe.
pub async fn apply_schema(db: &ConciergeDb) -> Result<(), ConciergeError> {
    for (name, schema) in [("001_core_tables", SCHEMA_001), ("002_memory_search", SCHEMA_002)] {
        db.query(schema)
            .await
            .map_err(|e| ConciergeError::Database(format!("Schema {} failed: {}", name, e)))?;
        tracing::debug!("Applied schema {}", name);
    }
    Ok(())
}
