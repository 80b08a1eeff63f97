//! Medium-term memory: a capped, time-boxed, most-recent-first list of
//! turns per session.
//!
//! Entries live in a moka cache as whole immutable `Arc<Vec<_>>` blobs,
//! so a concurrent read-modify-write at worst reorders entries, never
//! corrupts them. Appends are best-effort: the cache cannot fail, and
//! nothing here blocks the caller beyond the in-memory operation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;

use crate::models::Role;

/// Default window length per session.
const DEFAULT_CAP: usize = 20;

/// Default entry lifetime.
const DEFAULT_TTL_SECS: u64 = 60 * 60 * 6;

/// One remembered turn.
#[derive(Debug, Clone, PartialEq)]
pub struct MediumEntry {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

/// Per-session rolling window of recent turns.
pub struct MediumMemory {
    cache: Cache<String, Arc<Vec<MediumEntry>>>,
    cap: usize,
}

impl MediumMemory {
    pub fn new(cap: usize, ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(10_000)
                .build(),
            cap,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CAP, Duration::from_secs(DEFAULT_TTL_SECS))
    }

    /// Push a turn to the front of the session's window, dropping the
    /// oldest entry beyond the cap.
    pub async fn push(&self, session_id: &str, entry: MediumEntry) {
        let current = self.cache.get(session_id).await;
        let mut updated: Vec<MediumEntry> = Vec::with_capacity(self.cap);
        updated.push(entry);
        if let Some(existing) = current {
            updated.extend(existing.iter().take(self.cap - 1).cloned());
        }
        self.cache
            .insert(session_id.to_string(), Arc::new(updated))
            .await;
    }

    /// The session's window, most recent first.
    pub async fn recent(&self, session_id: &str) -> Vec<MediumEntry> {
        self.cache
            .get(session_id)
            .await
            .map(|entries| entries.as_ref().clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(content: &str) -> MediumEntry {
        MediumEntry {
            role: Role::User,
            content: content.to_string(),
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_most_recent_first() {
        let memory = MediumMemory::with_defaults();
        memory.push("s1", entry("first")).await;
        memory.push("s1", entry("second")).await;
        let recent = memory.recent("s1").await;
        assert_eq!(recent[0].content, "second");
        assert_eq!(recent[1].content, "first");
    }

    #[tokio::test]
    async fn test_cap_enforced() {
        let memory = MediumMemory::new(3, Duration::from_secs(60));
        for i in 0..5 {
            memory.push("s1", entry(&format!("turn-{i}"))).await;
        }
        let recent = memory.recent("s1").await;
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].content, "turn-4");
        assert_eq!(recent[2].content, "turn-2");
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let memory = MediumMemory::with_defaults();
        memory.push("s1", entry("one")).await;
        memory.push("s2", entry("two")).await;
        assert_eq!(memory.recent("s1").await.len(), 1);
        assert_eq!(memory.recent("s2").await[0].content, "two");
    }

    #[tokio::test]
    async fn test_unknown_session_is_empty() {
        let memory = MediumMemory::with_defaults();
        assert!(memory.recent("nope").await.is_empty());
    }
}
