//! External calendar mirroring.
//!
//! Agenda entries are mirrored to an external calendar as a secondary
//! effect. The local store is authoritative; a mirror failure is logged
//! and never surfaced to the user.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::ConciergeError;

#[derive(Debug, Clone)]
pub struct CalendarEvent {
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
}

#[async_trait]
pub trait CalendarSync: Send + Sync {
    async fn mirror(&self, owner: &str, event: CalendarEvent) -> Result<(), ConciergeError>;

    fn is_available(&self) -> bool;
}

/// Default sync used when no calendar backend is wired up.
pub struct NoopCalendarSync;

#[async_trait]
impl CalendarSync for NoopCalendarSync {
    async fn mirror(&self, owner: &str, event: CalendarEvent) -> Result<(), ConciergeError> {
        tracing::debug!("No calendar backend; skipping mirror of '{}' for {}", event.title, owner);
        Ok(())
    }

    fn is_available(&self) -> bool {
        false
    }
}
