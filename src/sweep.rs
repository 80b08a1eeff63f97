//! Background delivery of due handoff tasks.
//!
//! Runs on a fixed interval. For every due task the sweep first claims it
//! with the conditional update out of `pending`; only the claim winner
//! attempts delivery, so concurrent sweeps never double-send. Transient
//! dispatch failures retry inside the claim up to a small cap; the task
//! then finalizes to `sent` or `failed` and never returns to `pending`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::db::connection::ConciergeDb;
use crate::models::handoff::{
    claim_pending, due_pending_tasks, mark_failed, mark_sent, HandoffTask,
};
use crate::services::{MessagingService, OutboundMessage};
use crate::ConciergeError;

/// Dispatch attempts per claim, including the first.
const DELIVERY_TRIES: usize = 3;

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

pub struct HandoffSweep {
    db: Arc<ConciergeDb>,
    messaging: Arc<dyn MessagingService>,
    interval: Duration,
}

impl HandoffSweep {
    pub fn new(
        db: Arc<ConciergeDb>,
        messaging: Arc<dyn MessagingService>,
        interval_secs: u64,
    ) -> Self {
        Self {
            db,
            messaging,
            interval: Duration::from_secs(interval_secs),
        }
    }

    /// Run the sweep loop until the task is aborted.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match self.run_once().await {
                Ok(0) => {}
                Ok(delivered) => tracing::info!("Delivered {} handoff message(s)", delivered),
                Err(e) => tracing::warn!("Handoff sweep pass failed: {}", e),
            }
        }
    }

    /// One sweep pass. Returns how many tasks were delivered.
    pub async fn run_once(&self) -> Result<usize, ConciergeError> {
        if !self.messaging.is_available() {
            tracing::debug!("No messaging backend; leaving due handoffs pending");
            return Ok(0);
        }

        let due = due_pending_tasks(&self.db, Utc::now()).await?;
        let mut delivered = 0;
        for task in due {
            // Lost the claim race: someone else owns this delivery.
            let Some(claimed) = claim_pending(&self.db, &task.id).await? else {
                continue;
            };
            match self.deliver(&claimed).await {
                Ok(()) => {
                    mark_sent(&self.db, &claimed.id).await?;
                    delivered += 1;
                    tracing::info!("Handoff {} delivered to {}", claimed.id, claimed.contact);
                }
                Err(e) => {
                    tracing::warn!("Handoff {} failed: {}", claimed.id, e);
                    mark_failed(&self.db, &claimed.id, &e.to_string()).await?;
                }
            }
        }
        Ok(delivered)
    }

    async fn deliver(&self, task: &HandoffTask) -> Result<(), ConciergeError> {
        let mut last_err = None;
        for attempt in 1..=DELIVERY_TRIES {
            match self
                .messaging
                .dispatch(OutboundMessage {
                    destination: task.contact.clone(),
                    body: task.body.clone(),
                })
                .await
            {
                Ok(()) => return Ok(()),
                // Missing config is not transient; retrying cannot help.
                Err(e @ ConciergeError::Unavailable(_)) => return Err(e),
                Err(e) => {
                    last_err = Some(e);
                    if attempt < DELIVERY_TRIES {
                        tokio::time::sleep(RETRY_BACKOFF).await;
                    }
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| ConciergeError::Messaging("delivery failed".to_string())))
    }
}
