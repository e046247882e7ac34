//! Deadline timers for live events.
//!
//! Each live event carries two deadlines: when betting closes and when a
//! verdict is due. The scheduler arms one tokio timer per deadline and
//! announces each one through the [`Outbox`](crate::notify::Outbox) when it
//! fires. Killing or resolving an event cancels its timers; cancellation is
//! idempotent and cancelling an unknown id is a no-op.
//!
//! The timer table has its own mutex, separate from the store lock, so a
//! firing timer never contends with a data mutation.

use crate::book::models::EventId;
use crate::constants::CURRENCY_UNITS;
use crate::notify::Outbox;
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;

/// What the scheduler needs to know about an event to announce its
/// deadlines.
#[derive(Debug, Clone)]
pub struct DeadlineNotice {
    pub event_id: EventId,
    /// Chat destination the announcements go to.
    pub channel: String,
    pub proposition: String,
    pub closes_at: DateTime<Utc>,
    pub resolves_at: DateTime<Utc>,
}

struct EventTimers {
    close: JoinHandle<()>,
    resolve: JoinHandle<()>,
}

/// Arms and cancels per-event deadline timers.
#[derive(Clone)]
pub struct DeadlineScheduler {
    timers: Arc<Mutex<HashMap<EventId, EventTimers>>>,
    outbox: Outbox,
}

impl DeadlineScheduler {
    pub fn new(outbox: Outbox) -> Self {
        Self {
            timers: Arc::new(Mutex::new(HashMap::new())),
            outbox,
        }
    }

    /// Arm both timers for a freshly created event. Must be called from
    /// within a tokio runtime. If the id already has timers (it should not),
    /// the old ones are cancelled first.
    pub fn schedule(&self, notice: DeadlineNotice) {
        let id = notice.event_id;
        let close = tokio::spawn(close_announcement(self.outbox.clone(), notice.clone()));
        let resolve = tokio::spawn(resolve_announcement(
            self.outbox.clone(),
            notice,
            self.timers.clone(),
        ));
        let replaced = self
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, EventTimers { close, resolve });
        if let Some(old) = replaced {
            old.close.abort();
            old.resolve.abort();
        }
        debug!("scheduler: armed timers for event #{id}");
    }

    /// Cancel any pending timers for the event. Safe to call for ids that
    /// were never scheduled or whose timers already fired.
    pub fn cancel(&self, id: EventId) {
        let removed = self
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        if let Some(timers) = removed {
            timers.close.abort();
            timers.resolve.abort();
            debug!("scheduler: cancelled timers for event #{id}");
        }
    }

    /// Number of events with timers still armed.
    pub fn pending(&self) -> usize {
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

async fn sleep_until(at: DateTime<Utc>) {
    let wait = (at - Utc::now()).to_std().unwrap_or_default();
    tokio::time::sleep(wait).await;
}

async fn close_announcement(outbox: Outbox, notice: DeadlineNotice) {
    sleep_until(notice.closes_at).await;
    outbox.send(
        &notice.channel,
        &format!(
            "betting has closed on event #{}: \"{}\". Payouts are in {u} at resolution time.",
            notice.event_id,
            notice.proposition,
            u = CURRENCY_UNITS,
        ),
    );
}

async fn resolve_announcement(
    outbox: Outbox,
    notice: DeadlineNotice,
    timers: Arc<Mutex<HashMap<EventId, EventTimers>>>,
) {
    sleep_until(notice.resolves_at).await;
    outbox.send(
        &notice.channel,
        &format!(
            "event #{} \"{}\" is due: a moderator should settle it with {} yes or {} no",
            notice.event_id, notice.proposition, notice.event_id, notice.event_id,
        ),
    );
    // The event is now fully announced; drop the bookkeeping entry so the
    // close timer's finished handle is not kept forever.
    timers
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&notice.event_id);
}
