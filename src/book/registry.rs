//! Event registry: the bounded set of live events and their wager pools.

use crate::book::errors::{BookError, BookResult};
use crate::book::models::{
    BookConfig, Event, EventId, EventReceipt, EventSummary, Side,
};
use crate::ledger::{Ledger, normalize_nick};
use crate::scheduler::{DeadlineNotice, DeadlineScheduler};
use crate::store::{Store, TxnView, WriteTxn};
use chrono::{DateTime, Duration, Utc};
use log::info;
use std::sync::Arc;

/// Owns event creation, wagering, and the kill path. All mutations run as
/// one write transaction: validation happens before any write, so a rejected
/// operation leaves ledger and pools untouched.
#[derive(Clone)]
pub struct EventRegistry {
    store: Arc<Store>,
    ledger: Ledger,
    scheduler: DeadlineScheduler,
    config: BookConfig,
}

impl EventRegistry {
    pub fn new(
        store: Arc<Store>,
        ledger: Ledger,
        scheduler: DeadlineScheduler,
        config: BookConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            scheduler,
            config,
        }
    }

    /// Open a new event and place the creator's opening stake in its `for`
    /// pool. On success the creator is locked out from opening another event
    /// until this one resolves, and both deadline timers are armed.
    ///
    /// # Arguments
    ///
    /// * `creator` - Chat handle of the participant opening the event.
    /// * `channel` - Destination for the deadline announcements.
    /// * `stake` - Opening stake in credits; must be strictly positive.
    /// * `proposition` - The claim being wagered on.
    /// * `duration` - Total event length; betting closes halfway through.
    ///
    /// # Returns
    ///
    /// A receipt with the assigned id and both deadlines.
    pub fn create_event(
        &self,
        creator: &str,
        channel: &str,
        stake: i64,
        proposition: &str,
        duration: Duration,
    ) -> BookResult<EventReceipt> {
        let creator = normalize_nick(creator)?;
        if stake <= 0 {
            return Err(BookError::InvalidAmount(stake.to_string()));
        }
        if duration < self.config.min_duration || duration > self.config.max_duration {
            return Err(BookError::DurationOutOfRange {
                min_secs: self.config.min_duration.num_seconds(),
                max_secs: self.config.max_duration.num_seconds(),
            });
        }

        let now = Utc::now();
        let event = {
            let txn = self.store.begin_write();

            if let Some(until) = txn.next_allowed(&creator)? {
                if until > now {
                    return Err(BookError::CreationCooldown(until));
                }
            }

            let live = txn.live_event_ids()?;
            for &id in &live {
                if let Some(existing) = txn.event(id)? {
                    if existing.proposition == proposition {
                        return Err(BookError::DuplicateProposition(
                            proposition.to_string(),
                        ));
                    }
                }
            }
            if live.len() >= self.config.max_live_events {
                return Err(BookError::TooManyLiveEvents);
            }
            let id = (self.config.first_event_id..=EventId::MAX)
                .find(|id| !live.contains(id))
                .ok_or(BookError::TooManyLiveEvents)?;

            let event = Event {
                id,
                proposition: proposition.to_string(),
                creator: creator.clone(),
                created_at: now,
                closes_at: now + duration / 2,
                resolves_at: now + duration,
            };
            let entry = self.check_stake(&txn, &event, &creator, Side::For, stake, now)?;
            txn.put_event(&event)?;
            self.apply_stake(&txn, &event, &creator, Side::For, stake, entry)?;
            self.ledger
                .set_next_allowed(&txn, &creator, Some(event.resolves_at))?;
            event
        };

        info!(
            "event #{} created by {creator}: {proposition:?}, resolves {}",
            event.id, event.resolves_at
        );
        self.scheduler.schedule(DeadlineNotice {
            event_id: event.id,
            channel: channel.to_string(),
            proposition: event.proposition.clone(),
            closes_at: event.closes_at,
            resolves_at: event.resolves_at,
        });
        Ok(EventReceipt {
            id: event.id,
            created_at: event.created_at,
            closes_at: event.closes_at,
            resolves_at: event.resolves_at,
        })
    }

    /// Stake credits on one side of a live event. Repeated wagers by the
    /// same participant accumulate. Returns the side's new pool total.
    pub fn place_wager(
        &self,
        nick: &str,
        event_id: EventId,
        side: Side,
        amount: i64,
    ) -> BookResult<i64> {
        let nick = normalize_nick(nick)?;
        if amount <= 0 {
            return Err(BookError::InvalidAmount(amount.to_string()));
        }
        let now = Utc::now();
        let txn = self.store.begin_write();
        let event = txn
            .event(event_id)?
            .ok_or(BookError::UnknownEvent(event_id))?;
        let entry = self.check_stake(&txn, &event, &nick, side, amount, now)?;
        self.apply_stake(&txn, &event, &nick, side, amount, entry)?;
        let total = txn.pool_total(event_id, side)?;
        info!("wager: {nick} +{amount} {side} on event #{event_id}, pool now {total}");
        Ok(total)
    }

    /// Validate a stake against the betting window, the participant's
    /// funds, and the pool-entry arithmetic, without writing anything.
    /// Returns the participant's new cumulative entry. Shared by event
    /// creation and ordinary wagers; must run before the first write so a
    /// rejected stake leaves no partial effect.
    fn check_stake(
        &self,
        txn: &TxnView,
        event: &Event,
        nick: &str,
        side: Side,
        amount: i64,
        now: DateTime<Utc>,
    ) -> BookResult<i64> {
        if now >= event.closes_at {
            return Err(BookError::BettingClosed(event.id));
        }
        if !self.ledger.has_funds(txn, nick, amount)? {
            return Err(BookError::InsufficientFunds {
                available: txn.credits(nick)?,
                required: amount,
            });
        }
        txn.pool_entry(event.id, side, nick)?
            .checked_add(amount)
            .ok_or(BookError::BalanceOverflow)
    }

    /// Debit the stake and persist the pre-validated pool entry.
    fn apply_stake(
        &self,
        txn: &WriteTxn,
        event: &Event,
        nick: &str,
        side: Side,
        amount: i64,
        entry: i64,
    ) -> BookResult<()> {
        self.ledger.change_balance(txn, nick, -amount)?;
        txn.set_pool_entry(event.id, side, nick, entry)?;
        Ok(())
    }

    /// Discard a live event without paying anyone. Moderator only. Credits
    /// already staked are forfeit. Returns the deleted record.
    pub fn kill_event(&self, moderator: &str, event_id: EventId) -> BookResult<Event> {
        let moderator = normalize_nick(moderator)?;
        let event = {
            let txn = self.store.begin_write();
            if !txn.is_moderator(&moderator)? {
                return Err(BookError::Unauthorized(moderator));
            }
            let event = txn
                .event(event_id)?
                .ok_or(BookError::UnknownEvent(event_id))?;
            txn.delete_event(event_id)?;
            event
        };
        self.scheduler.cancel(event_id);
        info!("event #{event_id} killed by {moderator}");
        Ok(event)
    }

    /// Snapshot of all live events, computed fresh: remaining times are
    /// relative to now and clamped to zero once a deadline has passed.
    pub fn list_live_events(&self) -> BookResult<Vec<EventSummary>> {
        let now = Utc::now();
        let txn = self.store.begin_read();
        let mut summaries = Vec::new();
        for id in txn.live_event_ids()? {
            let Some(event) = txn.event(id)? else {
                continue;
            };
            summaries.push(EventSummary {
                id,
                status: event.status(now),
                proposition: event.proposition,
                betting_remaining: (event.closes_at - now).max(Duration::zero()),
                event_remaining: (event.resolves_at - now).max(Duration::zero()),
                for_total: txn.pool_total(id, Side::For)?,
                against_total: txn.pool_total(id, Side::Against)?,
            });
        }
        Ok(summaries)
    }
}
