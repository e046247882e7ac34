//! The top-level wager book facade.
//!
//! [`WagerBook`] wires the store, ledger, registry, resolver, scheduler and
//! outbox together, and turns one line of chat input into one reply string.
//! Hosts own message transport and moderator tracking; the book owns
//! everything between parsing a command and persisting its effect.

use crate::book::models::human_duration;
use crate::book::{BookConfig, BookError, BookResult, EventRegistry, Resolver};
use crate::commands::{self, Command};
use crate::constants::{CURRENCY_UNITS, OUTBOX_CAPACITY};
use crate::ledger::{Ledger, normalize_nick};
use crate::notify::{Notify, Outbox};
use crate::scheduler::DeadlineScheduler;
use crate::store::Store;
use log::error;
use std::path::Path;
use std::sync::Arc;

/// A complete wagering engine over one durable store.
///
/// Construction spawns the outbox sender task and so must happen within a
/// tokio runtime. Clones share the same store and timer table.
#[derive(Clone)]
pub struct WagerBook {
    store: Arc<Store>,
    ledger: Ledger,
    registry: EventRegistry,
    resolver: Resolver,
    outbox: Outbox,
}

impl WagerBook {
    /// Open (or create) a book persisted at `path`.
    pub fn open(path: impl AsRef<Path>, sink: Arc<dyn Notify>) -> BookResult<Self> {
        Ok(Self::with_store(
            Arc::new(Store::open(path)?),
            sink,
            BookConfig::default(),
        ))
    }

    /// An in-memory book that is discarded on drop.
    pub fn temporary(sink: Arc<dyn Notify>) -> BookResult<Self> {
        Ok(Self::with_store(
            Arc::new(Store::temporary()?),
            sink,
            BookConfig::default(),
        ))
    }

    /// Assemble a book over an existing store with explicit policy knobs.
    pub fn with_store(store: Arc<Store>, sink: Arc<dyn Notify>, config: BookConfig) -> Self {
        let outbox = Outbox::start(sink, OUTBOX_CAPACITY);
        let ledger = Ledger::new(store.clone());
        let scheduler = DeadlineScheduler::new(outbox.clone());
        let registry = EventRegistry::new(
            store.clone(),
            ledger.clone(),
            scheduler.clone(),
            config,
        );
        let resolver = Resolver::new(store.clone(), ledger.clone(), scheduler);
        Self {
            store,
            ledger,
            registry,
            resolver,
            outbox,
        }
    }

    /// The credit ledger, for balance queries and payroll minting.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// The event registry, for programmatic event management.
    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    /// The resolution engine.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// The outbound message queue, for hosts that announce on their own.
    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Flush buffered writes to disk. Call on shutdown.
    pub fn flush(&self) -> BookResult<()> {
        Ok(self.store.flush()?)
    }

    /// Handle one line of chat input from `nick` in `channel` and return the
    /// reply to send back. Errors are rendered as chat text; fatal storage
    /// errors are additionally logged for the operator.
    pub fn execute(&self, nick: &str, channel: &str, line: &str) -> String {
        match self.dispatch(nick, channel, line) {
            Ok(reply) => reply,
            Err(e) => {
                if e.is_fatal() {
                    error!("fatal storage error handling {line:?} from {nick}: {e}");
                }
                e.client_message()
            }
        }
    }

    fn dispatch(&self, nick: &str, channel: &str, line: &str) -> BookResult<String> {
        match Command::parse(line)? {
            Command::Create {
                stake,
                proposition,
                duration,
            } => {
                let receipt =
                    self.registry
                        .create_event(nick, channel, stake, &proposition, duration)?;
                Ok(format!(
                    "event #{} is on: \"{}\" - betting closes in {}, verdict due in {}",
                    receipt.id,
                    proposition,
                    human_duration(receipt.closes_at - receipt.created_at),
                    human_duration(receipt.resolves_at - receipt.created_at),
                ))
            }
            Command::Wager {
                event,
                side,
                amount,
            } => {
                let total = self.registry.place_wager(nick, event, side, amount)?;
                let balance = self.ledger.balance(nick)?;
                Ok(format!(
                    "{amount}{u} on {side}: event #{event} {side} pool now {total}{u}, \
                     you have {balance}{u} left",
                    u = CURRENCY_UNITS,
                ))
            }
            Command::Resolve { event, happened } => {
                Ok(self.resolver.resolve(nick, event, happened)?.to_string())
            }
            Command::Kill { events } => {
                let mut parts = Vec::with_capacity(events.len());
                for id in events {
                    match self.registry.kill_event(nick, id) {
                        Ok(event) => {
                            parts.push(format!("event #{id} \"{}\" killed", event.proposition));
                        }
                        Err(e) if e.is_fatal() => return Err(e),
                        Err(e) => parts.push(e.client_message()),
                    }
                }
                Ok(parts.join(" | "))
            }
            Command::ResetTimer { nicks } => {
                let caller = normalize_nick(nick)?;
                if !self.ledger.is_moderator(&caller)? {
                    return Err(BookError::Unauthorized(caller));
                }
                let mut cleared = Vec::with_capacity(nicks.len());
                for target in nicks {
                    self.ledger.clear_cooldown(&target)?;
                    cleared.push(target);
                }
                Ok(format!("cooldown cleared for {}", cleared.join(", ")))
            }
            Command::List => {
                let summaries = self.registry.list_live_events()?;
                if summaries.is_empty() {
                    Ok("no events are open".to_string())
                } else {
                    Ok(summaries
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(" | "))
                }
            }
            Command::Balance { nick: target } => {
                let target = target.as_deref().unwrap_or(nick);
                let account = self.ledger.account(target)?;
                Ok(format!(
                    "{} has {}{}",
                    account.nick, account.balance, CURRENCY_UNITS
                ))
            }
            Command::Help => Ok(commands::help_text()),
        }
    }
}
