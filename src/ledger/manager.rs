//! Ledger manager: the sole authority over credit totals.

use super::models::{Account, normalize_nick};
use crate::book::errors::{BookError, BookResult};
use crate::store::{Store, TxnView, WriteTxn};
use chrono::{DateTime, Utc};
use log::debug;
use std::sync::Arc;

/// Per-participant credit balances and directory metadata (creation
/// cooldown, moderator privilege). Accounts come into being lazily on first
/// reference and are never deleted.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<Store>,
}

impl Ledger {
    /// Create a ledger over the shared store.
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Current balance; 0 for an unknown participant, never an error.
    pub fn balance(&self, nick: &str) -> BookResult<i64> {
        let nick = normalize_nick(nick)?;
        let txn = self.store.begin_read();
        Ok(txn.credits(&nick)?)
    }

    /// Whether the participant can cover `amount`.
    pub fn has_funds(&self, txn: &TxnView, nick: &str, amount: i64) -> BookResult<bool> {
        let nick = normalize_nick(nick)?;
        Ok(txn.credits(&nick)? >= amount)
    }

    /// Apply `delta` (may be negative) to the balance inside the caller's
    /// write transaction and return the new balance.
    ///
    /// This does not re-validate sufficiency: when the change is a debit,
    /// the caller is contractually required to check funds first, within the
    /// same transaction, so the check and the commit form one atomic unit.
    pub fn change_balance(&self, txn: &WriteTxn, nick: &str, delta: i64) -> BookResult<i64> {
        let nick = normalize_nick(nick)?;
        let current = txn.credits(&nick)?;
        let updated = current.checked_add(delta).ok_or(BookError::BalanceOverflow)?;
        txn.set_credits(&nick, updated)?;
        debug!("ledger: {nick} {current} -> {updated} ({delta:+})");
        Ok(updated)
    }

    /// Apply `delta` in a transaction of its own and return the new balance.
    /// This is the entry point external credit sources (e.g. a payroll
    /// process) use to mint credits.
    pub fn adjust(&self, nick: &str, delta: i64) -> BookResult<i64> {
        let txn = self.store.begin_write();
        self.change_balance(&txn, nick, delta)
    }

    /// Earliest time the participant may open a new event.
    pub fn next_allowed_at(&self, nick: &str) -> BookResult<Option<DateTime<Utc>>> {
        let nick = normalize_nick(nick)?;
        let txn = self.store.begin_read();
        Ok(txn.next_allowed(&nick)?)
    }

    /// Set or clear the creation cooldown inside the caller's transaction.
    pub fn set_next_allowed(
        &self,
        txn: &WriteTxn,
        nick: &str,
        until: Option<DateTime<Utc>>,
    ) -> BookResult<()> {
        let nick = normalize_nick(nick)?;
        txn.set_next_allowed(&nick, until)?;
        Ok(())
    }

    /// Clear the creation cooldown (the `resettimer` admin operation).
    pub fn clear_cooldown(&self, nick: &str) -> BookResult<()> {
        let nick = normalize_nick(nick)?;
        let txn = self.store.begin_write();
        txn.set_next_allowed(&nick, None)?;
        debug!("ledger: cleared cooldown for {nick}");
        Ok(())
    }

    /// Whether the participant holds the moderator privilege.
    pub fn is_moderator(&self, nick: &str) -> BookResult<bool> {
        let nick = normalize_nick(nick)?;
        let txn = self.store.begin_read();
        Ok(txn.is_moderator(&nick)?)
    }

    /// Grant or revoke the moderator privilege. Hosts call this from their
    /// channel-mode tracking.
    pub fn set_moderator(&self, nick: &str, moderator: bool) -> BookResult<()> {
        let nick = normalize_nick(nick)?;
        let txn = self.store.begin_write();
        txn.set_moderator(&nick, moderator)?;
        Ok(())
    }

    /// Full account snapshot for display.
    pub fn account(&self, nick: &str) -> BookResult<Account> {
        let nick = normalize_nick(nick)?;
        let txn = self.store.begin_read();
        Ok(Account {
            balance: txn.credits(&nick)?,
            next_allowed_at: txn.next_allowed(&nick)?,
            moderator: txn.is_moderator(&nick)?,
            nick,
        })
    }
}
