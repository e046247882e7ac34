//! Durable key-value store backing the ledger and the wager book.
//!
//! The layout is a two-tree hierarchy:
//!
//! ```text
//! accounts: <nick>/credits            varint i64
//!           <nick>/nextbet            RFC 3339 timestamp
//!           <nick>/moderator          0x00 / 0x01
//! events:   <id>/proposition          UTF-8 text
//!           <id>/creator              UTF-8 nick
//!           <id>/created              RFC 3339 timestamp
//!           <id>/closes               RFC 3339 timestamp
//!           <id>/resolves             RFC 3339 timestamp
//!           <id>/for/<nick>           varint i64
//!           <id>/against/<nick>       varint i64
//! ```
//!
//! `<id>` is a single raw byte, so one prefix scan enumerates everything an
//! event owns. Nicks are normalized before they reach the store and can
//! never contain `/`.
//!
//! Every logical operation runs inside exactly one transaction guard:
//! [`Store::begin_write`] gives at-most-one-writer-at-a-time semantics, and
//! [`Store::begin_read`] gives a snapshot consistent with respect to writers.
//! Validation happens before any write, so a failed operation leaves no
//! partial effect.

pub mod codec;
pub mod errors;

pub use errors::{StoreError, StoreResult};

use crate::book::models::{Event, EventId, Side};
use chrono::{DateTime, Utc};
use sled::Tree;
use std::ops::Deref;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

const F_CREDITS: &[u8] = b"credits";
const F_NEXTBET: &[u8] = b"nextbet";
const F_MODERATOR: &[u8] = b"moderator";
const F_PROPOSITION: &[u8] = b"proposition";
const F_CREATOR: &[u8] = b"creator";
const F_CREATED: &[u8] = b"created";
const F_CLOSES: &[u8] = b"closes";
const F_RESOLVES: &[u8] = b"resolves";

/// The durable store: one sled database with `accounts` and `events` trees.
pub struct Store {
    db: sled::Db,
    accounts: Tree,
    events: Tree,
    lock: RwLock<()>,
}

impl Store {
    /// Open (or create) the store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::from_db(sled::open(path)?)
    }

    /// Open an in-memory store that is discarded on drop. Used by tests and
    /// demos in place of an on-disk database.
    pub fn temporary() -> StoreResult<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: sled::Db) -> StoreResult<Self> {
        let accounts = db.open_tree("accounts")?;
        let events = db.open_tree("events")?;
        Ok(Self {
            db,
            accounts,
            events,
            lock: RwLock::new(()),
        })
    }

    /// Begin a write transaction. Exactly one writer runs at a time; readers
    /// wait until it is released.
    pub fn begin_write(&self) -> WriteTxn<'_> {
        let guard = self
            .lock
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        WriteTxn {
            _guard: guard,
            view: TxnView {
                accounts: &self.accounts,
                events: &self.events,
            },
        }
    }

    /// Begin a read transaction. Readers run concurrently with each other and
    /// are serialized only with respect to writers.
    pub fn begin_read(&self) -> ReadTxn<'_> {
        let guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        ReadTxn {
            _guard: guard,
            view: TxnView {
                accounts: &self.accounts,
                events: &self.events,
            },
        }
    }

    /// Flush buffered writes to disk. Hosts call this on shutdown.
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

/// Read-only access to the trees, shared by both transaction guards.
pub struct TxnView<'a> {
    accounts: &'a Tree,
    events: &'a Tree,
}

/// A snapshot-consistent read transaction.
pub struct ReadTxn<'a> {
    _guard: RwLockReadGuard<'a, ()>,
    view: TxnView<'a>,
}

impl<'a> Deref for ReadTxn<'a> {
    type Target = TxnView<'a>;

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}

/// An exclusive write transaction.
pub struct WriteTxn<'a> {
    _guard: RwLockWriteGuard<'a, ()>,
    view: TxnView<'a>,
}

impl<'a> Deref for WriteTxn<'a> {
    type Target = TxnView<'a>;

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}

fn account_key(nick: &str, field: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(nick.len() + 1 + field.len());
    key.extend_from_slice(nick.as_bytes());
    key.push(b'/');
    key.extend_from_slice(field);
    key
}

fn event_key(id: EventId, field: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + field.len());
    key.push(id);
    key.push(b'/');
    key.extend_from_slice(field);
    key
}

fn pool_key(id: EventId, side: Side, nick: &str) -> Vec<u8> {
    let mut key = pool_prefix(id, side);
    key.extend_from_slice(nick.as_bytes());
    key
}

fn pool_prefix(id: EventId, side: Side) -> Vec<u8> {
    let label = side.label().as_bytes();
    let mut key = Vec::with_capacity(3 + label.len());
    key.push(id);
    key.push(b'/');
    key.extend_from_slice(label);
    key.push(b'/');
    key
}

impl TxnView<'_> {
    /// Credit balance for a nick; 0 for an unknown participant.
    pub fn credits(&self, nick: &str) -> StoreResult<i64> {
        let key = account_key(nick, F_CREDITS);
        match self.accounts.get(&key)? {
            Some(bytes) => codec::decode_i64(&key, &bytes),
            None => Ok(0),
        }
    }

    /// Earliest time the nick may open a new event, if restricted.
    pub fn next_allowed(&self, nick: &str) -> StoreResult<Option<DateTime<Utc>>> {
        let key = account_key(nick, F_NEXTBET);
        match self.accounts.get(&key)? {
            Some(bytes) => Ok(Some(codec::decode_time(&key, &bytes)?)),
            None => Ok(None),
        }
    }

    /// Whether the nick holds the moderator privilege.
    pub fn is_moderator(&self, nick: &str) -> StoreResult<bool> {
        let key = account_key(nick, F_MODERATOR);
        match self.accounts.get(&key)? {
            Some(bytes) => codec::decode_bool(&key, &bytes),
            None => Ok(false),
        }
    }

    /// Load a live event record, or `None` if the id is not in use.
    pub fn event(&self, id: EventId) -> StoreResult<Option<Event>> {
        let prop_key = event_key(id, F_PROPOSITION);
        let Some(prop) = self.events.get(&prop_key)? else {
            return Ok(None);
        };
        let proposition = String::from_utf8(prop.to_vec())
            .map_err(|e| StoreError::corrupt(&prop_key, e.to_string()))?;
        Ok(Some(Event {
            id,
            proposition,
            creator: self.required_text(id, F_CREATOR)?,
            created_at: self.required_time(id, F_CREATED)?,
            closes_at: self.required_time(id, F_CLOSES)?,
            resolves_at: self.required_time(id, F_RESOLVES)?,
        }))
    }

    fn required_text(&self, id: EventId, field: &[u8]) -> StoreResult<String> {
        let key = event_key(id, field);
        let bytes = self
            .events
            .get(&key)?
            .ok_or_else(|| StoreError::corrupt(&key, "missing event field"))?;
        String::from_utf8(bytes.to_vec()).map_err(|e| StoreError::corrupt(&key, e.to_string()))
    }

    fn required_time(&self, id: EventId, field: &[u8]) -> StoreResult<DateTime<Utc>> {
        let key = event_key(id, field);
        let bytes = self
            .events
            .get(&key)?
            .ok_or_else(|| StoreError::corrupt(&key, "missing event field"))?;
        codec::decode_time(&key, &bytes)
    }

    /// Identifiers of all live events, in ascending order.
    pub fn live_event_ids(&self) -> StoreResult<Vec<EventId>> {
        let mut ids = Vec::new();
        for item in self.events.iter() {
            let (key, _) = item?;
            if key.len() > 2 && key[1] == b'/' && &key[2..] == F_PROPOSITION {
                ids.push(key[0]);
            }
        }
        Ok(ids)
    }

    /// A single participant's cumulative stake on one side; 0 if absent.
    pub fn pool_entry(&self, id: EventId, side: Side, nick: &str) -> StoreResult<i64> {
        let key = pool_key(id, side, nick);
        match self.events.get(&key)? {
            Some(bytes) => codec::decode_i64(&key, &bytes),
            None => Ok(0),
        }
    }

    /// All entries of one pool, as (nick, cumulative stake) pairs.
    pub fn pool(&self, id: EventId, side: Side) -> StoreResult<Vec<(String, i64)>> {
        let prefix = pool_prefix(id, side);
        let mut entries = Vec::new();
        for item in self.events.scan_prefix(&prefix) {
            let (key, value) = item?;
            let nick = String::from_utf8(key[prefix.len()..].to_vec())
                .map_err(|e| StoreError::corrupt(&key, e.to_string()))?;
            entries.push((nick, codec::decode_i64(&key, &value)?));
        }
        Ok(entries)
    }

    /// Sum of all stakes on one side of an event.
    pub fn pool_total(&self, id: EventId, side: Side) -> StoreResult<i64> {
        let mut total: i64 = 0;
        for (_, stake) in self.pool(id, side)? {
            total = total.saturating_add(stake);
        }
        Ok(total)
    }
}

impl WriteTxn<'_> {
    /// Persist a credit balance.
    pub fn set_credits(&self, nick: &str, balance: i64) -> StoreResult<()> {
        self.view
            .accounts
            .insert(account_key(nick, F_CREDITS), codec::encode_i64(balance)?)?;
        Ok(())
    }

    /// Persist or clear the creation cooldown.
    pub fn set_next_allowed(
        &self,
        nick: &str,
        until: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        let key = account_key(nick, F_NEXTBET);
        match until {
            Some(t) => {
                self.view.accounts.insert(key, codec::encode_time(t))?;
            }
            None => {
                self.view.accounts.remove(key)?;
            }
        }
        Ok(())
    }

    /// Persist the moderator privilege flag.
    pub fn set_moderator(&self, nick: &str, moderator: bool) -> StoreResult<()> {
        self.view
            .accounts
            .insert(account_key(nick, F_MODERATOR), codec::encode_bool(moderator))?;
        Ok(())
    }

    /// Persist all metadata fields of a new event.
    pub fn put_event(&self, event: &Event) -> StoreResult<()> {
        let events = self.view.events;
        events.insert(
            event_key(event.id, F_PROPOSITION),
            event.proposition.as_bytes(),
        )?;
        events.insert(event_key(event.id, F_CREATOR), event.creator.as_bytes())?;
        events.insert(
            event_key(event.id, F_CREATED),
            codec::encode_time(event.created_at),
        )?;
        events.insert(
            event_key(event.id, F_CLOSES),
            codec::encode_time(event.closes_at),
        )?;
        events.insert(
            event_key(event.id, F_RESOLVES),
            codec::encode_time(event.resolves_at),
        )?;
        Ok(())
    }

    /// Persist a participant's cumulative stake in one pool.
    pub fn set_pool_entry(
        &self,
        id: EventId,
        side: Side,
        nick: &str,
        stake: i64,
    ) -> StoreResult<()> {
        self.view
            .events
            .insert(pool_key(id, side, nick), codec::encode_i64(stake)?)?;
        Ok(())
    }

    /// Delete an event record and both of its pools.
    pub fn delete_event(&self, id: EventId) -> StoreResult<()> {
        let prefix = [id, b'/'];
        let mut keys = Vec::new();
        for item in self.view.events.scan_prefix(prefix) {
            let (key, _) = item?;
            keys.push(key);
        }
        for key in keys {
            self.view.events.remove(key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_event(id: EventId) -> Event {
        let now = Utc::now();
        Event {
            id,
            proposition: "the stream hits 100 viewers".to_string(),
            creator: "alice".to_string(),
            created_at: now,
            closes_at: now + Duration::seconds(150),
            resolves_at: now + Duration::seconds(300),
        }
    }

    #[test]
    fn unknown_account_reads_as_empty() {
        let store = Store::temporary().unwrap();
        let txn = store.begin_read();
        assert_eq!(txn.credits("ghost").unwrap(), 0);
        assert_eq!(txn.next_allowed("ghost").unwrap(), None);
        assert!(!txn.is_moderator("ghost").unwrap());
    }

    #[test]
    fn account_fields_roundtrip() {
        let store = Store::temporary().unwrap();
        let until = Utc::now() + Duration::minutes(5);
        {
            let txn = store.begin_write();
            txn.set_credits("alice", 95).unwrap();
            txn.set_next_allowed("alice", Some(until)).unwrap();
            txn.set_moderator("alice", true).unwrap();
        }
        let txn = store.begin_read();
        assert_eq!(txn.credits("alice").unwrap(), 95);
        assert_eq!(txn.next_allowed("alice").unwrap(), Some(until));
        assert!(txn.is_moderator("alice").unwrap());
    }

    #[test]
    fn event_roundtrip_and_delete() {
        let store = Store::temporary().unwrap();
        let event = sample_event(3);
        {
            let txn = store.begin_write();
            txn.put_event(&event).unwrap();
            txn.set_pool_entry(3, Side::For, "alice", 5).unwrap();
            txn.set_pool_entry(3, Side::Against, "carol", 20).unwrap();
        }
        {
            let txn = store.begin_read();
            let loaded = txn.event(3).unwrap().unwrap();
            assert_eq!(loaded.proposition, event.proposition);
            assert_eq!(loaded.closes_at, event.closes_at);
            assert_eq!(txn.live_event_ids().unwrap(), vec![3]);
            assert_eq!(txn.pool_entry(3, Side::For, "alice").unwrap(), 5);
            assert_eq!(txn.pool_total(3, Side::Against).unwrap(), 20);
        }
        {
            let txn = store.begin_write();
            txn.delete_event(3).unwrap();
        }
        let txn = store.begin_read();
        assert!(txn.event(3).unwrap().is_none());
        assert!(txn.live_event_ids().unwrap().is_empty());
        assert_eq!(txn.pool_entry(3, Side::For, "alice").unwrap(), 0);
    }

    #[test]
    fn pools_enumerate_by_side() {
        let store = Store::temporary().unwrap();
        {
            let txn = store.begin_write();
            txn.put_event(&sample_event(1)).unwrap();
            txn.set_pool_entry(1, Side::For, "alice", 5).unwrap();
            txn.set_pool_entry(1, Side::For, "bob", 10).unwrap();
            txn.set_pool_entry(1, Side::Against, "carol", 20).unwrap();
        }
        let txn = store.begin_read();
        let fors = txn.pool(1, Side::For).unwrap();
        assert_eq!(fors.len(), 2);
        assert!(fors.contains(&("alice".to_string(), 5)));
        assert!(fors.contains(&("bob".to_string(), 10)));
        assert_eq!(txn.pool_total(1, Side::For).unwrap(), 15);
        assert_eq!(txn.pool(1, Side::Against).unwrap().len(), 1);
    }

    #[test]
    fn partial_event_record_is_corrupt() {
        let store = Store::temporary().unwrap();
        {
            let txn = store.begin_write();
            txn.put_event(&sample_event(9)).unwrap();
        }
        // Simulate a torn record by deleting one required field.
        store.events.remove(event_key(9, F_CLOSES)).unwrap();
        let txn = store.begin_read();
        assert!(matches!(
            txn.event(9),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
