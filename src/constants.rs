//! Policy constants for the wagering engine.

/// Most events that may be open for betting at the same time.
pub const MAX_CONCURRENT_EVENTS: usize = 5;

/// Shortest allowed event length, in seconds (2 minutes).
pub const MIN_EVENT_LEN_SECS: i64 = 2 * 60;

/// Longest allowed event length, in seconds (15 minutes).
pub const MAX_EVENT_LEN_SECS: i64 = 15 * 60;

/// First identifier tried when assigning an id to a new event. Id 0 is
/// never assigned; the free-id search runs from here up to `u8::MAX`.
pub const FIRST_EVENT_ID: u8 = 1;

/// Messages queued for delivery before the outbox starts dropping.
pub const OUTBOX_CAPACITY: usize = 64;

/// Suffix shown after credit amounts in chat replies.
pub const CURRENCY_UNITS: &str = "cr";
