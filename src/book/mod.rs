//! The wager book: live events, their pools, and resolution.
//!
//! [`registry::EventRegistry`] owns the bounded set of live events and the
//! create/wager/kill paths; [`resolve::Resolver`] settles them. Both share
//! one [`crate::ledger::Ledger`] and one [`crate::store::Store`], and every
//! credit sitting in a pool was debited from a balance exactly once.

pub mod errors;
pub mod models;
pub mod registry;
pub mod resolve;

pub use errors::{BookError, BookResult};
pub use models::{
    BookConfig, Event, EventId, EventReceipt, EventStatus, EventSummary, Payout, PayoutSummary,
    Side,
};
pub use registry::EventRegistry;
pub use resolve::{Resolver, payout_share};
