//! A chat-room wagering engine with a durable credit ledger.
//!
//! Participants hold virtual credits and wager them on short-lived events:
//! someone opens a proposition with an opening stake, others back either
//! side while the betting window is open, and a channel moderator settles
//! the verdict, splitting the whole pot proportionally among the winning
//! side. At most five events run at once, every event carries a betting
//! deadline and a resolution deadline, and both are announced in the
//! channel when they pass.
//!
//! The crate is transport-agnostic: hosts feed raw command lines into
//! [`WagerBook::execute`] and deliver outbound announcements through their
//! own [`Notify`] implementation.
//!
//! ```no_run
//! use std::sync::Arc;
//! use wagerbook::{LogNotifier, WagerBook};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let book = WagerBook::open("wagerbook.db", Arc::new(LogNotifier))?;
//!     book.ledger().adjust("alice", 100)?;
//!     let reply = book.execute("alice", "#chan", "10 that it rains today in 5m");
//!     println!("{reply}");
//!     book.flush()?;
//!     Ok(())
//! }
//! ```

pub mod book;
pub mod commands;
pub mod constants;
pub mod engine;
pub mod ledger;
pub mod notify;
pub mod scheduler;
pub mod store;

pub use book::{
    BookConfig, BookError, BookResult, Event, EventId, EventReceipt, EventSummary, Payout,
    PayoutSummary, Side,
};
pub use commands::Command;
pub use engine::WagerBook;
pub use ledger::{Account, Ledger};
pub use notify::{LogNotifier, Notify, Outbox};
pub use store::Store;
