//! Wager book error types.

use crate::book::models::EventId;
use crate::store::StoreError;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Wager book errors. Every kind is recovered at the operation boundary:
/// the triggering transaction is aborted with no partial effect and the
/// message is forwarded to the participant.
#[derive(Debug, Error)]
pub enum BookError {
    /// Storage failure, including persisted-state corruption. Hosts should
    /// treat [`BookError::is_fatal`] errors as a reason to stop rather than
    /// guess and continue.
    #[error("storage failure: {0}")]
    Store(#[from] StoreError),

    /// Stake did not parse as a strictly positive integer
    #[error("invalid amount {0:?}, need a positive whole number of credits")]
    InvalidAmount(String),

    /// Duration text did not parse
    #[error("invalid duration {0:?}, try something like 5m or 90s")]
    InvalidDuration(String),

    /// Not enough credits to cover the stake
    #[error("insufficient funds: have {available}cr, need {required}cr")]
    InsufficientFunds { available: i64, required: i64 },

    /// Event length outside the allowed policy window
    #[error("event length must be between {min_secs}s and {max_secs}s")]
    DurationOutOfRange { min_secs: i64, max_secs: i64 },

    /// A live event already carries byte-identical proposition text
    #[error("that has already been submitted")]
    DuplicateProposition(String),

    /// Live-event cap reached or identifier space exhausted
    #[error("too many bets already open, wait for one to resolve")]
    TooManyLiveEvents,

    /// No live event with that id
    #[error("event #{0} does not exist")]
    UnknownEvent(EventId),

    /// The betting window has passed
    #[error("betting has closed on event #{0}")]
    BettingClosed(EventId),

    /// Non-moderator attempting a privileged operation
    #[error("{0} is not allowed to do that")]
    Unauthorized(String),

    /// Nick or event id failed to parse
    #[error("malformed identifier {0:?}")]
    MalformedIdentifier(String),

    /// Side token was neither FOR nor AGAINST
    #[error("side must be FOR or AGAINST, not {0:?}")]
    InvalidSide(String),

    /// Creator is still locked out from opening another event
    #[error("not allowed to open another event until {0}")]
    CreationCooldown(DateTime<Utc>),

    /// Input matched no known command shape
    #[error("unknown command {0:?}, try help")]
    UnknownCommand(String),

    /// Credit arithmetic overflowed
    #[error("credit amount overflow")]
    BalanceOverflow,
}

impl BookError {
    /// Human-readable text safe to forward into chat. Internal storage
    /// details are sanitized rather than leaked to the channel.
    pub fn client_message(&self) -> String {
        match self {
            BookError::Store(_) => "internal error, please tell the operator".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether this error indicates persisted-state corruption. The host
    /// decides whether to crash or degrade, but it must not ignore these:
    /// proceeding risks duplicating or destroying credits.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BookError::Store(StoreError::Corrupt { .. }))
    }
}

/// Result type for wager book operations
pub type BookResult<T> = Result<T, BookError>;
