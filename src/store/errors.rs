//! Store error types.

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying sled error
    #[error("storage error: {0}")]
    Db(#[from] sled::Error),

    /// Value encoding failed
    #[error("value encoding failed: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// A stored value failed to decode. This indicates persisted-state
    /// corruption; callers must not guess and continue past it.
    #[error("corrupt value at {key}: {detail}")]
    Corrupt { key: String, detail: String },
}

impl StoreError {
    pub(crate) fn corrupt(key: &[u8], detail: impl Into<String>) -> Self {
        StoreError::Corrupt {
            key: String::from_utf8_lossy(key).into_owned(),
            detail: detail.into(),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
