//! Ledger data models.

use crate::book::errors::{BookError, BookResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A participant's account snapshot: balance plus directory metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub nick: String,
    pub balance: i64,
    /// Earliest time the participant may open a new event; `None` means
    /// unrestricted.
    pub next_allowed_at: Option<DateTime<Utc>>,
    pub moderator: bool,
}

/// Normalize a chat handle to its canonical ledger key: trimmed and
/// lowercased. Handles that are empty or contain `/` or whitespace cannot be
/// stored and are rejected.
pub fn normalize_nick(raw: &str) -> BookResult<String> {
    let nick = raw.trim().to_lowercase();
    if nick.is_empty() || nick.contains('/') || nick.contains(char::is_whitespace) {
        return Err(BookError::MalformedIdentifier(raw.to_string()));
    }
    Ok(nick)
}
