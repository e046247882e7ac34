//! Wager book data models.

use crate::constants::{
    CURRENCY_UNITS, FIRST_EVENT_ID, MAX_CONCURRENT_EVENTS, MAX_EVENT_LEN_SECS, MIN_EVENT_LEN_SECS,
};
use crate::book::errors::{BookError, BookResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Event identifier. Unique only among currently-live events; recycled once
/// an event is resolved or killed.
pub type EventId = u8;

/// The side of a proposition a wager backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    For,
    Against,
}

impl Side {
    /// Parse a side token, case-insensitively.
    pub fn parse(token: &str) -> BookResult<Self> {
        if token.eq_ignore_ascii_case("for") {
            Ok(Side::For)
        } else if token.eq_ignore_ascii_case("against") {
            Ok(Side::Against)
        } else {
            Err(BookError::InvalidSide(token.to_string()))
        }
    }

    /// The side's label as it appears in the persisted layout.
    pub fn label(self) -> &'static str {
        match self {
            Side::For => "for",
            Side::Against => "against",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::For => Side::Against,
            Side::Against => Side::For,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Derived lifecycle state of a live event. Terminal states (resolved,
/// killed) are represented by deletion of the record, not a stored flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Open,
    AwaitingResolution,
}

/// A live event record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub proposition: String,
    pub creator: String,
    pub created_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
    pub resolves_at: DateTime<Utc>,
}

impl Event {
    /// Lifecycle state at `now`. Wagers are gated by `closes_at` directly;
    /// this exists for display only.
    pub fn status(&self, now: DateTime<Utc>) -> EventStatus {
        if now < self.closes_at {
            EventStatus::Open
        } else {
            EventStatus::AwaitingResolution
        }
    }
}

/// What the creator gets back from a successful event creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventReceipt {
    pub id: EventId,
    pub created_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
    pub resolves_at: DateTime<Utc>,
}

/// One line of the live-event listing; computed fresh on each call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: EventId,
    pub proposition: String,
    /// Lifecycle state at snapshot time.
    pub status: EventStatus,
    /// Remaining betting time, clamped to zero once betting has closed.
    pub betting_remaining: Duration,
    /// Remaining time until resolution is due, clamped to zero.
    pub event_remaining: Duration,
    pub for_total: i64,
    pub against_total: i64,
}

impl std::fmt::Display for EventSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let betting = match self.status {
            EventStatus::Open => format!("betting {}", human_duration(self.betting_remaining)),
            EventStatus::AwaitingResolution => "betting closed".to_string(),
        };
        write!(
            f,
            "#{}: \"{}\" [for {}{u} / against {}{u}] {}, resolves {}",
            self.id,
            self.proposition,
            self.for_total,
            self.against_total,
            betting,
            human_duration(self.event_remaining),
            u = CURRENCY_UNITS,
        )
    }
}

/// One winner's cut of a resolved pot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payout {
    pub nick: String,
    pub staked: i64,
    pub payout: i64,
    /// Ledger balance after the payout was credited.
    pub balance: i64,
}

/// The outcome of resolving an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutSummary {
    pub event_id: EventId,
    pub proposition: String,
    pub happened: bool,
    pub pot: i64,
    pub winning_total: i64,
    pub losing_total: i64,
    /// Empty when nobody backed the winning side; the pot is then forfeit.
    pub payouts: Vec<Payout>,
}

impl std::fmt::Display for PayoutSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verdict = if self.happened {
            "it happened"
        } else {
            "it did not happen"
        };
        write!(
            f,
            "event #{} \"{}\" resolved: {}",
            self.event_id, self.proposition, verdict
        )?;
        if self.payouts.is_empty() {
            return write!(f, " - nobody backed the winning side, the house keeps the pot");
        }
        for p in &self.payouts {
            write!(
                f,
                " | {} wins {}{u} (balance {}{u})",
                p.nick,
                p.payout,
                p.balance,
                u = CURRENCY_UNITS
            )?;
        }
        Ok(())
    }
}

/// Policy knobs for the wager book. The defaults are the production values;
/// hosts and tests may override them.
#[derive(Debug, Clone)]
pub struct BookConfig {
    /// Most events that may be live at once.
    pub max_live_events: usize,
    /// Shortest allowed event length.
    pub min_duration: Duration,
    /// Longest allowed event length.
    pub max_duration: Duration,
    /// Where the free-id search starts.
    pub first_event_id: EventId,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            max_live_events: MAX_CONCURRENT_EVENTS,
            min_duration: Duration::seconds(MIN_EVENT_LEN_SECS),
            max_duration: Duration::seconds(MAX_EVENT_LEN_SECS),
            first_event_id: FIRST_EVENT_ID,
        }
    }
}

/// Render a duration as compact chat text, e.g. `2m30s`.
pub fn human_duration(d: Duration) -> String {
    let total = d.num_seconds().max(0);
    let (hours, rem) = (total / 3600, total % 3600);
    let (minutes, seconds) = (rem / 60, rem % 60);
    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if seconds > 0 || out.is_empty() {
        out.push_str(&format!("{seconds}s"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_parse_is_case_insensitive() {
        assert_eq!(Side::parse("FOR").unwrap(), Side::For);
        assert_eq!(Side::parse("against").unwrap(), Side::Against);
        assert_eq!(Side::parse("AgAiNsT").unwrap(), Side::Against);
        assert!(matches!(
            Side::parse("maybe"),
            Err(BookError::InvalidSide(_))
        ));
    }

    #[test]
    fn status_is_derived_from_close_time() {
        let now = Utc::now();
        let event = Event {
            id: 1,
            proposition: "x".into(),
            creator: "alice".into(),
            created_at: now,
            closes_at: now + Duration::seconds(10),
            resolves_at: now + Duration::seconds(20),
        };
        assert_eq!(event.status(now), EventStatus::Open);
        assert_eq!(
            event.status(now + Duration::seconds(10)),
            EventStatus::AwaitingResolution
        );
    }

    #[test]
    fn summary_display_reflects_betting_state() {
        let mut summary = EventSummary {
            id: 2,
            proposition: "it rains".into(),
            status: EventStatus::Open,
            betting_remaining: Duration::seconds(90),
            event_remaining: Duration::seconds(240),
            for_total: 5,
            against_total: 20,
        };
        assert_eq!(
            summary.to_string(),
            "#2: \"it rains\" [for 5cr / against 20cr] betting 1m30s, resolves 4m"
        );
        summary.status = EventStatus::AwaitingResolution;
        summary.betting_remaining = Duration::zero();
        assert!(summary.to_string().contains("betting closed"));
    }

    #[test]
    fn human_duration_formats() {
        assert_eq!(human_duration(Duration::seconds(0)), "0s");
        assert_eq!(human_duration(Duration::seconds(-5)), "0s");
        assert_eq!(human_duration(Duration::seconds(90)), "1m30s");
        assert_eq!(human_duration(Duration::seconds(3600)), "1h");
        assert_eq!(human_duration(Duration::seconds(3725)), "1h2m5s");
        assert_eq!(human_duration(Duration::seconds(120)), "2m");
    }
}
