//! Chat command grammar.
//!
//! Inbound lines are parsed into [`Command`] values before any state is
//! touched. The grammar:
//!
//! ```text
//! <amount> that <proposition> in <duration>    open a new event
//! <id> for|against <amount>                    stake on a live event
//! yes <id> / no <id>                           settle an event (moderator)
//! kill <id...>                                 discard events (moderator)
//! resettimer <nick...>                         clear cooldowns (moderator)
//! list                                         show live events
//! balance [nick]                               show a credit balance
//! help                                         show this summary
//! ```
//!
//! Keywords are case-insensitive. Since a proposition may itself contain the
//! word "in", the duration is taken after the last `in` token.

use crate::book::errors::{BookError, BookResult};
use crate::book::models::{EventId, Side};
use crate::constants::CURRENCY_UNITS;
use chrono::Duration;

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create {
        stake: i64,
        proposition: String,
        duration: Duration,
    },
    Wager {
        event: EventId,
        side: Side,
        amount: i64,
    },
    Resolve {
        event: EventId,
        happened: bool,
    },
    Kill {
        events: Vec<EventId>,
    },
    ResetTimer {
        nicks: Vec<String>,
    },
    List,
    Balance {
        nick: Option<String>,
    },
    Help,
}

impl Command {
    /// Parse one line of chat input.
    pub fn parse(line: &str) -> BookResult<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&first) = tokens.first() else {
            return Err(BookError::UnknownCommand(line.to_string()));
        };

        match first.to_lowercase().as_str() {
            "help" => return Ok(Command::Help),
            "list" => return Ok(Command::List),
            "balance" => {
                return Ok(Command::Balance {
                    nick: tokens.get(1).map(|s| s.to_string()),
                });
            }
            "yes" | "no" => {
                let id = tokens
                    .get(1)
                    .ok_or_else(|| BookError::UnknownCommand(line.to_string()))?;
                return Ok(Command::Resolve {
                    event: parse_event_id(id)?,
                    happened: first.eq_ignore_ascii_case("yes"),
                });
            }
            "kill" => {
                if tokens.len() < 2 {
                    return Err(BookError::UnknownCommand(line.to_string()));
                }
                let events = tokens[1..]
                    .iter()
                    .map(|t| parse_event_id(t))
                    .collect::<BookResult<Vec<_>>>()?;
                return Ok(Command::Kill { events });
            }
            "resettimer" => {
                if tokens.len() < 2 {
                    return Err(BookError::UnknownCommand(line.to_string()));
                }
                return Ok(Command::ResetTimer {
                    nicks: tokens[1..].iter().map(|t| t.to_string()).collect(),
                });
            }
            _ => {}
        }

        // Create form: <amount> that <proposition> in <duration>
        if tokens.len() >= 4 && tokens[1].eq_ignore_ascii_case("that") {
            let last_in = tokens
                .iter()
                .rposition(|t| t.eq_ignore_ascii_case("in"))
                .filter(|&i| i > 1 && i + 1 < tokens.len())
                .ok_or_else(|| BookError::UnknownCommand(line.to_string()))?;
            let proposition = tokens[2..last_in].join(" ");
            if proposition.is_empty() {
                return Err(BookError::UnknownCommand(line.to_string()));
            }
            return Ok(Command::Create {
                stake: parse_amount(tokens[0])?,
                proposition,
                duration: parse_duration(&tokens[last_in + 1..].join(""))?,
            });
        }

        // Wager form: <id> for|against <amount>. The gate is "looks like a
        // number" so an out-of-range id still reports what is wrong with it.
        if tokens.len() == 3
            && !tokens[0].is_empty()
            && tokens[0].bytes().all(|b| b.is_ascii_digit())
        {
            return Ok(Command::Wager {
                event: parse_event_id(tokens[0])?,
                side: Side::parse(tokens[1])?,
                amount: parse_amount(tokens[2])?,
            });
        }

        Err(BookError::UnknownCommand(line.to_string()))
    }
}

/// Usage text for the `help` command.
pub fn help_text() -> String {
    format!(
        "commands: <amount> that <proposition> in <duration> | \
         <id> for|against <amount> | yes <id> | no <id> | \
         kill <id...> | resettimer <nick...> | list | balance [nick] \
         (amounts in {CURRENCY_UNITS}, durations like 5m or 90s)"
    )
}

/// Parse a stake as a strictly positive whole number of credits. An optional
/// `cr` suffix is accepted.
pub fn parse_amount(token: &str) -> BookResult<i64> {
    let digits = token
        .strip_suffix(CURRENCY_UNITS)
        .unwrap_or(token);
    match digits.parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(BookError::InvalidAmount(token.to_string())),
    }
}

/// Parse a duration like `90s`, `5m`, `1h2m30s`. Units must appear in
/// descending order and at most once each.
pub fn parse_duration(token: &str) -> BookResult<Duration> {
    let err = || BookError::InvalidDuration(token.to_string());
    let mut total: i64 = 0;
    let mut value: i64 = 0;
    let mut have_digits = false;
    let mut last_unit: i64 = i64::MAX;
    for c in token.chars() {
        if let Some(d) = c.to_digit(10) {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(i64::from(d)))
                .ok_or_else(err)?;
            have_digits = true;
            continue;
        }
        let unit = match c.to_ascii_lowercase() {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return Err(err()),
        };
        if !have_digits || unit >= last_unit {
            return Err(err());
        }
        total = total
            .checked_add(value.checked_mul(unit).ok_or_else(err)?)
            .ok_or_else(err)?;
        value = 0;
        have_digits = false;
        last_unit = unit;
    }
    // Trailing bare digits are not a duration.
    if have_digits || total <= 0 {
        return Err(err());
    }
    Ok(Duration::seconds(total))
}

/// Parse an event identifier token.
pub fn parse_event_id(token: &str) -> BookResult<EventId> {
    token
        .parse::<EventId>()
        .map_err(|_| BookError::MalformedIdentifier(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_form_parses() {
        let cmd = Command::parse("10 that it rains tomorrow in 5m").unwrap();
        assert_eq!(
            cmd,
            Command::Create {
                stake: 10,
                proposition: "it rains tomorrow".to_string(),
                duration: Duration::minutes(5),
            }
        );
    }

    #[test]
    fn create_form_keeps_in_inside_the_proposition() {
        let cmd = Command::parse("5 that we win in overtime in 10m").unwrap();
        assert_eq!(
            cmd,
            Command::Create {
                stake: 5,
                proposition: "we win in overtime".to_string(),
                duration: Duration::minutes(10),
            }
        );
    }

    #[test]
    fn create_form_accepts_credit_suffix() {
        let cmd = Command::parse("10cr that x happens in 2m").unwrap();
        assert!(matches!(cmd, Command::Create { stake: 10, .. }));
    }

    #[test]
    fn wager_form_parses() {
        assert_eq!(
            Command::parse("3 against 20").unwrap(),
            Command::Wager {
                event: 3,
                side: Side::Against,
                amount: 20,
            }
        );
        assert_eq!(
            Command::parse("1 FOR 5cr").unwrap(),
            Command::Wager {
                event: 1,
                side: Side::For,
                amount: 5,
            }
        );
    }

    #[test]
    fn wager_with_bad_side_is_invalid_side() {
        assert!(matches!(
            Command::parse("3 maybe 20"),
            Err(BookError::InvalidSide(_))
        ));
    }

    #[test]
    fn wager_with_out_of_range_id_reports_the_identifier() {
        assert!(matches!(
            Command::parse("256 for 5"),
            Err(BookError::MalformedIdentifier(_))
        ));
        assert!(matches!(
            Command::parse("9999 against 5"),
            Err(BookError::MalformedIdentifier(_))
        ));
    }

    #[test]
    fn resolve_and_admin_verbs() {
        assert_eq!(
            Command::parse("yes 4").unwrap(),
            Command::Resolve {
                event: 4,
                happened: true,
            }
        );
        assert_eq!(
            Command::parse("NO 4").unwrap(),
            Command::Resolve {
                event: 4,
                happened: false,
            }
        );
        assert_eq!(
            Command::parse("kill 2 5").unwrap(),
            Command::Kill { events: vec![2, 5] }
        );
        assert_eq!(
            Command::parse("resettimer alice bob").unwrap(),
            Command::ResetTimer {
                nicks: vec!["alice".to_string(), "bob".to_string()],
            }
        );
    }

    #[test]
    fn queries() {
        assert_eq!(Command::parse("list").unwrap(), Command::List);
        assert_eq!(
            Command::parse("balance").unwrap(),
            Command::Balance { nick: None }
        );
        assert_eq!(
            Command::parse("balance alice").unwrap(),
            Command::Balance {
                nick: Some("alice".to_string()),
            }
        );
        assert_eq!(Command::parse("help").unwrap(), Command::Help);
    }

    #[test]
    fn garbage_is_unknown() {
        for line in ["", "   ", "frobnicate", "10 that in 5m", "yes", "kill"] {
            assert!(
                matches!(Command::parse(line), Err(BookError::UnknownCommand(_))),
                "line {line:?} should be unknown"
            );
        }
    }

    #[test]
    fn amounts() {
        assert_eq!(parse_amount("10").unwrap(), 10);
        assert_eq!(parse_amount("10cr").unwrap(), 10);
        for bad in ["0", "-5", "ten", "", "cr"] {
            assert!(matches!(
                parse_amount(bad),
                Err(BookError::InvalidAmount(_))
            ));
        }
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("90s").unwrap(), Duration::seconds(90));
        assert_eq!(parse_duration("5m").unwrap(), Duration::minutes(5));
        assert_eq!(
            parse_duration("1h2m30s").unwrap(),
            Duration::seconds(3750)
        );
        for bad in ["", "5", "m5", "5x", "5m2h", "5m5m", "-5m"] {
            assert!(
                matches!(parse_duration(bad), Err(BookError::InvalidDuration(_))),
                "duration {bad:?} should be invalid"
            );
        }
    }

    #[test]
    fn event_ids() {
        assert_eq!(parse_event_id("255").unwrap(), 255);
        for bad in ["256", "-1", "abc", ""] {
            assert!(matches!(
                parse_event_id(bad),
                Err(BookError::MalformedIdentifier(_))
            ));
        }
    }
}
