//! Resolution engine: settles live events and pays the winners.

use crate::book::errors::{BookError, BookResult};
use crate::book::models::{EventId, Payout, PayoutSummary, Side};
use crate::ledger::{Ledger, normalize_nick};
use crate::scheduler::DeadlineScheduler;
use crate::store::Store;
use log::info;
use std::sync::Arc;

/// Settles events: a moderator declares whether the proposition happened,
/// and the whole pot is split proportionally among the winning side.
#[derive(Clone)]
pub struct Resolver {
    store: Arc<Store>,
    ledger: Ledger,
    scheduler: DeadlineScheduler,
}

impl Resolver {
    pub fn new(store: Arc<Store>, ledger: Ledger, scheduler: DeadlineScheduler) -> Self {
        Self {
            store,
            ledger,
            scheduler,
        }
    }

    /// Settle an event. Moderator only.
    ///
    /// The winning pool is snapshotted, the event record deleted, and every
    /// winner credited `ceil(stake * pot / winning_total)` in the same
    /// transaction. Ceiling rounding favors the bettor; the slight
    /// over-payment it can produce is accepted, not clawed back. When nobody
    /// backed the winning side there are no payouts and the losing stakes
    /// are forfeit, but the event is still deleted.
    ///
    /// # Arguments
    ///
    /// * `moderator` - Chat handle of the privileged caller.
    /// * `event_id` - The live event to settle.
    /// * `happened` - Whether the proposition came true; `true` pays the
    ///   `for` pool, `false` pays the `against` pool.
    ///
    /// # Returns
    ///
    /// A summary of the verdict and every winner's cut.
    pub fn resolve(
        &self,
        moderator: &str,
        event_id: EventId,
        happened: bool,
    ) -> BookResult<PayoutSummary> {
        let moderator = normalize_nick(moderator)?;
        let winning_side = if happened { Side::For } else { Side::Against };

        let summary = {
            let txn = self.store.begin_write();
            if !txn.is_moderator(&moderator)? {
                return Err(BookError::Unauthorized(moderator));
            }
            let event = txn
                .event(event_id)?
                .ok_or(BookError::UnknownEvent(event_id))?;

            let winners = txn.pool(event_id, winning_side)?;
            let winning_total = winners.iter().map(|(_, stake)| stake).sum::<i64>();
            let losing_total = txn.pool_total(event_id, winning_side.opposite())?;
            let pot = winning_total
                .checked_add(losing_total)
                .ok_or(BookError::BalanceOverflow)?;

            // Every payout is computed and checked against its balance
            // before the first write, so a failure here cannot strand the
            // event half-settled.
            let mut payouts = Vec::with_capacity(winners.len());
            if winning_total > 0 {
                for (nick, staked) in winners {
                    let payout = payout_share(staked, pot, winning_total)?;
                    let balance = txn
                        .credits(&nick)?
                        .checked_add(payout)
                        .ok_or(BookError::BalanceOverflow)?;
                    payouts.push(Payout {
                        nick,
                        staked,
                        payout,
                        balance,
                    });
                }
            }

            txn.delete_event(event_id)?;
            for p in &payouts {
                self.ledger.change_balance(&txn, &p.nick, p.payout)?;
            }
            PayoutSummary {
                event_id,
                proposition: event.proposition,
                happened,
                pot,
                winning_total,
                losing_total,
                payouts,
            }
        };

        self.scheduler.cancel(event_id);
        info!(
            "event #{event_id} resolved by {moderator}: happened={happened}, pot={}, {} winner(s)",
            summary.pot,
            summary.payouts.len()
        );
        Ok(summary)
    }
}

/// One winner's cut: `ceil(stake * pot / winning_total)`, computed in 128-bit
/// to avoid intermediate overflow.
pub fn payout_share(stake: i64, pot: i64, winning_total: i64) -> BookResult<i64> {
    debug_assert!(winning_total > 0);
    let num = i128::from(stake) * i128::from(pot);
    let den = i128::from(winning_total);
    let share = (num + den - 1) / den;
    i64::try_from(share).map_err(|_| BookError::BalanceOverflow)
}
