//! Credit ledger and account directory.
//!
//! The ledger is the sole authority over credit totals: every stake debits
//! it exactly once, every payout credits it exactly once, and credits are
//! conserved across all operations except minting by an external payroll
//! process (which goes through [`Ledger::adjust`]). Balances are signed but
//! never negative at rest; debit callers validate sufficiency inside the
//! same transaction as the debit.

pub mod manager;
pub mod models;

pub use manager::Ledger;
pub use models::{Account, normalize_nick};
