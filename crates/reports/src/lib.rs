//! `elecpos-reports` — presentation-side report shaping.
//!
//! The backend RPCs return raw report rows; this crate derives what the
//! client renders on top of them: running balances over movement rows and
//! the in/out/debit/credit summary lines.

pub mod movement;
pub mod trial_balance;

pub use movement::{movement_with_balance, MovementLine, MovementSummary};
pub use trial_balance::{summarize_trial_balance, TrialBalanceSummary};
