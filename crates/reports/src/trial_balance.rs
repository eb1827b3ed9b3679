//! Trial balance footer: column totals and the balanced check.

use elecpos_backend::records::TrialBalanceRow;
use elecpos_core::round2;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrialBalanceSummary {
    pub total_debit: f64,
    pub total_credit: f64,
    /// True when debit and credit totals agree to the cent.
    pub balanced: bool,
}

pub fn summarize_trial_balance(rows: &[TrialBalanceRow]) -> TrialBalanceSummary {
    let total_debit = round2(rows.iter().map(|r| r.debit).sum());
    let total_credit = round2(rows.iter().map(|r| r.credit).sum());
    TrialBalanceSummary {
        total_debit,
        total_credit,
        balanced: (total_debit - total_credit).abs() < 0.005,
    }
}
