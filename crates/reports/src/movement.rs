//! Item movement shaping: signed quantities and a running balance.

use elecpos_backend::records::MovementRow;
use elecpos_core::round2;
use serde::Serialize;

/// Movement row enriched with the signed quantity and the balance after it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementLine {
    #[serde(flatten)]
    pub row: MovementRow,
    pub signed_qty: f64,
    pub balance: f64,
}

/// Footer of the movement table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MovementSummary {
    pub total_in: f64,
    pub total_out: f64,
    pub balance: f64,
}

fn signed(row: &MovementRow) -> f64 {
    if row.direction == "in" {
        row.qty
    } else {
        -row.qty
    }
}

/// Walk date-ordered movement rows accumulating the running balance.
///
/// Inbound rows count positive, outbound negative; the summary balance is
/// total in minus total out, which equals the final running balance.
pub fn movement_with_balance(rows: Vec<MovementRow>) -> (Vec<MovementLine>, MovementSummary) {
    let mut balance = 0.0;
    let mut total_in = 0.0;
    let mut total_out = 0.0;

    let lines = rows
        .into_iter()
        .map(|row| {
            let signed_qty = signed(&row);
            balance += signed_qty;
            if signed_qty >= 0.0 {
                total_in += row.qty;
            } else {
                total_out += row.qty;
            }
            MovementLine {
                signed_qty,
                balance: round2(balance),
                row,
            }
        })
        .collect();

    let summary = MovementSummary {
        total_in: round2(total_in),
        total_out: round2(total_out),
        balance: round2(total_in - total_out),
    };
    (lines, summary)
}
