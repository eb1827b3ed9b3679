//! Invoice totals arithmetic.
//!
//! Both purchase and sales invoices derive their header amounts the same way:
//! `sub_total = Σ qty*price`, `tax_total = Σ qty*price*tax_rate`,
//! `grand_total = sub_total + tax_total`. Tax rates are fractions (0.05 = 5%).

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::money::round2;

/// One invoice line as submitted by the client. `unit_price` is the unit cost
/// for purchases and the selling price for sales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub product_id: i64,
    pub qty: f64,
    pub unit_price: f64,
    #[serde(default)]
    pub tax_rate: f64,
}

impl InvoiceLine {
    /// Net line amount (before tax).
    pub fn line_total(&self) -> f64 {
        round2(self.qty * self.unit_price)
    }

    /// Tax amount for the line.
    pub fn line_tax(&self) -> f64 {
        round2(self.qty * self.unit_price * self.tax_rate)
    }
}

/// Computed header amounts for an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub sub_total: f64,
    pub tax_total: f64,
    pub grand_total: f64,
}

impl InvoiceTotals {
    /// Compute header totals from invoice lines.
    ///
    /// Rejects empty invoices and lines with negative quantity, price, or tax
    /// rate. The backend enforces the same constraints; validating here keeps
    /// the error a 400 rather than a backend round trip.
    pub fn compute(lines: &[InvoiceLine]) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::validation("no items"));
        }

        let mut sub_total = 0.0;
        let mut tax_total = 0.0;
        for line in lines {
            if line.qty <= 0.0 {
                return Err(DomainError::validation("qty must be positive"));
            }
            if line.unit_price < 0.0 {
                return Err(DomainError::validation("unit price cannot be negative"));
            }
            if line.tax_rate < 0.0 {
                return Err(DomainError::validation("tax rate cannot be negative"));
            }
            sub_total += line.qty * line.unit_price;
            tax_total += line.qty * line.unit_price * line.tax_rate;
        }

        let sub_total = round2(sub_total);
        let tax_total = round2(tax_total);
        Ok(Self {
            sub_total,
            tax_total,
            grand_total: round2(sub_total + tax_total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(qty: f64, unit_price: f64, tax_rate: f64) -> InvoiceLine {
        InvoiceLine {
            product_id: 1,
            qty,
            unit_price,
            tax_rate,
        }
    }

    #[test]
    fn totals_sum_lines() {
        let totals = InvoiceTotals::compute(&[line(2.0, 10.0, 0.05), line(1.0, 30.0, 0.0)]).unwrap();
        assert_eq!(totals.sub_total, 50.0);
        assert_eq!(totals.tax_total, 1.0);
        assert_eq!(totals.grand_total, 51.0);
    }

    #[test]
    fn empty_invoice_is_rejected() {
        let err = InvoiceTotals::compute(&[]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn negative_qty_is_rejected() {
        let err = InvoiceTotals::compute(&[line(-1.0, 10.0, 0.0)]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn untaxed_invoice_has_zero_tax() {
        let totals = InvoiceTotals::compute(&[line(3.0, 7.5, 0.0)]).unwrap();
        assert_eq!(totals.tax_total, 0.0);
        assert_eq!(totals.grand_total, totals.sub_total);
    }

    #[test]
    fn line_total_and_tax() {
        let l = line(2.0, 9.99, 0.05);
        assert_eq!(l.line_total(), 19.98);
        assert_eq!(l.line_tax(), 1.0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// grand_total is always the rounded sum of the sub and tax totals.
            #[test]
            fn grand_total_is_sub_plus_tax(
                qtys in proptest::collection::vec(0.01f64..1000.0, 1..20),
                price in 0.0f64..10_000.0,
                tax in 0.0f64..0.5,
            ) {
                let lines: Vec<InvoiceLine> = qtys
                    .iter()
                    .map(|&qty| InvoiceLine { product_id: 1, qty, unit_price: price, tax_rate: tax })
                    .collect();
                let totals = InvoiceTotals::compute(&lines).unwrap();
                prop_assert_eq!(totals.grand_total, crate::money::round2(totals.sub_total + totals.tax_total));
            }

            /// Totals scale with line count: more lines never decrease totals.
            #[test]
            fn totals_are_monotone_in_lines(
                qty in 0.01f64..100.0,
                price in 0.0f64..1000.0,
                n in 1usize..10,
            ) {
                let one = vec![InvoiceLine { product_id: 1, qty, unit_price: price, tax_rate: 0.1 }];
                let many = vec![one[0]; n];
                let t1 = InvoiceTotals::compute(&one).unwrap();
                let tn = InvoiceTotals::compute(&many).unwrap();
                prop_assert!(tn.sub_total >= t1.sub_total - 1e-9);
                prop_assert!(tn.grand_total >= t1.grand_total - 1e-9);
            }
        }
    }
}
