//! `elecpos-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! error model, money rounding, invoice totals arithmetic, and invoice-number
//! allocation helpers.

pub mod error;
pub mod invoice_no;
pub mod money;
pub mod totals;

pub use error::{DomainError, DomainResult};
pub use invoice_no::{allocate_with_retry, next_invoice_no, MAX_ALLOCATE_ATTEMPTS};
pub use money::round2;
pub use totals::{InvoiceLine, InvoiceTotals};
