//! `elecpos-backend` — the hosted-backend boundary.
//!
//! ElecPOS delegates persistence, uniqueness constraints, and the report
//! computations to a hosted relational backend. This crate models that
//! boundary as the [`Backend`] trait: table CRUD plus the RPC-style stored
//! functions (`report_inventory`, `report_movement`, `report_trial_balance`,
//! `post_journal_quick`) the app calls.
//!
//! Two implementations:
//! - [`MemoryBackend`]: in-process reference implementation for dev/test; it
//!   honors the same contracts (serial ids, unique `invoice_no`, balanced
//!   journal postings, stock aggregation).
//! - `PostgresBackend` (feature `postgres`): sqlx against the hosted
//!   database, calling its stored functions rather than reimplementing them.

pub mod client;
pub mod error;
pub mod memory;
pub mod records;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use client::{Backend, BACKUP_TABLES};
pub use error::{BackendError, BackendResult};
pub use memory::MemoryBackend;

#[cfg(feature = "postgres")]
pub use postgres::PostgresBackend;
