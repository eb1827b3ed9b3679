//! `elecpos-backup` — full-database export and restore.
//!
//! Exports every backup table as JSON, either as one dump document or as a
//! zip bundle with one `data/<table>.json` entry per table. Restore reads
//! the same bundle layout back and upserts rows table by table in dependency
//! order, keeping original row ids.

pub mod archive;
pub mod dump;
pub mod error;
pub mod restore;

pub use archive::{read_archive, write_archive};
pub use dump::{export_dump, BackupDump};
pub use error::{BackupError, BackupResult};
pub use restore::{import_dump, restore_archive, RestoreReport, TableRestore};
