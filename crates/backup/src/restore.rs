//! Restore: upsert dumped rows back into the backend, table by table.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use elecpos_backend::{Backend, BACKUP_TABLES};

use crate::archive::read_archive;
use crate::error::BackupResult;

#[derive(Debug, Clone, Serialize)]
pub struct TableRestore {
    pub table: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoreReport {
    pub tables: Vec<TableRestore>,
    pub total_rows: usize,
}

/// Upsert per-table rows in `BACKUP_TABLES` order, so parents land before
/// the rows that reference them.
pub async fn import_dump(
    backend: &dyn Backend,
    mut tables: BTreeMap<String, Vec<serde_json::Value>>,
) -> BackupResult<RestoreReport> {
    if let Some(unknown) = tables
        .keys()
        .find(|t| !BACKUP_TABLES.contains(&t.as_str()))
    {
        return Err(crate::error::BackupError::UnknownTable(unknown.clone()));
    }

    let mut report = RestoreReport {
        tables: Vec::new(),
        total_rows: 0,
    };

    for table in BACKUP_TABLES {
        let Some(rows) = tables.remove(*table) else {
            continue;
        };
        if rows.is_empty() {
            continue;
        }
        let count = backend.upsert_rows(table, rows).await?;
        info!(table, rows = count, "restored table");
        report.total_rows += count;
        report.tables.push(TableRestore {
            table: (*table).to_string(),
            rows: count,
        });
    }

    Ok(report)
}

/// Restore from an uploaded zip bundle.
pub async fn restore_archive(backend: &dyn Backend, bytes: &[u8]) -> BackupResult<RestoreReport> {
    let tables = read_archive(bytes)?;
    import_dump(backend, tables).await
}
