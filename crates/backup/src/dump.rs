//! The JSON dump document: every backup table keyed by name.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use elecpos_backend::{Backend, BACKUP_TABLES};

use crate::error::BackupResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupDump {
    pub exported_at: DateTime<Utc>,
    pub dump: BTreeMap<String, Vec<serde_json::Value>>,
}

/// Read every backup table into one dump document.
pub async fn export_dump(backend: &dyn Backend) -> BackupResult<BackupDump> {
    let mut dump = BTreeMap::new();
    for table in BACKUP_TABLES {
        let rows = backend.dump_table(table).await?;
        debug!(table, rows = rows.len(), "dumped table");
        dump.insert((*table).to_string(), rows);
    }
    Ok(BackupDump {
        exported_at: Utc::now(),
        dump,
    })
}
