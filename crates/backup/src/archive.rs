//! Zip bundle layout: one `data/<table>.json` entry per backup table.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use elecpos_backend::BACKUP_TABLES;

use crate::dump::BackupDump;
use crate::error::{BackupError, BackupResult};

const DATA_PREFIX: &str = "data/";

/// Serialize a dump into the zip bundle, in table dump order.
pub fn write_archive(dump: &BackupDump) -> BackupResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for table in BACKUP_TABLES {
        let rows = dump.dump.get(*table).cloned().unwrap_or_default();
        zip.start_file(format!("{DATA_PREFIX}{table}.json"), options)?;
        zip.write_all(serde_json::to_string_pretty(&rows)?.as_bytes())?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Parse a zip bundle back into per-table rows.
///
/// Entries outside `data/` are ignored; a `data/<name>.json` entry naming a
/// table that is not backed up is an error, so a restore never writes
/// anything the exporter would not have produced.
pub fn read_archive(bytes: &[u8]) -> BackupResult<BTreeMap<String, Vec<serde_json::Value>>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut tables = BTreeMap::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let Some(table) = name
            .strip_prefix(DATA_PREFIX)
            .and_then(|rest| rest.strip_suffix(".json"))
        else {
            continue;
        };
        if !BACKUP_TABLES.contains(&table) {
            return Err(BackupError::BadEntry(name));
        }

        let mut body = String::new();
        entry.read_to_string(&mut body)?;
        let rows: Vec<serde_json::Value> =
            serde_json::from_str(&body).map_err(|source| BackupError::BadJson {
                entry: name.clone(),
                source,
            })?;
        tables.insert(table.to_string(), rows);
    }

    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn dump_with(table: &str, rows: Vec<serde_json::Value>) -> BackupDump {
        let mut dump = BTreeMap::new();
        dump.insert(table.to_string(), rows);
        BackupDump {
            exported_at: Utc::now(),
            dump,
        }
    }

    #[test]
    fn archive_round_trips_rows() {
        let rows = vec![serde_json::json!({"id": 1, "name_ar": "item"})];
        let bytes = write_archive(&dump_with("products", rows.clone())).unwrap();

        let tables = read_archive(&bytes).unwrap();
        assert_eq!(tables["products"], rows);
        // Missing tables are written as empty arrays.
        assert_eq!(tables["sales"], Vec::<serde_json::Value>::new());
        assert_eq!(tables.len(), BACKUP_TABLES.len());
    }

    #[test]
    fn unknown_data_entry_is_rejected() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        zip.start_file("data/secrets.json", options).unwrap();
        zip.write_all(b"[]").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        assert!(matches!(
            read_archive(&bytes),
            Err(BackupError::BadEntry(_))
        ));
    }

    #[test]
    fn non_data_entries_are_ignored() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        zip.start_file("README.txt", options).unwrap();
        zip.write_all(b"backup").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        assert!(read_archive(&bytes).unwrap().is_empty());
    }

    #[test]
    fn malformed_json_names_the_entry() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        zip.start_file("data/products.json", options).unwrap();
        zip.write_all(b"{not json").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        match read_archive(&bytes) {
            Err(BackupError::BadJson { entry, .. }) => assert_eq!(entry, "data/products.json"),
            other => panic!("expected BadJson, got {other:?}"),
        }
    }
}
