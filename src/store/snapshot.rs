//! JSON snapshot of a `MemoryStore`: `{"version": 1, "tables": {"movie": [...], ...}}`.

use super::{Change, MemoryStore, Store, StoreError};
use crate::utils::fsutil::write_atomic;
use crate::utils::json::{document_to_json, object_to_document};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    tables: BTreeMap<String, Vec<serde_json::Value>>,
}

/// Writes every table of `store` to `path` atomically.
///
/// # Errors
/// I/O or serialization failures.
pub fn save(store: &MemoryStore, path: &Path) -> Result<usize, StoreError> {
    let mut tables = BTreeMap::new();
    let mut n = 0;
    for name in store.table_names() {
        let rows: Vec<serde_json::Value> =
            store.rows(&name)?.iter().map(document_to_json).collect();
        n += rows.len();
        tables.insert(name, rows);
    }
    let bytes = serde_json::to_vec_pretty(&Snapshot { version: SNAPSHOT_VERSION, tables })?;
    write_atomic(path, &bytes)?;
    log::info!("saved {n} row(s) to {}", path.display());
    Ok(n)
}

/// Replaces the contents of `store` with the snapshot at `path`. A missing
/// file leaves the store empty and loads nothing.
///
/// # Errors
/// Unreadable file, unknown version or table, or rows the schema rejects.
/// The store is cleared in that case.
pub fn load(store: &MemoryStore, path: &Path) -> Result<usize, StoreError> {
    store.clear();
    if !path.exists() {
        log::info!("no snapshot at {}, starting empty", path.display());
        return Ok(0);
    }
    let bytes = std::fs::read(path)?;
    let snap: Snapshot = serde_json::from_slice(&bytes)?;
    if snap.version != SNAPSHOT_VERSION {
        return Err(StoreError::Snapshot(format!("unsupported snapshot version {}", snap.version)));
    }
    let mut n = 0;
    let result = snap.tables.into_iter().try_for_each(|(table, rows)| {
        store.table(&table)?;
        let changes = rows
            .iter()
            .map(|v| object_to_document(v).map(Change::Insert).map_err(|e| StoreError::Decode(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        n += changes.len();
        store.commit(&table, changes).map(|_| ())
    });
    if let Err(e) = result {
        store.clear();
        return Err(e);
    }
    log::info!("loaded {n} row(s) from {}", path.display());
    Ok(n)
}
