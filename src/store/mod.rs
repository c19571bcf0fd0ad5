//! Storage collaborator interface and the in-memory backend.

pub mod eval;
mod memory;
mod schema;
pub mod snapshot;

pub use memory::MemoryStore;
pub use schema::{Column, ColumnKind, TableSpec};

use crate::query::Query;
use bson::{Bson, Document as BsonDocument};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Table not found: {0}")]
    NoSuchTable(String),

    #[error("Column not found: {table}.{column}")]
    NoSuchColumn { table: String, column: String },

    #[error("Unique constraint violated: {table}({})", columns.join(", "))]
    UniqueViolation { table: String, columns: Vec<String> },

    #[error("Row not found in {0}")]
    RowNotFound(String),

    #[error("Invalid value for {table}.{column}: {reason}")]
    InvalidValue { table: String, column: String, reason: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Snapshot(e.to_string())
    }
}

/// Primary key values of one row, in key-column order.
#[derive(Debug, Clone, PartialEq)]
pub struct RowKey(pub Vec<Bson>);

impl RowKey {
    #[must_use]
    pub fn of(spec: &TableSpec, row: &BsonDocument) -> Self {
        Self(spec.primary_key.iter().map(|k| row.get(*k).cloned().unwrap_or(Bson::Null)).collect())
    }
}

/// A staged write.
#[derive(Debug, Clone)]
pub enum Change {
    Insert(BsonDocument),
    /// Insert with the single integer key set to one past the current maximum.
    InsertNextKey(BsonDocument),
    Replace { key: RowKey, row: BsonDocument },
    Delete(RowKey),
}

/// What the core needs from a storage backend.
pub trait Store: Send + Sync {
    /// # Errors
    /// `NoSuchTable` when the table is not declared.
    fn table(&self, name: &str) -> Result<TableSpec, StoreError>;

    /// Number of rows matching the query.
    ///
    /// # Errors
    /// `NoSuchTable` / `NoSuchColumn` for a query naming unknown storage.
    fn count(&self, query: &Query) -> Result<u64, StoreError>;

    /// Matching rows in query order, skipping `offset` and returning at most `limit`.
    ///
    /// # Errors
    /// `NoSuchTable` / `NoSuchColumn` for a query naming unknown storage.
    fn fetch(&self, query: &Query, offset: u64, limit: Option<u64>) -> Result<Vec<BsonDocument>, StoreError>;

    /// Applies all changes atomically; on error nothing is applied.
    /// Returns the stored form of every inserted or replaced row, in order.
    ///
    /// # Errors
    /// `UniqueViolation`, `RowNotFound` or `InvalidValue` from any change.
    fn commit(&self, table: &str, changes: Vec<Change>) -> Result<Vec<BsonDocument>, StoreError>;
}

/// Unit of work over one table. Changes are staged locally and reach the
/// store only on `commit`; dropping the session discards them.
pub struct Session<'s> {
    store: &'s dyn Store,
    table: &'static str,
    pending: Vec<Change>,
}

impl<'s> Session<'s> {
    pub fn new(store: &'s dyn Store, table: &'static str) -> Self {
        Self { store, table, pending: Vec::new() }
    }

    pub fn add(&mut self, row: BsonDocument) {
        self.pending.push(Change::Insert(row));
    }

    /// Stages an insert whose integer key the store assigns at commit time.
    pub fn add_with_next_key(&mut self, row: BsonDocument) {
        self.pending.push(Change::InsertNextKey(row));
    }

    pub fn replace(&mut self, key: RowKey, row: BsonDocument) {
        self.pending.push(Change::Replace { key, row });
    }

    pub fn delete(&mut self, key: RowKey) {
        self.pending.push(Change::Delete(key));
    }

    /// Commits the staged changes and returns the refreshed rows.
    ///
    /// # Errors
    /// Whatever the store rejects; the session is rolled back in that case.
    pub fn commit(mut self) -> Result<Vec<BsonDocument>, StoreError> {
        let changes = std::mem::take(&mut self.pending);
        let n = changes.len();
        let rows = self.store.commit(self.table, changes)?;
        crate::query::telemetry::record_write(self.table, n);
        Ok(rows)
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("rolled back {} staged change(s) on {}", self.pending.len(), self.table);
        }
    }
}
