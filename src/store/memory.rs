use bson::{Bson, Document as BsonDocument};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;

use super::eval::{compare_bson, compare_rows, matches};
use super::schema::{ColumnKind, TableSpec};
use super::{Change, RowKey, Store, StoreError};
use crate::query::Query;
use crate::utils::num::u64_to_usize;

#[derive(Debug, Clone)]
struct Row {
    // Insertion sequence; the final tie-breaker for ordering.
    rowid: u64,
    data: BsonDocument,
}

#[derive(Debug)]
struct Table {
    spec: TableSpec,
    rows: Vec<Row>,
    next_rowid: u64,
}

impl Table {
    fn check_query(&self, query: &Query) -> Result<(), StoreError> {
        let fields = query
            .predicates
            .iter()
            .map(crate::query::Predicate::field)
            .chain(query.order.iter().map(|s| s.field.as_str()));
        for field in fields {
            if self.spec.column(field).is_none() {
                return Err(StoreError::NoSuchColumn {
                    table: self.spec.name.to_string(),
                    column: field.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Coerces every column of `row`, filling missing nullable columns with NULL.
    fn normalize(&self, row: &BsonDocument) -> Result<BsonDocument, StoreError> {
        let invalid = |column: &str, reason: String| StoreError::InvalidValue {
            table: self.spec.name.to_string(),
            column: column.to_string(),
            reason,
        };
        if let Some(extra) = row.keys().find(|k| self.spec.column(k).is_none()) {
            return Err(invalid(extra, "unknown column".to_string()));
        }
        let mut out = BsonDocument::new();
        for column in self.spec.columns {
            let value = match row.get(column.name) {
                None | Some(Bson::Null) if column.nullable => Bson::Null,
                None | Some(Bson::Null) => return Err(invalid(column.name, "NOT NULL".to_string())),
                Some(v) => column.kind.coerce(v).map_err(|reason| invalid(column.name, reason))?,
            };
            out.insert(column.name, value);
        }
        Ok(out)
    }

    fn check_unique(&self, rows: &[Row], candidate: &BsonDocument, skip: Option<usize>) -> Result<(), StoreError> {
        for constraint in self.spec.constraints() {
            let values: Vec<&Bson> =
                constraint.iter().map(|c| candidate.get(*c).unwrap_or(&Bson::Null)).collect();
            // NULLs never collide, as in SQL
            if values.iter().any(|v| matches!(v, Bson::Null)) {
                continue;
            }
            let clash = rows.iter().enumerate().any(|(i, r)| {
                Some(i) != skip
                    && constraint.iter().zip(&values).all(|(c, v)| {
                        r.data.get(*c).is_some_and(|x| compare_bson(x, v) == Ordering::Equal)
                    })
            });
            if clash {
                return Err(StoreError::UniqueViolation {
                    table: self.spec.name.to_string(),
                    columns: constraint.iter().map(|c| (*c).to_string()).collect(),
                });
            }
        }
        Ok(())
    }

    fn insert(&self, rows: &mut Vec<Row>, next_rowid: &mut u64, row: &BsonDocument) -> Result<BsonDocument, StoreError> {
        let row = self.normalize(row)?;
        self.check_unique(rows, &row, None)?;
        rows.push(Row { rowid: *next_rowid, data: row.clone() });
        *next_rowid += 1;
        Ok(row)
    }

    /// Next value of a single integer primary key, computed over `rows`.
    fn next_key(&self, rows: &[Row]) -> Result<(&'static str, i64), StoreError> {
        let key = match self.spec.primary_key {
            [key] if self.spec.column(key).is_some_and(|c| c.kind == ColumnKind::Integer) => *key,
            _ => {
                return Err(StoreError::InvalidValue {
                    table: self.spec.name.to_string(),
                    column: self.spec.primary_key.join("_"),
                    reason: "key is not a single integer column".to_string(),
                });
            }
        };
        let max = rows
            .iter()
            .filter_map(|r| match r.data.get(key) {
                Some(Bson::Int64(n)) => Some(*n),
                Some(Bson::Int32(n)) => Some(i64::from(*n)),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        Ok((key, max + 1))
    }

    fn position(&self, rows: &[Row], key: &RowKey) -> Result<usize, StoreError> {
        rows.iter()
            .position(|r| RowKey::of(&self.spec, &r.data) == *key)
            .ok_or_else(|| StoreError::RowNotFound(self.spec.name.to_string()))
    }
}

/// Schema-aware in-memory backend. Rows keep insertion order, so identical
/// queries over unchanged data return identical results.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with every table in `specs` declared.
    #[must_use]
    pub fn with_tables(specs: impl IntoIterator<Item = TableSpec>) -> Self {
        let store = Self::new();
        for spec in specs {
            store.create_table(spec);
        }
        store
    }

    /// Declares a table. Returns false if it already exists.
    pub fn create_table(&self, spec: TableSpec) -> bool {
        let mut tables = self.tables.write();
        if tables.contains_key(spec.name) {
            return false;
        }
        tables.insert(spec.name.to_string(), Table { spec, rows: Vec::new(), next_rowid: 1 });
        true
    }

    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// All rows of a table in insertion order.
    ///
    /// # Errors
    /// `NoSuchTable` when the table is not declared.
    pub fn rows(&self, table: &str) -> Result<Vec<BsonDocument>, StoreError> {
        let tables = self.tables.read();
        let t = tables.get(table).ok_or_else(|| StoreError::NoSuchTable(table.to_string()))?;
        Ok(t.rows.iter().map(|r| r.data.clone()).collect())
    }

    /// Removes every row of every table, keeping the declarations.
    pub fn clear(&self) {
        for t in self.tables.write().values_mut() {
            t.rows.clear();
            t.next_rowid = 1;
        }
    }
}

impl Store for MemoryStore {
    fn table(&self, name: &str) -> Result<TableSpec, StoreError> {
        self.tables
            .read()
            .get(name)
            .map(|t| t.spec)
            .ok_or_else(|| StoreError::NoSuchTable(name.to_string()))
    }

    fn count(&self, query: &Query) -> Result<u64, StoreError> {
        let tables = self.tables.read();
        let t = tables.get(&query.table).ok_or_else(|| StoreError::NoSuchTable(query.table.clone()))?;
        t.check_query(query)?;
        let n = t.rows.iter().filter(|r| matches(&t.spec, &r.data, &query.predicates)).count();
        Ok(crate::utils::num::usize_to_u64(n))
    }

    fn fetch(&self, query: &Query, offset: u64, limit: Option<u64>) -> Result<Vec<BsonDocument>, StoreError> {
        let tables = self.tables.read();
        let t = tables.get(&query.table).ok_or_else(|| StoreError::NoSuchTable(query.table.clone()))?;
        t.check_query(query)?;
        let mut hits: Vec<&Row> =
            t.rows.iter().filter(|r| matches(&t.spec, &r.data, &query.predicates)).collect();
        if !query.order.is_empty() {
            hits.sort_by(|a, b| {
                compare_rows(&a.data, &b.data, &query.order).then_with(|| a.rowid.cmp(&b.rowid))
            });
        }
        let skip = u64_to_usize(offset).unwrap_or(usize::MAX);
        let take = limit.and_then(u64_to_usize).unwrap_or(usize::MAX);
        Ok(hits.into_iter().skip(skip).take(take).map(|r| r.data.clone()).collect())
    }

    fn commit(&self, table: &str, changes: Vec<Change>) -> Result<Vec<BsonDocument>, StoreError> {
        let mut tables = self.tables.write();
        let t = tables.get_mut(table).ok_or_else(|| StoreError::NoSuchTable(table.to_string()))?;
        // Work on a copy so a failing change leaves the table untouched.
        let mut rows = t.rows.clone();
        let mut next_rowid = t.next_rowid;
        let mut written = Vec::new();
        for change in changes {
            match change {
                Change::Insert(row) => {
                    written.push(t.insert(&mut rows, &mut next_rowid, &row)?);
                }
                Change::InsertNextKey(mut row) => {
                    // Assigned under the write lock, so concurrent commits never share a key.
                    let (key, next) = t.next_key(&rows)?;
                    row.insert(key, next);
                    written.push(t.insert(&mut rows, &mut next_rowid, &row)?);
                }
                Change::Replace { key, row } => {
                    let at = t.position(&rows, &key)?;
                    let row = t.normalize(&row)?;
                    t.check_unique(&rows, &row, Some(at))?;
                    rows[at].data = row.clone();
                    written.push(row);
                }
                Change::Delete(key) => {
                    let at = t.position(&rows, &key)?;
                    rows.remove(at);
                }
            }
        }
        t.rows = rows;
        t.next_rowid = next_rowid;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, Rating};
    use crate::query::{Direction, Predicate, SortExpression};
    use bson::doc;

    fn store() -> MemoryStore {
        MemoryStore::with_tables([Rating::table_spec()])
    }

    fn rating(user: i64, movie: i64, value: f64) -> BsonDocument {
        doc! {"user": user, "movie": movie, "rating": value, "timestamp": 0_i64}
    }

    #[test]
    fn commit_is_all_or_nothing() {
        let s = store();
        s.commit("rating", vec![Change::Insert(rating(1, 1, 3.0))]).unwrap();
        let err = s
            .commit("rating", vec![Change::Insert(rating(1, 2, 4.0)), Change::Insert(rating(1, 1, 5.0))])
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }));
        assert_eq!(s.rows("rating").unwrap().len(), 1);
    }

    #[test]
    fn insert_normalizes_numbers() {
        let s = store();
        let written = s
            .commit("rating", vec![Change::Insert(doc! {"user": 1, "movie": 2, "rating": 4, "timestamp": 9})])
            .unwrap();
        assert_eq!(written[0].get("user"), Some(&Bson::Int64(1)));
        assert_eq!(written[0].get("rating"), Some(&Bson::Double(4.0)));
    }

    #[test]
    fn not_null_and_unknown_columns_are_rejected() {
        let s = store();
        let err = s.commit("rating", vec![Change::Insert(doc! {"user": 1, "movie": 2})]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidValue { ref column, .. } if column == "rating"));
        let err = s
            .commit("rating", vec![Change::Insert(doc! {"user": 1, "movie": 2, "rating": 1.0, "timestamp": 0, "x": 1})])
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidValue { ref column, .. } if column == "x"));
    }

    #[test]
    fn replace_and_delete_by_key() {
        let s = store();
        s.commit("rating", vec![Change::Insert(rating(1, 1, 3.0)), Change::Insert(rating(2, 1, 2.0))]).unwrap();
        let key = RowKey(vec![Bson::Int64(1), Bson::Int64(1)]);
        s.commit("rating", vec![Change::Replace { key: key.clone(), row: rating(1, 1, 5.0) }]).unwrap();
        let q = Query::new("rating").filter(Predicate::Eq { field: "rating".into(), literal: "5".into() });
        assert_eq!(s.count(&q).unwrap(), 1);
        s.commit("rating", vec![Change::Delete(key.clone())]).unwrap();
        assert_eq!(s.rows("rating").unwrap().len(), 1);
        let err = s.commit("rating", vec![Change::Delete(key)]).unwrap_err();
        assert!(matches!(err, StoreError::RowNotFound(_)));
    }

    #[test]
    fn next_key_inserts_count_up_from_the_largest_key() {
        let s = MemoryStore::with_tables([crate::entity::Request::table_spec()]);
        let entry = |path: &str| doc! {"path": path, "verb": "GET", "start_time": 0.0, "with_token": false};
        let mut seeded = entry("/seed");
        seeded.insert("id", 41_i64);
        s.commit("request", vec![Change::Insert(seeded)]).unwrap();
        let written = s
            .commit("request", vec![Change::InsertNextKey(entry("/a")), Change::InsertNextKey(entry("/b"))])
            .unwrap();
        let ids: Vec<i64> = written.iter().map(|d| d.get_i64("id").unwrap()).collect();
        assert_eq!(ids, vec![42, 43]);
    }

    #[test]
    fn next_key_needs_a_single_integer_key() {
        let err = store().commit("rating", vec![Change::InsertNextKey(rating(1, 1, 1.0))]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidValue { .. }));
        assert!(store().rows("rating").unwrap().is_empty());
    }

    #[test]
    fn fetch_orders_then_slices() {
        let s = store();
        let rows = (1..=5).map(|m| Change::Insert(rating(1, m, (m % 3) as f64))).collect();
        s.commit("rating", rows).unwrap();
        let q = Query::new("rating")
            .order_by(SortExpression { field: "rating".into(), direction: Direction::Desc });
        let page = s.fetch(&q, 1, Some(2)).unwrap();
        let movies: Vec<i64> = page.iter().map(|d| d.get_i64("movie").unwrap()).collect();
        // ratings: m1=1, m2=2, m3=0, m4=1, m5=2 -> desc with insertion tie-break: 2,5,1,4,3
        assert_eq!(movies, vec![5, 1]);
    }

    #[test]
    fn unknown_columns_in_queries_are_errors() {
        let s = store();
        let q = Query::new("rating").filter(Predicate::Eq { field: "nope".into(), literal: "1".into() });
        assert!(matches!(s.count(&q), Err(StoreError::NoSuchColumn { .. })));
        assert!(matches!(s.count(&Query::new("nope")), Err(StoreError::NoSuchTable(_))));
    }
}
