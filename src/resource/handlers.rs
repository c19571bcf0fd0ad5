//! Typed list/create/read/update/delete over any [`Entity`].

use bson::Document as BsonDocument;
use serde_json::{Map, Value};

use crate::entity::{CompoundKey, Entity};
use crate::errors::ApiError;
use crate::query::{Page, Query, build_query, paginate};
use crate::store::{RowKey, Session, Store, StoreError};

use super::{ListParams, PageLimits};

fn payload_object<'a, E: Entity>(body: &'a Value) -> Result<&'a Map<String, Value>, ApiError> {
    let obj = body
        .as_object()
        .ok_or_else(|| ApiError::invalid_parameter(format!("{} payload must be a JSON object", E::NAME)))?;
    for key in obj.keys() {
        E::check_field(key)?;
    }
    Ok(obj)
}

fn decode_payload<E: Entity>(value: Value) -> Result<E, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::invalid_parameter(format!("invalid {} payload: {e}", E::NAME)))
}

/// The stored row identified by `id`, together with its storage key.
fn find_row<E: Entity>(store: &dyn Store, id: &str) -> Result<(RowKey, BsonDocument), ApiError> {
    let key = CompoundKey::parse(E::KEY, id)?;
    let query = key.predicates().into_iter().fold(Query::new(E::TABLE), Query::filter);
    let row = store
        .fetch(&query, 0, Some(1))
        .map_err(ApiError::Internal)?
        .into_iter()
        .next()
        .ok_or(ApiError::ResourceNotFound(E::NAME))?;
    Ok((RowKey::of(&E::table_spec(), &row), row))
}

fn single_row(mut written: Vec<BsonDocument>) -> Result<BsonDocument, ApiError> {
    written.pop().ok_or_else(|| ApiError::Internal(StoreError::Decode("commit returned no row".to_string())))
}

/// # Errors
/// `InvalidParameter` for bad tokens or page bounds; `Internal` on store failure.
pub fn list<E: Entity>(store: &dyn Store, params: &ListParams, limits: &PageLimits) -> Result<Page<E>, ApiError> {
    let (page, limit) = params.resolve(limits)?;
    let query = build_query::<E>(&params.filter, &params.sort)?;
    paginate(store, &query, page, limit)?.try_map(E::from_row)
}

/// # Errors
/// `UnknownField` / `InvalidParameter` for a bad payload;
/// `ResourceAlreadyExists` when a unique key is taken (nothing is written).
pub fn create<E: Entity>(store: &dyn Store, body: &Value) -> Result<E, ApiError> {
    payload_object::<E>(body)?;
    let record: E = decode_payload(body.clone())?;
    let mut session = Session::new(store, E::TABLE);
    session.add(record.to_row()?);
    let written = session.commit().map_err(|e| ApiError::from_store(E::NAME, e))?;
    log::info!("created {} {}", E::NAME, E::id_spec());
    E::from_row(single_row(written)?)
}

/// # Errors
/// `ResourceNotFound` when no row matches `id`; `InvalidParameter` for a malformed compound id.
pub fn read<E: Entity>(store: &dyn Store, id: &str) -> Result<E, ApiError> {
    let (_, row) = find_row::<E>(store, id)?;
    E::from_row(row)
}

/// Merges `body` over the stored record and writes it back.
///
/// Every key of `body` must be a field of `E`; this is checked before the
/// store is touched.
///
/// # Errors
/// `UnknownField`, `ResourceNotFound`, `InvalidParameter`, or
/// `ResourceAlreadyExists` when the change collides with another row.
pub fn update<E: Entity>(store: &dyn Store, id: &str, body: &Value) -> Result<E, ApiError> {
    let changes = payload_object::<E>(body)?;
    let (key, row) = find_row::<E>(store, id)?;
    let current = E::from_row(row)?;
    let mut merged = match serde_json::to_value(&current) {
        Ok(Value::Object(m)) => m,
        Ok(_) => return Err(ApiError::Internal(StoreError::Decode(format!("{} is not a record", E::NAME)))),
        Err(e) => return Err(ApiError::Internal(StoreError::Decode(e.to_string()))),
    };
    for (k, v) in changes {
        merged.insert(k.clone(), v.clone());
    }
    let record: E = decode_payload(Value::Object(merged))?;
    let mut session = Session::new(store, E::TABLE);
    session.replace(key, record.to_row()?);
    let written = session.commit().map_err(|e| ApiError::from_store(E::NAME, e))?;
    log::info!("updated {} {id}", E::NAME);
    E::from_row(single_row(written)?)
}

/// # Errors
/// `ResourceNotFound` when no row matches `id`.
pub fn delete<E: Entity>(store: &dyn Store, id: &str) -> Result<(), ApiError> {
    let (key, _) = find_row::<E>(store, id)?;
    let mut session = Session::new(store, E::TABLE);
    session.delete(key);
    session.commit().map_err(|e| ApiError::from_store(E::NAME, e))?;
    log::info!("deleted {} {id}", E::NAME);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Genre, Rating, catalogue};
    use crate::store::{Change, MemoryStore, TableSpec};
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::with_tables(catalogue())
    }

    #[test]
    fn create_then_read_by_compound_id() {
        let s = store();
        let created: Rating = create(&s, &json!({"user": 3, "movie": 7, "rating": 4.5, "timestamp": 1})).unwrap();
        assert_eq!(created.rating, 4.5);
        let read_back: Rating = read(&s, "3_7").unwrap();
        assert_eq!(read_back, created);
        assert!(matches!(read::<Rating>(&s, "3_8"), Err(ApiError::ResourceNotFound("Rating"))));
    }

    #[test]
    fn create_rejects_unknown_keys() {
        let s = store();
        let err = create::<Genre>(&s, &json!({"id": "Drama", "colour": "red"})).unwrap_err();
        assert!(matches!(err, ApiError::UnknownField { entity: "Genre", .. }));
        assert!(s.rows("genre").unwrap().is_empty());
    }

    #[test]
    fn create_rejects_bad_shapes() {
        let s = store();
        assert!(matches!(create::<Genre>(&s, &json!(["Drama"])), Err(ApiError::InvalidParameter { .. })));
        assert!(matches!(
            create::<Rating>(&s, &json!({"user": "x", "movie": 1, "rating": 1.0})),
            Err(ApiError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn update_merges_and_delete_removes() {
        let s = store();
        create::<Rating>(&s, &json!({"user": 1, "movie": 2, "rating": 2.0, "timestamp": 5})).unwrap();
        let updated: Rating = update(&s, "1_2", &json!({"rating": 3.5})).unwrap();
        assert_eq!((updated.rating, updated.timestamp), (3.5, 5));
        delete::<Rating>(&s, "1_2").unwrap();
        assert!(matches!(delete::<Rating>(&s, "1_2"), Err(ApiError::ResourceNotFound(_))));
    }

    /// Empties a table right before each commit, as a concurrent delete would.
    struct Vanishing(MemoryStore);

    impl Store for Vanishing {
        fn table(&self, name: &str) -> Result<TableSpec, StoreError> {
            self.0.table(name)
        }

        fn count(&self, query: &Query) -> Result<u64, StoreError> {
            self.0.count(query)
        }

        fn fetch(&self, query: &Query, offset: u64, limit: Option<u64>) -> Result<Vec<BsonDocument>, StoreError> {
            self.0.fetch(query, offset, limit)
        }

        fn commit(&self, table: &str, changes: Vec<Change>) -> Result<Vec<BsonDocument>, StoreError> {
            self.0.clear();
            self.0.commit(table, changes)
        }
    }

    #[test]
    fn rows_deleted_before_commit_are_not_found() {
        let s = store();
        create::<Rating>(&s, &json!({"user": 1, "movie": 2, "rating": 2.0})).unwrap();
        let racing = Vanishing(s);
        let err = update::<Rating>(&racing, "1_2", &json!({"rating": 3.0})).unwrap_err();
        assert!(matches!(err, ApiError::ResourceNotFound("Rating")));
        create::<Rating>(&racing.0, &json!({"user": 1, "movie": 2, "rating": 2.0})).unwrap();
        let err = delete::<Rating>(&racing, "1_2");
        assert!(matches!(err, Err(ApiError::ResourceNotFound("Rating"))));
    }
}
