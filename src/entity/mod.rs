//! Entity catalogue: typed records plus the static schema the query engine
//! checks field names against.

mod key;
mod models;

pub use key::CompoundKey;
pub use models::{Genre, Movie, Rating, Request, Review, Section, Tag, User, Watchlist};

use crate::errors::ApiError;
use crate::store::{Column, StoreError, TableSpec};
use bson::Document as BsonDocument;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A persistent record type served by the generic resource handlers.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Name used in error messages (`Movie not found`).
    const NAME: &'static str;
    const TABLE: &'static str;
    /// Primary key components in path order (`user_movie` for `["user", "movie"]`).
    const KEY: &'static [&'static str];
    /// Column whitelist; filters, sorts and payload keys must name one of these.
    const COLUMNS: &'static [Column];
    /// Extra unique constraints besides the primary key.
    const UNIQUE: &'static [&'static [&'static str]] = &[];

    #[must_use]
    fn table_spec() -> TableSpec {
        TableSpec { name: Self::TABLE, columns: Self::COLUMNS, primary_key: Self::KEY, unique: Self::UNIQUE }
    }

    /// Underscore-joined id-field spec used in routes.
    #[must_use]
    fn id_spec() -> String {
        Self::KEY.join("_")
    }

    #[must_use]
    fn has_field(name: &str) -> bool {
        Self::COLUMNS.iter().any(|c| c.name == name)
    }

    /// # Errors
    /// `UnknownField` when `name` is not a column of this entity.
    fn check_field(name: &str) -> Result<(), ApiError> {
        if Self::has_field(name) {
            Ok(())
        } else {
            Err(ApiError::UnknownField { entity: Self::NAME, field: name.to_string() })
        }
    }

    /// # Errors
    /// `InvalidParameter` when the record cannot be represented as a row.
    fn to_row(&self) -> Result<BsonDocument, ApiError> {
        bson::to_document(self).map_err(|e| ApiError::invalid_parameter(e.to_string()))
    }

    /// # Errors
    /// `Internal` when a stored row no longer decodes into the entity.
    fn from_row(row: BsonDocument) -> Result<Self, ApiError> {
        bson::from_document(row).map_err(|e| ApiError::Internal(StoreError::Decode(e.to_string())))
    }
}

/// Table specs for every entity in the catalogue.
#[must_use]
pub fn catalogue() -> Vec<TableSpec> {
    vec![
        User::table_spec(),
        Movie::table_spec(),
        Rating::table_spec(),
        Tag::table_spec(),
        Review::table_spec(),
        Watchlist::table_spec(),
        Genre::table_spec(),
        Section::table_spec(),
        Request::table_spec(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_id_spec_joins_key_fields() {
        assert_eq!(Rating::id_spec(), "user_movie");
        assert_eq!(Tag::id_spec(), "user_movie_name");
        assert_eq!(Movie::id_spec(), "id");
    }

    #[test]
    fn whitelist_rejects_unknown_fields() {
        assert!(Movie::check_field("title").is_ok());
        let err = Movie::check_field("__class__").unwrap_err();
        assert!(matches!(err, ApiError::UnknownField { entity: "Movie", .. }));
    }

    #[test]
    fn every_key_field_is_a_column() {
        for spec in catalogue() {
            for k in spec.primary_key {
                assert!(spec.column(k).is_some(), "{}.{k}", spec.name);
            }
            for constraint in spec.unique {
                for c in *constraint {
                    assert!(spec.column(c).is_some(), "{}.{c}", spec.name);
                }
            }
        }
    }
}
