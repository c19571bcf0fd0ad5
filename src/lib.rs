//! cinelite: a small movie catalogue backend.
//!
//! Every entity (users, movies, ratings, tags, reviews, watchlists, genres,
//! sections, request log) is exposed through the same generic resource
//! handlers: list with `operator(field, value)` filters, `field.asc|desc`
//! sorting and page/limit pagination, plus create, read, update and delete
//! by (possibly compound) id.

pub mod api;
pub mod cli;
pub mod config;
pub mod entity;
pub mod errors;
pub mod logger;
pub mod query;
pub mod resource;
pub mod store;
pub mod utils;

pub use api::{Api, ApiRequest, ApiResponse, Method};
pub use config::Config;
pub use errors::{ApiError, ErrorKind};
pub use store::{MemoryStore, Store};

use std::path::Path;
use std::sync::Arc;

/// Opens a catalogue backed by the snapshot at `data_path`, loading it if present.
///
/// # Errors
/// Fails when the snapshot exists but cannot be read or does not fit the catalogue.
pub fn open(data_path: &Path) -> Result<(Arc<MemoryStore>, Api), store::StoreError> {
    let store = Arc::new(MemoryStore::with_tables(entity::catalogue()));
    store::snapshot::load(&store, data_path)?;
    let api = Api::new(store.clone());
    Ok((store, api))
}
