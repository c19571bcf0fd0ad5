//! Generic resource handlers and the route-name registry that binds them to
//! every entity type.

mod handlers;

pub use handlers::{create, delete, list, read, update};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;

use crate::entity::{Entity, Genre, Movie, Rating, Request, Review, Section, Tag, User, Watchlist};
use crate::errors::ApiError;
use crate::store::{Store, StoreError};
use crate::utils::num::i64_to_u64;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 1000;

/// Page size policy applied to list requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLimits {
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self { default_page_size: DEFAULT_PAGE_SIZE, max_page_size: MAX_PAGE_SIZE }
    }
}

/// List query parameters, shaped like the query string (`filter` and `sort` repeat).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub page: i64,
    pub limit: Option<i64>,
    pub sort: Vec<String>,
    pub filter: Vec<String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self { page: 1, limit: None, sort: Vec::new(), filter: Vec::new() }
    }
}

impl ListParams {
    /// Builds params from decoded query pairs. Unrelated keys are ignored.
    ///
    /// # Errors
    /// `InvalidParameter` when `page` or `limit` is not an integer.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self, ApiError> {
        let int = |name: &str, v: &str| {
            v.parse::<i64>().map_err(|_| ApiError::invalid_parameter(format!("{name} must be an integer")))
        };
        let mut params = Self::default();
        for (k, v) in pairs {
            match k {
                "page" => params.page = int(k, v)?,
                "limit" => params.limit = Some(int(k, v)?),
                "sort" => params.sort.push(v.to_string()),
                "filter" => params.filter.push(v.to_string()),
                _ => {}
            }
        }
        Ok(params)
    }

    /// Validated `(page, limit)`.
    ///
    /// # Errors
    /// `InvalidParameter` for a non-positive page or a limit outside `1..=max_page_size`.
    pub fn resolve(&self, limits: &PageLimits) -> Result<(u64, u64), ApiError> {
        let page = i64_to_u64(self.page)
            .filter(|p| *p > 0)
            .ok_or_else(|| ApiError::invalid_parameter("page number exceeds limits"))?;
        let limit = match self.limit {
            None => limits.default_page_size,
            Some(l) => i64_to_u64(l)
                .filter(|l| (1..=limits.max_page_size).contains(l))
                .ok_or_else(|| {
                    ApiError::invalid_parameter(format!("limit must be between 1 and {}", limits.max_page_size))
                })?,
        };
        Ok((page, limit))
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(StoreError::Decode(e.to_string())))
}

/// Type-erased handler set for one entity: JSON in, JSON out.
pub trait ResourceHandler: Send + Sync {
    fn entity(&self) -> &'static str;
    fn id_spec(&self) -> String;
    fn list(&self, store: &dyn Store, params: &ListParams, limits: &PageLimits) -> Result<Value, ApiError>;
    fn create(&self, store: &dyn Store, body: &Value) -> Result<Value, ApiError>;
    fn read(&self, store: &dyn Store, id: &str) -> Result<Value, ApiError>;
    fn update(&self, store: &dyn Store, id: &str, body: &Value) -> Result<Value, ApiError>;
    fn delete(&self, store: &dyn Store, id: &str) -> Result<(), ApiError>;
}

pub struct Handler<E>(PhantomData<fn() -> E>);

impl<E> Default for Handler<E> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<E: Entity> ResourceHandler for Handler<E> {
    fn entity(&self) -> &'static str {
        E::NAME
    }

    fn id_spec(&self) -> String {
        E::id_spec()
    }

    fn list(&self, store: &dyn Store, params: &ListParams, limits: &PageLimits) -> Result<Value, ApiError> {
        to_json(&list::<E>(store, params, limits)?)
    }

    fn create(&self, store: &dyn Store, body: &Value) -> Result<Value, ApiError> {
        to_json(&create::<E>(store, body)?)
    }

    fn read(&self, store: &dyn Store, id: &str) -> Result<Value, ApiError> {
        to_json(&read::<E>(store, id)?)
    }

    fn update(&self, store: &dyn Store, id: &str, body: &Value) -> Result<Value, ApiError> {
        to_json(&update::<E>(store, id, body)?)
    }

    fn delete(&self, store: &dyn Store, id: &str) -> Result<(), ApiError> {
        delete::<E>(store, id)
    }
}

/// Route name to handler set.
pub struct Resources {
    by_route: BTreeMap<&'static str, Box<dyn ResourceHandler>>,
}

impl Resources {
    #[must_use]
    pub fn empty() -> Self {
        Self { by_route: BTreeMap::new() }
    }

    /// Every entity of the catalogue under its plural route name.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .with::<User>("users")
            .with::<Movie>("movies")
            .with::<Rating>("ratings")
            .with::<Tag>("tags")
            .with::<Review>("reviews")
            .with::<Watchlist>("watchlists")
            .with::<Genre>("genres")
            .with::<Section>("sections")
            .with::<Request>("requests")
    }

    #[must_use]
    pub fn with<E: Entity>(mut self, route: &'static str) -> Self {
        self.by_route.insert(route, Box::new(Handler::<E>::default()));
        self
    }

    #[must_use]
    pub fn get(&self, route: &str) -> Option<&dyn ResourceHandler> {
        self.by_route.get(route).map(|h| &**h)
    }

    pub fn routes(&self) -> impl Iterator<Item = (&'static str, &dyn ResourceHandler)> + '_ {
        self.by_route.iter().map(|(r, h)| (*r, &**h))
    }
}
