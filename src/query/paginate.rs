use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::errors::ApiError;
use crate::store::Store;
use crate::utils::num::{div_ceil_u64, u128_to_u64_saturating};
use bson::Document as BsonDocument;

use super::types::Query;

/// One page of results plus the navigation metadata clients rely on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub items_per_page: u64,
    pub has_next: bool,
    pub has_prev: bool,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page: self.page,
            total_pages: self.total_pages,
            total_items: self.total_items,
            items_per_page: self.items_per_page,
            has_next: self.has_next,
            has_prev: self.has_prev,
            items: self.items.into_iter().map(f).collect(),
        }
    }

    /// # Errors
    /// The first error returned by `f`.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        let items = self.items.into_iter().map(f).collect::<Result<Vec<U>, E>>()?;
        Ok(Page {
            page: self.page,
            total_pages: self.total_pages,
            total_items: self.total_items,
            items_per_page: self.items_per_page,
            has_next: self.has_next,
            has_prev: self.has_prev,
            items,
        })
    }
}

/// `max(1, ceil(total / limit))`; an empty result still has one (empty) page.
#[must_use]
pub fn total_pages(total: u64, limit: u64) -> u64 {
    if limit == 0 { 1 } else { div_ceil_u64(total, limit).max(1) }
}

/// Runs `query` as one count then one bounded fetch.
///
/// `page` is 1-based. The page bound is checked against the count before any
/// rows are fetched, including for empty results where only page 1 exists.
///
/// # Errors
/// `InvalidParameter` for `limit == 0` or a page outside `1..=total_pages`;
/// `Internal` when the store fails.
pub fn paginate(store: &dyn Store, query: &Query, page: u64, limit: u64) -> Result<Page<BsonDocument>, ApiError> {
    if limit == 0 {
        return Err(ApiError::invalid_parameter("limit must be greater than zero"));
    }
    let started = Instant::now();
    let total_items = store.count(query).map_err(ApiError::Internal)?;
    let total_pages = total_pages(total_items, limit);
    if page == 0 || page > total_pages {
        return Err(ApiError::invalid_parameter("page number exceeds limits"));
    }
    let offset = (page - 1).saturating_mul(limit);
    let items = store.fetch(query, offset, Some(limit)).map_err(ApiError::Internal)?;
    let elapsed = started.elapsed().as_millis();
    crate::dev_trace!(
        "paginate {query} page={page} limit={limit} total={total_items} took={}ms",
        u128_to_u64_saturating(elapsed)
    );
    super::telemetry::log_query(&query.table, &query.to_string(), elapsed, page, limit, total_items);
    Ok(Page {
        page,
        total_pages,
        total_items,
        items_per_page: limit,
        has_next: page < total_pages,
        has_prev: page > 1,
        items,
    })
}
