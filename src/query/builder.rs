use crate::entity::Entity;
use crate::errors::ApiError;

use super::operators::registry;
use super::parse::{parse_filter, parse_sort};
use super::types::{MAX_FILTERS, MAX_SORT_FIELDS, Predicate, Query, SortExpression};

/// Resolves one filter token against entity `E`.
///
/// # Errors
/// The raw token-level error: malformed token, unknown operator or field, bad operand.
pub fn resolve_filter<E: Entity>(token: &str) -> Result<Predicate, ApiError> {
    let expr = parse_filter(token)?;
    let descriptor = registry().get(&expr.operator)?;
    E::check_field(&expr.field)?;
    descriptor.kind.build(&expr.field, &expr.operand)
}

/// Resolves one sort token against entity `E`.
///
/// # Errors
/// `MalformedSortExpression` or `UnknownField`.
pub fn resolve_sort<E: Entity>(token: &str) -> Result<SortExpression, ApiError> {
    let sort = parse_sort(token)?;
    E::check_field(&sort.field)?;
    Ok(sort)
}

/// Composes a deferred query over `E` from raw filter and sort tokens.
///
/// Filters are ANDed in order; sorts chain left to right. The first bad
/// token aborts the whole build.
///
/// # Errors
/// `InvalidParameter` naming the offending token, with the token-level error
/// as its source, or when either list exceeds its cap.
pub fn build_query<E: Entity>(filters: &[String], sorts: &[String]) -> Result<Query, ApiError> {
    if filters.len() > MAX_FILTERS {
        return Err(ApiError::invalid_parameter(format!("at most {MAX_FILTERS} filters are allowed")));
    }
    if sorts.len() > MAX_SORT_FIELDS {
        return Err(ApiError::invalid_parameter(format!("at most {MAX_SORT_FIELDS} sort fields are allowed")));
    }
    let mut query = Query::new(E::TABLE);
    for token in filters {
        let predicate =
            resolve_filter::<E>(token).map_err(|cause| ApiError::invalid_token("filter", token, cause))?;
        query = query.filter(predicate);
    }
    for token in sorts {
        let sort = resolve_sort::<E>(token).map_err(|cause| ApiError::invalid_token("sort", token, cause))?;
        query = query.order_by(sort);
    }
    crate::dev_trace!("built query: {query}");
    Ok(query)
}
