//! Documentation tables: operator help, error responses per entity, and the
//! endpoint listing rendered by `cinelite docs`.

use serde::Serialize;

use crate::errors::ErrorKind;
use crate::query::registry;
use crate::resource::Resources;

pub const SORT_PARAM_DOCS: &str = "Sorting parameter given in the format field.{asc|desc} (e.g. title.asc)";
pub const LIMIT_PARAM_DOCS: &str = "Max number of items per page";

/// `(operator, description)` in registry order.
#[must_use]
pub fn operator_docs() -> Vec<(&'static str, &'static str)> {
    registry().descriptions()
}

/// Help paragraph for the `filter` parameter.
#[must_use]
pub fn filter_param_docs() -> String {
    registry().docs()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDoc {
    pub status: u16,
    pub kind: String,
    pub description: String,
}

/// Error responses an endpoint over `entity` may produce, by status.
#[must_use]
pub fn error_docs(entity: &str, kinds: &[ErrorKind]) -> Vec<ErrorDoc> {
    let mut kinds = kinds.to_vec();
    kinds.sort_by_key(|k| (k.status(), *k));
    kinds.dedup();
    kinds
        .into_iter()
        .map(|k| ErrorDoc { status: k.status(), kind: format!("{k:?}"), description: k.description(entity) })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointDoc {
    pub method: &'static str,
    pub path: String,
    pub summary: String,
    pub errors: Vec<ErrorDoc>,
}

/// The five CRUD endpoints of every registered resource.
#[must_use]
pub fn endpoint_docs(resources: &Resources) -> Vec<EndpointDoc> {
    use ErrorKind::{InvalidParameter, ResourceAlreadyExists, ResourceNotFound, UnknownField};
    let mut out = Vec::new();
    for (route, handler) in resources.routes() {
        let entity = handler.entity();
        let item = format!("/{route}/{{{}}}", handler.id_spec());
        let mut push = |method, path: &str, summary: String, kinds: &[ErrorKind]| {
            out.push(EndpointDoc { method, path: path.to_string(), summary, errors: error_docs(entity, kinds) });
        };
        push("GET", &format!("/{route}"), format!("List {entity} records"), &[InvalidParameter]);
        push("POST", &format!("/{route}"), format!("Create a {entity}"), &[ResourceAlreadyExists, UnknownField]);
        push("GET", &item, format!("Read one {entity}"), &[ResourceNotFound]);
        push("PUT", &item, format!("Update a {entity}"), &[ResourceNotFound, UnknownField]);
        push("DELETE", &item, format!("Delete a {entity}"), &[ResourceNotFound]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_docs_are_sorted_and_deduplicated() {
        let docs = error_docs("Movie", &[ErrorKind::ResourceNotFound, ErrorKind::UnknownField, ErrorKind::UnknownField]);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].status, 400);
        assert_eq!(docs[1].status, 404);
        assert_eq!(docs[1].description, "Movie not found");
    }

    #[test]
    fn endpoints_use_compound_id_spec() {
        let docs = endpoint_docs(&Resources::standard());
        assert!(docs.iter().any(|d| d.method == "PUT" && d.path == "/ratings/{user_movie}"));
        assert_eq!(docs.len(), Resources::standard().routes().count() * 5);
    }

    #[test]
    fn filter_docs_list_every_operator() {
        let text = filter_param_docs();
        for (name, _) in operator_docs() {
            assert!(text.contains(&format!("**-{name}**")));
        }
    }
}
