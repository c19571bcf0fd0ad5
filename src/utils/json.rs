use crate::errors::ApiError;
use bson::{Bson, Document as BsonDocument};

/// Convert a JSON value that must be an object into a BSON document.
///
/// # Errors
/// `InvalidParameter` when the value is not an object.
pub fn object_to_document(val: &serde_json::Value) -> Result<BsonDocument, ApiError> {
    if !val.is_object() {
        return Err(ApiError::invalid_parameter("expected JSON object"));
    }
    bson::to_document(val).map_err(|e| ApiError::invalid_parameter(e.to_string()))
}

/// Relaxed JSON rendering of a stored row.
#[must_use]
pub fn document_to_json(doc: &BsonDocument) -> serde_json::Value {
    Bson::Document(doc.clone()).into_relaxed_extjson()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_converts() {
        let d = object_to_document(&serde_json::json!({"a": 1, "b": "x"})).unwrap();
        assert_eq!(d.get_str("b").unwrap(), "x");
        assert!(d.get("a").is_some());
    }

    #[test]
    fn arrays_are_rejected() {
        let e = object_to_document(&serde_json::json!([1, 2, 3])).unwrap_err();
        assert!(matches!(e, ApiError::InvalidParameter { .. }));
    }

    #[test]
    fn rows_render_as_plain_json() {
        let row = bson::doc! {"id": 3_i64, "rating": 7.5, "title": Bson::Null};
        assert_eq!(document_to_json(&row), serde_json::json!({"id": 3, "rating": 7.5, "title": null}));
    }
}
