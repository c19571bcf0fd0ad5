use crate::errors::ApiError;

/// Parses a JSON payload given on the command line or read from stdin.
///
/// # Errors
/// `InvalidParameter` when the text is not JSON.
pub fn parse_payload(text: &str) -> Result<serde_json::Value, ApiError> {
    serde_json::from_str(text.trim()).map_err(|e| ApiError::invalid_parameter(format!("invalid JSON payload: {e}")))
}

/// Path segment for a resource id; `/` would split the route.
#[must_use]
pub fn id_segment(id: &str) -> String {
    id.replace('%', "%25").replace('/', "%2F")
}
