//! Framework-neutral request dispatcher over the resource registry.
//!
//! Routes per resource `r`: `GET /r`, `POST /r`, `GET /r/{id}`, `PUT /r/{id}`,
//! `DELETE /r/{id}`. Also `GET /operators` and `GET /sections/{id}/movies`,
//! which lists movies through the section's stored filter and sort tokens.

pub mod docs;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::entity::{Entity, Movie, Request, Section};
use crate::errors::ApiError;
use crate::resource::{ListParams, PageLimits, Resources, list, read};
use crate::store::{Session, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            other => Err(ApiError::invalid_parameter(format!("unsupported method {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    /// Decoded query pairs in arrival order; `filter` and `sort` may repeat.
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub token: Option<String>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: None, token: None }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    #[must_use]
    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    #[must_use]
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn params(&self) -> Result<ListParams, ApiError> {
        ListParams::from_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    fn body(&self) -> &Value {
        self.body.as_ref().unwrap_or(&Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    #[must_use]
    pub fn error(err: &ApiError) -> Self {
        Self { status: err.status(), body: json!({ "detail": err.client_message() }) }
    }

    #[must_use]
    pub fn route_not_found() -> Self {
        Self { status: 404, body: json!({ "detail": "route not found" }) }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

enum Outcome {
    Done(Result<Value, ApiError>),
    NoRoute,
}

/// Binds the resource registry to one store.
pub struct Api {
    store: Arc<dyn Store>,
    resources: Resources,
    limits: PageLimits,
    record_requests: bool,
}

impl Api {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store, resources: Resources::standard(), limits: PageLimits::default(), record_requests: false }
    }

    #[must_use]
    pub fn with_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn with_resources(mut self, resources: Resources) -> Self {
        self.resources = resources;
        self
    }

    /// Record every dispatched request into the `request` table.
    #[must_use]
    pub fn recording_requests(mut self, enabled: bool) -> Self {
        self.record_requests = enabled;
        self
    }

    #[must_use]
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn dispatch(&self, req: &ApiRequest) -> ApiResponse {
        let start_time = unix_seconds();
        let response = match self.route(req) {
            Outcome::NoRoute => ApiResponse::route_not_found(),
            Outcome::Done(Ok(body)) => ApiResponse::ok(body),
            Outcome::Done(Err(err)) => {
                match &err {
                    ApiError::Internal(source) => log::error!("{} {} failed: {source}", req.method, req.path),
                    other => log::debug!("{} {} rejected: {other}", req.method, req.path),
                }
                ApiResponse::error(&err)
            }
        };
        log::info!("{} {} -> {}", req.method, req.path, response.status);
        if self.record_requests {
            self.record(req, &response, start_time);
        }
        response
    }

    fn route(&self, req: &ApiRequest) -> Outcome {
        let segments: Vec<&str> = req.path.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect();
        match (req.method, segments.as_slice()) {
            (Method::Get, ["operators"]) => Outcome::Done(Ok(operators_json())),
            (Method::Get, ["sections", id, "movies"]) => {
                Outcome::Done(self.browse_section(req, &decode_segment(id)))
            }
            (method, [route, rest @ ..]) if rest.len() <= 1 => {
                let Some(handler) = self.resources.get(route) else {
                    return Outcome::NoRoute;
                };
                let store = self.store.as_ref();
                let result = match (method, rest) {
                    (Method::Get, []) => {
                        req.params().and_then(|p| handler.list(store, &p, &self.limits))
                    }
                    (Method::Post, []) => handler.create(store, req.body()),
                    (Method::Get, [id]) => handler.read(store, &decode_segment(id)),
                    (Method::Put, [id]) => handler.update(store, &decode_segment(id), req.body()),
                    (Method::Delete, [id]) => {
                        handler.delete(store, &decode_segment(id)).map(|()| json!({ "result": "OK" }))
                    }
                    _ => return Outcome::NoRoute,
                };
                Outcome::Done(result)
            }
            _ => Outcome::NoRoute,
        }
    }

    /// Movies matching the section's stored filters plus the request's own;
    /// request sorts replace the stored ones when given.
    fn browse_section(&self, req: &ApiRequest, id: &str) -> Result<Value, ApiError> {
        let section: Section = read(self.store.as_ref(), id)?;
        let mut params = req.params()?;
        let stored = |tokens: &Option<String>| -> Vec<String> {
            tokens
                .as_deref()
                .map(|t| t.split(';').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect())
                .unwrap_or_default()
        };
        let mut filters = stored(&section.filter);
        filters.append(&mut params.filter);
        params.filter = filters;
        if params.sort.is_empty() {
            params.sort = stored(&section.sort);
        }
        let page = list::<Movie>(self.store.as_ref(), &params, &self.limits)?;
        serde_json::to_value(&page).map_err(|e| ApiError::Internal(crate::store::StoreError::Decode(e.to_string())))
    }

    fn record(&self, req: &ApiRequest, response: &ApiResponse, start_time: f64) {
        let entry = Request {
            id: 0,
            path: req.path.clone(),
            verb: req.method.as_str().to_string(),
            response_status_code: Some(response.status.to_string()),
            start_time,
            end_time: Some(unix_seconds()),
            with_token: req.token.is_some(),
        };
        let mut row = match entry.to_row() {
            Ok(row) => row,
            Err(e) => {
                log::warn!("request log entry rejected: {e}");
                return;
            }
        };
        row.remove("id");
        let mut session = Session::new(self.store.as_ref(), Request::TABLE);
        session.add_with_next_key(row);
        if let Err(e) = session.commit() {
            log::warn!("request log write failed: {e}");
        }
    }
}

/// Reverses the escaping of `/` and `%` inside an id path segment.
#[must_use]
pub fn decode_segment(segment: &str) -> String {
    segment.replace("%2F", "/").replace("%2f", "/").replace("%25", "%")
}

fn operators_json() -> Value {
    let ops: Vec<Value> = docs::operator_docs()
        .into_iter()
        .map(|(name, description)| json!({ "operator": name, "description": description }))
        .collect();
    Value::Array(ops)
}

#[allow(clippy::cast_precision_loss)]
fn unix_seconds() -> f64 {
    let now = chrono::Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::catalogue;
    use crate::store::MemoryStore;

    fn api() -> Api {
        Api::new(Arc::new(MemoryStore::with_tables(catalogue())))
    }

    #[test]
    fn unknown_routes_are_404() {
        let api = api();
        for req in [ApiRequest::get("/nope"), ApiRequest::get("/movies/1/extra"), ApiRequest::post("/movies/1", json!({}))] {
            let resp = api.dispatch(&req);
            assert_eq!(resp.status, 404);
            assert_eq!(resp.body["detail"], "route not found");
        }
    }

    #[test]
    fn delete_answers_plain_ok() {
        let api = api();
        assert!(api.dispatch(&ApiRequest::post("/genres", json!({"id": "Drama"}))).is_success());
        let resp = api.dispatch(&ApiRequest::delete("/genres/Drama"));
        assert_eq!(resp, ApiResponse::ok(json!({"result": "OK"})));
    }

    #[test]
    fn recorded_requests_capture_status_and_token() {
        let api = api().recording_requests(true);
        api.dispatch(&ApiRequest::get("/movies/42").with_token("t"));
        api.dispatch(&ApiRequest::get("/movies"));
        let rows = api.dispatch(&ApiRequest::get("/requests").with_query("sort", "id.asc"));
        let items = rows.body["items"].as_array().unwrap().clone();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["response_status_code"], "404");
        assert_eq!(items[0]["with_token"], true);
        assert_eq!(items[1]["id"], 2);
    }

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("put".parse::<Method>().unwrap(), Method::Put);
        assert!("PATCH".parse::<Method>().is_err());
    }
}
