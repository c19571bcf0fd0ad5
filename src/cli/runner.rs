use serde_json::{Value, json};
use std::io::Write;

use crate::api::{Api, ApiRequest, ApiResponse, docs};
use crate::store::{MemoryStore, snapshot};

use super::command::Command;
use super::util::{id_segment, parse_payload};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
}

type BoxError = Box<dyn std::error::Error>;

fn print(out: &mut dyn Write, value: &Value, mode: OutputMode) -> Result<(), BoxError> {
    match mode {
        OutputMode::Json => writeln!(out, "{value}")?,
        OutputMode::Human => writeln!(out, "{}", serde_json::to_string_pretty(value)?)?,
    }
    Ok(())
}

fn list_request(path: String, page: Option<i64>, limit: Option<i64>, sort: &[String], filter: &[String]) -> ApiRequest {
    let mut req = ApiRequest::get(path);
    if let Some(p) = page {
        req = req.with_query("page", &p.to_string());
    }
    if let Some(l) = limit {
        req = req.with_query("limit", &l.to_string());
    }
    for s in sort {
        req = req.with_query("sort", s);
    }
    for f in filter {
        req = req.with_query("filter", f);
    }
    req
}

fn to_request(cmd: Command) -> Result<ApiRequest, BoxError> {
    Ok(match cmd {
        Command::List { resource, page, limit, sort, filter } => {
            list_request(format!("/{resource}"), page, limit, &sort, &filter)
        }
        Command::Get { resource, id } => ApiRequest::get(format!("/{resource}/{}", id_segment(&id))),
        Command::Create { resource, json } => ApiRequest::post(format!("/{resource}"), parse_payload(&json)?),
        Command::Update { resource, id, json } => {
            ApiRequest::put(format!("/{resource}/{}", id_segment(&id)), parse_payload(&json)?)
        }
        Command::Delete { resource, id } => ApiRequest::delete(format!("/{resource}/{}", id_segment(&id))),
        Command::BrowseSection { id, page, limit, sort, filter } => {
            list_request(format!("/sections/{}/movies", id_segment(&id)), page, limit, &sort, &filter)
        }
        Command::Operators => ApiRequest::get("/operators"),
        Command::Docs | Command::Metrics | Command::Init { .. } => {
            return Err("command is not an api request".into());
        }
    })
}

/// Runs one command, printing the result to `out`. Returns the api status
/// (200 for local commands).
///
/// # Errors
/// Bad payloads, output failures, or snapshot I/O for `init`.
pub fn run_with_format(api: &Api, store: &MemoryStore, cmd: Command, mode: OutputMode, out: &mut dyn Write) -> Result<u16, BoxError> {
    match cmd {
        Command::Docs => {
            let body = json!({
                "filter": docs::filter_param_docs(),
                "sort": docs::SORT_PARAM_DOCS,
                "limit": docs::LIMIT_PARAM_DOCS,
                "endpoints": docs::endpoint_docs(api.resources()),
            });
            print(out, &body, mode)?;
            Ok(200)
        }
        Command::Metrics => {
            write!(out, "{}", crate::query::telemetry::metrics_text())?;
            Ok(200)
        }
        Command::Init { data_path } => {
            if data_path.exists() {
                print(out, &json!({"action": "exists", "path": data_path.display().to_string()}), mode)?;
            } else {
                snapshot::save(store, &data_path)?;
                print(out, &json!({"action": "created", "path": data_path.display().to_string()}), mode)?;
            }
            Ok(200)
        }
        other => {
            let req = to_request(other)?;
            let ApiResponse { status, body } = api.dispatch(&req);
            print(out, &body, mode)?;
            Ok(status)
        }
    }
}

/// [`run_with_format`] to stdout in human mode.
///
/// # Errors
/// See [`run_with_format`].
pub fn run(api: &Api, store: &MemoryStore, cmd: Command) -> Result<u16, BoxError> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    run_with_format(api, store, cmd, OutputMode::Human, &mut lock)
}
