//! Process-wide query and write accounting.
//!
//! Each paginated read becomes one `QueryEvent` on the `cinelite::metrics`
//! target. The rendered query is reduced to a SHA-256 digest because filter
//! operands can carry user data. Commits are counted and logged on
//! `cinelite::audit`.

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use crate::logger::{AUDIT_TARGET, METRICS_TARGET};
use crate::utils::num::{u128_to_u64_saturating, usize_to_u64};

const DEFAULT_SLOW_QUERY_MS: u64 = 500;

#[derive(Debug, Serialize)]
struct QueryEvent<'a> {
    ts: String,
    table: &'a str,
    query_hash: String,
    duration_ms: u64,
    page: u64,
    limit: u64,
    total: u64,
    slow: bool,
}

/// Counters plus the knobs that shape what gets logged.
struct Telemetry {
    queries: AtomicU64,
    slow_queries: AtomicU64,
    writes: AtomicU64,
    slow_query_ms: AtomicU64,
    structured: AtomicBool,
    sink: Mutex<Option<Arc<RwLock<Vec<String>>>>>,
}

impl Telemetry {
    fn from_env() -> Self {
        let slow_query_ms = std::env::var("CINELITE_SLOW_QUERY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SLOW_QUERY_MS);
        Self {
            queries: AtomicU64::new(0),
            slow_queries: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            slow_query_ms: AtomicU64::new(slow_query_ms),
            structured: AtomicBool::new(true),
            sink: Mutex::new(None),
        }
    }

    fn emit(&self, line: String) {
        if let Some(sink) = self.sink.lock().as_ref() {
            sink.write().push(line.clone());
        }
        log::info!(target: METRICS_TARGET, "{line}");
    }
}

static TELEMETRY: LazyLock<Telemetry> = LazyLock::new(Telemetry::from_env);

/// Queries at or above this duration count as slow and log a warning.
pub fn set_slow_query_ms(ms: u64) {
    TELEMETRY.slow_query_ms.store(ms, Ordering::Relaxed);
}

/// Toggles the per-query JSON line; counters are kept either way.
pub fn set_structured_json(enabled: bool) {
    TELEMETRY.structured.store(enabled, Ordering::Relaxed);
}

/// Mirrors every structured query line into `sink`.
pub fn set_query_sink_for_tests(sink: Arc<RwLock<Vec<String>>>) {
    *TELEMETRY.sink.lock() = Some(sink);
}

fn digest(text: &str) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Records one paginated read.
pub fn log_query(table: &str, query_text: &str, duration_ms: u128, page: u64, limit: u64, total: u64) {
    let t = &*TELEMETRY;
    t.queries.fetch_add(1, Ordering::Relaxed);
    let duration = u128_to_u64_saturating(duration_ms);
    let slow = duration >= t.slow_query_ms.load(Ordering::Relaxed);
    let query_hash = digest(query_text);
    if slow {
        t.slow_queries.fetch_add(1, Ordering::Relaxed);
        log::warn!(target: METRICS_TARGET, "slow query on {table}: {duration} ms (hash {query_hash})");
    }
    if !t.structured.load(Ordering::Relaxed) {
        return;
    }
    let event = QueryEvent {
        ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        table,
        query_hash,
        duration_ms: duration,
        page,
        limit,
        total,
        slow,
    };
    match serde_json::to_string(&event) {
        Ok(line) => t.emit(line),
        Err(e) => log::warn!(target: METRICS_TARGET, "query event dropped: {e}"),
    }
}

/// Records a committed unit of work on `table`.
pub fn record_write(table: &str, changes: usize) {
    TELEMETRY.writes.fetch_add(usize_to_u64(changes), Ordering::Relaxed);
    log::info!(target: AUDIT_TARGET, "commit table={table} changes={changes}");
}

/// Counters as `name value` lines.
#[must_use]
pub fn metrics_text() -> String {
    let t = &*TELEMETRY;
    [
        ("cinelite_queries_total", &t.queries),
        ("cinelite_queries_slow_total", &t.slow_queries),
        ("cinelite_writes_total", &t.writes),
    ]
    .iter()
    .map(|(name, counter)| format!("{name} {}\n", counter.load(Ordering::Relaxed)))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_lines_carry_a_digest_not_the_text() {
        let sink = Arc::new(RwLock::new(Vec::new()));
        set_query_sink_for_tests(sink.clone());
        let text = "SELECT * FROM movie WHERE title = 'secret'";
        log_query("movie", text, 1, 1, 10, 0);
        let lines = sink.read().clone();
        let line = lines.iter().find(|l| l.contains(&digest(text))).unwrap();
        assert!(!line.contains("secret"));
        let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(parsed["table"], "movie");
        assert_eq!(parsed["limit"], 10);
    }

    #[test]
    fn metrics_text_lists_counters() {
        record_write("genre", 2);
        let text = metrics_text();
        assert_eq!(text.lines().count(), 3);
        let writes = text
            .lines()
            .find_map(|l| l.strip_prefix("cinelite_writes_total "))
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap();
        assert!(writes >= 2);
    }

    #[test]
    fn digest_is_hex_sha256() {
        let d = digest("abc");
        assert_eq!(d.len(), 64);
        assert!(d.starts_with("ba7816bf"));
    }
}
