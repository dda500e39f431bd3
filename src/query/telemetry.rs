use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Default)]
pub struct Metrics {
    pub queries_total: AtomicU64,
    pub queries_slow_total: AtomicU64,
    pub writes_total: AtomicU64,
    pub records_deleted_total: AtomicU64,
    pub records_updated_total: AtomicU64,
    pub audits_total: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queries_total: u64,
    pub queries_slow_total: u64,
    pub writes_total: u64,
    pub records_deleted_total: u64,
    pub records_updated_total: u64,
    pub audits_total: u64,
}

#[derive(Default)]
struct Telemetry {
    metrics: Metrics,
    query_log_path: RwLock<Option<PathBuf>>,
    audit_enabled: AtomicBool,
    // For tests we can capture audit lines in-memory
    audit_sink: RwLock<Option<Arc<RwLock<Vec<String>>>>>,
}

static TELEMETRY: std::sync::LazyLock<Telemetry> = std::sync::LazyLock::new(Telemetry::default);

/// Append JSON query lines to `path`; `None` disables the query log.
pub fn set_query_log(path: Option<PathBuf>) {
    *TELEMETRY.query_log_path.write() = path;
}

pub fn set_audit_enabled(enabled: bool) {
    TELEMETRY.audit_enabled.store(enabled, Ordering::Relaxed);
}

pub fn set_audit_sink_for_tests(sink: Arc<RwLock<Vec<String>>>) {
    *TELEMETRY.audit_sink.write() = Some(sink);
}

fn write_line(path: &Path, line: &str) {
    if let Ok(mut f) = std::fs::OpenOptions::new().create(true).append(true).open(path) {
        use std::io::Write;
        let _ = writeln!(f, "{line}");
    }
}

fn now_ts() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn sha256_hex(input: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut h = Sha256::new();
    h.update(input.as_bytes());
    hex::encode(h.finalize())
}

/// One executed read or bulk mutation.
pub struct QueryEvent<'a> {
    pub collection: &'a str,
    pub op: &'a str,
    pub filter_dbg: &'a str,
    pub duration_ms: u64,
    pub result_count: usize,
    pub slow_query_ms: u64,
}

pub fn log_query(ev: &QueryEvent<'_>) {
    TELEMETRY.metrics.queries_total.fetch_add(1, Ordering::Relaxed);
    let slow = ev.duration_ms >= ev.slow_query_ms;
    if slow {
        TELEMETRY.metrics.queries_slow_total.fetch_add(1, Ordering::Relaxed);
        log::warn!(
            target: "recordlite::metrics",
            "slow {} on {}: {} ms ({} results)",
            ev.op,
            ev.collection,
            ev.duration_ms,
            ev.result_count
        );
    }
    let path = TELEMETRY.query_log_path.read().clone();
    if let Some(path) = path {
        let line = serde_json::json!({
            "ts": now_ts(),
            "collection": ev.collection,
            "op": ev.op,
            "filter_hash": sha256_hex(ev.filter_dbg),
            "duration_ms": ev.duration_ms,
            "result_count": ev.result_count,
            "slow": slow
        })
        .to_string();
        write_line(&path, &line);
    }
}

pub fn record_deleted(n: u64) {
    TELEMETRY.metrics.records_deleted_total.fetch_add(n, Ordering::Relaxed);
}

pub fn record_updated(n: u64) {
    TELEMETRY.metrics.records_updated_total.fetch_add(n, Ordering::Relaxed);
}

pub fn log_audit(op: &str, collection: &str, record_id: &str) {
    TELEMETRY.metrics.writes_total.fetch_add(1, Ordering::Relaxed);
    if !TELEMETRY.audit_enabled.load(Ordering::Relaxed) {
        return;
    }
    TELEMETRY.metrics.audits_total.fetch_add(1, Ordering::Relaxed);
    let line = serde_json::json!({
        "ts": now_ts(), "op": op, "collection": collection, "record_id": record_id
    })
    .to_string();
    log::info!(target: "recordlite::audit", "{line}");
    let audit_clone = TELEMETRY.audit_sink.read().clone();
    if let Some(sink) = audit_clone {
        sink.write().push(line);
    }
}

#[must_use]
pub fn metrics_snapshot() -> MetricsSnapshot {
    let m = &TELEMETRY.metrics;
    MetricsSnapshot {
        queries_total: m.queries_total.load(Ordering::Relaxed),
        queries_slow_total: m.queries_slow_total.load(Ordering::Relaxed),
        writes_total: m.writes_total.load(Ordering::Relaxed),
        records_deleted_total: m.records_deleted_total.load(Ordering::Relaxed),
        records_updated_total: m.records_updated_total.load(Ordering::Relaxed),
        audits_total: m.audits_total.load(Ordering::Relaxed),
    }
}

#[must_use]
pub fn metrics_text() -> String {
    // OpenMetrics/Prometheus exposition format (no types/HELP for brevity)
    let m = metrics_snapshot();
    format!(
        "recordlite_queries_total {}\n\
         recordlite_queries_slow_total {}\n\
         recordlite_writes_total {}\n\
         recordlite_records_deleted_total {}\n\
         recordlite_records_updated_total {}\n\
         recordlite_audits_total {}\n",
        m.queries_total,
        m.queries_slow_total,
        m.writes_total,
        m.records_deleted_total,
        m.records_updated_total,
        m.audits_total,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_only_move_forward() {
        let before = metrics_snapshot();
        log_query(&QueryEvent {
            collection: "t",
            op: "find",
            filter_dbg: "None",
            duration_ms: 10,
            result_count: 0,
            slow_query_ms: 0,
        });
        record_deleted(2);
        let after = metrics_snapshot();
        assert!(after.queries_total > before.queries_total);
        assert!(after.queries_slow_total > before.queries_slow_total);
        assert!(after.records_deleted_total >= before.records_deleted_total + 2);
        assert!(metrics_text().contains("recordlite_queries_total"));
    }

    #[test]
    fn query_log_writes_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queries.log");
        set_query_log(Some(path.clone()));
        log_query(&QueryEvent {
            collection: "qlog",
            op: "count",
            filter_dbg: "Some(Cmp)",
            duration_ms: 0,
            result_count: 3,
            slow_query_ms: 1_000,
        });
        set_query_log(None);
        let text = std::fs::read_to_string(&path).unwrap();
        let line = text.lines().find(|l| l.contains("\"qlog\"")).unwrap();
        let v: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(v["result_count"], 3);
        assert_eq!(v["filter_hash"].as_str().unwrap().len(), 64);
    }
}
