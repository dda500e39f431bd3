//! Developer bench logging ("level 6"). Each executed operation emits one JSON line
//! through `dev6!`; tests capture lines on a per-thread sink so parallel tests never
//! see each other's output.

use std::cell::RefCell;

thread_local! {
    static TL_SINK: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

/// Disables the current thread's sink on drop.
pub struct DevSinkGuard;

impl Drop for DevSinkGuard {
    fn drop(&mut self) {
        TL_SINK.with(|s| *s.borrow_mut() = None);
    }
}

/// Starts capturing `dev6!` lines on this thread.
pub fn enable_thread_sink() -> DevSinkGuard {
    TL_SINK.with(|s| *s.borrow_mut() = Some(Vec::new()));
    DevSinkGuard
}

pub fn write_str(msg: &str) {
    TL_SINK.with(|s| {
        if let Some(buf) = s.borrow_mut().as_mut() {
            buf.push(msg.to_owned());
        }
    });
}

/// Takes the captured lines; empty when capture is off.
pub fn drain() -> Vec<String> {
    TL_SINK.with(|s| s.borrow_mut().as_mut().map(std::mem::take).unwrap_or_default())
}

pub fn snapshot() -> Vec<String> {
    TL_SINK.with(|s| s.borrow().as_ref().cloned().unwrap_or_default())
}

/// Captured bench lines for `op`, parsed back into JSON.
pub fn bench_lines(op: &str) -> Vec<serde_json::Value> {
    snapshot()
        .iter()
        .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
        .filter(|v| v["bench"] == "query" && v["op"] == op)
        .collect()
}

/// One bench line: `{"bench":"query","op":..,"collection":..,<counters>}`.
#[must_use]
pub fn bench_line(op: &str, collection: &str, counters: &[(&str, u64)]) -> String {
    let mut m = serde_json::Map::new();
    m.insert("bench".into(), "query".into());
    m.insert("op".into(), op.into());
    m.insert("collection".into(), collection.into());
    for (k, v) in counters {
        m.insert((*k).to_owned(), (*v).into());
    }
    serde_json::Value::Object(m).to_string()
}

/// Emit a developer log and capture it in the thread-local sink if enabled.
#[macro_export]
macro_rules! dev6 {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        $crate::utils::devlog::write_str(&__s);
        log::log!(target: "recordlite::dev6", log::Level::Trace, "{}", __s);
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_captures_and_drains() {
        let _g = enable_thread_sink();
        crate::dev6!("alpha {}", 1);
        crate::dev6!("{}", bench_line("count", "users", &[("result_count", 3)]));
        assert_eq!(snapshot().len(), 2);
        let lines = bench_lines("count");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["collection"], "users");
        assert_eq!(lines[0]["result_count"], 3);
        assert_eq!(drain().len(), 2);
        assert!(snapshot().is_empty());
    }

    #[test]
    fn other_threads_are_not_captured() {
        let _g = enable_thread_sink();
        crate::dev6!("main-thread");
        let child = std::thread::spawn(|| {
            crate::dev6!("child-thread");
            snapshot()
        })
        .join()
        .unwrap();
        assert!(child.is_empty());
        assert_eq!(snapshot(), vec!["main-thread".to_owned()]);
    }

    #[test]
    fn guard_turns_capture_off() {
        {
            let _g = enable_thread_sink();
            crate::dev6!("inside");
        }
        crate::dev6!("outside");
        assert!(snapshot().is_empty());
        assert!(drain().is_empty());
    }
}
