//! Developer traces for query building and pagination.
//!
//! Every trace goes to the `cinelite::dev` log target. A test can also open a
//! [`TraceCapture`] to collect the traces emitted on its own thread, which
//! keeps assertions independent of the global logger.

use std::cell::RefCell;

thread_local! {
    static CAPTURED: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

/// Collects traces emitted on the current thread until dropped.
#[must_use = "traces are only captured while the guard is alive"]
pub struct TraceCapture {
    _not_send: std::marker::PhantomData<*const ()>,
}

impl TraceCapture {
    /// Starts capturing, discarding anything a previous capture left behind.
    pub fn start() -> Self {
        CAPTURED.with(|c| *c.borrow_mut() = Some(Vec::new()));
        Self { _not_send: std::marker::PhantomData }
    }

    /// Traces captured so far; the buffer is emptied.
    pub fn take(&self) -> Vec<String> {
        CAPTURED.with(|c| c.borrow_mut().as_mut().map(std::mem::take).unwrap_or_default())
    }
}

impl Drop for TraceCapture {
    fn drop(&mut self) {
        CAPTURED.with(|c| c.borrow_mut().take());
    }
}

#[doc(hidden)]
pub fn record(line: String) {
    log::trace!(target: crate::logger::DEV_TARGET, "{line}");
    CAPTURED.with(|c| {
        if let Some(lines) = c.borrow_mut().as_mut() {
            lines.push(line);
        }
    });
}

/// `format!`-style developer trace.
#[macro_export]
macro_rules! dev_trace {
    ($($arg:tt)*) => {
        $crate::utils::devlog::record(format!($($arg)*))
    };
}
