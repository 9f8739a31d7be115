use std::cell::Cell;

pub const DEBUG_TRACE_ENV: &str = "BAREWORD_DEBUG_TRACE";

thread_local! {
    static DEBUG_TRACE_OVERRIDE: Cell<Option<bool>> = const { Cell::new(None) };
}

/// `[BAREWORD_TRACE]` lines on stderr, enabled by `BAREWORD_DEBUG_TRACE=1`.
pub fn debug_trace_enabled() -> bool {
    DEBUG_TRACE_OVERRIDE.with(|cell| {
        cell.get()
            .unwrap_or_else(|| std::env::var(DEBUG_TRACE_ENV).is_ok_and(|v| v == "1"))
    })
}

/// Runs `f` with tracing forced on or off for the current thread.
/// `analyze_units` and `analyze_target` carry the setting onto their workers.
pub fn with_debug_trace<T>(enabled: bool, f: impl FnOnce() -> T) -> T {
    DEBUG_TRACE_OVERRIDE.with(|cell| {
        let prev = cell.get();
        cell.set(Some(enabled));
        let out = f();
        cell.set(prev);
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_and_is_restored() {
        let outer = debug_trace_enabled();
        with_debug_trace(true, || assert!(debug_trace_enabled()));
        with_debug_trace(false, || {
            assert!(!debug_trace_enabled());
            with_debug_trace(true, || assert!(debug_trace_enabled()));
            assert!(!debug_trace_enabled());
        });
        assert_eq!(debug_trace_enabled(), outer);
    }
}
