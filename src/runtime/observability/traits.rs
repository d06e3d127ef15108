use std::time::Duration;

/// Events the observer can record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverEvent {
    /// A redirect was issued. `kind` is `locked` or `protected`.
    ScreenBlocked {
        kind: &'static str,
        source: &'static str,
        chain: Option<u64>,
    },
    RetryChainStarted {
        chain: u64,
        kind: &'static str,
        ticks: usize,
    },
    RetryChainCancelled {
        chain: u64,
        reason: &'static str,
    },
    RestoreAttempt {
        attempt: u32,
        outcome: &'static str,
        next_delay: Option<Duration>,
    },
    WatchdogTick {
        skipped: bool,
        restored: bool,
    },
    Error {
        component: String,
        message: String,
    },
}

/// Sink for guard and self-healing events.
pub trait Observer: Send + Sync {
    /// Record a discrete event
    fn record_event(&self, event: &ObserverEvent);

    /// Flush any buffered data (no-op for most backends)
    fn flush(&self) {}

    /// Human-readable name of this observer
    fn name(&self) -> &str;
}
