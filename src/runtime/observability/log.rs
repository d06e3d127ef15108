use super::traits::{Observer, ObserverEvent};
use tracing::{info, warn};

/// Writes every event through `tracing`.
pub struct LogObserver;

impl LogObserver {
    pub fn new() -> Self {
        Self
    }
}

impl Observer for LogObserver {
    fn record_event(&self, event: &ObserverEvent) {
        match event {
            ObserverEvent::ScreenBlocked {
                kind,
                source,
                chain,
            } => {
                info!(kind = %kind, source = %source, chain = ?chain, "guard.blocked");
            }
            ObserverEvent::RetryChainStarted { chain, kind, ticks } => {
                info!(chain, kind = %kind, ticks, "guard.retry_chain.start");
            }
            ObserverEvent::RetryChainCancelled { chain, reason } => {
                info!(chain, reason = %reason, "guard.retry_chain.cancel");
            }
            ObserverEvent::RestoreAttempt {
                attempt,
                outcome,
                next_delay,
            } => {
                let next_ms = next_delay.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
                info!(attempt, outcome = %outcome, next_delay_ms = ?next_ms, "healing.restore");
            }
            ObserverEvent::WatchdogTick { skipped, restored } => {
                info!(skipped, restored, "healing.watchdog");
            }
            ObserverEvent::Error { component, message } => {
                warn!(component = %component, error = %message, "error");
            }
        }
    }

    fn name(&self) -> &str {
        "log"
    }
}
