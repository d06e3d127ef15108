use super::restorer::EnforcementRestorer;
use super::scheduler::{BackoffPolicy, HealingTask, TaskOutcome};
use crate::diagnostics::health::{self, COMPONENT_RESTORE};
use crate::runtime::observability::{NoopObserver, Observer, ObserverEvent};
use std::sync::Arc;
use std::time::Duration;
use strum::{Display, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum RestoreOutcome {
    Success,
    Retry,
    /// The attempt ceiling was reached; the watchdog takes over from here.
    GiveUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreAttempt {
    pub attempt: u32,
    pub outcome: RestoreOutcome,
    /// Set only for [`RestoreOutcome::Retry`].
    pub next_delay: Option<Duration>,
}

/// One-shot restore job scheduled after a trigger failed to restore
/// enforcement immediately.
pub struct RestoreWorker {
    restorer: Arc<EnforcementRestorer>,
    backoff: BackoffPolicy,
    max_attempts: u32,
    observer: Arc<dyn Observer>,
}

impl RestoreWorker {
    pub fn new(restorer: Arc<EnforcementRestorer>, backoff: BackoffPolicy, max_attempts: u32) -> Self {
        Self {
            restorer,
            backoff,
            max_attempts: max_attempts.max(1),
            observer: Arc::new(NoopObserver),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn backoff(&self) -> BackoffPolicy {
        self.backoff
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn attempt(&self, run_attempt: u32) -> RestoreAttempt {
        let result = if self.restorer.ensure_enforcement_active() {
            self.restorer.ensure_uninstall_protection();
            health::mark_ok(COMPONENT_RESTORE);
            RestoreAttempt {
                attempt: run_attempt,
                outcome: RestoreOutcome::Success,
                next_delay: None,
            }
        } else if run_attempt < self.max_attempts {
            health::record_retry(COMPONENT_RESTORE);
            health::mark_error(COMPONENT_RESTORE, "enforcement service still inactive");
            RestoreAttempt {
                attempt: run_attempt,
                outcome: RestoreOutcome::Retry,
                next_delay: Some(self.backoff.delay_for(run_attempt)),
            }
        } else {
            tracing::error!(
                attempts = run_attempt,
                "enforcement restore gave up; watchdog will keep trying"
            );
            health::mark_error(COMPONENT_RESTORE, "restore attempts exhausted");
            RestoreAttempt {
                attempt: run_attempt,
                outcome: RestoreOutcome::GiveUp,
                next_delay: None,
            }
        };

        self.observer.record_event(&ObserverEvent::RestoreAttempt {
            attempt: result.attempt,
            outcome: result.outcome.into(),
            next_delay: result.next_delay,
        });
        result
    }
}

impl HealingTask for RestoreWorker {
    fn name(&self) -> &str {
        COMPONENT_RESTORE
    }

    fn run(&self, run_attempt: u32) -> TaskOutcome {
        match self.attempt(run_attempt).outcome {
            RestoreOutcome::Success => TaskOutcome::Success,
            RestoreOutcome::Retry => TaskOutcome::Retry,
            RestoreOutcome::GiveUp => TaskOutcome::Failure,
        }
    }
}
