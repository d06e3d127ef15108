use super::restorer::EnforcementRestorer;
use super::scheduler::{HealingTask, TaskOutcome};
use crate::diagnostics::health::{self, COMPONENT_WATCHDOG};
use crate::policy::ConditionChecker;
use crate::runtime::observability::{NoopObserver, Observer, ObserverEvent};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WatchdogReport {
    /// The guard is switched off; nothing was checked.
    pub skipped: bool,
    pub enforcement_active: bool,
    pub uninstall_protected: bool,
}

/// Periodic check that re-asserts enforcement and uninstall protection.
/// Every tick counts as a success so the periodic registration survives.
pub struct Watchdog {
    restorer: Arc<EnforcementRestorer>,
    policy: Arc<ConditionChecker>,
    observer: Arc<dyn Observer>,
}

impl Watchdog {
    pub fn new(restorer: Arc<EnforcementRestorer>, policy: Arc<ConditionChecker>) -> Self {
        Self {
            restorer,
            policy,
            observer: Arc::new(NoopObserver),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn tick(&self) -> WatchdogReport {
        if !self.policy.is_guard_enabled() {
            tracing::debug!("guard disabled, watchdog skipped");
            health::mark_idle(COMPONENT_WATCHDOG);
            self.observer.record_event(&ObserverEvent::WatchdogTick {
                skipped: true,
                restored: false,
            });
            return WatchdogReport {
                skipped: true,
                ..WatchdogReport::default()
            };
        }

        let enforcement_active = self.restorer.ensure_enforcement_active();
        let uninstall_protected = self.restorer.ensure_uninstall_protection();
        if enforcement_active {
            health::mark_ok(COMPONENT_WATCHDOG);
        } else {
            tracing::warn!("watchdog could not restore the enforcement service");
            health::mark_error(COMPONENT_WATCHDOG, "enforcement service inactive");
        }
        self.observer.record_event(&ObserverEvent::WatchdogTick {
            skipped: false,
            restored: enforcement_active,
        });

        WatchdogReport {
            skipped: false,
            enforcement_active,
            uninstall_protected,
        }
    }
}

impl HealingTask for Watchdog {
    fn name(&self) -> &str {
        COMPONENT_WATCHDOG
    }

    fn run(&self, _run_attempt: u32) -> TaskOutcome {
        self.tick();
        TaskOutcome::Success
    }
}
