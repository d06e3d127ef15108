use super::restorer::EnforcementRestorer;
use super::scheduler::{BackoffPolicy, ExistingWorkPolicy, WorkScheduler};
use super::watchdog::Watchdog;
use super::worker::RestoreWorker;
use crate::config::HealingConfig;
use crate::policy::ConditionChecker;
use crate::runtime::observability::{NoopObserver, Observer};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use strum::{Display, EnumString, IntoStaticStr};

/// Registration key of the periodic watchdog.
pub const WATCHDOG_WORK_KEY: &str = "enforcement_watchdog";
/// Registration key of the one-shot restore job.
pub const RESTORE_WORK_KEY: &str = "enforcement_restore";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LifecycleTrigger {
    BootCompleted,
    PackageReplaced,
    /// The enforcement service was seen disabled.
    EnforcementLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TriggerReport {
    pub trigger: LifecycleTrigger,
    /// `false` when a live watchdog was kept.
    pub watchdog_registered: bool,
    pub restored_immediately: bool,
    pub restore_scheduled: bool,
    pub uninstall_protected: bool,
    /// Enforcement services are limited to the protected packages.
    pub services_restricted: bool,
}

/// Wires the restorer, watchdog and restore worker to a [`WorkScheduler`].
pub struct SelfHealing {
    restorer: Arc<EnforcementRestorer>,
    scheduler: Arc<dyn WorkScheduler>,
    watchdog: Arc<Watchdog>,
    restore: Arc<RestoreWorker>,
    watchdog_interval: Duration,
    restore_delay: Duration,
}

impl SelfHealing {
    pub fn new(
        restorer: Arc<EnforcementRestorer>,
        policy: Arc<ConditionChecker>,
        scheduler: Arc<dyn WorkScheduler>,
        healing: &HealingConfig,
    ) -> Self {
        Self::with_observer(restorer, policy, scheduler, healing, Arc::new(NoopObserver))
    }

    pub fn with_observer(
        restorer: Arc<EnforcementRestorer>,
        policy: Arc<ConditionChecker>,
        scheduler: Arc<dyn WorkScheduler>,
        healing: &HealingConfig,
        observer: Arc<dyn Observer>,
    ) -> Self {
        let backoff = BackoffPolicy::exponential(
            Duration::from_secs(healing.restore_backoff_secs),
            Duration::from_secs(healing.restore_max_backoff_secs),
        );
        let watchdog = Watchdog::new(Arc::clone(&restorer), policy).with_observer(Arc::clone(&observer));
        let restore = RestoreWorker::new(Arc::clone(&restorer), backoff, healing.restore_max_attempts)
            .with_observer(observer);
        Self {
            restorer,
            scheduler,
            watchdog: Arc::new(watchdog),
            restore: Arc::new(restore),
            watchdog_interval: healing.watchdog_interval(),
            restore_delay: Duration::from_secs(healing.restore_initial_delay_secs),
        }
    }

    pub fn restorer(&self) -> &Arc<EnforcementRestorer> {
        &self.restorer
    }

    /// Registers the periodic watchdog unless one is already live.
    pub fn schedule_watchdog(&self) -> bool {
        self.scheduler.register_periodic(
            WATCHDOG_WORK_KEY,
            self.watchdog_interval,
            ExistingWorkPolicy::Keep,
            Arc::clone(&self.watchdog) as _,
        )
    }

    pub fn cancel_watchdog(&self) -> bool {
        self.scheduler.cancel(WATCHDOG_WORK_KEY)
    }

    /// Starts a fresh restore job, replacing any pending one.
    pub fn schedule_restore(&self) -> bool {
        self.scheduler.register_delayed(
            RESTORE_WORK_KEY,
            self.restore_delay,
            self.restore.backoff(),
            ExistingWorkPolicy::Replace,
            Arc::clone(&self.restore) as _,
        )
    }

    /// Handles a boot, update or enforcement-lost signal.
    pub fn on_trigger(&self, trigger: LifecycleTrigger) -> TriggerReport {
        tracing::info!(%trigger, "self-healing triggered");
        let watchdog_registered = self.schedule_watchdog();
        let restored_immediately = self.restorer.ensure_enforcement_active();
        let restore_scheduled = !restored_immediately && self.schedule_restore();
        let uninstall_protected = self.restorer.ensure_uninstall_protection();
        let services_restricted = self.restorer.ensure_permitted_services();

        TriggerReport {
            trigger,
            watchdog_registered,
            restored_immediately,
            restore_scheduled,
            uninstall_protected,
            services_restricted,
        }
    }
}
