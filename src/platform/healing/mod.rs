//! Self-healing of the enforcement service.
//!
//! [`EnforcementRestorer`] re-registers the service through an ordered chain
//! of [`PrivilegedChannel`]s. [`SelfHealing`] reacts to lifecycle triggers by
//! registering a periodic [`Watchdog`] and, when the immediate restore fails,
//! a one-shot [`RestoreWorker`] with exponential backoff.

mod channel;
mod lifecycle;
mod memory;
mod restorer;
mod scheduler;
mod watchdog;
mod worker;

pub use channel::{PrivilegedChannel, ServiceList, ServiceRegistry, WriteOutcome};
pub use lifecycle::{LifecycleTrigger, RESTORE_WORK_KEY, SelfHealing, TriggerReport, WATCHDOG_WORK_KEY};
pub use memory::{MemorySettings, ScriptedChannel};
pub use restorer::EnforcementRestorer;
pub use scheduler::{
    BackoffPolicy, ExistingWorkPolicy, HealingTask, TaskOutcome, TokioWorkScheduler,
    WorkScheduler,
};
pub use watchdog::{Watchdog, WatchdogReport};
pub use worker::{RestoreAttempt, RestoreOutcome, RestoreWorker};
