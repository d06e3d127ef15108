use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use strum::{Display, IntoStaticStr};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// What to do when work is registered under a key that already has live work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ExistingWorkPolicy {
    /// Leave the running registration alone.
    Keep,
    /// Cancel it and start over.
    Replace,
}

/// Exponential delay between retries of one-shot work, capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max: Duration,
}

impl BackoffPolicy {
    pub fn exponential(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
        }
    }

    /// Wait before the next run after `failed_attempts` failures (min 1).
    pub fn delay_for(&self, failed_attempts: u32) -> Duration {
        let failures = failed_attempts.max(1);
        let delay = self
            .base
            .saturating_mul(2_u32.saturating_pow(failures - 1));
        delay.min(self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum TaskOutcome {
    Success,
    /// Run again after the registration's backoff.
    Retry,
    /// Stop without retrying.
    Failure,
}

/// A unit of self-healing work. `run` may block on platform calls.
pub trait HealingTask: Send + Sync {
    fn name(&self) -> &str;

    /// `run_attempt` starts at 1 and counts runs of one registration.
    fn run(&self, run_attempt: u32) -> TaskOutcome;
}

/// Registers background work that outlives the component that asked for it.
///
/// Registration returns `false` when [`ExistingWorkPolicy::Keep`] left a
/// live registration in place.
pub trait WorkScheduler: Send + Sync {
    fn register_periodic(
        &self,
        key: &str,
        interval: Duration,
        policy: ExistingWorkPolicy,
        task: Arc<dyn HealingTask>,
    ) -> bool;

    fn register_delayed(
        &self,
        key: &str,
        delay: Duration,
        backoff: BackoffPolicy,
        policy: ExistingWorkPolicy,
        task: Arc<dyn HealingTask>,
    ) -> bool;

    /// Returns `true` when live work was cancelled.
    fn cancel(&self, key: &str) -> bool;

    fn is_registered(&self, key: &str) -> bool;
}

/// [`WorkScheduler`] backed by tokio tasks. Must be used inside a runtime.
#[derive(Debug, Default)]
pub struct TokioWorkScheduler {
    work: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl TokioWorkScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn install<F>(&self, key: &str, policy: ExistingWorkPolicy, spawn: F) -> bool
    where
        F: FnOnce() -> JoinHandle<()>,
    {
        let Ok(mut work) = self.work.lock() else {
            tracing::error!("Work registry poisoned; '{key}' not scheduled");
            return false;
        };
        if let Some(existing) = work.get(key) {
            if !existing.is_finished() {
                match policy {
                    ExistingWorkPolicy::Keep => {
                        tracing::debug!("Work '{key}' already registered, keeping it");
                        return false;
                    }
                    ExistingWorkPolicy::Replace => {
                        tracing::info!("Work '{key}' replaced");
                        existing.abort();
                    }
                }
            }
        }
        work.insert(key.to_string(), spawn());
        true
    }

    /// Cancels every registration.
    pub fn shutdown(&self) {
        if let Ok(mut work) = self.work.lock() {
            for (_, handle) in work.drain() {
                handle.abort();
            }
        }
    }
}

impl Drop for TokioWorkScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_task(task: &Arc<dyn HealingTask>, attempt: u32) -> TaskOutcome {
    let worker = Arc::clone(task);
    match tokio::task::spawn_blocking(move || worker.run(attempt)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Healing task '{}' crashed: {e}", task.name());
            TaskOutcome::Failure
        }
    }
}

impl WorkScheduler for TokioWorkScheduler {
    fn register_periodic(
        &self,
        key: &str,
        interval: Duration,
        policy: ExistingWorkPolicy,
        task: Arc<dyn HealingTask>,
    ) -> bool {
        let key_owned = key.to_string();
        self.install(key, policy, move || {
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    match run_task(&task, 1).await {
                        TaskOutcome::Success => {
                            tracing::debug!("Periodic work '{key_owned}' completed");
                        }
                        outcome => {
                            tracing::warn!(
                                "Periodic work '{key_owned}' ended with {outcome}; next run in {}s",
                                interval.as_secs()
                            );
                        }
                    }
                }
            })
        })
    }

    fn register_delayed(
        &self,
        key: &str,
        delay: Duration,
        backoff: BackoffPolicy,
        policy: ExistingWorkPolicy,
        task: Arc<dyn HealingTask>,
    ) -> bool {
        let key_owned = key.to_string();
        self.install(key, policy, move || {
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let mut attempt: u32 = 1;
                loop {
                    tracing::info!("Work '{key_owned}' starting (attempt {attempt})");
                    match run_task(&task, attempt).await {
                        TaskOutcome::Success => {
                            tracing::info!("Work '{key_owned}' succeeded");
                            break;
                        }
                        TaskOutcome::Failure => {
                            tracing::error!("Work '{key_owned}' failed after {attempt} attempts");
                            break;
                        }
                        TaskOutcome::Retry => {
                            let wait = backoff.delay_for(attempt);
                            tracing::warn!(
                                "Work '{key_owned}' will retry in {}s",
                                wait.as_secs()
                            );
                            tokio::time::sleep(wait).await;
                            attempt = attempt.saturating_add(1);
                        }
                    }
                }
            })
        })
    }

    fn cancel(&self, key: &str) -> bool {
        let Ok(mut work) = self.work.lock() else {
            return false;
        };
        match work.remove(key) {
            Some(handle) => {
                let live = !handle.is_finished();
                handle.abort();
                if live {
                    tracing::info!("Work '{key}' cancelled");
                }
                live
            }
            None => false,
        }
    }

    fn is_registered(&self, key: &str) -> bool {
        self.work
            .lock()
            .map(|work| work.get(key).is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }
}
