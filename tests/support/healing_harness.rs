#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use screen_guard::config::HealingConfig;
use screen_guard::platform::healing::{
    BackoffPolicy, EnforcementRestorer, ExistingWorkPolicy, HealingTask, MemorySettings,
    PrivilegedChannel, ScriptedChannel, SelfHealing, TaskOutcome, WorkScheduler,
};
use screen_guard::policy::{ConditionChecker, FixedCharging, FixedClock, MemoryPreferenceStore};
use screen_guard::runtime::observability::RecordingObserver;

pub const OURS: &str = "io.screenguard/io.screenguard.GuardAccessibilityService";

#[derive(Clone)]
pub enum Schedule {
    Periodic { interval: Duration },
    Delayed { delay: Duration, backoff: BackoffPolicy },
}

#[derive(Clone)]
pub struct Registration {
    pub key: String,
    pub schedule: Schedule,
    pub policy: ExistingWorkPolicy,
    pub task: Arc<dyn HealingTask>,
}

/// [`WorkScheduler`] that only records registrations. Work runs when the
/// test asks for it, on a virtual clock.
#[derive(Default)]
pub struct RecordingWorkScheduler {
    history: Mutex<Vec<Registration>>,
    live: Mutex<BTreeMap<String, Registration>>,
}

impl RecordingWorkScheduler {
    pub fn history(&self) -> Vec<(String, ExistingWorkPolicy)> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .map(|r| (r.key.clone(), r.policy))
            .collect()
    }

    pub fn live(&self, key: &str) -> Option<Registration> {
        self.live.lock().unwrap().get(key).cloned()
    }

    /// Runs delayed work until it stops, returning `(elapsed, attempt,
    /// outcome)` per run. Elapsed time starts at registration.
    pub fn drive_delayed(&self, key: &str, limit: u32) -> Vec<(Duration, u32, TaskOutcome)> {
        let Some(registration) = self.live(key) else {
            return Vec::new();
        };
        let Schedule::Delayed { delay, backoff } = registration.schedule else {
            panic!("{key} is not delayed work");
        };

        let mut runs = Vec::new();
        let mut elapsed = delay;
        for attempt in 1..=limit {
            let outcome = registration.task.run(attempt);
            runs.push((elapsed, attempt, outcome));
            if outcome != TaskOutcome::Retry {
                break;
            }
            elapsed += backoff.delay_for(attempt);
        }
        self.live.lock().unwrap().remove(key);
        runs
    }

    /// Runs one period of periodic work.
    pub fn tick_periodic(&self, key: &str) -> Option<TaskOutcome> {
        let registration = self.live(key)?;
        Some(registration.task.run(1))
    }

    fn register(&self, registration: Registration) -> bool {
        self.history.lock().unwrap().push(registration.clone());
        let mut live = self.live.lock().unwrap();
        if live.contains_key(&registration.key) && registration.policy == ExistingWorkPolicy::Keep {
            return false;
        }
        live.insert(registration.key.clone(), registration);
        true
    }
}

impl WorkScheduler for RecordingWorkScheduler {
    fn register_periodic(
        &self,
        key: &str,
        interval: Duration,
        policy: ExistingWorkPolicy,
        task: Arc<dyn HealingTask>,
    ) -> bool {
        self.register(Registration {
            key: key.to_string(),
            schedule: Schedule::Periodic { interval },
            policy,
            task,
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
        self.register(Registration {
            key: key.to_string(),
            schedule: Schedule::Delayed { delay, backoff },
            policy,
            task,
        })
    }

    fn cancel(&self, key: &str) -> bool {
        self.live.lock().unwrap().remove(key).is_some()
    }

    fn is_registered(&self, key: &str) -> bool {
        self.live.lock().unwrap().contains_key(key)
    }
}

pub struct HealingStack {
    pub settings: Arc<MemorySettings>,
    pub primary: Arc<ScriptedChannel>,
    pub secondary: Arc<ScriptedChannel>,
    pub policy: Arc<ConditionChecker>,
    pub scheduler: Arc<RecordingWorkScheduler>,
    pub observer: Arc<RecordingObserver>,
    pub healing: SelfHealing,
}

impl HealingStack {
    /// Primary channel = device-owner API, secondary = shell fallback.
    pub fn new(primary: ScriptedChannel, secondary: ScriptedChannel, settings: Arc<MemorySettings>) -> Self {
        let primary = Arc::new(primary);
        let secondary = Arc::new(secondary);
        let channels: Vec<Arc<dyn PrivilegedChannel>> = vec![primary.clone(), secondary.clone()];
        let config = HealingConfig::default();
        let restorer = Arc::new(EnforcementRestorer::new(settings.clone(), channels, &config));
        let policy = Arc::new(ConditionChecker::new(
            Arc::new(MemoryPreferenceStore::new()),
            Arc::new(FixedClock::at(12, 0).expect("valid time")),
            Arc::new(FixedCharging::new(false)),
        ));
        let scheduler = Arc::new(RecordingWorkScheduler::default());
        let observer = Arc::new(RecordingObserver::new());
        let healing = SelfHealing::with_observer(
            restorer,
            policy.clone(),
            scheduler.clone(),
            &config,
            observer.clone(),
        );
        Self {
            settings,
            primary,
            secondary,
            policy,
            scheduler,
            observer,
            healing,
        }
    }

    /// Both channels deny every write.
    pub fn locked_down() -> Self {
        let settings = Arc::new(MemorySettings::with_services("com.other/.Service"));
        Self::new(
            ScriptedChannel::new("device_owner", &settings).denying(),
            ScriptedChannel::new("shell", &settings).denying(),
            settings,
        )
    }

    /// Device-owner writes denied; the shell fallback works.
    pub fn shell_only() -> Self {
        let settings = Arc::new(MemorySettings::with_services("com.other/.Service"));
        Self::new(
            ScriptedChannel::new("device_owner", &settings).denying(),
            ScriptedChannel::new("shell", &settings),
            settings,
        )
    }
}
