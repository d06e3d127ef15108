use super::healing_harness::{HealingStack, OURS};
use screen_guard::config::HealingConfig;
use screen_guard::platform::healing::{
    EnforcementRestorer, LifecycleTrigger, MemorySettings, PrivilegedChannel, RESTORE_WORK_KEY,
    ScriptedChannel, SelfHealing, TaskOutcome, TokioWorkScheduler, WATCHDOG_WORK_KEY,
    WorkScheduler,
};
use screen_guard::policy::{ConditionChecker, FixedCharging, FixedClock, MemoryPreferenceStore};
use screen_guard::runtime::observability::{ObserverEvent, RecordingObserver};
use std::sync::Arc;
use std::time::Duration;

fn secs(value: u64) -> Duration {
    Duration::from_secs(value)
}

fn give_ups(observer: &RecordingObserver) -> usize {
    observer
        .events()
        .iter()
        .filter(|event| {
            matches!(
                event,
                ObserverEvent::RestoreAttempt {
                    outcome: "give_up",
                    ..
                }
            )
        })
        .count()
}

#[test]
fn restore_gives_up_after_five_attempts_with_doubling_backoff() {
    let stack = HealingStack::locked_down();
    stack.healing.on_trigger(LifecycleTrigger::BootCompleted);

    let runs = stack.scheduler.drive_delayed(RESTORE_WORK_KEY, 20);
    let timeline: Vec<_> = runs.iter().map(|(at, attempt, _)| (*at, *attempt)).collect();
    assert_eq!(
        timeline,
        vec![
            (secs(5), 1),
            (secs(35), 2),
            (secs(95), 3),
            (secs(215), 4),
            (secs(455), 5),
        ]
    );
    assert_eq!(runs.last().map(|run| run.2), Some(TaskOutcome::Failure));
    assert_eq!(give_ups(&stack.observer), 1);

    // The watchdog survives the give-up and keeps running.
    assert!(!stack.scheduler.is_registered(RESTORE_WORK_KEY));
    assert_eq!(
        stack.scheduler.tick_periodic(WATCHDOG_WORK_KEY),
        Some(TaskOutcome::Success)
    );
}

#[tokio::test(start_paused = true)]
async fn watchdog_recovers_after_restore_gives_up() {
    let settings = Arc::new(MemorySettings::new());
    let device_owner = Arc::new(ScriptedChannel::new("device_owner", &settings).denying());
    let shell = Arc::new(ScriptedChannel::new("shell", &settings).unavailable());
    let channels: Vec<Arc<dyn PrivilegedChannel>> = vec![device_owner, shell.clone()];
    let config = HealingConfig::default();
    let restorer = Arc::new(EnforcementRestorer::new(settings.clone(), channels, &config));
    let policy = Arc::new(ConditionChecker::new(
        Arc::new(MemoryPreferenceStore::new()),
        Arc::new(FixedClock::at(12, 0).unwrap()),
        Arc::new(FixedCharging::new(false)),
    ));
    let scheduler = Arc::new(TokioWorkScheduler::new());
    let observer = Arc::new(RecordingObserver::new());
    let healing =
        SelfHealing::with_observer(restorer, policy, scheduler.clone(), &config, observer.clone());

    let report = healing.on_trigger(LifecycleTrigger::BootCompleted);
    assert!(report.restore_scheduled);

    tokio::time::sleep(secs(600)).await;
    assert_eq!(give_ups(&observer), 1);
    assert!(!scheduler.is_registered(RESTORE_WORK_KEY));
    assert_eq!(settings.services(), None);

    // Shell access appears; the next watchdog period restores.
    shell.set_available(true);
    tokio::time::sleep(secs(400)).await;
    assert_eq!(settings.services().as_deref(), Some(OURS));
    assert!(scheduler.is_registered(WATCHDOG_WORK_KEY));
}
