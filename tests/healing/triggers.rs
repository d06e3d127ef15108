use super::healing_harness::{HealingStack, OURS, Schedule};
use screen_guard::platform::healing::{
    ExistingWorkPolicy, LifecycleTrigger, MemorySettings, RESTORE_WORK_KEY, ScriptedChannel,
    TaskOutcome, WATCHDOG_WORK_KEY, WriteOutcome,
};
use screen_guard::runtime::observability::ObserverEvent;
use std::sync::Arc;
use std::time::Duration;

fn secs(value: u64) -> Duration {
    Duration::from_secs(value)
}

// ── Boot / update triggers ──────────────────────────────────

#[test]
fn boot_falls_back_to_shell_and_protects_packages() {
    let stack = HealingStack::shell_only();

    let report = stack.healing.on_trigger(LifecycleTrigger::BootCompleted);
    assert!(report.watchdog_registered);
    assert!(report.restored_immediately);
    assert!(!report.restore_scheduled);
    assert!(report.uninstall_protected);

    assert_eq!(
        stack.settings.services().as_deref(),
        Some(format!("com.other/.Service:{OURS}").as_str())
    );
    assert!(stack.settings.master_switch());
    assert_eq!(stack.primary.service_writes(), 1);
    assert_eq!(stack.secondary.service_writes(), 1);
    assert_eq!(
        stack.settings.uninstall_blocked(),
        ["io.screenguard", "to.freedom.android2"]
    );
    assert!(report.services_restricted);
    assert_eq!(
        stack.settings.permitted_services(),
        Some(vec!["io.screenguard".to_string(), "to.freedom.android2".to_string()])
    );
    assert_eq!(stack.primary.restrict_writes(), 1);
    assert_eq!(stack.secondary.restrict_writes(), 1);
    assert_eq!(
        stack.scheduler.history(),
        vec![(WATCHDOG_WORK_KEY.to_string(), ExistingWorkPolicy::Keep)]
    );
}

#[test]
fn already_active_service_is_left_alone() {
    let settings = Arc::new(MemorySettings::with_services(OURS));
    let stack = HealingStack::new(
        ScriptedChannel::new("device_owner", &settings),
        ScriptedChannel::new("shell", &settings),
        settings,
    );

    let report = stack.healing.on_trigger(LifecycleTrigger::PackageReplaced);
    assert!(report.restored_immediately);
    assert!(!report.restore_scheduled);
    assert_eq!(stack.primary.service_writes(), 0);
    assert_eq!(stack.secondary.service_writes(), 0);
    // Uninstall protection is re-asserted on every trigger.
    assert!(report.uninstall_protected);
    assert_eq!(stack.primary.uninstall_writes(), 2);
}

#[test]
fn allowlist_is_reasserted_on_every_trigger() {
    let stack = HealingStack::shell_only();

    for trigger in [
        LifecycleTrigger::BootCompleted,
        LifecycleTrigger::PackageReplaced,
        LifecycleTrigger::EnforcementLost,
    ] {
        assert!(stack.healing.on_trigger(trigger).services_restricted);
    }
    assert_eq!(stack.secondary.restrict_writes(), 3);
}

#[test]
fn locked_down_host_leaves_services_unrestricted() {
    let stack = HealingStack::locked_down();

    let report = stack.healing.on_trigger(LifecycleTrigger::BootCompleted);
    assert!(!report.services_restricted);
    assert!(stack.settings.permitted_services().is_none());
}

#[test]
fn unreadable_list_schedules_restore_without_writing() {
    let stack = HealingStack::shell_only();
    stack.settings.fail_reads(true);

    let report = stack.healing.on_trigger(LifecycleTrigger::EnforcementLost);
    assert!(!report.restored_immediately);
    assert!(report.restore_scheduled);
    assert_eq!(stack.primary.service_writes(), 0);
    assert_eq!(stack.secondary.service_writes(), 0);
}

#[test]
fn repeated_triggers_keep_watchdog_and_replace_restore() {
    let stack = HealingStack::locked_down();

    assert!(stack.healing.on_trigger(LifecycleTrigger::BootCompleted).watchdog_registered);
    let second = stack.healing.on_trigger(LifecycleTrigger::PackageReplaced);
    assert!(!second.watchdog_registered);
    assert!(second.restore_scheduled);

    assert_eq!(
        stack.scheduler.history(),
        vec![
            (WATCHDOG_WORK_KEY.to_string(), ExistingWorkPolicy::Keep),
            (RESTORE_WORK_KEY.to_string(), ExistingWorkPolicy::Replace),
            (WATCHDOG_WORK_KEY.to_string(), ExistingWorkPolicy::Keep),
            (RESTORE_WORK_KEY.to_string(), ExistingWorkPolicy::Replace),
        ]
    );
    let Some(watchdog) = stack.scheduler.live(WATCHDOG_WORK_KEY) else {
        panic!("watchdog should stay registered");
    };
    assert!(matches!(
        watchdog.schedule,
        Schedule::Periodic { interval } if interval == secs(15 * 60)
    ));
}

// ── Restore job ─────────────────────────────────────────────

#[test]
fn restore_succeeds_once_fallback_stops_denying() {
    let settings = Arc::new(MemorySettings::with_services("com.other/.Service"));
    let stack = HealingStack::new(
        ScriptedChannel::new("device_owner", &settings).denying(),
        ScriptedChannel::new("shell", &settings)
            .with_script([WriteOutcome::PermissionDenied, WriteOutcome::PermissionDenied]),
        settings,
    );

    let report = stack.healing.on_trigger(LifecycleTrigger::EnforcementLost);
    assert!(report.restore_scheduled);

    let runs = stack.scheduler.drive_delayed(RESTORE_WORK_KEY, 10);
    assert_eq!(
        runs,
        vec![
            (secs(5), 1, TaskOutcome::Retry),
            (secs(35), 2, TaskOutcome::Success),
        ]
    );
    assert!(stack.healing.restorer().is_enforcement_active());
}

// ── Watchdog ────────────────────────────────────────────────

#[test]
fn watchdog_skips_work_while_guard_is_disabled() {
    let stack = HealingStack::shell_only();
    tokio_test::assert_ok!(stack.policy.set_guard_enabled(false));
    assert!(stack.healing.schedule_watchdog());

    assert_eq!(
        stack.scheduler.tick_periodic(WATCHDOG_WORK_KEY),
        Some(TaskOutcome::Success)
    );
    assert_eq!(stack.secondary.service_writes(), 0);
    assert_eq!(
        stack.observer.events(),
        vec![ObserverEvent::WatchdogTick {
            skipped: true,
            restored: false
        }]
    );

    tokio_test::assert_ok!(stack.policy.set_guard_enabled(true));
    stack.scheduler.tick_periodic(WATCHDOG_WORK_KEY);
    assert!(stack.healing.restorer().is_enforcement_active());
}
