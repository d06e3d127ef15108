use screen_guard::diagnostics::health;
use screen_guard::guard::{GuardService, GuardState, ScreenEvent};
use screen_guard::screen::ScreenSnapshot;

use super::guard_harness::{
    A11Y_CLASS, ADMIN_CLASS, GuardStack, SETTINGS, SUBSETTINGS, accessibility_page, admin_page,
    ms, time,
};

#[tokio::test(start_paused = true)]
async fn event_loop_blocks_and_reports_health() {
    let stack = GuardStack::new(time(23, 30), false);
    stack.screen.show(&accessibility_page());
    let (tx, rx) = tokio::sync::mpsc::channel(16);
    let handle =
        GuardService::new(stack.engine(), stack.screen.clone(), stack.actions.clone()).spawn(rx);

    tx.send(ScreenEvent::navigation(SETTINGS, A11Y_CLASS)).await.unwrap();
    tx.send(ScreenEvent::content_changed(SETTINGS)).await.unwrap();
    tokio::time::sleep(ms(50)).await;
    assert_eq!(stack.actions.redirects(), 1);

    drop(tx);
    let engine = handle.await.unwrap();
    assert_eq!(engine.state(), GuardState::Blocking);
    // Other tests share the registry, so only presence is stable here.
    assert!(health::component(health::COMPONENT_GUARD).is_some());
}

#[tokio::test(start_paused = true)]
async fn protected_retry_chain_runs_on_tokio_time() {
    let stack = GuardStack::new(time(7, 0), true);
    stack.screen.show(&ScreenSnapshot::new(SETTINGS));
    let (tx, rx) = tokio::sync::mpsc::channel(16);
    let handle =
        GuardService::new(stack.engine(), stack.screen.clone(), stack.actions.clone()).spawn(rx);

    tx.send(ScreenEvent::navigation(SETTINGS, ADMIN_CLASS)).await.unwrap();
    tokio::time::sleep(ms(100)).await;
    stack.screen.show(&admin_page("to.freedom.android2"));
    tokio::time::sleep(ms(100)).await;
    assert_eq!(stack.actions.redirects(), 1);

    // A different admin app on a fresh navigation is left alone.
    stack.screen.show(&admin_page("Family Link"));
    tx.send(ScreenEvent::navigation(SETTINGS, ADMIN_CLASS)).await.unwrap();
    tokio::time::sleep(ms(5_000)).await;
    assert_eq!(stack.actions.redirects(), 1);

    drop(tx);
    let engine = handle.await.unwrap();
    assert_eq!(engine.active_chain(), None);
}

#[tokio::test(start_paused = true)]
async fn kill_switch_flip_mid_chain_stops_blocked_retries() {
    let stack = GuardStack::new(time(12, 0), false);
    stack.screen.show(&ScreenSnapshot::new(SETTINGS));
    let (tx, rx) = tokio::sync::mpsc::channel(16);
    let handle =
        GuardService::new(stack.engine(), stack.screen.clone(), stack.actions.clone()).spawn(rx);

    tx.send(ScreenEvent::navigation(SETTINGS, SUBSETTINGS)).await.unwrap();
    tokio::time::sleep(ms(200)).await;
    stack.reopened_policy().set_guard_enabled(false).unwrap();
    stack.screen.show(&accessibility_page());
    tokio::time::sleep(ms(5_000)).await;

    assert_eq!(stack.actions.redirects(), 0);
    drop(tx);
    let engine = tokio_test::assert_ok!(handle.await);
    assert_eq!(engine.active_chain(), None);
}
