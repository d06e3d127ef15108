use screen_guard::guard::{BlockKind, GuardEffect, ScreenEvent};
use screen_guard::runtime::ObserverEvent;
use screen_guard::screen::{MatchSource, ScreenSnapshot};

use super::guard_harness::{
    A11Y_CLASS, ADMIN_CLASS, DISPLAY_CLASS, GuardStack, SETTINGS, SUBSETTINGS, accessibility_page,
    admin_page, display_page, japanese_accessibility_page, ms, time,
};

#[test]
fn scenario_a_window_edge_is_exclusive() {
    let stack = GuardStack::new(time(7, 59), false);
    stack.policy.set_window(time(6, 0), time(8, 0)).unwrap();
    stack.policy.set_require_charging(false).unwrap();
    stack.screen.show(&accessibility_page());
    let mut driver = stack.driver();

    assert!(driver.dispatch(&ScreenEvent::navigation(SETTINGS, A11Y_CLASS)).is_empty());

    stack.clock.set(time(8, 0));
    driver.advance_to(ms(2_000));
    let effects = driver.dispatch(&ScreenEvent::navigation(SETTINGS, A11Y_CLASS));
    assert!(matches!(effects[0].effect, GuardEffect::GoHome { kind: BlockKind::Locked, .. }));
    assert_eq!(stack.actions.redirects(), 1);
}

#[test]
fn scenario_b_one_redirect_per_navigation() {
    let stack = GuardStack::new(time(22, 0), true);
    stack.screen.show(&accessibility_page());
    let mut driver = stack.driver();

    driver.dispatch(&ScreenEvent::navigation(SETTINGS, A11Y_CLASS));
    driver.advance_to(ms(50));
    driver.dispatch(&ScreenEvent::content_changed(SETTINGS));
    driver.advance_to(ms(120));
    driver.dispatch(&ScreenEvent::content_changed(SETTINGS));

    assert_eq!(stack.actions.redirects(), 1);
    assert_eq!(stack.actions.messages().len(), 1);
    assert!(stack.actions.messages()[0].contains("06:00 – 08:00"));
}

#[test]
fn scenario_c_protected_screen_blocked_inside_window() {
    let stack = GuardStack::new(time(7, 0), true);
    assert!(stack.policy.is_allowed());
    stack.screen.show(&admin_page("Freedom"));
    let mut driver = stack.driver();

    let effects = driver.dispatch(&ScreenEvent::navigation(SETTINGS, ADMIN_CLASS));
    assert!(matches!(
        &effects[0].effect,
        GuardEffect::GoHome { kind: BlockKind::Protected, reason } if reason.source == MatchSource::NodeScan
    ));
    assert_eq!(stack.actions.redirects(), 1);
}

#[test]
fn scenario_d_generic_container_resolved_from_header() {
    let stack = GuardStack::new(time(12, 0), false);
    stack.screen.show(&accessibility_page());
    let mut driver = stack.driver();

    let effects = driver.dispatch(&ScreenEvent::navigation(SETTINGS, SUBSETTINGS));
    assert!(matches!(effects[0].effect, GuardEffect::GoHome { .. }));
    assert_eq!(driver.pending_retries(), 0);
    assert_eq!(stack.screen.live_handles(), 0);
}

#[test]
fn japanese_title_is_recognised_alongside_english() {
    let stack = GuardStack::new(time(12, 0), false);
    stack.screen.show(&japanese_accessibility_page());
    let mut driver = stack.driver();

    driver.dispatch(&ScreenEvent::navigation(SETTINGS, SUBSETTINGS));
    assert_eq!(stack.actions.redirects(), 1);
}

#[test]
fn unrelated_settings_pages_never_redirect() {
    let stack = GuardStack::new(time(12, 0), false);
    stack.screen.show(&display_page());
    let mut driver = stack.driver();

    driver.dispatch(&ScreenEvent::navigation(SETTINGS, DISPLAY_CLASS));
    driver.dispatch(&ScreenEvent::navigation(SETTINGS, SUBSETTINGS));
    driver.run_until_idle();
    driver.dispatch(&ScreenEvent::content_changed(SETTINGS));

    assert_eq!(stack.actions.redirects(), 0);
    assert_eq!(stack.screen.live_handles(), 0);
}

#[test]
fn late_render_redirects_once_and_drains_chain() {
    let stack = GuardStack::new(time(12, 0), false);
    stack.screen.show(&ScreenSnapshot::new(SETTINGS));
    let mut driver = stack.driver();

    driver.dispatch(&ScreenEvent::navigation(SETTINGS, SUBSETTINGS));
    assert!(driver.pending_retries() > 0);

    driver.advance_to(ms(200));
    stack.screen.show(&accessibility_page());
    let fired = driver.run_until_idle();

    let redirects = fired
        .iter()
        .filter(|timed| matches!(timed.effect, GuardEffect::GoHome { .. }))
        .count();
    assert_eq!(redirects, 1);
    assert_eq!(driver.pending_retries(), 0);
    assert_eq!(stack.actions.redirects(), 1);

    let cancelled = stack.observer.events().into_iter().any(|event| {
        matches!(event, ObserverEvent::RetryChainCancelled { reason: "matched", .. })
    });
    assert!(cancelled);
}

#[test]
fn navigating_away_stops_pending_retries() {
    let stack = GuardStack::new(time(12, 0), false);
    stack.screen.clear();
    let mut driver = stack.driver();

    driver.dispatch(&ScreenEvent::navigation(SETTINGS, SUBSETTINGS));
    driver.advance_to(ms(100));
    driver.dispatch(&ScreenEvent::navigation("com.google.android.apps.nexuslauncher", "Launcher"));
    assert_eq!(driver.pending_retries(), 0);

    stack.screen.show(&accessibility_page());
    driver.run_until_idle();
    assert_eq!(stack.actions.redirects(), 0);
}
