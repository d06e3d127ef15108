use screen_guard::guard::ScreenEvent;

use super::guard_harness::{A11Y_CLASS, GuardStack, SETTINGS, accessibility_page, ms, time};

#[test]
fn edits_from_another_reader_apply_to_next_event() {
    let stack = GuardStack::new(time(21, 0), false);
    stack.screen.show(&accessibility_page());
    let mut driver = stack.driver();

    driver.dispatch(&ScreenEvent::navigation(SETTINGS, A11Y_CLASS));
    assert_eq!(stack.actions.redirects(), 1);

    let editor = stack.reopened_policy();
    editor.set_window(time(20, 0), time(22, 0)).unwrap();
    editor.set_require_charging(false).unwrap();

    driver.advance_to(ms(5_000));
    driver.dispatch(&ScreenEvent::navigation(SETTINGS, A11Y_CLASS));
    assert_eq!(stack.actions.redirects(), 1);
}

#[test]
fn kill_switch_opens_every_screen() {
    let stack = GuardStack::new(time(3, 0), false);
    stack.reopened_policy().set_guard_enabled(false).unwrap();
    stack.screen.show(&accessibility_page());
    let mut driver = stack.driver();

    driver.dispatch(&ScreenEvent::navigation(SETTINGS, A11Y_CLASS));
    driver.dispatch(&ScreenEvent::content_changed(SETTINGS));
    assert_eq!(stack.actions.redirects(), 0);
    assert!(stack.policy.is_allowed());
}

#[test]
fn window_components_survive_reopen() {
    let stack = GuardStack::new(time(12, 0), false);
    stack.policy.set_window_parts(5, 45, 7, 15).unwrap();
    stack.policy.set_window_parts(5, 45, 7, 15).unwrap();

    let reopened = stack.reopened_policy().config();
    assert_eq!(reopened.window_start, time(5, 45));
    assert_eq!(reopened.window_end, time(7, 15));
    assert!(stack.config.prefs_path().exists());
}

#[test]
fn invalid_setter_input_leaves_store_untouched() {
    let stack = GuardStack::new(time(12, 0), false);
    assert!(stack.policy.set_window_parts(6, 0, 24, 0).is_err());
    assert!(!stack.config.prefs_path().exists());
}

#[test]
fn out_of_range_file_values_fall_back_to_defaults() {
    let stack = GuardStack::new(time(12, 0), false);
    std::fs::write(
        stack.config.prefs_path(),
        "[guard_prefs]\nstart_hour = 9\nend_hour = 24\nend_minute = 75\n",
    )
    .unwrap();

    let config = stack.policy.config();
    assert_eq!(config.window_start, time(9, 0));
    assert_eq!(config.window_end, time(8, 0));
}
