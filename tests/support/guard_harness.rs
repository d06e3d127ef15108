#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use screen_guard::Config;
use screen_guard::guard::{GuardEngine, LogicalDriver, RecordingActions};
use screen_guard::policy::{ConditionChecker, FixedCharging, FixedClock, TimeOfDay, TomlPreferenceStore};
use screen_guard::runtime::observability::RecordingObserver;
use screen_guard::screen::{ScreenSnapshot, SnapshotNode, SnapshotScreen};

pub const SETTINGS: &str = "com.android.settings";
pub const SUBSETTINGS: &str = "com.android.settings.SubSettings";
pub const A11Y_CLASS: &str = "com.android.settings.accessibility.AccessibilitySettings";
pub const ADMIN_CLASS: &str =
    "com.android.settings.applications.specialaccess.deviceadmin.DeviceAdminAdd";
pub const DISPLAY_CLASS: &str = "com.android.settings.display.DisplaySettings";

pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

pub fn time(hour: u32, minute: u32) -> TimeOfDay {
    TimeOfDay::new(hour, minute).expect("valid time")
}

fn page(children: Vec<SnapshotNode>) -> ScreenSnapshot {
    let mut root = SnapshotNode::container("android.widget.FrameLayout");
    root.children = children;
    ScreenSnapshot::new(SETTINGS).with_root(root)
}

pub fn accessibility_page() -> ScreenSnapshot {
    page(vec![
        SnapshotNode::container("androidx.appcompat.widget.Toolbar")
            .with_child(SnapshotNode::text("Accessibility")),
        SnapshotNode::text("TalkBack"),
    ])
}

pub fn japanese_accessibility_page() -> ScreenSnapshot {
    page(vec![SnapshotNode::text("ユーザー補助").with_heading()])
}

pub fn display_page() -> ScreenSnapshot {
    page(vec![
        SnapshotNode::text("Display").with_heading(),
        SnapshotNode::text("Brightness level"),
    ])
}

pub fn admin_page(app: &str) -> ScreenSnapshot {
    page(vec![
        SnapshotNode::text("Activate device admin app?"),
        SnapshotNode::text(app),
    ])
}

/// Full guard stack over a file-backed preference store.
pub struct GuardStack {
    pub dir: TempDir,
    pub config: Config,
    pub clock: Arc<FixedClock>,
    pub charging: Arc<FixedCharging>,
    pub policy: Arc<ConditionChecker>,
    pub screen: Arc<SnapshotScreen>,
    pub actions: Arc<RecordingActions>,
    pub observer: Arc<RecordingObserver>,
}

impl GuardStack {
    pub fn new(at: TimeOfDay, charging: bool) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let config = Config::load_or_init_at(dir.path()).expect("config");
        let clock = Arc::new(FixedClock::new(at));
        let charging = Arc::new(FixedCharging::new(charging));
        let store = TomlPreferenceStore::new(config.prefs_path(), config.prefs.namespace.clone());
        let policy = Arc::new(ConditionChecker::new(
            Arc::new(store),
            clock.clone(),
            charging.clone(),
        ));
        Self {
            dir,
            config,
            clock,
            charging,
            policy,
            screen: Arc::new(SnapshotScreen::new()),
            actions: Arc::new(RecordingActions::new()),
            observer: Arc::new(RecordingObserver::new()),
        }
    }

    pub fn engine(&self) -> GuardEngine {
        GuardEngine::from_config(&self.config, self.policy.clone()).with_observer(self.observer.clone())
    }

    pub fn driver(&self) -> LogicalDriver {
        LogicalDriver::new(self.engine(), self.screen.clone(), self.actions.clone())
    }

    /// A second policy reader over the same preference file.
    pub fn reopened_policy(&self) -> ConditionChecker {
        let store =
            TomlPreferenceStore::new(self.config.prefs_path(), self.config.prefs.namespace.clone());
        ConditionChecker::new(Arc::new(store), self.clock.clone(), self.charging.clone())
    }
}
