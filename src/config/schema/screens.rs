use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pattern tables the screen classifier matches against.
///
/// All matching is case-insensitive substring matching except
/// `target_package` (exact) and `generic_window_titles` (whole-string).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenPatterns {
    /// Package whose screens are watched.
    #[serde(default = "default_target_package")]
    pub target_package: String,

    /// Activity/fragment fragments of the policy-gated screen, across OEM builds.
    #[serde(default = "default_blocked_classes")]
    pub blocked_classes: Vec<String>,

    /// Activity/fragment fragments of the always-blocked administrative screen.
    #[serde(default = "default_protected_classes")]
    pub protected_classes: Vec<String>,

    /// Generic host activities whose identity must be read from the title.
    #[serde(default = "default_generic_containers")]
    pub generic_containers: Vec<String>,

    /// Window titles that say nothing about the screen shown.
    #[serde(default = "default_generic_window_titles")]
    pub generic_window_titles: Vec<String>,

    /// Blocked-screen title phrases keyed by locale. Every locale is active
    /// at once.
    #[serde(default = "default_blocked_titles")]
    pub blocked_titles: BTreeMap<String, Vec<String>>,

    /// Texts identifying the protected companion app on the admin screen.
    #[serde(default = "default_protected_texts")]
    pub protected_texts: Vec<String>,

    /// Stable id of the collapsing-toolbar title widget.
    #[serde(default = "default_header_title_id")]
    pub header_title_id: String,

    /// Generic title widget id, also reused by list rows.
    #[serde(default = "default_generic_title_id")]
    pub generic_title_id: String,

    /// View-id fragments that, next to `title`, mark a header widget.
    #[serde(default = "default_header_id_markers")]
    pub header_id_markers: Vec<String>,

    /// Ancestor class-name fragments of a toolbar/header.
    #[serde(default = "default_header_ancestor_classes")]
    pub header_ancestor_classes: Vec<String>,

    /// Ancestor view-id fragments of a toolbar/header.
    #[serde(default = "default_header_ancestor_ids")]
    pub header_ancestor_ids: Vec<String>,
}

fn default_target_package() -> String {
    "com.android.settings".into()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn default_blocked_classes() -> Vec<String> {
    strings(&[
        // AOSP / Pixel
        "AccessibilitySettings",
        "ToggleAccessibilityServicePreferenceFragment",
        "InvisibleToggleAccessibilityServicePreferenceFragment",
        "AccessibilityShortcutPreferenceFragment",
        // Samsung One UI
        "AccessibilitySettingsActivity",
        // Xiaomi MIUI
        "MiuiAccessibilitySettings",
    ])
}

fn default_protected_classes() -> Vec<String> {
    strings(&["DeviceAdminAdd"])
}

fn default_generic_containers() -> Vec<String> {
    strings(&["SubSettings"])
}

fn default_generic_window_titles() -> Vec<String> {
    strings(&["SubSettings", "Settings", "設定"])
}

fn default_blocked_titles() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([
        ("en".to_string(), strings(&["Accessibility"])),
        ("ja".to_string(), strings(&["ユーザー補助", "アクセシビリティ"])),
    ])
}

fn default_protected_texts() -> Vec<String> {
    strings(&["Freedom", "to.freedom.android2"])
}

fn default_header_title_id() -> String {
    "com.android.settings:id/collapsing_toolbar_title".into()
}

fn default_generic_title_id() -> String {
    "android:id/title".into()
}

fn default_header_id_markers() -> Vec<String> {
    strings(&["collapsing", "toolbar", "action_bar", "header"])
}

fn default_header_ancestor_classes() -> Vec<String> {
    strings(&["Toolbar", "ActionBar"])
}

fn default_header_ancestor_ids() -> Vec<String> {
    strings(&["toolbar", "action_bar", "collapsing"])
}

impl Default for ScreenPatterns {
    fn default() -> Self {
        Self {
            target_package: default_target_package(),
            blocked_classes: default_blocked_classes(),
            protected_classes: default_protected_classes(),
            generic_containers: default_generic_containers(),
            generic_window_titles: default_generic_window_titles(),
            blocked_titles: default_blocked_titles(),
            protected_texts: default_protected_texts(),
            header_title_id: default_header_title_id(),
            generic_title_id: default_generic_title_id(),
            header_id_markers: default_header_id_markers(),
            header_ancestor_classes: default_header_ancestor_classes(),
            header_ancestor_ids: default_header_ancestor_ids(),
        }
    }
}

impl ScreenPatterns {
    /// Blocked title phrases across every configured locale.
    pub fn all_blocked_titles(&self) -> impl Iterator<Item = &str> {
        self.blocked_titles
            .values()
            .flat_map(|phrases| phrases.iter().map(String::as_str))
    }
}
