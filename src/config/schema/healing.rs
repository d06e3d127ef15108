use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Platform floor for periodic work.
pub const MIN_WATCHDOG_INTERVAL_MINUTES: u64 = 15;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealingConfig {
    #[serde(default = "default_watchdog_interval_minutes")]
    pub watchdog_interval_minutes: u64,
    #[serde(default = "default_restore_initial_delay_secs")]
    pub restore_initial_delay_secs: u64,
    #[serde(default = "default_restore_backoff_secs")]
    pub restore_backoff_secs: u64,
    #[serde(default = "default_restore_max_backoff_secs")]
    pub restore_max_backoff_secs: u64,
    #[serde(default = "default_restore_max_attempts")]
    pub restore_max_attempts: u32,
    /// Flattened component id of this guard's enforcement service, as it
    /// appears in the host's active-service list.
    #[serde(default = "default_enforcement_component")]
    pub enforcement_component: String,
    /// Package of the guard itself.
    #[serde(default = "default_own_package")]
    pub own_package: String,
    /// Third-party safeguard apps kept installed alongside the guard.
    #[serde(default = "default_protected_packages")]
    pub protected_packages: Vec<String>,
}

fn default_watchdog_interval_minutes() -> u64 {
    MIN_WATCHDOG_INTERVAL_MINUTES
}

fn default_restore_initial_delay_secs() -> u64 {
    5
}

fn default_restore_backoff_secs() -> u64 {
    30
}

fn default_restore_max_backoff_secs() -> u64 {
    5 * 60 * 60
}

fn default_restore_max_attempts() -> u32 {
    5
}

fn default_enforcement_component() -> String {
    "io.screenguard/io.screenguard.GuardAccessibilityService".into()
}

fn default_own_package() -> String {
    "io.screenguard".into()
}

fn default_protected_packages() -> Vec<String> {
    vec!["to.freedom.android2".into()]
}

impl Default for HealingConfig {
    fn default() -> Self {
        Self {
            watchdog_interval_minutes: default_watchdog_interval_minutes(),
            restore_initial_delay_secs: default_restore_initial_delay_secs(),
            restore_backoff_secs: default_restore_backoff_secs(),
            restore_max_backoff_secs: default_restore_max_backoff_secs(),
            restore_max_attempts: default_restore_max_attempts(),
            enforcement_component: default_enforcement_component(),
            own_package: default_own_package(),
            protected_packages: default_protected_packages(),
        }
    }
}

impl HealingConfig {
    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_secs(
            self.watchdog_interval_minutes
                .max(MIN_WATCHDOG_INTERVAL_MINUTES)
                * 60,
        )
    }

    /// The guard's own package followed by every protected companion.
    pub fn uninstall_protected_packages(&self) -> Vec<String> {
        let mut packages = vec![self.own_package.clone()];
        for package in &self.protected_packages {
            if !packages.contains(package) {
                packages.push(package.clone());
            }
        }
        packages
    }
}
