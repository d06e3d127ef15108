use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Delays (from the navigation event) of the re-checks scheduled when a
    /// screen has not rendered its title yet.
    #[serde(default = "default_retry_delays_ms")]
    pub retry_delays_ms: Vec<u64>,
    /// Minimum gap between two user notifications.
    #[serde(default = "default_notify_cooldown_ms")]
    pub notify_cooldown_ms: u64,
    /// Content-change events this close to the last redirect are dropped.
    #[serde(default = "default_content_throttle_ms")]
    pub content_throttle_ms: u64,
    /// How many ancestors are walked looking for a toolbar/header.
    #[serde(default = "default_header_ancestor_depth")]
    pub header_ancestor_depth: usize,
}

fn default_retry_delays_ms() -> Vec<u64> {
    vec![150, 400, 800, 1500, 3000]
}

fn default_notify_cooldown_ms() -> u64 {
    1000
}

fn default_content_throttle_ms() -> u64 {
    300
}

fn default_header_ancestor_depth() -> usize {
    5
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            retry_delays_ms: default_retry_delays_ms(),
            notify_cooldown_ms: default_notify_cooldown_ms(),
            content_throttle_ms: default_content_throttle_ms(),
            header_ancestor_depth: default_header_ancestor_depth(),
        }
    }
}

impl GuardConfig {
    pub fn retry_delays(&self) -> Vec<Duration> {
        self.retry_delays_ms
            .iter()
            .copied()
            .map(Duration::from_millis)
            .collect()
    }
}
