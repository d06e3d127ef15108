use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

const POWER_SUPPLY_ROOT: &str = "/sys/class/power_supply";

/// Charging-state capability. The only real-world input of the policy
/// engine besides the clock.
pub trait ChargingProvider: Send + Sync {
    fn is_charging(&self) -> bool;
}

/// Settable charging state for tests and replays.
#[derive(Debug, Default)]
pub struct FixedCharging {
    charging: AtomicBool,
}

impl FixedCharging {
    pub fn new(charging: bool) -> Self {
        Self {
            charging: AtomicBool::new(charging),
        }
    }

    pub fn set(&self, charging: bool) {
        self.charging.store(charging, Ordering::SeqCst);
    }
}

impl ChargingProvider for FixedCharging {
    fn is_charging(&self) -> bool {
        self.charging.load(Ordering::SeqCst)
    }
}

/// Reads `status` of every power supply under sysfs. A supply reporting
/// `Charging` or `Full` counts as plugged in.
#[derive(Debug, Clone)]
pub struct SysfsChargingProvider {
    root: PathBuf,
}

impl SysfsChargingProvider {
    pub fn new() -> Self {
        Self::with_root(POWER_SUPPLY_ROOT)
    }

    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ChargingProvider for SysfsChargingProvider {
    fn is_charging(&self) -> bool {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(error) => {
                tracing::debug!(%error, root = %self.root.display(), "power supply dir unreadable");
                return false;
            }
        };

        entries.flatten().any(|entry| {
            std::fs::read_to_string(entry.path().join("status"))
                .map(|status| matches!(status.trim(), "Charging" | "Full"))
                .unwrap_or(false)
        })
    }
}
