mod charging;
mod store;
mod time;

pub use charging::{ChargingProvider, FixedCharging, SysfsChargingProvider};
pub use store::{MemoryPreferenceStore, PrefSnapshot, PrefValue, PreferenceStore, TomlPreferenceStore};
pub use time::{FixedClock, SystemClock, TimeOfDay, TimeSource};

use crate::error::Result;
use serde::Serialize;
use std::sync::Arc;

pub const PREF_NAMESPACE: &str = "guard_prefs";
pub const KEY_START_HOUR: &str = "start_hour";
pub const KEY_START_MINUTE: &str = "start_minute";
pub const KEY_END_HOUR: &str = "end_hour";
pub const KEY_END_MINUTE: &str = "end_minute";
pub const KEY_REQUIRE_CHARGING: &str = "require_charging";
pub const KEY_GUARD_ENABLED: &str = "guard_enabled";

pub const DEFAULT_START_HOUR: u32 = 6;
pub const DEFAULT_START_MINUTE: u32 = 0;
pub const DEFAULT_END_HOUR: u32 = 8;
pub const DEFAULT_END_MINUTE: u32 = 0;
pub const DEFAULT_REQUIRE_CHARGING: bool = true;
pub const DEFAULT_GUARD_ENABLED: bool = true;

/// Snapshot of the persisted access policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolicyConfig {
    pub guard_enabled: bool,
    pub window_start: TimeOfDay,
    pub window_end: TimeOfDay,
    pub require_charging: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            guard_enabled: DEFAULT_GUARD_ENABLED,
            window_start: TimeOfDay::from_minute_of_day(DEFAULT_START_HOUR * 60 + DEFAULT_START_MINUTE),
            window_end: TimeOfDay::from_minute_of_day(DEFAULT_END_HOUR * 60 + DEFAULT_END_MINUTE),
            require_charging: DEFAULT_REQUIRE_CHARGING,
        }
    }
}

impl PolicyConfig {
    /// Absent, mistyped or out-of-range fields take their default.
    pub fn from_snapshot(snapshot: &PrefSnapshot) -> Self {
        Self {
            guard_enabled: read_bool(snapshot, KEY_GUARD_ENABLED, DEFAULT_GUARD_ENABLED),
            window_start: read_time(
                snapshot,
                (KEY_START_HOUR, DEFAULT_START_HOUR),
                (KEY_START_MINUTE, DEFAULT_START_MINUTE),
            ),
            window_end: read_time(
                snapshot,
                (KEY_END_HOUR, DEFAULT_END_HOUR),
                (KEY_END_MINUTE, DEFAULT_END_MINUTE),
            ),
            require_charging: read_bool(snapshot, KEY_REQUIRE_CHARGING, DEFAULT_REQUIRE_CHARGING),
        }
    }

    /// Half-open `[start, end)`: a window with `start == end` never matches.
    pub fn window_contains(&self, now: TimeOfDay) -> bool {
        now >= self.window_start && now < self.window_end
    }

    /// `HH:MM – HH:MM`
    pub fn window_label(&self) -> String {
        format!("{} – {}", self.window_start, self.window_end)
    }
}

/// Outcome of one policy evaluation, with the inputs that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolicyDecision {
    pub allowed: bool,
    pub guard_enabled: bool,
    pub in_window: bool,
    pub charging_ok: bool,
}

/// Decides whether the restricted screens may currently be opened.
///
/// Reads the store on every call; nothing is cached, so a write made by the
/// configuration surface applies to the very next evaluation.
pub struct ConditionChecker {
    store: Arc<dyn PreferenceStore>,
    clock: Arc<dyn TimeSource>,
    charging: Arc<dyn ChargingProvider>,
}

impl ConditionChecker {
    pub fn new(
        store: Arc<dyn PreferenceStore>,
        clock: Arc<dyn TimeSource>,
        charging: Arc<dyn ChargingProvider>,
    ) -> Self {
        Self {
            store,
            clock,
            charging,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.evaluate().allowed
    }

    pub fn evaluate(&self) -> PolicyDecision {
        let config = self.config();
        if !config.guard_enabled {
            return PolicyDecision {
                allowed: true,
                guard_enabled: false,
                in_window: config.window_contains(self.clock.now()),
                charging_ok: true,
            };
        }

        let in_window = config.window_contains(self.clock.now());
        let charging_ok = !config.require_charging || self.charging.is_charging();
        PolicyDecision {
            allowed: in_window && charging_ok,
            guard_enabled: true,
            in_window,
            charging_ok,
        }
    }

    pub fn is_charging(&self) -> bool {
        self.charging.is_charging()
    }

    pub fn is_guard_enabled(&self) -> bool {
        self.config().guard_enabled
    }

    /// Reads the whole policy from one store snapshot.
    pub fn config(&self) -> PolicyConfig {
        match self.store.snapshot() {
            Ok(snapshot) => PolicyConfig::from_snapshot(&snapshot),
            Err(error) => {
                tracing::warn!(%error, "preferences unreadable, using defaults");
                PolicyConfig::default()
            }
        }
    }

    /// Commits all four window components together.
    pub fn set_window(&self, start: TimeOfDay, end: TimeOfDay) -> Result<()> {
        self.store.put_many(&[
            (KEY_START_HOUR, PrefValue::Int(i64::from(start.hour()))),
            (KEY_START_MINUTE, PrefValue::Int(i64::from(start.minute()))),
            (KEY_END_HOUR, PrefValue::Int(i64::from(end.hour()))),
            (KEY_END_MINUTE, PrefValue::Int(i64::from(end.minute()))),
        ])?;
        tracing::info!(start = %start, end = %end, "policy window updated");
        Ok(())
    }

    /// Validates all four components before writing any of them.
    pub fn set_window_parts(
        &self,
        start_hour: u32,
        start_minute: u32,
        end_hour: u32,
        end_minute: u32,
    ) -> Result<()> {
        let start = TimeOfDay::new(start_hour, start_minute)?;
        let end = TimeOfDay::new(end_hour, end_minute)?;
        self.set_window(start, end)
    }

    pub fn set_require_charging(&self, required: bool) -> Result<()> {
        self.store
            .put(KEY_REQUIRE_CHARGING, PrefValue::Bool(required))?;
        tracing::info!(required, "charging requirement updated");
        Ok(())
    }

    pub fn set_guard_enabled(&self, enabled: bool) -> Result<()> {
        self.store.put(KEY_GUARD_ENABLED, PrefValue::Bool(enabled))?;
        tracing::info!(enabled, "guard kill switch updated");
        Ok(())
    }

    pub fn status_summary(&self) -> String {
        let config = self.config();
        let mut summary = t!("policy.summary", window = config.window_label()).to_string();
        if config.require_charging {
            summary.push_str(&t!("policy.charging_suffix"));
        }
        summary
    }
}

fn read_bool(snapshot: &PrefSnapshot, key: &str, default: bool) -> bool {
    match snapshot.get_bool(key) {
        Ok(value) => value.unwrap_or(default),
        Err(error) => {
            tracing::warn!(key, %error, "unreadable preference, using default");
            default
        }
    }
}

fn read_component(snapshot: &PrefSnapshot, key: &str, default: u32, max: u32) -> u32 {
    match snapshot.get_int(key) {
        Ok(None) => default,
        Ok(Some(value)) => match u32::try_from(value) {
            Ok(value) if value <= max => value,
            _ => {
                tracing::warn!(key, value, "out-of-range preference, using default");
                default
            }
        },
        Err(error) => {
            tracing::warn!(key, %error, "unreadable preference, using default");
            default
        }
    }
}

fn read_time(snapshot: &PrefSnapshot, hour: (&str, u32), minute: (&str, u32)) -> TimeOfDay {
    let h = read_component(snapshot, hour.0, hour.1, 23);
    let m = read_component(snapshot, minute.0, minute.1, 59);
    TimeOfDay::from_minute_of_day(h * 60 + m)
}
