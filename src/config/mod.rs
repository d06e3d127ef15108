pub mod schema;

pub use schema::{
    Config, GuardConfig, HealingConfig, MIN_WATCHDOG_INTERVAL_MINUTES, ObservabilityConfig,
    PrefsConfig, ScreenPatterns,
};
