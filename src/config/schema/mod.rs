mod core;
mod guard;
mod healing;
mod observability;
mod prefs;
mod screens;

pub use core::Config;
pub use guard::GuardConfig;
pub use healing::{HealingConfig, MIN_WATCHDOG_INTERVAL_MINUTES};
pub use observability::ObservabilityConfig;
pub use prefs::PrefsConfig;
pub use screens::ScreenPatterns;
