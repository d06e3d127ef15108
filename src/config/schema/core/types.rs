use super::super::{GuardConfig, HealingConfig, ObservabilityConfig, PrefsConfig, ScreenPatterns};
use crate::error::ConfigError;
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const MAX_RETRY_DELAYS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding config.toml and the preference file - computed, not serialized
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub guard: GuardConfig,

    #[serde(default)]
    pub screens: ScreenPatterns,

    #[serde(default)]
    pub healing: HealingConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub prefs: PrefsConfig,

    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_locale() -> String {
    "en".into()
}

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());
        let data_dir = home.join(".screen-guard");

        Self {
            config_path: data_dir.join("config.toml"),
            data_dir,
            guard: GuardConfig::default(),
            screens: ScreenPatterns::default(),
            healing: HealingConfig::default(),
            observability: ObservabilityConfig::default(),
            prefs: PrefsConfig::default(),
            locale: default_locale(),
        }
    }
}

impl Config {
    /// Preference file backing the policy configuration.
    pub fn prefs_path(&self) -> PathBuf {
        self.prefs
            .path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("guard_prefs.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| -> Result<(), ConfigError> {
            Err(ConfigError::Validation(message))
        };
        if self.screens.target_package.trim().is_empty() {
            return invalid("screens.target_package must not be empty".into());
        }
        if self.screens.all_blocked_titles().next().is_none() {
            return invalid("screens.blocked_titles must list at least one phrase".into());
        }
        if self.guard.retry_delays_ms.len() > MAX_RETRY_DELAYS {
            return invalid(format!(
                "guard.retry_delays_ms must have at most {MAX_RETRY_DELAYS} entries"
            ));
        }
        if self.healing.restore_max_attempts == 0 {
            return invalid("healing.restore_max_attempts must be at least 1".into());
        }
        if self.healing.enforcement_component.trim().is_empty() {
            return invalid("healing.enforcement_component must not be empty".into());
        }
        Ok(())
    }
}
