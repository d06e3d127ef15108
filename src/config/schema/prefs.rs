use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the policy key/value store lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefsConfig {
    /// Table name inside the preference file.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Preference file; defaults to `guard_prefs.toml` next to config.toml.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_namespace() -> String {
    crate::policy::PREF_NAMESPACE.into()
}

impl Default for PrefsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            path: None,
        }
    }
}
