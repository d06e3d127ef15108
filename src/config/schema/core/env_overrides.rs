use super::Config;
use std::path::PathBuf;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(locale) = std::env::var("SCREEN_GUARD_LOCALE")
            && !locale.is_empty()
        {
            self.locale = locale;
        }

        if let Ok(path) = std::env::var("SCREEN_GUARD_PREFS")
            && !path.is_empty()
        {
            self.prefs.path = Some(PathBuf::from(path));
        }

        if let Ok(backend) = std::env::var("SCREEN_GUARD_OBSERVABILITY")
            && !backend.is_empty()
        {
            self.observability.backend = backend;
        }
    }
}
