use super::Config;
use anyhow::{Context, Result};
use directories::UserDirs;
use std::fs;
use std::path::Path;

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        Self::load_or_init_at(&home.join(".screen-guard"))
    }

    /// Loads `<data_dir>/config.toml`, writing a default file on first run.
    pub fn load_or_init_at(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join("config.toml");

        if !data_dir.exists() {
            fs::create_dir_all(data_dir).context("Failed to create .screen-guard directory")?;
        }

        let mut config = if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path.clone_from(&config_path);
            config.data_dir = data_dir.to_path_buf();
            config
        } else {
            let config = Self {
                config_path: config_path.clone(),
                data_dir: data_dir.to_path_buf(),
                ..Self::default()
            };
            config.save()?;
            config
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn first_run_writes_default_config() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("sg");
        let config = Config::load_or_init_at(&dir).unwrap();

        assert!(dir.join("config.toml").exists());
        assert_eq!(config.config_path, dir.join("config.toml"));
        assert_eq!(config.data_dir, dir);
    }

    #[test]
    fn saved_config_round_trips() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::load_or_init_at(tmp.path()).unwrap();
        config.guard.notify_cooldown_ms = 2500;
        config.screens.target_package = "com.vendor.settings".into();
        config.save().unwrap();

        let reloaded = Config::load_or_init_at(tmp.path()).unwrap();
        assert_eq!(reloaded.guard.notify_cooldown_ms, 2500);
        assert_eq!(reloaded.screens.target_package, "com.vendor.settings");
    }

    #[test]
    fn invalid_file_is_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[healing]\nrestore_max_attempts = 0\n",
        )
        .unwrap();
        assert!(Config::load_or_init_at(tmp.path()).is_err());
    }

    #[test]
    fn unparsable_file_reports_context() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[guard\n").unwrap();
        let err = Config::load_or_init_at(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
