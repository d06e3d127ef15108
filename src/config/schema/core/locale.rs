use super::Config;

const SUPPORTED_LOCALES: &[&str] = &["en", "ja"];

fn detect_system_locale() -> Option<String> {
    std::env::var("LC_ALL")
        .or_else(|_| std::env::var("LC_MESSAGES"))
        .or_else(|_| std::env::var("LANG"))
        .ok()
        .map(|lang| lang.trim().to_lowercase())
        .filter(|lang| !lang.is_empty())
}

/// `"auto"` consults the system locale; anything unsupported falls back to `"en"`.
fn resolve_locale(config_locale: &str) -> String {
    let requested = if config_locale.eq_ignore_ascii_case("auto") {
        detect_system_locale().unwrap_or_default()
    } else {
        config_locale.to_lowercase()
    };

    let lang = normalise_locale(&requested);
    if SUPPORTED_LOCALES.contains(&lang.as_str()) {
        lang
    } else {
        "en".into()
    }
}

/// Normalise `"ja_JP.UTF-8"` -> `"ja"`, `"en-US"` -> `"en"`, passthrough `"ja"`.
fn normalise_locale(raw: &str) -> String {
    let base = raw.split('.').next().unwrap_or(raw);
    let lang = base.split(['_', '-']).next().unwrap_or(base);
    lang.to_string()
}

impl Config {
    /// Resolve the message locale and hand it to `rust_i18n`.
    pub fn apply_locale(&self) {
        let locale = resolve_locale(&self.locale);
        rust_i18n::set_locale(&locale);
    }
}
