use screen_guard::Config;
use screen_guard::diagnostics::health;
use screen_guard::policy::ConditionChecker;
use serde_json::json;

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

pub fn render_status(config: &Config, policy: &ConditionChecker) -> String {
    let decision = policy.evaluate();
    let mut lines = vec![
        format!("◆ {}", t!("status.title")),
        String::new(),
        format!("{}        {}", t!("status.version"), env!("CARGO_PKG_VERSION")),
        format!("{}         {}", t!("status.config"), config.config_path.display()),
        format!("{}    {}", t!("status.prefs"), config.prefs_path().display()),
        format!("{} {}", t!("status.target"), config.screens.target_package),
        format!("{}  {}", t!("status.observability"), config.observability.backend),
        String::new(),
        format!("{}         {}", t!("status.policy"), policy.status_summary()),
        format!("{}  {}", t!("status.guard_enabled"), yes_no(decision.guard_enabled)),
        format!("{}       {}", t!("status.charging"), yes_no(policy.is_charging())),
        format!(
            "{}     {}",
            t!("status.decision"),
            if decision.allowed {
                t!("status.allowed")
            } else {
                t!("status.denied")
            }
        ),
    ];

    let snapshot = health::snapshot();
    if !snapshot.components.is_empty() {
        lines.push(String::new());
        for (name, component) in &snapshot.components {
            lines.push(format!(
                "  {name:9} {} (retries: {})",
                component.status, component.retries
            ));
        }
    }

    lines.join("\n")
}

pub fn status_json(config: &Config, policy: &ConditionChecker) -> serde_json::Value {
    json!({
        "version": env!("CARGO_PKG_VERSION"),
        "config_path": config.config_path,
        "prefs_path": config.prefs_path(),
        "target_package": config.screens.target_package,
        "policy": policy.config(),
        "decision": policy.evaluate(),
        "charging": policy.is_charging(),
        "health": health::snapshot_json(),
    })
}
