use crate::app::status::{render_status, status_json};
use crate::cli::commands::{Cli, Commands};
use anyhow::{Context, Result};
use screen_guard::Config;
use screen_guard::guard::{GuardEffect, GuardEngine, Replay, TimedEffect, parse_recording};
use screen_guard::policy::{
    ChargingProvider, ConditionChecker, FixedCharging, FixedClock, SysfsChargingProvider,
    SystemClock, TimeOfDay, TimeSource, TomlPreferenceStore,
};
use screen_guard::runtime::create_observer;
use screen_guard::screen::{Classification, ScreenClassifier, ScreenSignature};
use std::path::Path;
use std::sync::Arc;

fn policy_with(
    config: &Config,
    clock: Arc<dyn TimeSource>,
    charging: Arc<dyn ChargingProvider>,
) -> ConditionChecker {
    let store = TomlPreferenceStore::new(config.prefs_path(), config.prefs.namespace.clone());
    ConditionChecker::new(Arc::new(store), clock, charging)
}

fn live_policy(config: &Config) -> ConditionChecker {
    policy_with(
        config,
        Arc::new(SystemClock),
        Arc::new(SysfsChargingProvider::new()),
    )
}

fn parse_time(raw: &str) -> Result<TimeOfDay> {
    raw.parse::<TimeOfDay>()
        .with_context(|| format!("invalid time '{raw}'"))
}

pub fn classification_line(classification: &Classification) -> String {
    match classification {
        Classification::Irrelevant => t!("classify.irrelevant").to_string(),
        Classification::BlockedTarget(reason) => t!(
            "classify.blocked",
            source = reason.source,
            matched = &reason.matched
        )
        .to_string(),
        Classification::ProtectedTarget(reason) => t!(
            "classify.protected",
            source = reason.source,
            matched = &reason.matched
        )
        .to_string(),
    }
}

fn effect_line(timed: &TimedEffect) -> Option<String> {
    let at = timed.at.as_millis();
    match &timed.effect {
        GuardEffect::GoHome { kind, reason } => Some(format!(
            "{at:>7}ms  {} [{kind}] ({}: {})",
            t!("replay.redirect"),
            reason.source,
            reason.matched
        )),
        GuardEffect::Notify(notice) => Some(format!(
            "{at:>7}ms  {}: {}",
            t!("replay.notify"),
            notice.message.replace('\n', " / ")
        )),
        GuardEffect::ScheduleRetry(_) | GuardEffect::CancelRetries { .. } => None,
    }
}

fn run_replay(config: &Config, file: &Path, at: Option<&str>, charging: bool) -> Result<()> {
    let input = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read recording {}", file.display()))?;
    let steps = parse_recording(&input)?;

    let clock: Arc<dyn TimeSource> = match at {
        Some(raw) => Arc::new(FixedClock::new(parse_time(raw)?)),
        None => Arc::new(SystemClock),
    };
    let policy = policy_with(config, clock, Arc::new(FixedCharging::new(charging)));
    let engine = GuardEngine::from_config(config, Arc::new(policy))
        .with_observer(create_observer(&config.observability));
    let actions = Arc::new(screen_guard::guard::RecordingActions::new());
    let mut replay = Replay::new(engine, actions.clone());

    for line in replay.run(&steps).iter().filter_map(effect_line) {
        println!("{line}");
    }
    println!(
        "{}",
        t!(
            "replay.summary",
            redirects = actions.redirects(),
            notices = actions.messages().len()
        )
    );
    Ok(())
}

fn set_guard_enabled(config: &Config, enabled: bool) -> Result<()> {
    live_policy(config).set_guard_enabled(enabled)?;
    println!("{} {}", t!("status.guard_enabled"), if enabled { "yes" } else { "no" });
    Ok(())
}

pub fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Status { json } => {
            let policy = live_policy(&config);
            if json {
                println!("{}", serde_json::to_string_pretty(&status_json(&config, &policy))?);
            } else {
                println!("{}", render_status(&config, &policy));
            }
            Ok(())
        }

        Commands::Window { start, end } => {
            let policy = live_policy(&config);
            policy.set_window(parse_time(&start)?, parse_time(&end)?)?;
            println!("{}", policy.status_summary());
            Ok(())
        }

        Commands::Charging { state } => {
            let policy = live_policy(&config);
            policy.set_require_charging(state.enabled())?;
            println!("{}", policy.status_summary());
            Ok(())
        }

        Commands::Enable => set_guard_enabled(&config, true),
        Commands::Disable => set_guard_enabled(&config, false),

        Commands::Classify {
            package,
            class_name,
            title,
            texts,
        } => {
            let classifier = ScreenClassifier::new(&config.screens);
            let classification = classifier.classify(
                ScreenSignature {
                    source_package: &package,
                    class_name: class_name.as_deref(),
                    window_title: title.as_deref(),
                },
                &texts,
            );
            println!("{}", classification_line(&classification));
            Ok(())
        }

        Commands::Replay { file, at, charging } => {
            run_replay(&config, &file, at.as_deref(), charging)
        }
    }
}
