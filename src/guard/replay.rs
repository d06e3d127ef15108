use super::actions::GuardActions;
use super::driver::{LogicalDriver, TimedEffect};
use super::engine::GuardEngine;
use super::event::ScreenEvent;
use crate::screen::{ScreenSnapshot, SnapshotScreen};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// One line of a JSON-lines recording.
///
/// `screen` replaces what the host displays; `event` is delivered after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayStep {
    pub at_ms: u64,
    #[serde(default)]
    pub screen: Option<ScreenSnapshot>,
    #[serde(default)]
    pub event: Option<ScreenEvent>,
}

/// Parses a recording. Blank lines are skipped; timestamps must not go
/// backwards.
pub fn parse_recording(input: &str) -> Result<Vec<ReplayStep>> {
    let mut steps: Vec<ReplayStep> = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let step: ReplayStep = serde_json::from_str(line)
            .with_context(|| format!("line {}: invalid replay step", index + 1))?;
        if let Some(previous) = steps.last()
            && step.at_ms < previous.at_ms
        {
            bail!(
                "line {}: at_ms {} is earlier than {}",
                index + 1,
                step.at_ms,
                previous.at_ms
            );
        }
        steps.push(step);
    }
    Ok(steps)
}

/// Feeds a recording through a [`GuardEngine`] on a logical clock.
pub struct Replay {
    screen: Arc<SnapshotScreen>,
    driver: LogicalDriver,
}

impl Replay {
    pub fn new(engine: GuardEngine, actions: Arc<dyn GuardActions>) -> Self {
        let screen = Arc::new(SnapshotScreen::new());
        let driver = LogicalDriver::new(engine, screen.clone(), actions);
        Self { screen, driver }
    }

    pub fn screen(&self) -> &SnapshotScreen {
        &self.screen
    }

    pub fn driver(&self) -> &LogicalDriver {
        &self.driver
    }

    /// Retries due at or before a step's time fire before that step's
    /// screen swap. Pending retries are drained once the steps run out.
    pub fn run(&mut self, steps: &[ReplayStep]) -> Vec<TimedEffect> {
        let mut effects = Vec::new();
        for step in steps {
            effects.extend(self.driver.advance_to(Duration::from_millis(step.at_ms)));
            if let Some(snapshot) = &step.screen {
                self.screen.show(snapshot);
            }
            if let Some(event) = &step.event {
                effects.extend(self.driver.dispatch(event));
            }
        }
        effects.extend(self.driver.run_until_idle());
        effects
    }
}
