//! Process-wide health of the long-running guard components.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{OnceLock, RwLock};
use std::time::Instant;
use strum::Display;

/// Blocking state machine event loop.
pub const COMPONENT_GUARD: &str = "guard";
/// Periodic enforcement sweep.
pub const COMPONENT_WATCHDOG: &str = "watchdog";
/// Bounded restore retry chain.
pub const COMPONENT_RESTORE: &str = "restore";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Starting,
    Ok,
    /// Ran with nothing to do, e.g. the guard is disabled.
    Idle,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    pub updated_at: DateTime<Utc>,
    pub last_ok_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub retries: u64,
}

impl ComponentHealth {
    fn starting(now: DateTime<Utc>) -> Self {
        Self {
            status: ComponentStatus::Starting,
            updated_at: now,
            last_ok_at: None,
            last_error: None,
            retries: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub pid: u32,
    pub taken_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub components: BTreeMap<String, ComponentHealth>,
}

struct Registry {
    started: Instant,
    components: RwLock<BTreeMap<String, ComponentHealth>>,
}

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Registry {
        started: Instant::now(),
        components: RwLock::new(BTreeMap::new()),
    })
}

fn update(component: &str, apply: impl FnOnce(&mut ComponentHealth, DateTime<Utc>)) {
    let Ok(mut components) = registry().components.write() else {
        return;
    };
    let now = Utc::now();
    let entry = components
        .entry(component.to_owned())
        .or_insert_with(|| ComponentHealth::starting(now));
    apply(entry, now);
    entry.updated_at = now;
}

pub fn mark_ok(component: &str) {
    update(component, |entry, now| {
        entry.status = ComponentStatus::Ok;
        entry.last_ok_at = Some(now);
        entry.last_error = None;
    });
}

pub fn mark_error(component: &str, message: &str) {
    update(component, |entry, _| {
        entry.status = ComponentStatus::Error;
        entry.last_error = Some(message.to_owned());
    });
}

pub fn mark_idle(component: &str) {
    update(component, |entry, _| entry.status = ComponentStatus::Idle);
}

pub fn record_retry(component: &str) {
    update(component, |entry, _| {
        entry.retries = entry.retries.saturating_add(1);
    });
}

pub fn component(component: &str) -> Option<ComponentHealth> {
    registry()
        .components
        .read()
        .ok()
        .and_then(|components| components.get(component).cloned())
}

pub fn snapshot() -> HealthSnapshot {
    let registry = registry();
    HealthSnapshot {
        pid: std::process::id(),
        taken_at: Utc::now(),
        uptime_seconds: registry.started.elapsed().as_secs(),
        components: registry
            .components
            .read()
            .map(|components| components.clone())
            .unwrap_or_default(),
    }
}

pub fn snapshot_json() -> serde_json::Value {
    serde_json::to_value(snapshot())
        .unwrap_or_else(|error| serde_json::json!({ "error": error.to_string() }))
}
