use crate::policy::PolicyConfig;
use serde::Serialize;
use std::time::Duration;
use strum::{Display, IntoStaticStr};

/// How long a notice stays on screen.
pub const NOTICE_DURATION: Duration = Duration::from_millis(3500);

/// Why a screen was left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// Policy-gated; reopens inside the allowed window.
    Locked,
    /// Administratively protected; no window applies.
    Protected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: BlockKind,
    pub message: String,
    pub duration: Duration,
}

impl Notice {
    pub fn locked(policy: &PolicyConfig) -> Self {
        let charging = if policy.require_charging {
            t!("guard.locked_charging").to_string()
        } else {
            String::new()
        };
        Self {
            kind: BlockKind::Locked,
            message: t!(
                "guard.locked",
                window = policy.window_label(),
                charging = charging
            )
            .to_string(),
            duration: NOTICE_DURATION,
        }
    }

    pub fn protected() -> Self {
        Self {
            kind: BlockKind::Protected,
            message: t!("guard.protected").to_string(),
            duration: NOTICE_DURATION,
        }
    }
}

/// Tracks the time of the last redirect.
///
/// The timestamp moves on every redirect, including those whose notice was
/// suppressed, so a burst of redirects shows one notice.
#[derive(Debug, Clone)]
pub struct CooldownGate {
    cooldown: Duration,
    last_action: Option<Duration>,
}

impl CooldownGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_action: None,
        }
    }

    pub fn last_action(&self) -> Option<Duration> {
        self.last_action
    }

    /// Records a redirect at `now`; returns whether a notice may be shown.
    pub fn record(&mut self, now: Duration) -> bool {
        let allowed = self
            .last_action
            .is_none_or(|last| now.saturating_sub(last) > self.cooldown);
        self.last_action = Some(now);
        allowed
    }

    /// Whether the last redirect happened less than `window` before `now`.
    pub fn within(&self, now: Duration, window: Duration) -> bool {
        self.last_action
            .is_some_and(|last| now.saturating_sub(last) < window)
    }
}
