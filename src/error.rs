use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `screen-guard`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; binary code continues to use
/// `anyhow::Result` for ad-hoc context chains.
///
/// Note that the blocking state machine and the watchdog never surface these
/// to their hosts: inspection errors are downgraded to an inconclusive result
/// and restore failures are logged.
#[derive(Debug, Error)]
pub enum GuardError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Preference store ────────────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Screen inspection ───────────────────────────────────────────────
    #[error("inspect: {0}")]
    Inspect(#[from] InspectError),

    // ── Platform capabilities ───────────────────────────────────────────
    #[error("platform: {0}")]
    Platform(#[from] PlatformError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid time of day {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Preference store errors ────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse failed: {0}")]
    Parse(String),

    #[error("serialize failed: {0}")]
    Serialize(String),

    #[error("key {key} holds a {found} value")]
    TypeMismatch { key: String, found: &'static str },
}

// ─── Screen inspection errors ───────────────────────────────────────────────

/// Failures while reading the host's node tree. Always treated as an
/// inconclusive inspection by the guard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectError {
    #[error("node tree torn down during read")]
    TornDown,

    #[error("platform call failed: {0}")]
    Platform(String),
}

// ─── Platform capability errors ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("secure setting {key} unreadable: {message}")]
    SettingRead { key: String, message: String },

    #[error("no privileged channel available")]
    NoPrivilegedChannel,
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, GuardError>;
