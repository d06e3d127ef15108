use crate::error::PlatformError;
use std::fmt;

/// Typed result of one privileged write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Success,
    /// Rejected by host policy; the next channel may still succeed.
    PermissionDenied,
    /// Any other failure; no fallback is attempted.
    Failed(String),
}

impl WriteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// One way of writing protected host settings (device-owner API, shell,
/// root...). Channels are tried in order.
pub trait PrivilegedChannel: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this process currently holds the privilege the channel needs.
    fn is_available(&self) -> bool;

    /// Replaces the host's list of active enforcement services.
    fn write_active_service_list(&self, value: &str) -> WriteOutcome;

    /// Turns the host's enforcement master switch on or off.
    fn write_master_switch(&self, enabled: bool) -> WriteOutcome;

    fn set_uninstall_blocked(&self, package: &str, blocked: bool) -> WriteOutcome;

    /// Limits which packages may provide enforcement services.
    fn restrict_permitted_services(&self, packages: &[String]) -> WriteOutcome;
}

/// Read side of the host's active enforcement service list.
pub trait ServiceRegistry: Send + Sync {
    /// The raw colon-separated list; `None` when the setting is unset.
    fn active_service_list(&self) -> Result<Option<String>, PlatformError>;
}

/// Colon-separated list of flattened component ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceList(Vec<String>);

impl ServiceList {
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(':')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Whole-entry match, so `a/b.Service` is not found in `a/b.ServiceX`.
    pub fn contains(&self, component: &str) -> bool {
        self.0.iter().any(|entry| entry == component)
    }

    /// Appends `component` unless already listed.
    #[must_use]
    pub fn with(mut self, component: &str) -> Self {
        if !self.contains(component) {
            self.0.push(component.to_string());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for ServiceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(":"))
    }
}
