use super::channel::{PrivilegedChannel, ServiceList, ServiceRegistry, WriteOutcome};
use crate::config::HealingConfig;
use std::sync::Arc;

/// Keeps the guard's enforcement service registered and its packages
/// protected from uninstall.
///
/// Neither operation returns an error or panics: every failure is logged and
/// reported as `false`.
pub struct EnforcementRestorer {
    registry: Arc<dyn ServiceRegistry>,
    channels: Vec<Arc<dyn PrivilegedChannel>>,
    component: String,
    protected_packages: Vec<String>,
}

impl EnforcementRestorer {
    /// `channels` is the strategy chain, tried in order.
    pub fn new(
        registry: Arc<dyn ServiceRegistry>,
        channels: Vec<Arc<dyn PrivilegedChannel>>,
        healing: &HealingConfig,
    ) -> Self {
        Self {
            registry,
            channels,
            component: healing.enforcement_component.clone(),
            protected_packages: healing.uninstall_protected_packages(),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    fn current_list(&self) -> Option<ServiceList> {
        match self.registry.active_service_list() {
            Ok(raw) => Some(ServiceList::parse(raw.as_deref().unwrap_or_default())),
            Err(error) => {
                tracing::warn!(%error, "active service list unreadable");
                None
            }
        }
    }

    pub fn is_enforcement_active(&self) -> bool {
        self.current_list()
            .is_some_and(|list| list.contains(&self.component))
    }

    fn available_channels(&self) -> impl Iterator<Item = &Arc<dyn PrivilegedChannel>> {
        self.channels.iter().filter(|channel| {
            let available = channel.is_available();
            if !available {
                tracing::debug!(channel = channel.name(), "privileged channel unavailable");
            }
            available
        })
    }

    /// Registers the enforcement service if it is missing.
    ///
    /// Returns `true` only when the service is confirmed active by reading
    /// the list back after the write.
    pub fn ensure_enforcement_active(&self) -> bool {
        let Some(current) = self.current_list() else {
            return false;
        };
        if current.contains(&self.component) {
            tracing::debug!(component = %self.component, "enforcement service already active");
            return true;
        }

        let desired = current.with(&self.component).to_string();
        let mut written = false;
        for channel in self.available_channels() {
            match channel.write_active_service_list(&desired) {
                WriteOutcome::Success => {
                    let switch = channel.write_master_switch(true);
                    if !switch.is_success() {
                        tracing::warn!(channel = channel.name(), outcome = ?switch, "master switch write failed");
                    }
                    written = true;
                    break;
                }
                WriteOutcome::PermissionDenied => {
                    tracing::warn!(channel = channel.name(), "service list write denied, trying next channel");
                }
                WriteOutcome::Failed(message) => {
                    tracing::error!(channel = channel.name(), error = %message, "service list write failed");
                    return false;
                }
            }
        }

        if !written {
            tracing::warn!(component = %self.component, "no privileged channel could register the enforcement service");
            return false;
        }

        let confirmed = self.is_enforcement_active();
        if confirmed {
            tracing::info!(component = %self.component, "enforcement service re-registered");
        } else {
            tracing::warn!(component = %self.component, "write reported success but service is still inactive");
        }
        confirmed
    }

    /// Blocks uninstall of every protected package. Returns `true` when all
    /// of them were blocked.
    pub fn ensure_uninstall_protection(&self) -> bool {
        let mut all_blocked = true;
        for package in &self.protected_packages {
            let mut blocked = false;
            for channel in self.available_channels() {
                match channel.set_uninstall_blocked(package, true) {
                    WriteOutcome::Success => {
                        tracing::debug!(package = %package, channel = channel.name(), "uninstall blocked");
                        blocked = true;
                        break;
                    }
                    WriteOutcome::PermissionDenied => {}
                    WriteOutcome::Failed(message) => {
                        tracing::error!(package = %package, channel = channel.name(), error = %message, "uninstall block failed");
                        break;
                    }
                }
            }
            if !blocked {
                tracing::warn!(package = %package, "package left without uninstall protection");
                all_blocked = false;
            }
        }
        all_blocked
    }

    /// Allows enforcement services only from the protected packages.
    /// Returns `true` once one channel accepted the allowlist.
    pub fn ensure_permitted_services(&self) -> bool {
        for channel in self.available_channels() {
            match channel.restrict_permitted_services(&self.protected_packages) {
                WriteOutcome::Success => {
                    tracing::debug!(
                        channel = channel.name(),
                        packages = ?self.protected_packages,
                        "enforcement services restricted"
                    );
                    return true;
                }
                WriteOutcome::PermissionDenied => {
                    tracing::warn!(channel = channel.name(), "service allowlist denied, trying next channel");
                }
                WriteOutcome::Failed(message) => {
                    tracing::error!(channel = channel.name(), error = %message, "service allowlist write failed");
                    return false;
                }
            }
        }
        tracing::warn!("enforcement services left unrestricted");
        false
    }
}
