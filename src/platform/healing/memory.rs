//! In-memory host settings and scripted privileged channels.

use super::channel::{PrivilegedChannel, ServiceRegistry, WriteOutcome};
use crate::error::PlatformError;
use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Host settings held in memory.
#[derive(Debug, Default)]
pub struct MemorySettings {
    services: Mutex<Option<String>>,
    master_switch: AtomicBool,
    uninstall_blocked: Mutex<BTreeSet<String>>,
    permitted_services: Mutex<Option<Vec<String>>>,
    fail_reads: AtomicBool,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_services(raw: &str) -> Self {
        let settings = Self::default();
        settings.set_services(Some(raw));
        settings
    }

    pub fn services(&self) -> Option<String> {
        self.services.lock().ok().and_then(|services| services.clone())
    }

    /// Simulates the user (or another app) editing the list.
    pub fn set_services(&self, raw: Option<&str>) {
        if let Ok(mut services) = self.services.lock() {
            *services = raw.map(str::to_string);
        }
    }

    pub fn master_switch(&self) -> bool {
        self.master_switch.load(Ordering::SeqCst)
    }

    pub fn uninstall_blocked(&self) -> Vec<String> {
        self.uninstall_blocked
            .lock()
            .map(|blocked| blocked.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// `None` while every package may provide enforcement services.
    pub fn permitted_services(&self) -> Option<Vec<String>> {
        self.permitted_services
            .lock()
            .ok()
            .and_then(|permitted| permitted.clone())
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

impl ServiceRegistry for MemorySettings {
    fn active_service_list(&self) -> Result<Option<String>, PlatformError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PlatformError::SettingRead {
                key: "enabled_accessibility_services".into(),
                message: "read refused".into(),
            });
        }
        Ok(self.services())
    }
}

/// A [`PrivilegedChannel`] over [`MemorySettings`] whose outcomes are
/// scripted. Queued outcomes are consumed first; after that every write
/// returns the fallback outcome.
#[derive(Debug)]
pub struct ScriptedChannel {
    name: String,
    settings: Arc<MemorySettings>,
    available: AtomicBool,
    effective: bool,
    fallback: WriteOutcome,
    script: Mutex<VecDeque<WriteOutcome>>,
    service_writes: AtomicUsize,
    uninstall_writes: AtomicUsize,
    restrict_writes: AtomicUsize,
}

impl ScriptedChannel {
    pub fn new(name: &str, settings: &Arc<MemorySettings>) -> Self {
        Self {
            name: name.to_string(),
            settings: Arc::clone(settings),
            available: AtomicBool::new(true),
            effective: true,
            fallback: WriteOutcome::Success,
            script: Mutex::new(VecDeque::new()),
            service_writes: AtomicUsize::new(0),
            uninstall_writes: AtomicUsize::new(0),
            restrict_writes: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn denying(mut self) -> Self {
        self.fallback = WriteOutcome::PermissionDenied;
        self
    }

    #[must_use]
    pub fn failing(mut self, message: &str) -> Self {
        self.fallback = WriteOutcome::Failed(message.to_string());
        self
    }

    #[must_use]
    pub fn unavailable(self) -> Self {
        self.available.store(false, Ordering::SeqCst);
        self
    }

    /// Writes report success without changing the settings.
    #[must_use]
    pub fn ineffective(mut self) -> Self {
        self.effective = false;
        self
    }

    /// Queues outcomes for the next service list writes.
    #[must_use]
    pub fn with_script(self, outcomes: impl IntoIterator<Item = WriteOutcome>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.extend(outcomes);
        }
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn service_writes(&self) -> usize {
        self.service_writes.load(Ordering::SeqCst)
    }

    pub fn uninstall_writes(&self) -> usize {
        self.uninstall_writes.load(Ordering::SeqCst)
    }

    pub fn restrict_writes(&self) -> usize {
        self.restrict_writes.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> WriteOutcome {
        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl PrivilegedChannel for ScriptedChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn write_active_service_list(&self, value: &str) -> WriteOutcome {
        self.service_writes.fetch_add(1, Ordering::SeqCst);
        let outcome = self.next_outcome();
        if outcome.is_success() && self.effective {
            self.settings.set_services(Some(value));
        }
        outcome
    }

    fn write_master_switch(&self, enabled: bool) -> WriteOutcome {
        if self.fallback.is_success() && self.effective {
            self.settings.master_switch.store(enabled, Ordering::SeqCst);
        }
        self.fallback.clone()
    }

    fn set_uninstall_blocked(&self, package: &str, blocked: bool) -> WriteOutcome {
        self.uninstall_writes.fetch_add(1, Ordering::SeqCst);
        let outcome = self.fallback.clone();
        if outcome.is_success() && self.effective {
            if let Ok(mut set) = self.settings.uninstall_blocked.lock() {
                if blocked {
                    set.insert(package.to_string());
                } else {
                    set.remove(package);
                }
            }
        }
        outcome
    }

    fn restrict_permitted_services(&self, packages: &[String]) -> WriteOutcome {
        self.restrict_writes.fetch_add(1, Ordering::SeqCst);
        let outcome = self.fallback.clone();
        if outcome.is_success() && self.effective {
            if let Ok(mut permitted) = self.settings.permitted_services.lock() {
                *permitted = Some(packages.to_vec());
            }
        }
        outcome
    }
}
