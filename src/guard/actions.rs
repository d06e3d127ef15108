use std::sync::Mutex;
use std::time::Duration;

/// Redirect and notify capabilities of the host. Both are fire-and-forget.
pub trait GuardActions: Send + Sync {
    /// Leave the current screen for the home screen.
    fn go_home(&self);

    /// Show a transient message to the user.
    fn show(&self, message: &str, duration: Duration);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRecord {
    GoHome,
    Show { message: String, duration: Duration },
}

/// Records every action instead of performing it.
#[derive(Debug, Default)]
pub struct RecordingActions {
    records: Mutex<Vec<ActionRecord>>,
}

impl RecordingActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ActionRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn redirects(&self) -> usize {
        self.records()
            .iter()
            .filter(|record| matches!(record, ActionRecord::GoHome))
            .count()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .filter_map(|record| match record {
                ActionRecord::Show { message, .. } => Some(message),
                ActionRecord::GoHome => None,
            })
            .collect()
    }

    fn push(&self, record: ActionRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }
}

impl GuardActions for RecordingActions {
    fn go_home(&self) {
        self.push(ActionRecord::GoHome);
    }

    fn show(&self, message: &str, duration: Duration) {
        self.push(ActionRecord::Show {
            message: message.to_string(),
            duration,
        });
    }
}

/// Logs actions through `tracing`; used where no host is attached.
#[derive(Debug, Default)]
pub struct LogActions;

impl GuardActions for LogActions {
    fn go_home(&self) {
        tracing::info!("go home");
    }

    fn show(&self, message: &str, duration: Duration) {
        let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        tracing::info!(duration_ms, text = message, "notice");
    }
}
