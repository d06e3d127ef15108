use serde::{Deserialize, Serialize};

/// One event pushed by the host's event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScreenEvent {
    /// A new screen was entered.
    Navigation {
        package: String,
        #[serde(default)]
        class_name: Option<String>,
    },
    /// The current screen redrew its content.
    ContentChanged { package: String },
}

impl ScreenEvent {
    pub fn navigation(package: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self::Navigation {
            package: package.into(),
            class_name: Some(class_name.into()),
        }
    }

    pub fn content_changed(package: impl Into<String>) -> Self {
        Self::ContentChanged {
            package: package.into(),
        }
    }

    pub fn package(&self) -> &str {
        match self {
            Self::Navigation { package, .. } | Self::ContentChanged { package } => package,
        }
    }
}
