use crate::error::InspectError;
use serde::{Deserialize, Serialize};
use strum::Display;

/// A node acquired from the host's node tree. Dropping the handle releases it.
pub type NodeHandle = Box<dyn ScreenNode>;

/// A window's node tree. Dropping the handle releases it.
pub type TreeHandle = Box<dyn NodeTree>;

pub trait ScreenNode: Send {
    fn text(&self) -> Option<String>;
    fn view_id(&self) -> Option<String>;
    fn class_name(&self) -> Option<String>;
    fn is_heading(&self) -> bool;
    fn parent(&self) -> Result<Option<NodeHandle>, InspectError>;
}

pub trait NodeTree: Send {
    fn package_name(&self) -> Option<String>;

    /// Nodes whose text contains `text`, ignoring case.
    fn find_by_text(&self, text: &str) -> Result<Vec<NodeHandle>, InspectError>;

    /// Nodes whose stable view id equals `view_id`.
    fn find_by_view_id(&self, view_id: &str) -> Result<Vec<NodeHandle>, InspectError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WindowKind {
    #[default]
    Application,
    System,
    InputMethod,
    Overlay,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowInfo {
    #[serde(default)]
    pub kind: WindowKind,
    #[serde(default)]
    pub title: Option<String>,
}

impl WindowInfo {
    pub fn application(title: impl Into<String>) -> Self {
        Self {
            kind: WindowKind::Application,
            title: Some(title.into()),
        }
    }
}

/// Read access to whatever the host is currently displaying.
pub trait ScreenInspector: Send + Sync {
    /// Windows on screen, topmost first.
    fn windows(&self) -> Result<Vec<WindowInfo>, InspectError>;

    /// The focused window's tree, or `None` while nothing is rendered.
    fn active_tree(&self) -> Result<Option<TreeHandle>, InspectError>;
}
