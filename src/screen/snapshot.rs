//! Serializable screen snapshots standing in for a live node tree.
//!
//! Used by `replay` and by tests. Every acquired tree and node handle is
//! counted so callers can verify that inspection released everything it
//! acquired, including on error paths.

use super::node::{NodeHandle, NodeTree, ScreenInspector, ScreenNode, TreeHandle, WindowInfo};
use crate::error::InspectError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub heading: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
}

impl SnapshotNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn container(class_name: impl Into<String>) -> Self {
        Self {
            class_name: Some(class_name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_view_id(mut self, view_id: impl Into<String>) -> Self {
        self.view_id = Some(view_id.into());
        self
    }

    #[must_use]
    pub fn with_heading(mut self) -> Self {
        self.heading = true;
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: SnapshotNode) -> Self {
        self.children.push(child);
        self
    }
}

/// One rendered screen: its package, window list and node tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSnapshot {
    pub package: String,
    #[serde(default)]
    pub windows: Vec<WindowInfo>,
    #[serde(default)]
    pub root: Option<SnapshotNode>,
}

impl ScreenSnapshot {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_window(mut self, window: WindowInfo) -> Self {
        self.windows.push(window);
        self
    }

    #[must_use]
    pub fn with_root(mut self, root: SnapshotNode) -> Self {
        self.root = Some(root);
        self
    }
}

#[derive(Debug)]
struct FlatNode {
    text: Option<String>,
    view_id: Option<String>,
    class_name: Option<String>,
    heading: bool,
    parent: Option<usize>,
}

#[derive(Debug)]
struct FlatTree {
    package: String,
    nodes: Vec<FlatNode>,
}

impl FlatTree {
    fn build(package: &str, root: &SnapshotNode) -> Self {
        let mut nodes = Vec::new();
        let mut stack = vec![(root, None)];
        while let Some((node, parent)) = stack.pop() {
            let index = nodes.len();
            nodes.push(FlatNode {
                text: node.text.clone(),
                view_id: node.view_id.clone(),
                class_name: node.class_name.clone(),
                heading: node.heading,
                parent,
            });
            for child in node.children.iter().rev() {
                stack.push((child, Some(index)));
            }
        }
        Self {
            package: package.to_string(),
            nodes,
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    live: AtomicUsize,
    acquired: AtomicUsize,
    torn_down: AtomicBool,
}

impl Shared {
    fn acquire(self: &Arc<Self>) -> Lease {
        self.live.fetch_add(1, Ordering::SeqCst);
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Lease(Arc::clone(self))
    }

    fn check(&self) -> Result<(), InspectError> {
        if self.torn_down.load(Ordering::SeqCst) {
            Err(InspectError::TornDown)
        } else {
            Ok(())
        }
    }
}

/// Decrements the live-handle count when dropped.
#[derive(Debug)]
struct Lease(Arc<Shared>);

impl Drop for Lease {
    fn drop(&mut self) {
        self.0.live.fetch_sub(1, Ordering::SeqCst);
    }
}

struct SnapshotNodeHandle {
    tree: Arc<FlatTree>,
    index: usize,
    shared: Arc<Shared>,
    _lease: Lease,
}

impl SnapshotNodeHandle {
    fn new(tree: &Arc<FlatTree>, index: usize, shared: &Arc<Shared>) -> NodeHandle {
        Box::new(Self {
            tree: Arc::clone(tree),
            index,
            shared: Arc::clone(shared),
            _lease: shared.acquire(),
        })
    }

    fn node(&self) -> &FlatNode {
        &self.tree.nodes[self.index]
    }
}

impl ScreenNode for SnapshotNodeHandle {
    fn text(&self) -> Option<String> {
        self.node().text.clone()
    }

    fn view_id(&self) -> Option<String> {
        self.node().view_id.clone()
    }

    fn class_name(&self) -> Option<String> {
        self.node().class_name.clone()
    }

    fn is_heading(&self) -> bool {
        self.node().heading
    }

    fn parent(&self) -> Result<Option<NodeHandle>, InspectError> {
        self.shared.check()?;
        Ok(self
            .node()
            .parent
            .map(|parent| SnapshotNodeHandle::new(&self.tree, parent, &self.shared)))
    }
}

struct SnapshotTreeHandle {
    tree: Arc<FlatTree>,
    shared: Arc<Shared>,
    _lease: Lease,
}

impl SnapshotTreeHandle {
    fn collect(&self, predicate: impl Fn(&FlatNode) -> bool) -> Result<Vec<NodeHandle>, InspectError> {
        self.shared.check()?;
        Ok(self
            .tree
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| predicate(node))
            .map(|(index, _)| SnapshotNodeHandle::new(&self.tree, index, &self.shared))
            .collect())
    }
}

impl NodeTree for SnapshotTreeHandle {
    fn package_name(&self) -> Option<String> {
        Some(self.tree.package.clone())
    }

    fn find_by_text(&self, text: &str) -> Result<Vec<NodeHandle>, InspectError> {
        let needle = text.to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        self.collect(|node| {
            node.text
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(&needle))
        })
    }

    fn find_by_view_id(&self, view_id: &str) -> Result<Vec<NodeHandle>, InspectError> {
        self.collect(|node| node.view_id.as_deref() == Some(view_id))
    }
}

#[derive(Debug, Default)]
struct Current {
    windows: Vec<WindowInfo>,
    tree: Option<Arc<FlatTree>>,
}

/// A [`ScreenInspector`] whose displayed screen is swapped in by the caller.
#[derive(Debug, Default)]
pub struct SnapshotScreen {
    current: RwLock<Current>,
    shared: Arc<Shared>,
}

impl SnapshotScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn showing(snapshot: &ScreenSnapshot) -> Self {
        let screen = Self::new();
        screen.show(snapshot);
        screen
    }

    /// Replaces the displayed screen. A snapshot without a root behaves as
    /// a screen that has not rendered yet.
    pub fn show(&self, snapshot: &ScreenSnapshot) {
        let tree = snapshot
            .root
            .as_ref()
            .map(|root| Arc::new(FlatTree::build(&snapshot.package, root)));
        let mut current = self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        current.windows.clone_from(&snapshot.windows);
        current.tree = tree;
    }

    pub fn clear(&self) {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *current = Current::default();
    }

    /// While set, every read fails as if the host destroyed the tree.
    pub fn set_torn_down(&self, torn_down: bool) {
        self.shared.torn_down.store(torn_down, Ordering::SeqCst);
    }

    /// Tree and node handles acquired and not yet released.
    pub fn live_handles(&self) -> usize {
        self.shared.live.load(Ordering::SeqCst)
    }

    /// Tree and node handles acquired since creation.
    pub fn acquired_handles(&self) -> usize {
        self.shared.acquired.load(Ordering::SeqCst)
    }
}

impl ScreenInspector for SnapshotScreen {
    fn windows(&self) -> Result<Vec<WindowInfo>, InspectError> {
        self.shared.check()?;
        let current = self
            .current
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(current.windows.clone())
    }

    fn active_tree(&self) -> Result<Option<TreeHandle>, InspectError> {
        self.shared.check()?;
        let current = self
            .current
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(current.tree.as_ref().map(|tree| {
            Box::new(SnapshotTreeHandle {
                tree: Arc::clone(tree),
                shared: Arc::clone(&self.shared),
                _lease: self.shared.acquire(),
            }) as TreeHandle
        }))
    }
}
