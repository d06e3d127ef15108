use super::classifier::{MatchReason, MatchSource, ScreenClassifier};
use super::node::{NodeTree, ScreenInspector, ScreenNode, WindowKind};
use crate::config::{GuardConfig, ScreenPatterns};
use crate::error::InspectError;

/// Result of reading a screen whose class name alone was not decisive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspection {
    Match(MatchReason),
    /// Not rendered yet, not a target, or the read failed.
    Inconclusive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTitle {
    pub text: String,
    pub source: MatchSource,
}

#[derive(Debug, Clone)]
struct HeaderRules {
    title_id: String,
    generic_title_id: String,
    id_markers: Vec<String>,
    ancestor_classes: Vec<String>,
    ancestor_ids: Vec<String>,
    max_depth: usize,
}

fn lower_all(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}

fn contains_any(value: Option<String>, needles: &[String]) -> bool {
    value.is_some_and(|value| {
        let value = value.to_lowercase();
        needles.iter().any(|needle| value.contains(needle.as_str()))
    })
}

/// Reads titles and header texts out of the host's node tree.
///
/// Every acquired tree and node is a scoped handle, so early returns and
/// error paths release them. Read failures never escape: they are logged and
/// reported as [`Inspection::Inconclusive`].
#[derive(Debug, Clone)]
pub struct ScreenReader {
    classifier: ScreenClassifier,
    header: HeaderRules,
}

impl ScreenReader {
    pub fn new(patterns: &ScreenPatterns, guard: &GuardConfig) -> Self {
        Self {
            classifier: ScreenClassifier::new(patterns),
            header: HeaderRules {
                title_id: patterns.header_title_id.clone(),
                generic_title_id: patterns.generic_title_id.clone(),
                id_markers: lower_all(&patterns.header_id_markers),
                ancestor_classes: lower_all(&patterns.header_ancestor_classes),
                ancestor_ids: lower_all(&patterns.header_ancestor_ids),
                max_depth: guard.header_ancestor_depth,
            },
        }
    }

    pub fn classifier(&self) -> &ScreenClassifier {
        &self.classifier
    }

    /// Package of the focused window, if anything is rendered.
    pub fn current_package(
        &self,
        inspector: &dyn ScreenInspector,
    ) -> Result<Option<String>, InspectError> {
        Ok(inspector
            .active_tree()?
            .and_then(|tree| tree.package_name()))
    }

    /// Looks for the policy-gated screen by title, then by header text.
    pub fn inspect_blocked(&self, inspector: &dyn ScreenInspector) -> Inspection {
        let tree = match inspector.active_tree() {
            Ok(Some(tree)) => tree,
            Ok(None) => {
                tracing::debug!("no active tree");
                return Inspection::Inconclusive;
            }
            Err(error) => {
                tracing::debug!(%error, "active tree unavailable");
                return Inspection::Inconclusive;
            }
        };

        let title = self.resolve_title(inspector, tree.as_ref());
        if let Some(title) = &title
            && self.classifier.is_blocked_title(Some(&title.text))
        {
            return Inspection::Match(MatchReason::new(title.source, title.text.clone()));
        }

        if let Some(text) = self.find_blocked_header_text(tree.as_ref()) {
            return Inspection::Match(MatchReason::new(MatchSource::NodeScan, text));
        }

        tracing::debug!(
            title = title.as_ref().map_or("(none)", |t| t.text.as_str()),
            "title and node scan found no blocked screen"
        );
        Inspection::Inconclusive
    }

    /// Confirms the administrative screen concerns a protected companion.
    pub fn inspect_protected(&self, inspector: &dyn ScreenInspector) -> Inspection {
        let tree = match inspector.active_tree() {
            Ok(Some(tree)) => tree,
            Ok(None) => return Inspection::Inconclusive,
            Err(error) => {
                tracing::debug!(%error, "active tree unavailable");
                return Inspection::Inconclusive;
            }
        };

        for pattern in self.classifier.protected_text_patterns() {
            match tree.find_by_text(pattern) {
                Ok(nodes) => {
                    if let Some(node) = nodes.first() {
                        let text = node.text().unwrap_or_else(|| pattern.clone());
                        return Inspection::Match(MatchReason::new(MatchSource::NodeScan, text));
                    }
                }
                Err(error) => tracing::debug!(%error, pattern = %pattern, "protected text lookup failed"),
            }
        }
        Inspection::Inconclusive
    }

    /// First usable title: application window title (non-generic), then
    /// the collapsing-toolbar title widget, then a generic title widget that
    /// sits in a header.
    pub fn resolve_title(
        &self,
        inspector: &dyn ScreenInspector,
        tree: &dyn NodeTree,
    ) -> Option<ResolvedTitle> {
        match self.window_title(inspector) {
            Ok(Some(text)) => {
                return Some(ResolvedTitle {
                    text,
                    source: MatchSource::WindowTitle,
                });
            }
            Ok(None) => {}
            Err(error) => tracing::debug!(%error, "window titles unavailable"),
        }

        match self.header_widget_title(tree) {
            Ok(Some(text)) => {
                return Some(ResolvedTitle {
                    text,
                    source: MatchSource::HeaderNode,
                });
            }
            Ok(None) => {}
            Err(error) => tracing::debug!(%error, "header title lookup failed"),
        }

        match self.generic_widget_title(tree) {
            Ok(Some(text)) => Some(ResolvedTitle {
                text,
                source: MatchSource::HeaderNode,
            }),
            Ok(None) => None,
            Err(error) => {
                tracing::debug!(%error, "title widget lookup failed");
                None
            }
        }
    }

    fn window_title(&self, inspector: &dyn ScreenInspector) -> Result<Option<String>, InspectError> {
        Ok(inspector
            .windows()?
            .into_iter()
            .filter(|window| window.kind == WindowKind::Application)
            .filter_map(|window| window.title)
            .find(|title| !self.classifier.is_generic_window_title(title)))
    }

    fn header_widget_title(&self, tree: &dyn NodeTree) -> Result<Option<String>, InspectError> {
        let nodes = tree.find_by_view_id(&self.header.title_id)?;
        Ok(nodes
            .first()
            .and_then(|node| node.text())
            .filter(|text| !text.trim().is_empty()))
    }

    fn generic_widget_title(&self, tree: &dyn NodeTree) -> Result<Option<String>, InspectError> {
        let nodes = tree.find_by_view_id(&self.header.generic_title_id)?;
        Ok(nodes.iter().find_map(|node| {
            node.text()
                .filter(|text| !text.trim().is_empty())
                .filter(|_| self.is_header_node(node.as_ref()))
        }))
    }

    fn find_blocked_header_text(&self, tree: &dyn NodeTree) -> Option<String> {
        for pattern in self.classifier.blocked_title_patterns() {
            let nodes = match tree.find_by_text(pattern) {
                Ok(nodes) => nodes,
                Err(error) => {
                    tracing::debug!(%error, pattern = %pattern, "node text lookup failed");
                    continue;
                }
            };
            let hit = nodes.iter().find_map(|node| {
                node.text()
                    .filter(|text| self.classifier.is_blocked_title(Some(text)))
                    .filter(|_| self.is_header_node(node.as_ref()))
            });
            if hit.is_some() {
                return hit;
            }
        }
        None
    }

    /// Whether `node` is a title/header rather than an ordinary list row.
    pub fn is_header_node(&self, node: &dyn ScreenNode) -> bool {
        match self.check_header_node(node) {
            Ok(header) => header,
            Err(error) => {
                tracing::debug!(%error, "header check failed");
                false
            }
        }
    }

    fn check_header_node(&self, node: &dyn ScreenNode) -> Result<bool, InspectError> {
        if node.is_heading() {
            return Ok(true);
        }

        if let Some(view_id) = node.view_id() {
            let view_id = view_id.to_lowercase();
            if view_id.contains("title")
                && self
                    .header
                    .id_markers
                    .iter()
                    .any(|marker| view_id.contains(marker.as_str()))
            {
                return Ok(true);
            }
        }

        let mut next = node.parent()?;
        for _ in 0..self.header.max_depth {
            let Some(ancestor) = next else {
                break;
            };
            if contains_any(ancestor.class_name(), &self.header.ancestor_classes)
                || contains_any(ancestor.view_id(), &self.header.ancestor_ids)
            {
                return Ok(true);
            }
            next = ancestor.parent()?;
        }
        Ok(false)
    }
}

impl Default for ScreenReader {
    fn default() -> Self {
        Self::new(&ScreenPatterns::default(), &GuardConfig::default())
    }
}
