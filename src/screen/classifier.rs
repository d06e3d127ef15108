use crate::config::ScreenPatterns;
use serde::Serialize;
use strum::{Display, IntoStaticStr};

/// Which signal produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    ClassName,
    WindowTitle,
    HeaderNode,
    NodeScan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchReason {
    pub source: MatchSource,
    /// The observed text that matched (class name, title or node text).
    pub matched: String,
}

impl MatchReason {
    pub fn new(source: MatchSource, matched: impl Into<String>) -> Self {
        Self {
            source,
            matched: matched.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classification {
    Irrelevant,
    /// Blocked only while the policy denies access.
    BlockedTarget(MatchReason),
    /// Blocked regardless of the policy window.
    ProtectedTarget(MatchReason),
}

/// What the class name alone says about a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassNameVerdict {
    Blocked,
    Protected,
    /// Generic host activity; identity must come from the title.
    GenericContainer,
    Other,
}

/// One observed screen, as delivered with a platform event.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScreenSignature<'a> {
    pub source_package: &'a str,
    pub class_name: Option<&'a str>,
    pub window_title: Option<&'a str>,
}

/// Stateless pattern matcher over screen identifiers.
///
/// Matching is case-insensitive and substring based. It errs toward
/// blocking: a longer unrelated word that contains a blocked phrase will
/// match as well. Empty or missing input never matches.
#[derive(Debug, Clone)]
pub struct ScreenClassifier {
    target_package: String,
    blocked_classes: Vec<String>,
    protected_classes: Vec<String>,
    generic_containers: Vec<String>,
    generic_window_titles: Vec<String>,
    blocked_titles: Vec<String>,
    protected_texts: Vec<String>,
}

fn lowered(values: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.as_ref().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

fn contains_any(haystack: Option<&str>, needles: &[String]) -> Option<String> {
    let haystack = haystack.filter(|h| !h.is_empty())?.to_lowercase();
    needles
        .iter()
        .find(|needle| haystack.contains(needle.as_str()))
        .cloned()
}

impl ScreenClassifier {
    pub fn new(patterns: &ScreenPatterns) -> Self {
        Self {
            target_package: patterns.target_package.clone(),
            blocked_classes: lowered(&patterns.blocked_classes),
            protected_classes: lowered(&patterns.protected_classes),
            generic_containers: lowered(&patterns.generic_containers),
            generic_window_titles: lowered(&patterns.generic_window_titles),
            blocked_titles: lowered(patterns.all_blocked_titles()),
            protected_texts: lowered(&patterns.protected_texts),
        }
    }

    pub fn target_package(&self) -> &str {
        &self.target_package
    }

    /// Exact match; a package that merely starts with the target is not it.
    pub fn is_target_package(&self, package: Option<&str>) -> bool {
        package.is_some_and(|p| !p.is_empty() && p == self.target_package)
    }

    pub fn is_blocked_class_name(&self, class_name: Option<&str>) -> bool {
        contains_any(class_name, &self.blocked_classes).is_some()
    }

    pub fn is_protected_class_name(&self, class_name: Option<&str>) -> bool {
        contains_any(class_name, &self.protected_classes).is_some()
    }

    pub fn is_generic_container(&self, class_name: Option<&str>) -> bool {
        contains_any(class_name, &self.generic_containers).is_some()
    }

    pub fn is_blocked_title(&self, title: Option<&str>) -> bool {
        contains_any(title, &self.blocked_titles).is_some()
    }

    pub fn is_protected_title(&self, text: Option<&str>) -> bool {
        contains_any(text, &self.protected_texts).is_some()
    }

    /// Whole-string, case-insensitive. Blank titles count as generic.
    pub fn is_generic_window_title(&self, title: &str) -> bool {
        let title = title.trim();
        title.is_empty()
            || self
                .generic_window_titles
                .iter()
                .any(|generic| title.to_lowercase() == *generic)
    }

    pub fn blocked_title_patterns(&self) -> &[String] {
        &self.blocked_titles
    }

    pub fn protected_text_patterns(&self) -> &[String] {
        &self.protected_texts
    }

    pub fn class_name_verdict(&self, class_name: Option<&str>) -> ClassNameVerdict {
        if self.is_blocked_class_name(class_name) {
            ClassNameVerdict::Blocked
        } else if self.is_protected_class_name(class_name) {
            ClassNameVerdict::Protected
        } else if self.is_generic_container(class_name) {
            ClassNameVerdict::GenericContainer
        } else {
            ClassNameVerdict::Other
        }
    }

    /// Classifies from every available signal, cheapest first.
    ///
    /// `node_texts` is consumed lazily and only when neither the class name
    /// nor the window title decided the outcome.
    pub fn classify<I, S>(&self, signature: ScreenSignature<'_>, node_texts: I) -> Classification
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.is_target_package(Some(signature.source_package)) {
            return Classification::Irrelevant;
        }

        if let Some(class_name) = signature.class_name {
            if self.is_blocked_class_name(Some(class_name)) {
                return Classification::BlockedTarget(MatchReason::new(
                    MatchSource::ClassName,
                    class_name,
                ));
            }
            if self.is_protected_class_name(Some(class_name)) {
                return Classification::ProtectedTarget(MatchReason::new(
                    MatchSource::ClassName,
                    class_name,
                ));
            }
        }

        if let Some(title) = signature.window_title
            && !self.is_generic_window_title(title)
            && self.is_blocked_title(Some(title))
        {
            return Classification::BlockedTarget(MatchReason::new(MatchSource::WindowTitle, title));
        }

        for text in node_texts {
            let text = text.as_ref();
            if self.is_blocked_title(Some(text)) {
                return Classification::BlockedTarget(MatchReason::new(MatchSource::NodeScan, text));
            }
        }

        Classification::Irrelevant
    }
}

impl Default for ScreenClassifier {
    fn default() -> Self {
        Self::new(&ScreenPatterns::default())
    }
}
