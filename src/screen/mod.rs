//! Recognizing the watched screens.
//!
//! [`ScreenClassifier`] is pure string matching over pattern tables.
//! [`ScreenReader`] reads titles and header texts through the
//! [`ScreenInspector`] capability when the class name is not decisive.

mod classifier;
mod inspect;
mod node;
mod snapshot;

pub use classifier::{
    ClassNameVerdict, Classification, MatchReason, MatchSource, ScreenClassifier, ScreenSignature,
};
pub use inspect::{Inspection, ResolvedTitle, ScreenReader};
pub use node::{NodeHandle, NodeTree, ScreenInspector, ScreenNode, TreeHandle, WindowInfo, WindowKind};
pub use snapshot::{ScreenSnapshot, SnapshotNode, SnapshotScreen};
