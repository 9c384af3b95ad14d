//! Gantry Changelog - changelog annotations for release planning
//!
//! Annotations classify pending changes per module and drive the size of the
//! next semantic version bump.

pub mod loader;
pub mod types;

pub use loader::load_annotations;
pub use types::{version_increment, Annotation, ChangeType, SemverIncrement};
