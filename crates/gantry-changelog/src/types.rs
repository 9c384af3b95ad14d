//! Changelog annotation types

use serde::{Deserialize, Serialize};

/// Classification of a changelog annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// A new feature
    Feature,
    /// A bug fix
    BugFix,
    /// Documentation-only change
    Documentation,
    /// Dependency bump
    Dependency,
    /// Informational announcement
    Announcement,
    /// Promote a pre-release module to a final release
    Release,
}

impl ChangeType {
    /// The semantic version increment this change type requests.
    pub fn increment(self) -> SemverIncrement {
        match self {
            Self::Release => SemverIncrement::Release,
            Self::Feature => SemverIncrement::Minor,
            Self::BugFix | Self::Dependency => SemverIncrement::Patch,
            Self::Documentation | Self::Announcement => SemverIncrement::Default,
        }
    }
}

/// A changelog annotation describing a pending change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Unique annotation identifier
    pub id: String,
    /// The kind of change
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Relative repository paths of the modules the annotation applies to
    #[serde(default)]
    pub modules: Vec<String>,
}

/// The size of a semantic version bump, smallest first. A release promotion
/// outranks a minor bump, which outranks patch and the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum SemverIncrement {
    /// No annotation requested a specific bump
    #[default]
    Default,
    /// Patch bump
    Patch,
    /// Minor bump
    Minor,
    /// Promote a pre-release to a final release
    Release,
}

/// Derive the aggregate version increment from a set of annotations.
pub fn version_increment(annotations: &[Annotation]) -> SemverIncrement {
    annotations
        .iter()
        .map(|a| a.change_type.increment())
        .max()
        .unwrap_or_default()
}
