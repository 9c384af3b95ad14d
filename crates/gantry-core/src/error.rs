//! Error types for gantry

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using GantryError
pub type Result<T> = std::result::Result<T, GantryError>;

/// Main error type for gantry operations
#[derive(Debug, Error)]
pub enum GantryError {
    /// Module tree errors
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Module metadata file errors
    #[error(transparent)]
    ModFile(#[from] ModFileError),

    /// Git-related errors
    #[error(transparent)]
    Git(#[from] GitError),

    /// Changelog annotation errors
    #[error(transparent)]
    Changelog(#[from] ChangelogError),

    /// Version-related errors
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Release computation errors
    #[error(transparent)]
    Release(#[from] ReleaseError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Module tree errors
#[derive(Debug, Error)]
pub enum TreeError {
    /// Module path is not nested under the tree root
    #[error("module {path} is not nested within {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    /// A module with the same relative path already exists
    #[error("module already exists with relative path {0}")]
    DuplicateModule(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize configuration
    #[error("failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Module metadata (`go.mod`) errors
#[derive(Debug, Error)]
pub enum ModFileError {
    /// Module file missing
    #[error("module file not found at {0}")]
    NotFound(PathBuf),

    /// The module directive is missing from the file
    #[error("module directive not present in {0}")]
    MissingModuleDirective(PathBuf),

    /// Malformed module file
    #[error("failed to parse module file {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    /// IO error
    #[error("IO error reading module file: {0}")]
    Io(#[from] std::io::Error),
}

/// Git-related errors
#[derive(Debug, Error)]
pub enum GitError {
    /// Repository not found
    #[error("git repository not found at {0}")]
    RepositoryNotFound(PathBuf),

    /// Reference could not be resolved
    #[error("failed to resolve reference {reference}: {reason}")]
    BadReference { reference: String, reason: String },

    /// Malformed module tag
    #[error("invalid module tag: {0}")]
    InvalidTag(String),

    /// Git2 library error
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),
}

/// Changelog annotation errors
#[derive(Debug, Error)]
pub enum ChangelogError {
    /// Failed to parse an annotation file
    #[error("failed to parse annotation {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    /// IO error
    #[error("IO error reading annotations: {0}")]
    Io(#[from] std::io::Error),
}

/// Version-related errors
#[derive(Debug, Error)]
pub enum VersionError {
    /// Failed to parse a semantic version
    #[error("failed to parse semver '{version}': {reason}")]
    ParseFailed { version: String, reason: String },

    /// Module identity path carries an invalid major version suffix
    #[error("invalid module path: {0}")]
    InvalidModulePath(String),

    /// Pre-release tag did not end in a numeric component
    #[error("failed to parse pre-release version number in '{0}'")]
    InvalidPreRelease(String),

    /// A release promotion was requested for a non pre-release version
    #[error("changelog annotation requests release bump, but latest tag {0} is not a pre-release")]
    NotAPreRelease(String),

    /// The computed next version does not increase
    #[error("computed next version {next} is not higher than {latest}")]
    NotIncreasing { next: String, latest: String },
}

/// Release computation errors
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// A tombstoned module still has source files on disk
    #[error("tombstone module {path} has source files: {files:?}")]
    TombstoneHasSource { path: String, files: Vec<String> },

    /// A module exempt from tagging is depended on by other modules
    #[error("module {path} is configured for no releases, but has {dependents} dependents")]
    UntaggedModuleHasDependents { path: String, dependents: usize },

    /// The in-repo require graph contains a cycle
    #[error("dependency cycle detected among modules: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),

    /// Root module record missing when summarizing a single-module repository
    #[error("root module metadata not found for {0}")]
    MissingRootModule(String),
}

impl GantryError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }
}
