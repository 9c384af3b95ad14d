//! Gantry Git - Git collaborator for release planning
//!
//! Provides the repository handle, the per-module semantic-version tag
//! registry, and the change/history listings the release engine consumes.

pub mod changes;
pub mod repository;
pub mod tags;

pub use repository::GitRepo;
pub use tags::{module_tag, parse_module_tag, ModuleTags};
