//! Gantry Release - release calculation engine
//!
//! Determines which repository modules need a release, computes their next
//! semantic versions, and summarizes the outcome in a release manifest.

pub mod calculate;
pub mod deps;
pub mod id;
pub mod manifest;
pub mod version;

pub use calculate::{
    calculate, CalculatedRelease, ChangeProvider, ModuleChange, ModuleFinder, ModuleRecord,
};
pub use deps::calculate_dependency_updates;
pub use id::{next_release_id, Clock, SystemClock, RELEASE_TAG_PREFIX};
pub use manifest::{build_release_manifest, Manifest, ModuleManifest};
pub use version::calculate_next_version;
