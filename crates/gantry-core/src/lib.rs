//! Gantry Core - Core library for release planning
//!
//! This crate provides the foundational types for the gantry release
//! planning tool: error handling, the module path tree, change filtering,
//! module metadata parsing, policy configuration, and module discovery.

pub mod config;
pub mod discover;
pub mod error;
pub mod filter;
pub mod modfile;
pub mod tree;

pub use config::{load_config, write_config, Config, ModulePolicy};
pub use discover::Discoverer;
pub use error::{GantryError, Result};
pub use filter::{filter_module_files, is_module_changed};
pub use modfile::{load_module_file, ModuleFile, Require};
pub use tree::{ModuleNode, ModuleTree, TOMBSTONE_ATTRIBUTE};
