//! Filesystem module discovery
//!
//! Walks the repository for directories containing a module definition file,
//! building a [`ModuleTree`] rooted at the repository root. Hidden
//! directories and `testdata` fixture directories are skipped.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::Result;
use crate::modfile::is_module_file_present;
use crate::tree::ModuleTree;

const TEST_FIXTURE_DIR: &str = "testdata";

/// Discovers all modules and sub-modules under a repository root.
#[derive(Debug)]
pub struct Discoverer {
    root: PathBuf,
    modules: ModuleTree,
}

impl Discoverer {
    /// Walk the repository root and collect every directory containing a
    /// module definition file into a tree.
    pub fn discover(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let mut modules = ModuleTree::with_root(&root);

        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e.file_name()));

        for entry in walker {
            let entry = entry.map_err(|e| {
                crate::error::GantryError::Io(e.into())
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if is_module_file_present(entry.path()) {
                debug!(path = %entry.path().display(), "discovered module");
                modules.insert(entry.path(), &[])?;
            }
        }

        info!(root = %root.display(), modules = modules.list().len(), "module discovery complete");
        Ok(Self { root, modules })
    }

    /// Absolute path of the root directory all modules are nested within.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The tree of discovered modules.
    pub fn modules(&self) -> &ModuleTree {
        &self.modules
    }
}

fn is_skipped_dir(name: &std::ffi::OsStr) -> bool {
    let name = name.to_string_lossy();
    name == TEST_FIXTURE_DIR || name.starts_with('.')
}
