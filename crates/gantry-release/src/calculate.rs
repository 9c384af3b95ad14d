//! Release calculation
//!
//! Determines which repository modules need a release based on the Git
//! history since their last tagged version, previously released tags, the
//! repository configuration, and pending changelog annotations.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use gantry_changelog::Annotation;
use gantry_core::config::{Config, ModulePolicy};
use gantry_core::discover::Discoverer;
use gantry_core::error::{GantryError, ReleaseError, Result};
use gantry_core::filter::{filter_module_files, is_module_file, is_source_file};
use gantry_core::modfile::load_module_file;
use gantry_core::tree::{ModuleNode, ModuleTree, TOMBSTONE_ATTRIBUTE};
use gantry_git::{module_tag, GitRepo, ModuleTags};

use crate::deps::calculate_dependency_updates;

/// A type that searches a repository for modules.
pub trait ModuleFinder {
    /// Absolute path of the root directory all modules are nested within.
    fn root(&self) -> &Path;

    /// The tree of known modules.
    fn modules(&self) -> &ModuleTree;
}

impl ModuleFinder for Discoverer {
    fn root(&self) -> &Path {
        Discoverer::root(self)
    }

    fn modules(&self) -> &ModuleTree {
        Discoverer::modules(self)
    }
}

/// Access to repository history: changed files between references and
/// historical file listings.
pub trait ChangeProvider {
    /// File paths changed between two references, scoped to a
    /// repository-relative path.
    fn changes(&self, start: &str, end: &str, path: &str) -> Result<Vec<String>>;

    /// Full file listing at a historical reference for a repository-relative
    /// path.
    fn tree_files(&self, reference: &str, path: &str) -> Result<Vec<String>>;
}

impl ChangeProvider for GitRepo {
    fn changes(&self, start: &str, end: &str, path: &str) -> Result<Vec<String>> {
        GitRepo::changes(self, start, end, path)
    }

    fn tree_files(&self, reference: &str, path: &str) -> Result<Vec<String>> {
        GitRepo::tree_files(self, reference, path)
    }
}

/// The kinds of change that make a module release-worthy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleChange {
    /// The module has source changes since its last tagged release.
    #[serde(default, skip_serializing_if = "is_false")]
    pub source_change: bool,

    /// The module is new and has never been tagged.
    #[serde(default, skip_serializing_if = "is_false")]
    pub new_module: bool,

    /// A direct or indirect in-repository dependency is being released.
    #[serde(default, skip_serializing_if = "is_false")]
    pub dependency_update: bool,
}

impl ModuleChange {
    /// Returns true when no change kind is set.
    pub fn is_empty(&self) -> bool {
        !(self.source_change || self.new_module || self.dependency_update)
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A repository module and what is known about its release state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    /// The module identity path from its definition file.
    pub module_path: String,

    /// The module's path relative to the repository root.
    pub rel_repo_path: String,

    /// The most recent tagged release, if any.
    pub latest: Option<String>,

    /// The changes found for the module.
    pub changes: ModuleChange,

    /// The changed files owned by this module.
    pub file_changes: Vec<String>,

    /// The changelog annotations applicable to this module.
    pub annotations: Vec<Annotation>,

    /// The configured release policy for this module.
    pub policy: ModulePolicy,

    /// Identity paths of the module's declared requirements.
    pub requires: Vec<String>,
}

/// The outcome of a release calculation: the module tree, augmented with
/// tombstones for historically tagged modules, and a record per module keyed
/// by module identity path. Unchanged modules are retained with an empty
/// change set.
#[derive(Debug, Clone)]
pub struct CalculatedRelease {
    /// The repository module tree, including tombstoned modules.
    pub tree: ModuleTree,

    /// Release state per module, keyed by module identity path.
    pub modules: BTreeMap<String, ModuleRecord>,
}

/// Calculate the modules affected by the next release based on Git history,
/// previous tags, module configuration, and changelog annotations.
pub fn calculate(
    finder: &impl ModuleFinder,
    git: &impl ChangeProvider,
    tags: &ModuleTags,
    config: &Config,
    annotations: &[Annotation],
) -> Result<CalculatedRelease> {
    let root = finder.root();
    let mut tree = finder.modules().clone();

    let mut module_annotations: BTreeMap<String, Vec<Annotation>> = BTreeMap::new();
    for annotation in annotations {
        for module in &annotation.modules {
            module_annotations
                .entry(module.clone())
                .or_default()
                .push(annotation.clone());
        }
    }

    // Tagged modules that no longer exist in the working tree are tracked as
    // tombstones.
    let tagged: Vec<String> = tags.module_paths().map(str::to_string).collect();
    for path in &tagged {
        if tree.get(path).is_none() {
            debug!(path, "tombstoning removed module");
            tree.insert_rel(path, &[TOMBSTONE_ATTRIBUTE])?;
        }
    }

    let mut records = BTreeMap::new();
    for module in tree.iter() {
        // Tombstone modules must own no source files. Files owned by their
        // registered sub-modules are fine.
        if module.has_attribute(TOMBSTONE_ATTRIBUTE) {
            let files = list_rel_files(root, module.abs_path())?;
            let files = filter_module_files(module, &files);
            if !files.is_empty() {
                return Err(ReleaseError::TombstoneHasSource {
                    path: module.path().to_string(),
                    files,
                }
                .into());
            }
            continue;
        }

        let module_file = load_module_file(module.abs_path())?;
        let latest = tags.latest(module.path());

        let mut file_changes = Vec::new();
        let mut has_changes = false;
        if let Some(latest) = &latest {
            let start = module_tag(module.path(), latest)?;
            let changed = git.changes(&start, "HEAD", module.path())?;

            // Only changes specific to this module count; sub-module changes
            // are considered separately.
            file_changes = filter_module_files(module, &changed);
            has_changes = !file_changes.is_empty();

            if !has_changes {
                has_changes = has_carved_out_submodule(git, tags, module, &start)?;
            }
        }

        let changes = ModuleChange {
            source_change: has_changes && latest.is_some(),
            new_module: latest.is_none(),
            dependency_update: false,
        };

        debug!(
            module = %module_file.module_path,
            rel_path = module.path(),
            latest = latest.as_deref().unwrap_or(""),
            files = file_changes.len(),
            "checked module"
        );

        records.insert(
            module_file.module_path.clone(),
            ModuleRecord {
                module_path: module_file.module_path.clone(),
                rel_repo_path: module.path().to_string(),
                latest,
                changes,
                file_changes,
                annotations: module_annotations
                    .get(module.path())
                    .cloned()
                    .unwrap_or_default(),
                policy: config.module_policy(module.path()),
                requires: module_file.require_paths(),
            },
        );
    }

    calculate_dependency_updates(&mut records)?;

    info!(
        modules = records.len(),
        changed = records.values().filter(|r| !r.changes.is_empty()).count(),
        "release calculation complete"
    );

    Ok(CalculatedRelease { tree, modules: records })
}

/// Returns whether any untagged sub-module of this module was carved out of
/// it since the module's last tagged release.
fn has_carved_out_submodule(
    git: &impl ChangeProvider,
    tags: &ModuleTags,
    module: &ModuleNode,
    start_tag: &str,
) -> Result<bool> {
    for sub in module.iter() {
        // Tombstoned sub-modules no longer exist locally.
        if sub.has_attribute(TOMBSTONE_ATTRIBUTE) {
            continue;
        }
        // Sub-modules with their own tags are existing modules.
        if tags.latest(sub.path()).is_some() {
            continue;
        }

        let historical = git.tree_files(start_tag, sub.path())?;
        if is_module_carved_out(sub, &historical) {
            debug!(parent = module.path(), sub = sub.path(), "carved out sub-module");
            return Ok(true);
        }
    }
    Ok(false)
}

/// Returns whether a new sub-module was carved out of its parent. The files
/// are the parent's previously tagged contents of the sub-module directory;
/// a carved-out module had Go source there but no module definition file.
fn is_module_carved_out(module: &ModuleNode, files: &[String]) -> bool {
    let files = filter_module_files(module, files);

    let mut has_source = false;
    let mut has_module_file = false;
    for file in &files {
        let name = file.rsplit('/').next().unwrap_or(file);
        if is_module_file(name) {
            has_module_file = true;
        }
        if is_source_file(name) {
            has_source = true;
        }
        if has_source && has_module_file {
            break;
        }
    }

    !has_module_file && has_source
}

/// List every file under the directory, relative to the repository root. A
/// directory that does not exist yields an empty list.
fn list_rel_files(root: &Path, dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| GantryError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| GantryError::other(format!("file {} outside root", entry.path().display())))?;
        let parts: Vec<&str> = rel
            .components()
            .filter_map(|c| match c {
                std::path::Component::Normal(p) => p.to_str(),
                _ => None,
            })
            .collect();
        files.push(parts.join("/"));
    }

    files.sort();
    Ok(files)
}
