//! Release manifest construction
//!
//! Summarizes a calculated release into a JSON manifest: the release id, the
//! modules being released with their version transitions, and the Git tags to
//! create.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use gantry_core::error::{ReleaseError, Result};
use gantry_core::tree::ModuleTree;
use gantry_git::module_tag;

use crate::calculate::{ModuleChange, ModuleRecord};
use crate::version::calculate_next_version;

/// A release description of changed modules and their associated tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Release identifier.
    pub id: String,

    /// Whether a repository-wide release tag should be created. Single-module
    /// repositories are identified by their module version instead.
    pub with_release_tag: bool,

    /// Released modules keyed by relative repository path.
    pub modules: BTreeMap<String, ModuleManifest>,

    /// The Git tags to create, sorted.
    pub tags: Vec<String>,
}

/// A changed module's entry in a release manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleManifest {
    /// The module identity path.
    pub module_path: String,

    /// The version being released from, absent for new modules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// The version being released.
    pub to: String,

    /// The kinds of change that made the module release-worthy.
    #[serde(default, skip_serializing_if = "ModuleChange::is_empty")]
    pub changes: ModuleChange,

    /// The changed files, present in verbose manifests only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_changes: Vec<String>,

    /// Identifiers of the changelog annotations applied to this module.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,
}

/// Build the release manifest for a calculated set of module records.
/// Unchanged modules and modules configured not to be tagged are left out.
pub fn build_release_manifest(
    tree: &ModuleTree,
    id: &str,
    modules: &BTreeMap<String, ModuleRecord>,
    verbose: bool,
    pre_release: Option<&str>,
) -> Result<Manifest> {
    let mut manifest = Manifest {
        id: id.to_string(),
        with_release_tag: true,
        modules: BTreeMap::new(),
        tags: Vec::new(),
    };

    for (module_path, record) in modules {
        if record.changes.is_empty() || record.policy.no_tag {
            continue;
        }

        let next = calculate_next_version(
            module_path,
            record.latest.as_deref(),
            &record.policy,
            &record.annotations,
            pre_release,
        )?;

        let file_changes = if verbose {
            record.file_changes.clone()
        } else {
            Vec::new()
        };

        manifest.tags.push(module_tag(&record.rel_repo_path, &next)?);
        manifest.modules.insert(
            record.rel_repo_path.clone(),
            ModuleManifest {
                module_path: module_path.clone(),
                from: record.latest.clone(),
                to: next,
                changes: record.changes,
                file_changes,
                annotations: record.annotations.iter().map(|a| a.id.clone()).collect(),
            },
        );
    }

    // Only multi-module repositories get a repository-wide release tag.
    // Single-module repositories are identified by the root module's version,
    // current or next.
    let repo_modules = tree.list();
    if let [root] = repo_modules.as_slice() {
        let root_path = root.path();
        manifest.id = match manifest.modules.get(root_path) {
            Some(entry) => entry.to.clone(),
            None => modules
                .values()
                .find(|r| r.rel_repo_path == root_path)
                .and_then(|r| r.latest.clone())
                .ok_or_else(|| ReleaseError::MissingRootModule(root_path.to_string()))?,
        };
        manifest.with_release_tag = false;
    }

    manifest.tags.sort();
    manifest.tags.dedup();

    info!(
        id = %manifest.id,
        modules = manifest.modules.len(),
        tags = manifest.tags.len(),
        "built release manifest"
    );
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_changelog::{Annotation, ChangeType};
    use gantry_core::config::ModulePolicy;

    fn record(
        module_path: &str,
        rel_path: &str,
        latest: Option<&str>,
        changes: ModuleChange,
    ) -> ModuleRecord {
        ModuleRecord {
            module_path: module_path.to_string(),
            rel_repo_path: rel_path.to_string(),
            latest: latest.map(str::to_string),
            changes,
            file_changes: vec!["main.go".to_string()],
            annotations: vec![],
            policy: ModulePolicy::default(),
            requires: vec![],
        }
    }

    fn source_change() -> ModuleChange {
        ModuleChange {
            source_change: true,
            ..Default::default()
        }
    }

    fn multi_module_tree() -> ModuleTree {
        let mut tree = ModuleTree::new();
        tree.insert(".", &[]).unwrap();
        tree.insert("config", &[]).unwrap();
        tree.insert("internal/tools", &[]).unwrap();
        tree
    }

    #[test]
    fn test_build_manifest_multi_module() {
        let tree = multi_module_tree();

        let mut modules = BTreeMap::new();
        modules.insert(
            "example.com/repo".to_string(),
            record("example.com/repo", ".", Some("v1.2.3"), source_change()),
        );
        modules.insert(
            "example.com/repo/config".to_string(),
            record("example.com/repo/config", "config", None, ModuleChange {
                new_module: true,
                ..Default::default()
            }),
        );
        // unchanged modules stay out of the manifest
        modules.insert(
            "example.com/repo/internal/tools".to_string(),
            record(
                "example.com/repo/internal/tools",
                "internal/tools",
                Some("v1.0.0"),
                ModuleChange::default(),
            ),
        );

        let manifest =
            build_release_manifest(&tree, "2021-10-27", &modules, false, None).unwrap();

        assert_eq!(manifest.id, "2021-10-27");
        assert!(manifest.with_release_tag);
        assert_eq!(manifest.modules.len(), 2);

        let root = &manifest.modules["."];
        assert_eq!(root.from.as_deref(), Some("v1.2.3"));
        assert_eq!(root.to, "v1.2.4");
        assert!(root.file_changes.is_empty());

        let config = &manifest.modules["config"];
        assert_eq!(config.from, None);
        assert_eq!(config.to, "v1.0.0-preview");

        assert_eq!(manifest.tags, vec!["config/v1.0.0-preview", "v1.2.4"]);
    }

    #[test]
    fn test_build_manifest_skips_no_tag_modules() {
        let tree = multi_module_tree();

        let mut modules = BTreeMap::new();
        modules.insert(
            "example.com/repo".to_string(),
            record("example.com/repo", ".", Some("v1.2.3"), source_change()),
        );
        let mut tools = record(
            "example.com/repo/internal/tools",
            "internal/tools",
            Some("v1.0.0"),
            source_change(),
        );
        tools.policy = ModulePolicy {
            no_tag: true,
            ..Default::default()
        };
        modules.insert("example.com/repo/internal/tools".to_string(), tools);

        let manifest =
            build_release_manifest(&tree, "2021-10-27", &modules, false, None).unwrap();
        assert_eq!(manifest.modules.len(), 1);
        assert_eq!(manifest.tags, vec!["v1.2.4"]);
    }

    #[test]
    fn test_build_manifest_verbose_and_annotations() {
        let tree = multi_module_tree();

        let mut modules = BTreeMap::new();
        let mut root = record("example.com/repo", ".", Some("v1.2.3"), source_change());
        root.annotations = vec![Annotation {
            id: "abc123".to_string(),
            change_type: ChangeType::BugFix,
            description: String::new(),
            modules: vec![".".to_string()],
        }];
        modules.insert("example.com/repo".to_string(), root);

        let manifest =
            build_release_manifest(&tree, "2021-10-27", &modules, true, None).unwrap();

        let root = &manifest.modules["."];
        assert_eq!(root.file_changes, vec!["main.go"]);
        assert_eq!(root.annotations, vec!["abc123"]);
    }

    #[test]
    fn test_build_manifest_single_module_changed() {
        let mut tree = ModuleTree::new();
        tree.insert(".", &[]).unwrap();

        let mut modules = BTreeMap::new();
        modules.insert(
            "example.com/repo".to_string(),
            record("example.com/repo", ".", Some("v1.2.3"), source_change()),
        );

        let manifest =
            build_release_manifest(&tree, "2021-10-27", &modules, false, None).unwrap();

        assert_eq!(manifest.id, "v1.2.4");
        assert!(!manifest.with_release_tag);
        assert_eq!(manifest.tags, vec!["v1.2.4"]);
    }

    #[test]
    fn test_build_manifest_single_module_unchanged() {
        let mut tree = ModuleTree::new();
        tree.insert(".", &[]).unwrap();

        let mut modules = BTreeMap::new();
        modules.insert(
            "example.com/repo".to_string(),
            record("example.com/repo", ".", Some("v1.0.1"), ModuleChange::default()),
        );

        let manifest =
            build_release_manifest(&tree, "2021-10-27", &modules, false, None).unwrap();

        assert_eq!(manifest.id, "v1.0.1");
        assert!(!manifest.with_release_tag);
        assert!(manifest.modules.is_empty());
        assert!(manifest.tags.is_empty());
    }

    #[test]
    fn test_build_manifest_single_module_missing_record() {
        let mut tree = ModuleTree::new();
        tree.insert(".", &[]).unwrap();

        let modules = BTreeMap::new();
        let err = build_release_manifest(&tree, "2021-10-27", &modules, false, None).unwrap_err();
        assert!(matches!(
            err,
            gantry_core::error::GantryError::Release(ReleaseError::MissingRootModule(_))
        ));
    }

    #[test]
    fn test_manifest_json_shape() {
        let manifest = Manifest {
            id: "2021-10-27".to_string(),
            with_release_tag: true,
            modules: BTreeMap::from([(
                "config".to_string(),
                ModuleManifest {
                    module_path: "example.com/repo/config".to_string(),
                    from: None,
                    to: "v1.0.0-preview".to_string(),
                    changes: ModuleChange {
                        new_module: true,
                        ..Default::default()
                    },
                    file_changes: vec![],
                    annotations: vec![],
                },
            )]),
            tags: vec!["config/v1.0.0-preview".to_string()],
        };

        let value = serde_json::to_value(&manifest).unwrap();
        assert_eq!(value["id"], "2021-10-27");
        assert_eq!(value["with_release_tag"], true);

        let entry = &value["modules"]["config"];
        assert_eq!(entry["to"], "v1.0.0-preview");
        assert_eq!(entry["changes"]["new_module"], true);
        // absent and empty fields are omitted
        assert!(entry.get("from").is_none());
        assert!(entry.get("file_changes").is_none());
        assert!(entry["changes"].get("source_change").is_none());

        let parsed: Manifest = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, manifest);
    }
}
