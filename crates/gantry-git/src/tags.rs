//! Tag listing and the per-module tag registry
//!
//! Module release tags follow the `{modulePath}/v{semver}` convention, with
//! bare `v{semver}` tags belonging to the repository root module.

use std::collections::BTreeMap;

use semver::Version;
use tracing::debug;

use gantry_core::error::{GitError, Result};

use crate::repository::GitRepo;

impl GitRepo {
    /// All tag names in the repository, sorted.
    pub fn tags(&self) -> Result<Vec<String>> {
        let names = self.repo.tag_names(None).map_err(GitError::Git2)?;
        let mut tags: Vec<String> = names.iter().flatten().map(str::to_string).collect();
        tags.sort();
        debug!(count = tags.len(), "listed tags");
        Ok(tags)
    }
}

/// Registry of semantic-version tags grouped per module path, most recent
/// first.
#[derive(Debug, Clone, Default)]
pub struct ModuleTags {
    tags: BTreeMap<String, Vec<Version>>,
}

impl ModuleTags {
    /// Classify a flat list of repository tags into per-module version
    /// lists. Tags that do not follow the module tag convention are ignored.
    pub fn parse(tags: &[String]) -> Self {
        let mut grouped: BTreeMap<String, Vec<Version>> = BTreeMap::new();

        for tag in tags {
            if let Some((module, version)) = parse_module_tag(tag) {
                grouped.entry(module).or_default().push(version);
            }
        }

        for versions in grouped.values_mut() {
            versions.sort_by(|a, b| b.cmp(a));
        }

        Self { tags: grouped }
    }

    /// The most recent semantic-version tag for the module path, formatted
    /// with its leading `v`.
    pub fn latest(&self, module: &str) -> Option<String> {
        self.tags
            .get(module)
            .and_then(|versions| versions.first())
            .map(|v| format!("v{v}"))
    }

    /// The module paths that have at least one release tag, in sorted order.
    pub fn module_paths(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }
}

/// Split a repository tag into its module path and version. Returns `None`
/// for tags that do not follow the module tag convention. Bare version tags
/// map to the root module path `.`.
pub fn parse_module_tag(tag: &str) -> Option<(String, Version)> {
    let (module, version) = match tag.rsplit_once('/') {
        Some((module, version)) => (module.to_string(), version),
        None => (".".to_string(), tag),
    };

    let version = version.strip_prefix('v')?;
    let version = Version::parse(version).ok()?;
    Some((module, version))
}

/// Format the release tag for a module path and version. The version must be
/// a `v`-prefixed semantic version; the root module path `.` produces a bare
/// version tag.
pub fn module_tag(module: &str, version: &str) -> Result<String> {
    let valid = version
        .strip_prefix('v')
        .and_then(|v| Version::parse(v).ok())
        .is_some();
    if !valid {
        return Err(GitError::InvalidTag(format!("{module}/{version}")).into());
    }

    if module == "." {
        Ok(version.to_string())
    } else {
        Ok(format!("{module}/{version}"))
    }
}
