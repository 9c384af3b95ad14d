//! Change listing between references and historical tree listing

use std::collections::BTreeSet;

use tracing::debug;

use gantry_core::error::{GitError, Result};

use crate::repository::GitRepo;

impl GitRepo {
    /// List the file paths that differ between two references, scoped to the
    /// given repository-relative path. The root path `.` scopes to the whole
    /// repository.
    pub fn changes(&self, start: &str, end: &str, path: &str) -> Result<Vec<String>> {
        let start_tree = self.tree_at(start)?;
        let end_tree = self.tree_at(end)?;

        let mut opts = git2::DiffOptions::new();
        if path != "." {
            opts.pathspec(path);
        }

        let diff = self
            .repo
            .diff_tree_to_tree(Some(&start_tree), Some(&end_tree), Some(&mut opts))
            .map_err(GitError::Git2)?;

        let mut files = BTreeSet::new();
        for delta in diff.deltas() {
            for file in [delta.old_file(), delta.new_file()] {
                if let Some(p) = file.path().and_then(|p| p.to_str()) {
                    files.insert(p.to_string());
                }
            }
        }

        debug!(start, end, path, count = files.len(), "listed changes");
        Ok(files.into_iter().collect())
    }

    /// List the full file tree at a historical reference for a given
    /// repository-relative path. Paths are returned relative to the
    /// repository root. A path that does not exist at the reference yields an
    /// empty list.
    pub fn tree_files(&self, reference: &str, path: &str) -> Result<Vec<String>> {
        let root = self.tree_at(reference)?;

        let (tree, prefix) = if path == "." {
            (root, String::new())
        } else {
            let entry = match root.get_path(std::path::Path::new(path)) {
                Ok(entry) => entry,
                Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(GitError::Git2(e).into()),
            };
            let object = entry.to_object(&self.repo).map_err(GitError::Git2)?;
            match object.into_tree() {
                Ok(tree) => (tree, format!("{path}/")),
                // path points at a blob, not a directory
                Err(_) => return Ok(vec![path.to_string()]),
            }
        };

        let mut files = Vec::new();
        tree.walk(git2::TreeWalkMode::PreOrder, |dir, entry| {
            if entry.kind() == Some(git2::ObjectType::Blob) {
                if let Some(name) = entry.name() {
                    files.push(format!("{prefix}{dir}{name}"));
                }
            }
            git2::TreeWalkResult::Ok
        })
        .map_err(GitError::Git2)?;

        files.sort();
        debug!(reference, path, count = files.len(), "listed tree files");
        Ok(files)
    }
}
