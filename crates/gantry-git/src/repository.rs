//! Git repository handle

use std::path::{Path, PathBuf};

use tracing::debug;

use gantry_core::error::{GitError, Result};

/// A handle to the repository under release management.
pub struct GitRepo {
    pub(crate) repo: git2::Repository,
    workdir: PathBuf,
}

impl std::fmt::Debug for GitRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepo")
            .field("workdir", &self.workdir)
            .finish()
    }
}

impl GitRepo {
    /// Open the repository at the exact path.
    pub fn open(path: &Path) -> Result<Self> {
        let repo = git2::Repository::open(path)
            .map_err(|_| GitError::RepositoryNotFound(path.to_path_buf()))?;
        Self::from_repo(repo)
    }

    /// Discover the repository containing the path, walking up parent
    /// directories.
    pub fn discover(path: &Path) -> Result<Self> {
        let repo = git2::Repository::discover(path)
            .map_err(|_| GitError::RepositoryNotFound(path.to_path_buf()))?;
        Self::from_repo(repo)
    }

    fn from_repo(repo: git2::Repository) -> Result<Self> {
        let workdir = repo
            .workdir()
            .ok_or_else(|| GitError::RepositoryNotFound(repo.path().to_path_buf()))?
            .to_path_buf();
        debug!(workdir = %workdir.display(), "opened repository");
        Ok(Self { repo, workdir })
    }

    /// The repository working directory.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Resolve a revision spec to the tree it points at.
    pub(crate) fn tree_at(&self, reference: &str) -> Result<git2::Tree<'_>> {
        let object = self
            .repo
            .revparse_single(reference)
            .map_err(|e| GitError::BadReference {
                reference: reference.to_string(),
                reason: e.message().to_string(),
            })?;
        let peeled = object
            .peel(git2::ObjectType::Tree)
            .map_err(|e| GitError::BadReference {
                reference: reference.to_string(),
                reason: e.message().to_string(),
            })?;
        peeled.into_tree().map_err(|_| {
            GitError::BadReference {
                reference: reference.to_string(),
                reason: "reference does not point to a tree".to_string(),
            }
            .into()
        })
    }
}
