//! Loading annotation files from the repository
//!
//! Pending annotations live as JSON files under `.changelog/` at the
//! repository root, one annotation per file.

use std::path::Path;

use tracing::{debug, info};

use gantry_core::error::{ChangelogError, Result};

use crate::types::Annotation;

/// Directory holding pending changelog annotations.
pub const ANNOTATION_DIR: &str = ".changelog";

/// Load all pending annotations from the repository root, sorted by id. A
/// missing annotation directory yields an empty list.
pub fn load_annotations(repo_root: &Path) -> Result<Vec<Annotation>> {
    let dir = repo_root.join(ANNOTATION_DIR);
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "no annotation directory");
        return Ok(Vec::new());
    }

    let mut annotations = Vec::new();
    for entry in std::fs::read_dir(&dir).map_err(ChangelogError::Io)? {
        let entry = entry.map_err(ChangelogError::Io)?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let content = std::fs::read_to_string(&path).map_err(ChangelogError::Io)?;
        let annotation: Annotation =
            serde_json::from_str(&content).map_err(|e| ChangelogError::ParseError {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        annotations.push(annotation);
    }

    annotations.sort_by(|a, b| a.id.cmp(&b.id));
    info!(count = annotations.len(), "loaded annotations");
    Ok(annotations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChangeType;

    #[test]
    fn test_load_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_annotations(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_load_annotations_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let changelog = dir.path().join(ANNOTATION_DIR);
        std::fs::create_dir(&changelog).unwrap();

        std::fs::write(
            changelog.join("b.json"),
            r#"{"id": "bbb", "type": "feature", "modules": ["."]}"#,
        )
        .unwrap();
        std::fs::write(
            changelog.join("a.json"),
            r#"{"id": "aaa", "type": "bugfix", "modules": ["config"]}"#,
        )
        .unwrap();
        std::fs::write(changelog.join("notes.txt"), "not an annotation").unwrap();

        let annotations = load_annotations(dir.path()).unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].id, "aaa");
        assert_eq!(annotations[0].change_type, ChangeType::BugFix);
        assert_eq!(annotations[1].id, "bbb");
    }

    #[test]
    fn test_load_malformed_annotation() {
        let dir = tempfile::tempdir().unwrap();
        let changelog = dir.path().join(ANNOTATION_DIR);
        std::fs::create_dir(&changelog).unwrap();
        std::fs::write(changelog.join("bad.json"), "{not json").unwrap();

        assert!(load_annotations(dir.path()).is_err());
    }
}
