//! Module change filtering
//!
//! Decides which changed file paths are owned by a specific module, as
//! opposed to one of its registered sub-modules.

use std::collections::HashMap;

use crate::tree::ModuleNode;

/// Returns the files from the list that apply to this specific module. Any
/// file owned by a nested sub-module, or that is not release relevant, is
/// excluded. The result is sorted lexicographically.
pub fn filter_module_files(module: &ModuleNode, files: &[String]) -> Vec<String> {
    // Relevance is decided per directory, memoized to avoid repeated tree
    // searches for files sharing a directory.
    let mut dir_relevant: HashMap<String, bool> = HashMap::new();
    let mut relevant = Vec::new();

    for file in files {
        let (dir, name) = split_dir(file);

        // Only source files and module definition files count as changes.
        if !(is_source_file(name) || is_module_file(name)) {
            continue;
        }

        let owned = *dir_relevant
            .entry(dir.to_string())
            .or_insert_with(|| module.parent_of(dir));
        if owned {
            relevant.push(file.clone());
        }
    }

    relevant.sort();
    relevant
}

/// Returns whether the given set of changes applies to the module directly,
/// and not any of its sub-modules.
pub fn is_module_changed(module: &ModuleNode, changes: &[String]) -> bool {
    !filter_module_files(module, changes).is_empty()
}

/// Returns whether a file name is a Go source file.
pub fn is_source_file(name: &str) -> bool {
    !name.starts_with('.') && name.ends_with(".go")
}

/// Returns whether a file name is the module definition file.
pub fn is_module_file(name: &str) -> bool {
    name == "go.mod"
}

fn split_dir(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((dir, name)) => (dir, name),
        None => (".", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ModuleTree;

    fn changes(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| (*p).to_string()).collect()
    }

    #[test]
    fn test_filter_no_submodules() {
        let mut tree = ModuleTree::new();
        tree.insert(".", &[]).unwrap();

        let got = filter_module_files(
            tree.get(".").unwrap(),
            &changes(&["sub3/foo.go", "sub2/bar.go", "sub1/baz.go", "foo.go"]),
        );
        assert_eq!(got, changes(&["foo.go", "sub1/baz.go", "sub2/bar.go", "sub3/foo.go"]));
    }

    #[test]
    fn test_filter_non_source_files() {
        let mut tree = ModuleTree::new();
        tree.insert(".", &[]).unwrap();

        let got = filter_module_files(tree.get(".").unwrap(), &changes(&["foo.java"]));
        assert!(got.is_empty());
    }

    #[test]
    fn test_filter_module_file_considered() {
        let mut tree = ModuleTree::new();
        tree.insert(".", &[]).unwrap();

        let got = filter_module_files(tree.get(".").unwrap(), &changes(&["go.mod"]));
        assert_eq!(got, changes(&["go.mod"]));
    }

    #[test]
    fn test_filter_root_with_submodules() {
        let mut tree = ModuleTree::new();
        tree.insert(".", &[]).unwrap();
        tree.insert("sub1", &[]).unwrap();
        tree.insert("sub2", &[]).unwrap();

        let got = filter_module_files(
            tree.get(".").unwrap(),
            &changes(&["sub3/foo.go", "sub2/bar.go", "sub1/baz.go", "foo.go"]),
        );
        // sub1 and sub2 are owned by registered sub-modules; sub3 is not.
        assert_eq!(got, changes(&["foo.go", "sub3/foo.go"]));
    }

    #[test]
    fn test_filter_submodule_dir() {
        let mut tree = ModuleTree::new();
        tree.insert("sub1", &[]).unwrap();

        let module = tree.get("sub1").unwrap();
        let got = filter_module_files(
            module,
            &changes(&["sub3/foo.go", "sub2/bar.go", "foo.go"]),
        );
        assert!(got.is_empty());

        let got = filter_module_files(
            module,
            &changes(&["sub3/foo.go", "sub2/bar.go", "sub1/bar.go", "foo.go"]),
        );
        assert_eq!(got, changes(&["sub1/bar.go"]));
    }

    #[test]
    fn test_filter_submodule_with_nested_submodules() {
        let mut tree = ModuleTree::new();
        tree.insert("sub1", &[]).unwrap();
        tree.insert("sub1/subsub1", &[]).unwrap();
        tree.insert("sub1/subsub2", &[]).unwrap();

        let module = tree.get("sub1").unwrap();
        let got = filter_module_files(
            module,
            &changes(&[
                "sub1/subsub1/foo.go",
                "sub1/subsub2/bar.go",
                "sub1/baz.go",
                "foo.go",
            ]),
        );
        assert_eq!(got, changes(&["sub1/baz.go"]));
    }

    #[test]
    fn test_is_module_changed() {
        let mut tree = ModuleTree::new();
        tree.insert("sub1", &[]).unwrap();

        let module = tree.get("sub1").unwrap();
        assert!(is_module_changed(module, &changes(&["sub1/bar.go"])));
        assert!(!is_module_changed(module, &changes(&["sub2/bar.go"])));
        assert!(!is_module_changed(module, &[]));
    }

    #[test]
    fn test_source_and_module_file_names() {
        assert!(is_source_file("foo.go"));
        assert!(!is_source_file(".hidden.go"));
        assert!(!is_source_file("foo.rs"));
        assert!(is_module_file("go.mod"));
        assert!(!is_module_file("go.sum"));
    }
}
