//! Dependency update propagation
//!
//! Modules that depend on a released module, directly or transitively, need a
//! release of their own to pick up the new version. Propagation walks the
//! inverse require graph from every changed module.

use std::collections::{BTreeMap, VecDeque};

use tracing::debug;

use gantry_core::error::{ReleaseError, Result};

use crate::calculate::ModuleRecord;

/// Set the dependency-update flag on every module whose direct or indirect
/// in-repository dependency has changes.
///
/// Fails with [`ReleaseError::UntaggedModuleHasDependents`] when a changed
/// module is configured not to be tagged but other modules require it, and
/// with [`ReleaseError::DependencyCycle`] when the in-repository require
/// graph is cyclic.
pub fn calculate_dependency_updates(records: &mut BTreeMap<String, ModuleRecord>) -> Result<()> {
    let reverse_graph = build_inverse_dependency_graph(records);
    check_for_cycles(records, &reverse_graph)?;

    let mut to_visit: VecDeque<String> = reverse_graph.keys().cloned().collect();
    while let Some(current) = to_visit.pop_front() {
        let (unchanged, no_tag) = {
            let record = &records[&current];
            (record.changes.is_empty(), record.policy.no_tag)
        };
        if unchanged {
            continue;
        }

        let dependents = &reverse_graph[&current];
        if no_tag {
            if !dependents.is_empty() {
                return Err(ReleaseError::UntaggedModuleHasDependents {
                    path: current,
                    dependents: dependents.len(),
                }
                .into());
            }
            continue;
        }

        for dependent in dependents {
            let record = records
                .get_mut(dependent)
                .unwrap_or_else(|| unreachable!("graph node without record"));
            if record.changes.dependency_update {
                continue;
            }
            record.changes.dependency_update = true;
            debug!(module = %dependent, cause = %current, "dependency update");

            // The dependent's own dependents need another look.
            if reverse_graph.contains_key(dependent) && !to_visit.contains(dependent) {
                to_visit.push_back(dependent.clone());
            }
        }
    }

    Ok(())
}

/// Map each module identity path to the modules that require it. Requirements
/// on modules outside the repository are ignored.
fn build_inverse_dependency_graph(
    records: &BTreeMap<String, ModuleRecord>,
) -> BTreeMap<String, Vec<String>> {
    let mut graph: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (module_path, record) in records {
        for require in &record.requires {
            if !records.contains_key(require) {
                continue;
            }
            graph.entry(require.clone()).or_default().push(module_path.clone());
        }
    }

    for dependents in graph.values_mut() {
        dependents.sort();
    }
    graph
}

/// Peel modules with no unresolved in-repository requirements; anything left
/// over sits on a cycle.
fn check_for_cycles(
    records: &BTreeMap<String, ModuleRecord>,
    reverse_graph: &BTreeMap<String, Vec<String>>,
) -> Result<()> {
    let mut pending: BTreeMap<&str, usize> = records
        .iter()
        .map(|(path, record)| {
            let in_repo = record
                .requires
                .iter()
                .filter(|r| records.contains_key(*r))
                .count();
            (path.as_str(), in_repo)
        })
        .collect();

    let mut ready: VecDeque<&str> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(path, _)| *path)
        .collect();

    while let Some(current) = ready.pop_front() {
        pending.remove(current);
        if let Some(dependents) = reverse_graph.get(current) {
            for dependent in dependents {
                if let Some(count) = pending.get_mut(dependent.as_str()) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push_back(dependent.as_str());
                    }
                }
            }
        }
    }

    if pending.is_empty() {
        return Ok(());
    }

    let cycle: Vec<String> = pending.keys().map(|p| (*p).to_string()).collect();
    Err(ReleaseError::DependencyCycle(cycle).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::config::ModulePolicy;
    use gantry_core::error::GantryError;

    use crate::calculate::ModuleChange;

    fn record(path: &str, requires: &[&str], changes: ModuleChange) -> ModuleRecord {
        ModuleRecord {
            module_path: path.to_string(),
            rel_repo_path: path.rsplit('/').next().unwrap_or(".").to_string(),
            latest: Some("v1.0.0".to_string()),
            changes,
            file_changes: vec![],
            annotations: vec![],
            policy: ModulePolicy::default(),
            requires: requires.iter().map(|r| (*r).to_string()).collect(),
        }
    }

    fn changed() -> ModuleChange {
        ModuleChange {
            source_change: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_propagates_through_chain() {
        let mut records = BTreeMap::new();
        records.insert("example.com/a".to_string(), record("example.com/a", &[], changed()));
        records.insert(
            "example.com/b".to_string(),
            record("example.com/b", &["example.com/a"], ModuleChange::default()),
        );
        records.insert(
            "example.com/c".to_string(),
            record("example.com/c", &["example.com/b"], ModuleChange::default()),
        );
        records.insert(
            "example.com/d".to_string(),
            record("example.com/d", &[], ModuleChange::default()),
        );

        calculate_dependency_updates(&mut records).unwrap();

        assert!(records["example.com/b"].changes.dependency_update);
        assert!(records["example.com/c"].changes.dependency_update);
        assert!(records["example.com/d"].changes.is_empty());
        // the origin keeps its own flags only
        assert!(!records["example.com/a"].changes.dependency_update);
    }

    #[test]
    fn test_unchanged_dependency_does_not_propagate() {
        let mut records = BTreeMap::new();
        records.insert(
            "example.com/a".to_string(),
            record("example.com/a", &[], ModuleChange::default()),
        );
        records.insert(
            "example.com/b".to_string(),
            record("example.com/b", &["example.com/a"], ModuleChange::default()),
        );

        calculate_dependency_updates(&mut records).unwrap();
        assert!(records["example.com/b"].changes.is_empty());
    }

    #[test]
    fn test_external_requirements_ignored() {
        let mut records = BTreeMap::new();
        records.insert(
            "example.com/a".to_string(),
            record("example.com/a", &["github.com/google/go-cmp"], changed()),
        );

        calculate_dependency_updates(&mut records).unwrap();
        assert!(!records["example.com/a"].changes.dependency_update);
    }

    #[test]
    fn test_no_tag_with_dependents_fails() {
        let mut records = BTreeMap::new();
        let mut no_tag = record("example.com/a", &[], changed());
        no_tag.policy = ModulePolicy {
            no_tag: true,
            ..Default::default()
        };
        records.insert("example.com/a".to_string(), no_tag);
        records.insert(
            "example.com/b".to_string(),
            record("example.com/b", &["example.com/a"], ModuleChange::default()),
        );

        let err = calculate_dependency_updates(&mut records).unwrap_err();
        assert!(matches!(
            err,
            GantryError::Release(ReleaseError::UntaggedModuleHasDependents { .. })
        ));
    }

    #[test]
    fn test_no_tag_without_dependents_skipped() {
        let mut records = BTreeMap::new();
        let mut no_tag = record("example.com/a", &[], changed());
        no_tag.policy = ModulePolicy {
            no_tag: true,
            ..Default::default()
        };
        records.insert("example.com/a".to_string(), no_tag);

        calculate_dependency_updates(&mut records).unwrap();
    }

    #[test]
    fn test_cycle_detected() {
        let mut records = BTreeMap::new();
        records.insert(
            "example.com/a".to_string(),
            record("example.com/a", &["example.com/b"], changed()),
        );
        records.insert(
            "example.com/b".to_string(),
            record("example.com/b", &["example.com/a"], ModuleChange::default()),
        );

        let err = calculate_dependency_updates(&mut records).unwrap_err();
        match err {
            GantryError::Release(ReleaseError::DependencyCycle(members)) => {
                assert_eq!(members, vec!["example.com/a", "example.com/b"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
