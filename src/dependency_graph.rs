//! Containment and dependency bookkeeping used to order destruction.
//!
//! An edge `dependent -> dependency` means `dependent` has to be destroyed
//! before `dependency`. The graph stores it twice: under `dependents`, keyed by
//! the dependency, and under `dependencies_for`, keyed by the dependent.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Relationships {
    /// outer name -> names it contains
    contained: IndexMap<String, IndexSet<String>>,
    /// name -> names that depend on it
    dependents: IndexMap<String, IndexSet<String>>,
    /// name -> names it depends on
    dependencies_for: IndexMap<String, IndexSet<String>>,
}

#[derive(Debug, Default)]
pub(crate) struct DependencyGraph {
    inner: Mutex<Relationships>,
}

impl DependencyGraph {
    /// Records that `outer` contains `inner`.
    ///
    /// Returns `false` when the pair was already known.
    pub(crate) fn add_containment(&self, outer: &str, inner: &str) -> bool {
        self.inner
            .lock()
            .contained
            .entry(outer.to_owned())
            .or_default()
            .insert(inner.to_owned())
    }

    /// Records `dependent -> dependency`; `dependency` must already be canonical.
    pub(crate) fn add_dependency(&self, dependent: &str, dependency: &str) {
        let mut graph = self.inner.lock();
        let added = graph
            .dependents
            .entry(dependency.to_owned())
            .or_default()
            .insert(dependent.to_owned());
        if !added {
            return;
        }
        graph
            .dependencies_for
            .entry(dependent.to_owned())
            .or_default()
            .insert(dependency.to_owned());
    }

    /// Whether `dependent` depends on `name`, directly or through other names.
    ///
    /// `canonical` maps each visited name to the key its dependents are stored under.
    pub(crate) fn is_dependent<F>(&self, name: &str, dependent: &str, canonical: F) -> bool
    where
        F: Fn(&str) -> String,
    {
        let graph = self.inner.lock();
        let mut seen = HashSet::new();
        let mut pending = vec![name.to_owned()];

        while let Some(current) = pending.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(dependents) = graph.dependents.get(&canonical(&current)) else {
                continue;
            };
            if dependents.contains(dependent) {
                return true;
            }
            pending.extend(
                dependents
                    .iter()
                    .filter(|transitive| !seen.contains(*transitive))
                    .cloned(),
            );
        }

        false
    }

    pub(crate) fn has_dependents(&self, name: &str) -> bool {
        self.inner.lock().dependents.contains_key(name)
    }

    pub(crate) fn dependents_of(&self, name: &str) -> Vec<String> {
        self.inner
            .lock()
            .dependents
            .get(name)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn dependencies_of(&self, name: &str) -> Vec<String> {
        self.inner
            .lock()
            .dependencies_for
            .get(name)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn contained_in(&self, name: &str) -> Vec<String> {
        self.inner
            .lock()
            .contained
            .get(name)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Removes and returns the dependents recorded for `name`.
    ///
    /// Concurrent destroyers of the same name race on this removal; only one of
    /// them sees the set.
    pub(crate) fn take_dependents(&self, name: &str) -> Option<IndexSet<String>> {
        self.inner.lock().dependents.shift_remove(name)
    }

    pub(crate) fn take_contained(&self, name: &str) -> Option<IndexSet<String>> {
        self.inner.lock().contained.shift_remove(name)
    }

    /// Drops `name` from every dependents set and forgets its own dependencies.
    pub(crate) fn scrub(&self, name: &str) {
        let mut graph = self.inner.lock();
        graph.dependents.retain(|_, dependents| {
            dependents.shift_remove(name);
            !dependents.is_empty()
        });
        graph.dependencies_for.shift_remove(name);
    }

    pub(crate) fn clear(&self) {
        let mut graph = self.inner.lock();
        graph.contained.clear();
        graph.dependents.clear();
        graph.dependencies_for.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        let graph = self.inner.lock();
        graph.contained.is_empty() && graph.dependents.is_empty() && graph.dependencies_for.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str) -> String {
        name.to_owned()
    }

    #[test]
    fn test_add_dependency_records_both_directions() {
        let graph = DependencyGraph::default();
        graph.add_dependency("service", "repository");

        assert_eq!(graph.dependents_of("repository"), vec!["service"]);
        assert_eq!(graph.dependencies_of("service"), vec!["repository"]);
        assert!(graph.has_dependents("repository"));
        assert!(!graph.has_dependents("service"));
    }

    #[test]
    fn test_add_containment_reports_duplicates() {
        let graph = DependencyGraph::default();
        assert!(graph.add_containment("outer", "inner"));
        assert!(!graph.add_containment("outer", "inner"));
        assert_eq!(graph.contained_in("outer"), vec!["inner"]);
    }

    #[test]
    fn test_is_dependent_transitive() {
        let graph = DependencyGraph::default();
        graph.add_dependency("b", "a");
        graph.add_dependency("c", "b");

        assert!(graph.is_dependent("a", "b", identity));
        assert!(graph.is_dependent("a", "c", identity));
        assert!(!graph.is_dependent("c", "a", identity));
    }

    #[test]
    fn test_is_dependent_terminates_on_cycle() {
        let graph = DependencyGraph::default();
        graph.add_dependency("b", "a");
        graph.add_dependency("a", "b");

        assert!(graph.is_dependent("a", "a", identity));
        assert!(!graph.is_dependent("a", "z", identity));
    }

    #[test]
    fn test_is_dependent_canonicalizes_visited_names() {
        let graph = DependencyGraph::default();
        graph.add_dependency("client", "dataSource");

        let via_alias = |name: &str| match name {
            "ds" => "dataSource".to_owned(),
            other => other.to_owned(),
        };
        assert!(graph.is_dependent("ds", "client", via_alias));
    }

    #[test]
    fn test_scrub_removes_name_everywhere() {
        let graph = DependencyGraph::default();
        graph.add_dependency("b", "a");
        graph.add_dependency("c", "a");

        graph.scrub("b");
        assert_eq!(graph.dependents_of("a"), vec!["c"]);
        assert!(graph.dependencies_of("b").is_empty());

        graph.scrub("c");
        assert!(!graph.has_dependents("a"));
    }

    #[test]
    fn test_take_dependents_once() {
        let graph = DependencyGraph::default();
        graph.add_dependency("b", "a");

        assert!(graph.take_dependents("a").is_some());
        assert!(graph.take_dependents("a").is_none());
    }

    #[test]
    fn test_clear() {
        let graph = DependencyGraph::default();
        graph.add_containment("outer", "inner");
        graph.add_dependency("outer", "inner");
        assert!(!graph.is_empty());

        graph.clear();
        assert!(graph.is_empty());
    }
}
