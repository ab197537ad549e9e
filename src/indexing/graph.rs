//! File dependency graph
//!
//! Edges point from a referencing file to the file it statically references.
//! The reverse graph answers "what has to be revisited when this file
//! changes".

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

/// Directed `file -> {referenced files}` graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    edges: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, from: &Path, to: &Path) {
        self.edges
            .entry(from.to_path_buf())
            .or_default()
            .insert(to.to_path_buf());
    }

    /// Files `file` references directly
    pub fn dependencies(&self, file: &Path) -> impl Iterator<Item = &PathBuf> {
        self.edges.get(file).into_iter().flatten()
    }

    /// Files that reference `file` directly
    pub fn dependents(&self, file: &Path) -> BTreeSet<PathBuf> {
        self.edges
            .iter()
            .filter(|(_, targets)| targets.contains(file))
            .map(|(from, _)| from.clone())
            .collect()
    }

    /// The reversed graph: `file -> {files referencing it}`
    pub fn reverse(&self) -> BTreeMap<PathBuf, BTreeSet<PathBuf>> {
        let mut reversed: BTreeMap<PathBuf, BTreeSet<PathBuf>> = BTreeMap::new();
        for (from, targets) in &self.edges {
            for to in targets {
                reversed.entry(to.clone()).or_default().insert(from.clone());
            }
        }
        reversed
    }

    /// Changed files plus every file that transitively depends on one of them
    pub fn affected_files<'p, I>(&self, changed: I) -> BTreeSet<PathBuf>
    where
        I: IntoIterator<Item = &'p PathBuf>,
    {
        let reversed = self.reverse();
        let mut affected = BTreeSet::new();
        let mut queue: VecDeque<PathBuf> = VecDeque::new();

        for file in changed {
            if affected.insert(file.clone()) {
                queue.push_back(file.clone());
            }
        }

        while let Some(file) = queue.pop_front() {
            if let Some(dependents) = reversed.get(&file) {
                for dependent in dependents {
                    if affected.insert(dependent.clone()) {
                        queue.push_back(dependent.clone());
                    }
                }
            }
        }

        affected
    }

    /// Every file appearing on either end of an edge
    pub fn files(&self) -> BTreeSet<&PathBuf> {
        self.edges
            .iter()
            .flat_map(|(from, targets)| std::iter::once(from).chain(targets.iter()))
            .collect()
    }

    /// Number of edges
    pub fn len(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &PathBuf)> {
        self.edges
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(move |to| (from, to)))
    }
}
