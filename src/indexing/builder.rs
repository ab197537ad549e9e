//! Module visits, the pass accumulator, and the published snapshot
//!
//! A pass produces a tree of [`ModuleVisit`]s: one per traversal step into a
//! module file. The [`StoreMap`] and the [`DependencyGraph`] are projections
//! of that tree, which is what lets an incremental pass reuse whole subtrees.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::parsing::ExportName;
use crate::schema::{Entry, ModulePath, StoreMap};

use super::graph::DependencyGraph;

/// `referencing file -> referenced file`
pub type Edge = (PathBuf, PathBuf);

/// How the module object is located inside its file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VisitTarget {
    /// Store constructor argument or default export of the entry file
    Root,
    /// An export of a module file
    Export(ExportName),
    /// Inline module object passed to `registerModule` on this line
    Registered { line: usize },
}

/// Structural position of a module
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ModuleFrame {
    pub path: ModulePath,
    /// Runtime namespace of the parent module
    pub runtime_base: ModulePath,
}

impl ModuleFrame {
    pub fn root() -> Self {
        Self::default()
    }
}

/// Identity of a visit; equal keys over equal inputs give equal visits
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VisitKey {
    pub file: PathBuf,
    pub path: ModulePath,
    pub runtime_base: ModulePath,
    pub target: VisitTarget,
}

/// Everything one traversal step into a file produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleVisit {
    pub key: VisitKey,
    /// Entries of the module and of its inline sub-modules
    pub entries: Vec<Entry>,
    pub edges: Vec<Edge>,
    /// Files of this visit holding a reference that resolved to nothing
    pub unresolved: Vec<PathBuf>,
    /// Files skipped because they were already being visited
    pub cycle_skips: Vec<PathBuf>,
    /// Runtime namespace of the module and of its inline sub-modules
    pub namespaces: Vec<(ModulePath, ModulePath)>,
    pub children: Vec<ModuleVisit>,
}

impl ModuleVisit {
    pub fn new(key: VisitKey) -> Self {
        Self {
            key,
            entries: Vec::new(),
            edges: Vec::new(),
            unresolved: Vec::new(),
            cycle_skips: Vec::new(),
            namespaces: Vec::new(),
            children: Vec::new(),
        }
    }

    /// This visit and all its descendants, pre-order
    pub fn walk(&self) -> Vec<&ModuleVisit> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(visit) = stack.pop() {
            out.push(visit);
            stack.extend(visit.children.iter().rev());
        }
        out
    }

    pub fn entry_count(&self) -> usize {
        self.walk().iter().map(|v| v.entries.len()).sum()
    }
}

/// Result of scanning one file for `registerModule` calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationScan {
    pub file: PathBuf,
    pub visits: Vec<ModuleVisit>,
    /// Edges recorded while resolving calls that produced no visit
    pub edges: Vec<Edge>,
    pub unresolved: Vec<PathBuf>,
}

/// Per-pass accumulator threaded through the module traversal.
///
/// Tracks the files currently being visited (for cycle detection) and every
/// module file reached, in first-visit order.
#[derive(Debug, Default)]
pub struct StoreBuilder {
    active: Vec<PathBuf>,
    module_files: Vec<PathBuf>,
    seen_files: HashSet<PathBuf>,
    namespaces: HashMap<ModulePath, ModulePath>,
    reused_visits: usize,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, file: &Path) -> bool {
        self.active.iter().any(|active| active == file)
    }

    pub fn active(&self) -> &[PathBuf] {
        &self.active
    }

    pub fn enter(&mut self, file: &Path) {
        self.active.push(file.to_path_buf());
        self.note_file(file);
    }

    pub fn leave(&mut self, file: &Path) {
        if let Some(position) = self.active.iter().rposition(|active| active == file) {
            self.active.remove(position);
        }
    }

    /// Account for a visit subtree carried over from a previous pass
    pub fn note_reused(&mut self, visit: &ModuleVisit) {
        for descendant in visit.walk() {
            self.note_file(&descendant.key.file);
            for (path, namespace) in &descendant.namespaces {
                self.note_namespace(path, namespace);
            }
            self.reused_visits += 1;
        }
    }

    /// Record the runtime namespace a module built so far resolved to
    pub fn note_namespace(&mut self, path: &ModulePath, namespace: &ModulePath) {
        self.namespaces.insert(path.clone(), namespace.clone());
    }

    pub fn runtime_namespace(&self, path: &ModulePath) -> Option<&ModulePath> {
        self.namespaces.get(path)
    }

    /// Runtime base of a module registered at `path`: the runtime namespace
    /// of its parent module, root when the parent was never built
    pub fn registration_base(&self, path: &ModulePath) -> ModulePath {
        self.runtime_namespace(&path.parent())
            .cloned()
            .unwrap_or_default()
    }

    fn note_file(&mut self, file: &Path) {
        if self.seen_files.insert(file.to_path_buf()) {
            self.module_files.push(file.to_path_buf());
        }
    }

    /// Module files reached so far, first-visit order
    pub fn module_files(&self) -> &[PathBuf] {
        &self.module_files
    }

    pub fn reused_visits(&self) -> usize {
        self.reused_visits
    }
}

/// Counters describing how a snapshot was built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Files read and parsed during the pass
    pub files_parsed: usize,
    /// Visits carried over from the previous snapshot
    pub visits_reused: usize,
}

/// Immutable result of one index pass
#[derive(Debug, Clone, Default)]
pub struct IndexSnapshot {
    /// Canonical entry file, `None` before the first pass
    pub entry: Option<PathBuf>,
    pub store: StoreMap,
    pub graph: DependencyGraph,
    pub root: Option<ModuleVisit>,
    pub registrations: Vec<RegistrationScan>,
    /// Assigned on publication; 0 means never published
    pub generation: u64,
    pub stats: PassStats,
}

impl IndexSnapshot {
    /// Snapshot published before any pass
    pub fn empty() -> Self {
        Self::default()
    }

    /// Project the visit tree into a store map and a dependency graph
    pub fn from_visits(
        entry: &Path,
        root: Option<ModuleVisit>,
        registrations: Vec<RegistrationScan>,
        stats: PassStats,
    ) -> Self {
        let mut store = StoreMap::new();
        let mut graph = DependencyGraph::new();

        let registered = registrations.iter().flat_map(|scan| scan.visits.iter());
        for top in root.iter().chain(registered) {
            for visit in top.walk() {
                for entry in &visit.entries {
                    store.push(entry.clone());
                }
                for (from, to) in &visit.edges {
                    graph.add_edge(from, to);
                }
            }
        }
        for scan in &registrations {
            for (from, to) in &scan.edges {
                graph.add_edge(from, to);
            }
        }

        Self {
            entry: Some(entry.to_path_buf()),
            store,
            graph,
            root,
            registrations,
            generation: 0,
            stats,
        }
    }

    /// All visits, root tree first, then registered modules; pre-order
    pub fn visits(&self) -> Vec<&ModuleVisit> {
        self.root
            .iter()
            .chain(self.registrations.iter().flat_map(|scan| scan.visits.iter()))
            .flat_map(|top| top.walk())
            .collect()
    }

    /// Structural module path of the module declared in `file`.
    ///
    /// The first visit into the file wins; a file that only contributes
    /// entries (an imported section) maps to the path of its first entry.
    pub fn namespace_for_file(&self, file: &Path) -> Option<ModulePath> {
        if let Some(visit) = self
            .visits()
            .into_iter()
            .find(|visit| visit.key.file == file && matches!(visit.key.target, VisitTarget::Export(_)))
        {
            return Some(visit.key.path.clone());
        }
        if self.entry.as_deref() == Some(file) {
            return Some(ModulePath::root());
        }
        self.store
            .iter()
            .find(|entry| entry.location.file == file)
            .map(|entry| entry.module_path.clone())
    }

    /// Files holding a reference that resolved to nothing during the pass
    pub fn unresolved_files(&self) -> BTreeSet<PathBuf> {
        let scans = self.registrations.iter().flat_map(|scan| scan.unresolved.iter());
        self.visits()
            .into_iter()
            .flat_map(|visit| visit.unresolved.iter())
            .chain(scans)
            .cloned()
            .collect()
    }

    /// Whether the pass read `file` or recorded a reference to it
    pub fn knows_file(&self, file: &Path) -> bool {
        self.graph.files().iter().any(|known| known.as_path() == file)
            || self.visits().iter().any(|visit| visit.key.file == file)
            || self.registrations.iter().any(|scan| scan.file == file)
    }

    /// Changed files plus their transitive dependents in this snapshot
    pub fn affected_files<'p, I>(&self, changed: I) -> BTreeSet<PathBuf>
    where
        I: IntoIterator<Item = &'p PathBuf>,
    {
        self.graph.affected_files(changed)
    }
}
