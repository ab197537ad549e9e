//! Dependency-scoped re-indexing
//!
//! An incremental pass walks the module tree from the entry file exactly like
//! a full pass. Whenever it is about to visit a file outside the affected set
//! (changed files and their transitive dependents), and the previous
//! snapshot holds a visit with the same key, that visit subtree is carried
//! over without reading the file. Everything else is parsed fresh, so
//! entries from affected files are replaced and removed declarations leave
//! nothing behind.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::{EngineError, Result};
use crate::extract::{build_store, ParseContext};
use crate::fs_utils::canonical_or_same;
use crate::paths::PathResolver;

use super::builder::{IndexSnapshot, ModuleVisit, RegistrationScan, VisitKey};

/// What an incremental pass may reuse from the previous snapshot
pub struct ReindexPlan<'p> {
    affected: BTreeSet<PathBuf>,
    visits: HashMap<&'p VisitKey, &'p ModuleVisit>,
    registrations: HashMap<&'p Path, &'p RegistrationScan>,
}

impl<'p> ReindexPlan<'p> {
    pub fn new(previous: &'p IndexSnapshot, changed: &[PathBuf]) -> Self {
        // a file the previous pass never saw may satisfy a reference that
        // failed to resolve
        let appeared = changed.iter().any(|file| !previous.knows_file(file));
        let unresolved = if appeared {
            previous.unresolved_files()
        } else {
            BTreeSet::new()
        };
        let affected = previous.affected_files(changed.iter().chain(unresolved.iter()));

        let mut visits = HashMap::new();
        for visit in previous.visits() {
            visits.entry(&visit.key).or_insert(visit);
        }
        let registrations = previous
            .registrations
            .iter()
            .map(|scan| (scan.file.as_path(), scan))
            .collect();

        Self {
            affected,
            visits,
            registrations,
        }
    }

    pub fn affected(&self) -> &BTreeSet<PathBuf> {
        &self.affected
    }

    pub fn is_affected(&self, file: &Path) -> bool {
        self.affected.contains(file)
    }

    /// Previous visit with the same key, if it can stand in for a fresh one.
    ///
    /// The visit file must be unaffected, no file of the subtree may be
    /// currently active, and every file the subtree skipped as a cycle must
    /// still be active or be one of the subtree's own files.
    pub fn reusable_visit(&self, key: &VisitKey, active: &[PathBuf]) -> Option<&'p ModuleVisit> {
        if self.is_affected(&key.file) {
            return None;
        }
        let visit = *self.visits.get(key)?;

        let active: HashSet<&PathBuf> = active.iter().collect();
        let subtree = visit.walk();
        let files: HashSet<&PathBuf> = subtree.iter().map(|v| &v.key.file).collect();
        let reaches_active = files.iter().any(|file| active.contains(file));
        // skips inside the subtree point at its own ancestors
        let cycles_hold = subtree
            .iter()
            .flat_map(|v| v.cycle_skips.iter())
            .all(|skipped| active.contains(skipped) || files.contains(skipped));

        (!reaches_active && cycles_hold).then_some(visit)
    }

    /// Previous `registerModule` scan of an unaffected file
    pub fn reusable_registrations(&self, file: &Path) -> Option<&'p RegistrationScan> {
        if self.is_affected(file) {
            return None;
        }
        self.registrations.get(file).copied()
    }
}

/// Rebuilds only what a change set touches
pub struct IncrementalReindexer<'r> {
    resolver: &'r PathResolver,
    max_file_size: u64,
}

impl<'r> IncrementalReindexer<'r> {
    pub fn new(resolver: &'r PathResolver, max_file_size: u64) -> Self {
        Self {
            resolver,
            max_file_size,
        }
    }

    /// Full pass from `entry`
    pub fn full(&self, entry: &Path) -> IndexSnapshot {
        self.resolver.clear_cache();
        let entry = canonical_or_same(self.resolver.file_system().as_ref(), entry);
        let ctx = ParseContext::new(self.resolver, self.max_file_size);
        let snapshot = build_store(&entry, &ctx);

        tracing::info!(
            "[INDEX] Full pass: {} entries, {} files parsed, {} edges",
            snapshot.store.len(),
            snapshot.stats.files_parsed,
            snapshot.graph.len()
        );
        snapshot
    }

    /// Re-index after `changed` files were modified, added or removed.
    ///
    /// # Errors
    ///
    /// `IndexFailure` when `previous` was never built from an entry file.
    pub fn reindex(&self, previous: &IndexSnapshot, changed: &[PathBuf]) -> Result<IndexSnapshot> {
        let Some(entry) = previous.entry.as_deref() else {
            return Err(EngineError::IndexFailure {
                message: "incremental pass requested before any full pass".to_string(),
            });
        };

        // changed files may have appeared or vanished
        self.resolver.clear_cache();

        let changed: Vec<PathBuf> = changed
            .iter()
            .map(|file| canonical_or_same(self.resolver.file_system().as_ref(), file))
            .collect();
        let plan = ReindexPlan::new(previous, &changed);
        let ctx = ParseContext::new(self.resolver, self.max_file_size).with_plan(&plan);
        let snapshot = build_store(entry, &ctx);

        tracing::info!(
            "[INDEX] Incremental pass: {} changed, {} affected, {} files parsed, {} visits reused",
            changed.len(),
            plan.affected().len(),
            snapshot.stats.files_parsed,
            snapshot.stats.visits_reused
        );
        Ok(snapshot)
    }

    /// Files a change set would revisit
    pub fn affected_files(&self, previous: &IndexSnapshot, changed: &[PathBuf]) -> BTreeSet<PathBuf> {
        let changed: Vec<PathBuf> = changed
            .iter()
            .map(|file| canonical_or_same(self.resolver.file_system().as_ref(), file))
            .collect();
        previous.affected_files(&changed)
    }
}
