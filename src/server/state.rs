//! Thread-safe published index state
//!
//! Queries read the last published [`IndexSnapshot`] through an `Arc`, so a
//! reader holds the lock only long enough to clone the pointer. Publication
//! swaps the `Arc` under a short write lock; nobody observes a half-built
//! store.
//!
//! # Locking Order
//!
//! 1. `ServerState::snapshot` (RwLock)
//! 2. `ServerState::status` (Mutex)
//!
//! Index passes never run while either lock is held.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use crate::indexing::IndexSnapshot;
use crate::schema::ModulePath;

/// Bookkeeping about the passes that produced the published snapshot
#[derive(Debug, Clone)]
pub struct IndexerStatus {
    /// Analyzer invocations so far, successful or not
    pub passes: u64,
    /// Passes that failed and left the previous snapshot in place
    pub failed_passes: u64,
    pub last_error: Option<String>,
    pub last_published: Option<Instant>,
    /// Wall time of the last successful pass
    pub last_duration: Option<Duration>,
}

impl IndexerStatus {
    fn new() -> Self {
        Self {
            passes: 0,
            failed_passes: 0,
            last_error: None,
            last_published: None,
            last_duration: None,
        }
    }
}

/// Published snapshot plus pass status, shared between the indexer and
/// query handlers
#[derive(Clone)]
pub struct ServerState {
    /// LOCKING ORDER: Always acquire this lock first.
    snapshot: Arc<RwLock<Arc<IndexSnapshot>>>,

    /// LOCKING ORDER: Acquire last.
    status: Arc<Mutex<IndexerStatus>>,
}

impl ServerState {
    /// State holding the empty, never-published snapshot
    pub fn new() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(Arc::new(IndexSnapshot::empty()))),
            status: Arc::new(Mutex::new(IndexerStatus::new())),
        }
    }

    // ========================================================================
    // Read Operations (concurrent access)
    // ========================================================================

    /// The last published snapshot
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Read the published snapshot with a closure
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&IndexSnapshot) -> R,
    {
        let snapshot = self.snapshot();
        f(&snapshot)
    }

    /// Generation of the published snapshot; 0 before the first publication
    pub fn generation(&self) -> u64 {
        self.snapshot.read().generation
    }

    /// Structural module path of the module declared in `file`
    pub fn namespace_for_file(&self, file: &std::path::Path) -> Option<ModulePath> {
        self.read(|snapshot| snapshot.namespace_for_file(file))
    }

    /// Entry file of the published snapshot
    pub fn entry(&self) -> Option<PathBuf> {
        self.read(|snapshot| snapshot.entry.clone())
    }

    // ========================================================================
    // Write Operations (exclusive access)
    // ========================================================================

    /// Swap in a freshly built snapshot, assigning it the next generation.
    ///
    /// Returns the generation assigned.
    pub fn publish(&self, mut snapshot: IndexSnapshot, duration: Duration) -> u64 {
        let generation = {
            let mut guard = self.snapshot.write();
            snapshot.generation = guard.generation + 1;
            let generation = snapshot.generation;
            *guard = Arc::new(snapshot);
            generation
        };

        let mut status = self.status.lock();
        status.passes += 1;
        status.last_error = None;
        status.last_published = Some(Instant::now());
        status.last_duration = Some(duration);
        generation
    }

    /// Record a failed pass; the published snapshot is left untouched
    pub fn record_failure(&self, message: String) {
        let mut status = self.status.lock();
        status.passes += 1;
        status.failed_passes += 1;
        status.last_error = Some(message);
    }

    // ========================================================================
    // Status Operations
    // ========================================================================

    /// Copy of the current pass status
    pub fn status(&self) -> IndexerStatus {
        self.status.lock().clone()
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("ServerState")
            .field("generation", &snapshot.generation)
            .field("entries", &snapshot.store.len())
            .field("passes", &self.status().passes)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
