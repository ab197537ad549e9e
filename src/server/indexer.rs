//! Single-flight asynchronous indexing
//!
//! At most one pass runs at a time. A request arriving while a pass runs is
//! folded into one pending request (a full request absorbs changed-file
//! requests, changed-file sets are unioned) and returns
//! [`IndexOutcome::Coalesced`] immediately. The caller that started the
//! running pass drains the pending request before returning, so every
//! request is served by a pass that starts after it was made.
//!
//! Passes run on tokio's blocking pool. A failed pass is logged and the
//! previous snapshot stays published.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::error::{EngineError, Result};
use crate::fs_utils::canonical_or_same;
use crate::indexing::{IncrementalReindexer, IndexSnapshot};
use crate::parsing::DEFAULT_MAX_FILE_SIZE;
use crate::paths::PathResolver;

use super::state::ServerState;

/// What a pass should rebuild
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexRequest {
    /// Rebuild everything from the entry file
    Full,
    /// Rebuild what these files (and their dependents) affect
    Changed(BTreeSet<PathBuf>),
}

impl IndexRequest {
    /// Fold a later request into this one
    pub fn merge(self, later: IndexRequest) -> IndexRequest {
        match (self, later) {
            (IndexRequest::Changed(mut files), IndexRequest::Changed(more)) => {
                files.extend(more);
                IndexRequest::Changed(files)
            }
            _ => IndexRequest::Full,
        }
    }
}

/// Result of an `index*` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// This call ran `passes` analyzer passes (its own plus drained requests)
    Completed { passes: usize },
    /// A pass was already running; the request was queued for it
    Coalesced,
}

/// Produces a snapshot from the previously published one
pub trait StoreAnalyzer: Send + Sync + 'static {
    /// Build a new snapshot.
    ///
    /// Called on the blocking pool, never concurrently with itself.
    fn analyze(&self, previous: &IndexSnapshot, request: &IndexRequest) -> Result<IndexSnapshot>;
}

/// The module graph analyzer rooted at a fixed entry file
pub struct ModuleGraphAnalyzer {
    entry: PathBuf,
    resolver: Arc<PathResolver>,
    max_file_size: u64,
}

impl ModuleGraphAnalyzer {
    pub fn new(entry: PathBuf, resolver: Arc<PathResolver>) -> Self {
        Self {
            entry,
            resolver,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn entry(&self) -> &Path {
        &self.entry
    }

    pub fn resolver(&self) -> &Arc<PathResolver> {
        &self.resolver
    }
}

impl StoreAnalyzer for ModuleGraphAnalyzer {
    fn analyze(&self, previous: &IndexSnapshot, request: &IndexRequest) -> Result<IndexSnapshot> {
        let fs = self.resolver.file_system();
        if !fs.is_file(&self.entry) {
            return Err(EngineError::FileNotFound {
                path: self.entry.display().to_string(),
            });
        }

        let reindexer = IncrementalReindexer::new(&self.resolver, self.max_file_size);
        let entry = canonical_or_same(fs.as_ref(), &self.entry);

        match request {
            IndexRequest::Changed(files) if previous.entry.as_deref() == Some(entry.as_path()) => {
                let files: Vec<PathBuf> = files.iter().cloned().collect();
                reindexer.reindex(previous, &files)
            }
            // never built, or built from another entry
            _ => Ok(reindexer.full(&entry)),
        }
    }
}

#[derive(Debug, Default)]
struct FlightState {
    running: bool,
    pending: Option<IndexRequest>,
}

/// Clears the running flag if the driving future is dropped mid-pass
struct FlightGuard<'f> {
    flight: &'f Mutex<FlightState>,
    armed: bool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.flight.lock().running = false;
        }
    }
}

/// Single-flight indexer publishing into a [`ServerState`]
pub struct StoreIndexer<A: StoreAnalyzer> {
    analyzer: Arc<A>,
    state: ServerState,
    flight: Arc<Mutex<FlightState>>,
}

impl<A: StoreAnalyzer> Clone for StoreIndexer<A> {
    fn clone(&self) -> Self {
        Self {
            analyzer: Arc::clone(&self.analyzer),
            state: self.state.clone(),
            flight: Arc::clone(&self.flight),
        }
    }
}

impl<A: StoreAnalyzer> StoreIndexer<A> {
    pub fn new(analyzer: A) -> Self {
        Self::with_state(analyzer, ServerState::new())
    }

    pub fn with_state(analyzer: A, state: ServerState) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            state,
            flight: Arc::new(Mutex::new(FlightState::default())),
        }
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    /// The last published snapshot
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.state.snapshot()
    }

    /// Request a full pass
    pub async fn index(&self) -> IndexOutcome {
        self.submit(IndexRequest::Full).await
    }

    /// Request an incremental pass for `files`
    pub async fn index_changed<I>(&self, files: I) -> IndexOutcome
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.submit(IndexRequest::Changed(files.into_iter().collect()))
            .await
    }

    async fn submit(&self, request: IndexRequest) -> IndexOutcome {
        {
            let mut flight = self.flight.lock();
            if flight.running {
                let merged = match flight.pending.take() {
                    Some(pending) => pending.merge(request),
                    None => request,
                };
                tracing::debug!("[INDEX] Pass running, request coalesced: {:?}", merged);
                flight.pending = Some(merged);
                return IndexOutcome::Coalesced;
            }
            flight.running = true;
        }

        let mut guard = FlightGuard {
            flight: &self.flight,
            armed: true,
        };
        let mut request = request;
        let mut passes = 0;
        loop {
            self.run_pass(request).await;
            passes += 1;

            let mut flight = self.flight.lock();
            match flight.pending.take() {
                Some(next) => request = next,
                None => {
                    flight.running = false;
                    guard.armed = false;
                    break;
                }
            }
        }

        IndexOutcome::Completed { passes }
    }

    async fn run_pass(&self, request: IndexRequest) {
        let previous = self.state.snapshot();
        let analyzer = Arc::clone(&self.analyzer);
        let started = Instant::now();

        let result =
            tokio::task::spawn_blocking(move || analyzer.analyze(&previous, &request)).await;

        match result {
            Ok(Ok(snapshot)) => {
                let entries = snapshot.store.len();
                let generation = self.state.publish(snapshot, started.elapsed());
                tracing::info!(
                    "[INDEX] Published generation {} ({} entries) in {:?}",
                    generation,
                    entries,
                    started.elapsed()
                );
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    "[INDEX] Pass failed, keeping generation {}: {}",
                    self.state.generation(),
                    e
                );
                self.state.record_failure(e.to_string());
            }
            Err(e) => {
                tracing::warn!("[INDEX] Pass aborted: {}", e);
                self.state.record_failure(e.to_string());
            }
        }
    }
}
