//! Live index: single-flight passes and snapshot publication
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                       StoreIndexer                         │
//! │   index() / index_changed()                                │
//! │        │  (one pass at a time, others coalesce)            │
//! │        ▼                                                   │
//! │   spawn_blocking ──► StoreAnalyzer::analyze(previous)      │
//! │                              │                             │
//! │                              ▼                             │
//! │   ServerState: RwLock<Arc<IndexSnapshot>>  ◄── publish     │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `state` - Published snapshot and pass status
//! - `indexer` - Single-flight pass scheduling

pub mod indexer;
pub mod state;

pub use indexer::{IndexOutcome, IndexRequest, ModuleGraphAnalyzer, StoreAnalyzer, StoreIndexer};
pub use state::{IndexerStatus, ServerState};
