//! vuex-engine: static store-module indexer for Vuex projects
//!
//! Starting from a store entry file, the engine follows `modules:` options,
//! imports and `registerModule` calls through the workspace and produces a
//! [`StoreMap`] of every state property, getter, mutation and action with
//! its structural path, runtime namespace and source location. Consumer
//! files are scanned at a cursor to find which store symbol is being
//! referenced, and [`find_item`] resolves it against the published index.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vuex_engine::{
//!     fs_utils::OsFileSystem, find_item, scan_context, AliasMap, HelperNames, LookupQuery,
//!     ModuleGraphAnalyzer, PathResolver, StoreIndexer,
//! };
//!
//! let resolver = Arc::new(PathResolver::new(root, AliasMap::default(), Arc::new(OsFileSystem)));
//! let indexer = StoreIndexer::new(ModuleGraphAnalyzer::new(entry, resolver));
//! indexer.index().await;
//!
//! let snapshot = indexer.snapshot();
//! let helpers = HelperNames::discover(&text);
//! if let Some(context) = scan_context(&text, cursor, &helpers) {
//!     let query = LookupQuery::from_context(&context, "SET_NAME", None, false);
//!     let entry = find_item(&snapshot.store, &query);
//! }
//! ```

pub mod alias;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod fs_utils;
pub mod indexing;
pub mod lang;
pub mod lookup;
pub mod parsing;
pub mod paths;
pub mod schema;
pub mod server;

// Re-export commonly used types
pub use alias::AliasMap;
pub use cli::{Cli, OutputFormat};
pub use config::EngineConfig;
pub use context::{
    scan_context, ContextDescriptor, ContextScanner, HelperNames, Invocation,
};
pub use error::{EngineError, Result};
pub use indexing::{IncrementalReindexer, IndexSnapshot};
pub use lang::Lang;
pub use lookup::{detect_root_option, find_item, LookupQuery};
pub use paths::PathResolver;
pub use schema::{Entry, EntryKind, Location, ModulePath, StoreMap};
pub use server::{IndexOutcome, IndexRequest, ModuleGraphAnalyzer, ServerState, StoreIndexer};
