//! Command modules for the vuex-engine CLI
//!
//! Each command module implements a single top-level command:
//! - `index` - Build (and optionally re-index) the store
//! - `context` - Cursor context in a consumer file
//! - `find` - Symbol lookup by name
//! - `resolve` - Cursor context + lookup against a freshly built index
//!
//! All command handlers take their `Args` struct from `cli.rs` and a shared
//! `CommandContext`, and return the text to print.

pub mod context;
pub mod find;
pub mod index;
pub mod resolve;

pub use context::run_context;
pub use find::run_find;
pub use index::run_index;
pub use resolve::run_resolve;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::cli::{CursorArgs, OutputFormat, StoreArgs};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::fs_utils::OsFileSystem;
use crate::indexing::IndexSnapshot;
use crate::paths::PathResolver;
use crate::schema::Entry;
use crate::server::{ModuleGraphAnalyzer, StoreIndexer};

/// Shared context passed to all command handlers
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Output format (text or json)
    pub format: OutputFormat,
    /// Show verbose output
    pub verbose: bool,
    pub config: EngineConfig,
}

impl CommandContext {
    pub fn new(format: OutputFormat, verbose: bool, config: EngineConfig) -> Self {
        Self {
            format,
            verbose,
            config,
        }
    }
}

/// Show the effective configuration
pub fn run_config(ctx: &CommandContext) -> Result<String> {
    match ctx.format {
        OutputFormat::Json => to_json(&ctx.config),
        OutputFormat::Text => Ok(format!(
            "# {}\n{}",
            EngineConfig::default_path().display(),
            ctx.config.display()
        )),
    }
}

/// An indexer over one workspace, with the runtime that drives it
pub struct Workspace {
    runtime: tokio::runtime::Runtime,
    indexer: StoreIndexer<ModuleGraphAnalyzer>,
}

impl Workspace {
    pub fn open(store: &StoreArgs, config: &EngineConfig) -> Result<Self> {
        let root = match &store.root {
            Some(root) => root.clone(),
            None => std::env::current_dir()?,
        };
        if !store.entry.is_file() {
            return Err(EngineError::FileNotFound {
                path: store.entry.display().to_string(),
            });
        }

        let aliases = config.alias_map(&root);
        let resolver = Arc::new(PathResolver::new(&root, aliases, Arc::new(OsFileSystem)));
        let analyzer = ModuleGraphAnalyzer::new(store.entry.clone(), resolver)
            .with_max_file_size(config.index.max_file_size);

        let runtime = tokio::runtime::Runtime::new().map_err(|e| EngineError::IndexFailure {
            message: format!("Failed to create tokio runtime: {}", e),
        })?;

        Ok(Self {
            runtime,
            indexer: StoreIndexer::new(analyzer),
        })
    }

    /// Run a full pass and return the published snapshot
    pub fn index(&self) -> Result<Arc<IndexSnapshot>> {
        self.runtime.block_on(self.indexer.index());
        self.published()
    }

    /// Run an incremental pass for `changed`
    pub fn index_changed(&self, changed: &[PathBuf]) -> Result<Arc<IndexSnapshot>> {
        self.runtime
            .block_on(self.indexer.index_changed(changed.iter().cloned()));
        self.published()
    }

    fn published(&self) -> Result<Arc<IndexSnapshot>> {
        let state = self.indexer.state();
        if let Some(message) = state.status().last_error {
            return Err(EngineError::IndexFailure { message });
        }
        Ok(state.snapshot())
    }

    pub fn workspace_root(&self) -> &Path {
        self.indexer.analyzer().resolver().workspace_root()
    }

    pub fn canonical(&self, path: &Path) -> PathBuf {
        let fs = self.indexer.analyzer().resolver().file_system();
        crate::fs_utils::canonical_or_same(fs.as_ref(), path)
    }
}

/// Byte offset of the cursor described by `args` in `text`
pub fn cursor_offset(args: &CursorArgs, text: &str) -> Result<usize> {
    if let Some(offset) = args.offset {
        return Ok(offset.min(text.len()));
    }
    let (Some(line), Some(column)) = (args.line, args.column) else {
        return Err(EngineError::ConfigError {
            message: "a cursor needs --offset or --line and --column".to_string(),
        });
    };

    let mut line_start = 0;
    for (index, content) in text.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            let within = content
                .char_indices()
                .nth(column)
                .map(|(i, _)| i)
                .unwrap_or(content.trim_end_matches('\n').len());
            return Ok(line_start + within);
        }
        line_start += content.len();
    }
    Ok(text.len())
}

/// Pretty JSON, mapping serialization failures into the engine error
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map(|json| json + "\n")
        .map_err(|e| EngineError::IndexFailure {
            message: format!("JSON serialization failed: {}", e),
        })
}

/// `kind  key  file:line:column` with the file relative to `root`
pub fn format_entry(entry: &Entry, root: &Path) -> String {
    let file = entry
        .location
        .file
        .strip_prefix(root)
        .unwrap_or(&entry.location.file);
    let mut line = format!(
        "  {:<8} {:<32} {}:{}:{}",
        entry.kind.to_string(),
        entry.runtime_key(),
        file.display(),
        entry.location.line,
        entry.location.column
    );
    if let Some(display_type) = &entry.display_type {
        line.push_str(&format!(" : {}", display_type));
    }
    line
}
