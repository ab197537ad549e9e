//! CLI argument definitions using clap with subcommand architecture
//!
//! The binary is a thin diagnostic shell over the library: every command
//! builds an index or scans a file and prints what the engine sees.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::schema::EntryKind;

/// Static store-module indexer and cursor-context resolver
#[derive(Parser, Debug)]
#[command(name = "vuex-engine")]
#[command(about = "Index Vuex store modules and resolve store symbols at a cursor")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (applies to all commands)
    #[arg(short, long, default_value = "text", value_enum, global = true)]
    pub format: OutputFormat,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, value_name = "PATH", global = true, env = "VUEX_ENGINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================
// Main Commands Enum
// ============================================

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the store index from an entry file
    #[command(visible_alias = "i")]
    Index(IndexArgs),

    /// Show the store context at a cursor position
    #[command(visible_alias = "c")]
    Context(ContextArgs),

    /// Look up a store symbol by name
    #[command(visible_alias = "f")]
    Find(FindArgs),

    /// Resolve the store symbol under a cursor end to end
    #[command(visible_alias = "r")]
    Resolve(ResolveArgs),

    /// Show the effective configuration
    Config,
}

// ============================================
// Shared arguments
// ============================================

/// Store entry and workspace boundary
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Store entry file (the file creating or exporting the root store)
    #[arg(value_name = "ENTRY")]
    pub entry: PathBuf,

    /// Workspace root; resolution never leaves it (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

/// A cursor inside a file
#[derive(Args, Debug, Clone)]
pub struct CursorArgs {
    /// File containing the cursor
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Byte offset of the cursor
    #[arg(long, conflicts_with_all = ["line", "column"])]
    pub offset: Option<usize>,

    /// 1-based line of the cursor
    #[arg(long, requires = "column")]
    pub line: Option<usize>,

    /// 0-based character column of the cursor
    #[arg(long, requires = "line")]
    pub column: Option<usize>,
}

// ============================================
// Subcommand arguments
// ============================================

/// Arguments for the index command
#[derive(Args, Debug)]
pub struct IndexArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// After the full pass, re-index as if these files had changed
    #[arg(long, value_name = "FILE", num_args = 1..)]
    pub changed: Vec<PathBuf>,

    /// Only list entries of this kind
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,
}

/// Arguments for the context command
#[derive(Args, Debug)]
pub struct ContextArgs {
    #[command(flatten)]
    pub cursor: CursorArgs,
}

/// Arguments for the find command
#[derive(Args, Debug)]
pub struct FindArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Symbol name, optionally qualified (`user/SET_NAME`)
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Symbol kind
    #[arg(long, value_enum)]
    pub kind: KindArg,

    /// Explicit namespace (`user/profile`)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Structural path of the module the query is made from
    #[arg(long)]
    pub current: Option<String>,

    /// Prefer the current module over the root
    #[arg(long, requires = "current")]
    pub prefer_local: bool,

    /// Try the root namespace when no namespace applies
    #[arg(long)]
    pub root_fallback: bool,
}

/// Arguments for the resolve command
#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub cursor: CursorArgs,
}

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    #[value(alias = "pretty")]
    Text,
    /// JSON for machine parsing
    Json,
}

/// Store symbol kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    State,
    Getter,
    Mutation,
    Action,
}

impl From<KindArg> for EntryKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::State => EntryKind::State,
            KindArg::Getter => EntryKind::Getter,
            KindArg::Mutation => EntryKind::Mutation,
            KindArg::Action => EntryKind::Action,
        }
    }
}
