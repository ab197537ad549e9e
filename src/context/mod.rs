//! Cursor-context scanning for consumer files
//!
//! The scanner works on raw editor text, never on the index: it decides what
//! kind of symbol the cursor refers to, and the lookup module then resolves
//! that against the published store map.

pub mod aliases;
pub mod scanner;
pub mod tokenizer;

pub use aliases::{HelperBinding, HelperNames};
pub use scanner::{
    scan_context, scan_context_with, ContextDescriptor, ContextScanner, Invocation, ScannerStats,
    DEFAULT_LOOKBACK, DEFAULT_MEMO_CAPACITY,
};
