//! Unified parsing module for store source files.
//!
//! Every file the module graph parser visits goes through [`load_program`]:
//! 1. The size ceiling is checked before reading
//! 2. The content is decoded and the language detected from the extension
//! 3. `.vue` files are reduced to their `<script>` block
//! 4. tree-sitter parses the source; a tree containing errors is rejected
//! 5. The CST is lowered to the tagged model in [`ast`]
//!
//! # Example
//!
//! ```ignore
//! use vuex_engine::parsing::parse_source;
//! use vuex_engine::Lang;
//! use std::path::Path;
//!
//! let program = parse_source(Path::new("store.js"), "export default { state: {} }", Lang::JavaScript)?;
//! assert!(program.default_export.is_some());
//! ```

pub mod ast;
pub mod common;
mod lower;

use std::io;
use std::path::Path;

use crate::error::{EngineError, Result};
use crate::fs_utils::FileSystem;
use crate::lang::{extract_sfc_script, Lang};

pub use ast::{
    Bindings, CallSite, ExportName, Expr, Function, ImportName, ImportRef, ObjectLit, Position,
    Program, PropKey, Property,
};

/// Files larger than this are not parsed (5 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Read, parse and lower one file.
///
/// # Errors
///
/// - `FileNotFound` / `Io` when the file cannot be read
/// - `OversizedFile` when it exceeds `max_file_size`
/// - `UnsupportedLanguage` for non-script extensions
/// - `ParseFailure` for invalid UTF-8 or syntax errors
pub fn load_program(fs: &dyn FileSystem, path: &Path, max_file_size: u64) -> Result<Program> {
    let len = fs.len(path).map_err(|e| not_found_or_io(e, path))?;
    if len > max_file_size {
        return Err(EngineError::OversizedFile {
            path: path.to_path_buf(),
            limit: max_file_size,
        });
    }

    let lang = Lang::from_path(path)?;
    let bytes = fs.read(path).map_err(|e| not_found_or_io(e, path))?;
    let source = String::from_utf8(bytes).map_err(|_| EngineError::ParseFailure {
        message: format!("{} is not valid UTF-8", path.display()),
    })?;

    parse_source(path, &source, lang)
}

/// Parse in-memory source for a file of the given language.
///
/// A `.vue` file without a script block yields an empty program. JSON
/// documents become a program whose default export is the document.
pub fn parse_source(path: &Path, source: &str, lang: Lang) -> Result<Program> {
    match lang {
        Lang::Vue => match extract_sfc_script(source) {
            Some(script) => parse_script(path, &script.content, script.lang, script.line_offset),
            None => Ok(Program {
                path: path.to_path_buf(),
                ..Default::default()
            }),
        },
        Lang::Json => {
            let wrapped = format!("({}\n)", source);
            let tree = parse_tree(path, &wrapped, Lang::JavaScript)?;
            Ok(lower::Lowerer::new(&wrapped, 0, 1).lower_program(tree.root_node(), path, true))
        }
        _ => parse_script(path, source, lang, 0),
    }
}

/// Parse a script whose first line is line `line_offset + 1` of `path`
pub fn parse_script(path: &Path, source: &str, lang: Lang, line_offset: usize) -> Result<Program> {
    let tree = parse_tree(path, source, lang)?;
    Ok(lower::Lowerer::new(source, line_offset, 0).lower_program(tree.root_node(), path, false))
}

fn parse_tree(path: &Path, source: &str, lang: Lang) -> Result<tree_sitter::Tree> {
    let language = lang
        .tree_sitter_language()
        .ok_or_else(|| EngineError::UnsupportedLanguage {
            extension: lang.name().to_string(),
        })?;

    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| EngineError::ParseFailure {
            message: format!("Failed to set language for {}: {:?}", path.display(), e),
        })?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| EngineError::ParseFailure {
            message: format!("Failed to parse file: {}", path.display()),
        })?;

    if tree.root_node().has_error() {
        return Err(EngineError::ParseFailure {
            message: format!("Syntax errors in {}", path.display()),
        });
    }

    Ok(tree)
}

fn not_found_or_io(err: io::Error, path: &Path) -> EngineError {
    if err.kind() == io::ErrorKind::NotFound {
        EngineError::FileNotFound {
            path: path.display().to_string(),
        }
    } else {
        EngineError::Io(err)
    }
}
