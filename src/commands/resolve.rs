//! Resolve command handler - cursor context plus lookup, end to end
//!
//! 1. Index the store
//! 2. Scan the consumer file for the context at the cursor
//! 3. Take the symbol name under the cursor
//! 4. Look it up with the module the file declares as the local namespace

use std::fs;

use serde::Serialize;

use crate::cli::{OutputFormat, ResolveArgs};
use crate::commands::{cursor_offset, format_entry, to_json, CommandContext, Workspace};
use crate::context::{scan_context_with, ContextDescriptor, HelperNames};
use crate::error::{EngineError, Result};
use crate::lookup::{detect_root_option_with, find_item, LookupQuery};
use crate::schema::Entry;

#[derive(Serialize)]
struct ResolveReport<'a> {
    context: Option<&'a ContextDescriptor>,
    query: Option<&'a LookupQuery>,
    found: Option<&'a Entry>,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '/')
}

/// The symbol name touching `cursor`
pub fn word_at(text: &str, cursor: usize) -> Option<&str> {
    let mut cursor = cursor.min(text.len());
    while !text.is_char_boundary(cursor) {
        cursor -= 1;
    }
    let start = text[..cursor]
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_name_char(*c))
        .last()
        .map_or(cursor, |(i, _)| i);
    let end = text[cursor..]
        .char_indices()
        .find(|(_, c)| !is_name_char(*c))
        .map_or(text.len(), |(i, _)| cursor + i);

    let word = text[start..end].trim_matches('/');
    (!word.is_empty()).then_some(word)
}

/// Run the resolve command
pub fn run_resolve(args: &ResolveArgs, ctx: &CommandContext) -> Result<String> {
    let file = &args.cursor.file;
    if !file.is_file() {
        return Err(EngineError::FileNotFound {
            path: file.display().to_string(),
        });
    }

    let workspace = Workspace::open(&args.store, &ctx.config)?;
    let snapshot = workspace.index()?;

    let text = fs::read_to_string(file)?;
    let offset = cursor_offset(&args.cursor, &text)?;
    let lookback = ctx.config.scanner.lookback;

    let helpers = HelperNames::discover(&text);
    let context = scan_context_with(&text, offset, &helpers, lookback);
    let current = snapshot.namespace_for_file(&workspace.canonical(file));
    if ctx.verbose {
        eprintln!("context: {:?}, local module: {:?}", context, current);
    }

    let query = match (&context, word_at(&text, offset)) {
        (Some(descriptor), Some(name)) => {
            let root_option = detect_root_option_with(&text, offset, lookback);
            Some(LookupQuery::from_context(descriptor, name, current, root_option))
        }
        _ => None,
    };
    let found = query.as_ref().and_then(|q| find_item(&snapshot.store, q));

    match ctx.format {
        OutputFormat::Json => to_json(&ResolveReport {
            context: context.as_ref(),
            query: query.as_ref(),
            found,
        }),
        OutputFormat::Text => Ok(match (&query, found) {
            (None, _) => "no store symbol at cursor\n".to_string(),
            (Some(query), None) => format!("no {} named {}\n", query.kind, query.name),
            (Some(_), Some(entry)) => {
                let mut output = format!("{}\n", format_entry(entry, workspace.workspace_root()));
                if let Some(doc) = &entry.documentation {
                    output.push('\n');
                    output.push_str(doc);
                    output.push('\n');
                }
                output
            }
        }),
    }
}
