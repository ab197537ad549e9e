//! Find command handler - symbol lookup by name

use serde::Serialize;

use crate::cli::{FindArgs, OutputFormat};
use crate::commands::{format_entry, to_json, CommandContext, Workspace};
use crate::error::Result;
use crate::lookup::{find_item, LookupQuery};
use crate::schema::{Entry, EntryKind, ModulePath};

#[derive(Serialize)]
struct FindReport<'a> {
    query: &'a LookupQuery,
    found: Option<&'a Entry>,
}

/// Run the find command
pub fn run_find(args: &FindArgs, ctx: &CommandContext) -> Result<String> {
    let workspace = Workspace::open(&args.store, &ctx.config)?;
    let snapshot = workspace.index()?;

    let mut query = LookupQuery::new(&args.name, EntryKind::from(args.kind))
        .prefer_local(args.prefer_local)
        .allow_root_fallback(args.root_fallback);
    if let Some(namespace) = &args.namespace {
        query = query.with_explicit_namespace(namespace);
    }
    if let Some(current) = &args.current {
        query = query.with_current_namespace(ModulePath::parse(current));
    }

    let found = find_item(&snapshot.store, &query);

    match ctx.format {
        OutputFormat::Json => to_json(&FindReport {
            query: &query,
            found,
        }),
        OutputFormat::Text => Ok(match found {
            Some(entry) => format!("{}\n", format_entry(entry, workspace.workspace_root())),
            None => format!("no {} named {}\n", query.kind, query.name),
        }),
    }
}
