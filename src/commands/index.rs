//! Index command handler - build the store index and list what it holds

use serde::Serialize;

use crate::cli::{IndexArgs, OutputFormat};
use crate::commands::{format_entry, to_json, CommandContext, Workspace};
use crate::error::Result;
use crate::indexing::IndexSnapshot;
use crate::schema::{Entry, EntryKind};

#[derive(Serialize)]
struct IndexReport<'a> {
    entry: Option<String>,
    generation: u64,
    files: usize,
    files_parsed: usize,
    visits_reused: usize,
    entries: Vec<&'a Entry>,
}

/// Run the index command
pub fn run_index(args: &IndexArgs, ctx: &CommandContext) -> Result<String> {
    let workspace = Workspace::open(&args.store, &ctx.config)?;
    let mut snapshot = workspace.index()?;

    if !args.changed.is_empty() {
        if ctx.verbose {
            eprintln!("Re-indexing {} changed file(s)", args.changed.len());
        }
        let changed: Vec<_> = args.changed.iter().map(|p| workspace.canonical(p)).collect();
        snapshot = workspace.index_changed(&changed)?;
    }

    let kind = args.kind.map(EntryKind::from);
    let entries: Vec<&Entry> = snapshot
        .store
        .iter()
        .filter(|entry| kind.map_or(true, |k| entry.kind == k))
        .collect();

    match ctx.format {
        OutputFormat::Json => to_json(&IndexReport {
            entry: snapshot.entry.as_ref().map(|p| p.display().to_string()),
            generation: snapshot.generation,
            files: snapshot.graph.files().len(),
            files_parsed: snapshot.stats.files_parsed,
            visits_reused: snapshot.stats.visits_reused,
            entries,
        }),
        OutputFormat::Text => Ok(format_text(&snapshot, &entries, workspace.workspace_root())),
    }
}

fn format_text(snapshot: &IndexSnapshot, entries: &[&Entry], root: &std::path::Path) -> String {
    let mut output = String::new();
    output.push_str("═══════════════════════════════════════════\n");
    output.push_str("  STORE INDEX\n");
    output.push_str("═══════════════════════════════════════════\n\n");

    if let Some(entry) = &snapshot.entry {
        output.push_str(&format!("entry: {}\n", entry.display()));
    }
    output.push_str(&format!("generation: {}\n", snapshot.generation));
    output.push_str(&format!(
        "files: {} ({} parsed, {} visits reused)\n\n",
        snapshot.graph.files().len(),
        snapshot.stats.files_parsed,
        snapshot.stats.visits_reused
    ));

    output.push_str(&format!("entries[{}]:\n", entries.len()));
    for entry in entries {
        output.push_str(&format_entry(entry, root));
        output.push('\n');
    }
    output
}
