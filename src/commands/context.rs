//! Context command handler - what the cursor is inside of

use std::fs;

use serde::Serialize;

use crate::cli::{ContextArgs, OutputFormat};
use crate::commands::{cursor_offset, to_json, CommandContext};
use crate::context::{ContextDescriptor, ContextScanner, HelperNames};
use crate::error::{EngineError, Result};
use crate::lookup::detect_root_option_with;

#[derive(Serialize)]
struct ContextReport {
    offset: usize,
    context: Option<ContextDescriptor>,
    root_option: bool,
}

/// Run the context command
pub fn run_context(args: &ContextArgs, ctx: &CommandContext) -> Result<String> {
    let file = &args.cursor.file;
    if !file.is_file() {
        return Err(EngineError::FileNotFound {
            path: file.display().to_string(),
        });
    }
    let text = fs::read_to_string(file)?;
    let offset = cursor_offset(&args.cursor, &text)?;

    let scanner = ContextScanner::with_limits(
        ctx.config.scanner.lookback,
        ctx.config.scanner.memo_capacity,
    );
    let helpers = HelperNames::discover(&text);
    let document = file.display().to_string();
    let context = scanner.get_context(&document, 0, &text, offset, &helpers);
    let root_option = detect_root_option_with(&text, offset, scanner.lookback());

    let report = ContextReport {
        offset,
        context,
        root_option,
    };

    match ctx.format {
        OutputFormat::Json => to_json(&report),
        OutputFormat::Text => {
            let mut output = format!("{}:{}\n", file.display(), offset);
            match &report.context {
                Some(descriptor) => {
                    output.push_str(&format!("kind: {}\n", descriptor.kind));
                    output.push_str(&format!("invocation: {:?}\n", descriptor.invocation));
                    if let Some(namespace) = &descriptor.explicit_namespace {
                        output.push_str(&format!("namespace: {}\n", namespace));
                    }
                    if report.root_option {
                        output.push_str("root: true\n");
                    }
                }
                None => output.push_str("no store context\n"),
            }
            Ok(output)
        }
    }
}
