//! Common utilities for walking tree-sitter trees
//!
//! Text extraction, iterative traversal, string literal decoding and
//! documentation comment cleanup shared by the lowering pass.

use tree_sitter::Node;

use super::ast::Position;

// ============================================================================
// Text Extraction
// ============================================================================

/// Get text content of a node
pub fn get_node_text<'s>(node: &Node, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Named children of a node, skipping comments
pub fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect();
    children
}

/// First named, non-comment child
pub fn first_named_child<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    named_children(node).into_iter().next()
}

/// Whether a node has an anonymous child token with the given text
pub fn has_token(node: &Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token);
    found
}

/// Decode a `string` node (or a substitution-free template) to its value
pub fn string_literal_value(node: &Node, source: &str) -> String {
    let mut value = String::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "string_fragment" => value.push_str(get_node_text(&child, source)),
            "escape_sequence" => value.push_str(&decode_escape(get_node_text(&child, source))),
            _ => {}
        }
    }
    value
}

fn decode_escape(escape: &str) -> String {
    match escape {
        "\\n" => "\n".to_string(),
        "\\t" => "\t".to_string(),
        "\\r" => "\r".to_string(),
        "\\0" => "\0".to_string(),
        other => other.chars().skip(1).collect(),
    }
}

// ============================================================================
// Positions
// ============================================================================

/// Start position of a node as a 1-indexed line and a character column.
///
/// `line_offset` shifts lines for script blocks extracted from `.vue` files.
pub fn node_position(node: &Node, source: &str, line_offset: usize) -> Position {
    let point = node.start_position();
    let line_start = node.start_byte() - point.column;
    let column = source
        .get(line_start..node.start_byte())
        .map(|prefix| prefix.chars().count())
        .unwrap_or(point.column);
    Position {
        line: point.row + 1 + line_offset,
        column,
    }
}

// ============================================================================
// Documentation comments
// ============================================================================

/// Whether a comment is documentation style (`/** ... */`)
pub fn is_doc_comment(text: &str) -> bool {
    text.starts_with("/**") && text != "/**/"
}

/// Strip comment markers, trim every line and drop blank lines
pub fn clean_doc_comment(text: &str) -> String {
    let inner = text
        .strip_prefix("/**")
        .unwrap_or(text)
        .strip_suffix("*/")
        .unwrap_or_else(|| text.strip_prefix("/**").unwrap_or(text));

    inner
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// AST Traversal
// ============================================================================

/// Visit all nodes in a tree with a visitor function (iterative to avoid stack overflow)
pub fn visit_all<'t, F>(node: &Node<'t>, mut visitor: F)
where
    F: FnMut(&Node<'t>),
{
    let mut cursor = node.walk();
    let mut did_visit_children = false;

    loop {
        if !did_visit_children {
            visitor(&cursor.node());

            if cursor.goto_first_child() {
                continue;
            }
        }

        if cursor.goto_next_sibling() {
            did_visit_children = false;
            continue;
        }

        if !cursor.goto_parent() {
            break;
        }
        did_visit_children = true;
    }
}

/// Node kinds that open a new function frame
pub fn is_function_kind(kind: &str) -> bool {
    matches!(
        kind,
        "arrow_function"
            | "function_expression"
            | "function"
            | "function_declaration"
            | "generator_function"
            | "generator_function_declaration"
            | "method_definition"
    )
}
