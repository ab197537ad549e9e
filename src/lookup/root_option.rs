//! `{ root: true }` detection for `commit` / `dispatch` calls
//!
//! Inside a namespaced module `commit('X')` targets the local module unless
//! the call passes `{ root: true }`. The option object may be written inline
//! or bound to an identifier, possibly through one factory call:
//!
//! ```text
//! commit('X', payload, { root: true })
//! const opts = { root: true };           commit('X', null, opts)
//! const rootOpts = () => ({ root: true }); const o = rootOpts(); commit('X', 1, o)
//! ```

use crate::context::scanner::bounded_prefix;
use crate::context::tokenizer::{matching_close, strip_comments, tokenize, Token, TokenKind};
use crate::context::DEFAULT_LOOKBACK;

const ROOT_CALLS: [&str; 2] = ["commit", "dispatch"];

/// Whether the `commit`/`dispatch` call around `cursor` asks for the root
/// namespace
pub fn detect_root_option(text: &str, cursor: usize) -> bool {
    detect_root_option_with(text, cursor, DEFAULT_LOOKBACK)
}

/// Same, scanning at most `lookback` characters on each side of the cursor
pub fn detect_root_option_with(text: &str, cursor: usize, lookback: usize) -> bool {
    let mut cursor = cursor.min(text.len());
    while !text.is_char_boundary(cursor) {
        cursor -= 1;
    }
    let before = bounded_prefix(text, cursor, lookback);
    let start = cursor - before.len();
    let end = text[cursor..]
        .char_indices()
        .nth(lookback)
        .map(|(i, _)| cursor + i)
        .unwrap_or(text.len());

    let window = strip_comments(&text[start..end]);
    let tokens = tokenize(&window);

    let Some(open) = enclosing_call(&tokens, cursor - start) else {
        return false;
    };
    let close = matching_close(&tokens, open).unwrap_or(tokens.len());

    for (index, argument) in split_arguments(&tokens, open + 1, close)
        .into_iter()
        .enumerate()
        .skip(1)
    {
        if object_at(&tokens, argument.0).is_some_and(|at| object_has_root(&tokens, at)) {
            return true;
        }
        if index == 2 && argument.1 - argument.0 == 1 {
            if let Some(name) = tokens[argument.0].ident() {
                if binding_has_root(&tokens, name) {
                    return true;
                }
            }
        }
    }

    false
}

/// Opening paren of the innermost `commit(` / `dispatch(` containing `cursor`
fn enclosing_call(tokens: &[Token], cursor: usize) -> Option<usize> {
    let mut stack: Vec<usize> = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        if token.start >= cursor {
            break;
        }
        match token.kind {
            TokenKind::Open(_) => stack.push(i),
            TokenKind::Close(_) => {
                stack.pop();
            }
            _ => {}
        }
    }

    stack.into_iter().rev().find(|&open| {
        tokens[open].kind == TokenKind::Open('(')
            && open > 0
            && tokens[open - 1]
                .ident()
                .is_some_and(|name| ROOT_CALLS.contains(&name))
    })
}

/// Top-level argument token ranges `[start, end)` between `from` and `to`
fn split_arguments(tokens: &[Token], from: usize, to: usize) -> Vec<(usize, usize)> {
    let mut arguments = Vec::new();
    let mut depth = 0usize;
    let mut start = from;
    let to = to.min(tokens.len());

    for i in from..to {
        match tokens[i].kind {
            TokenKind::Open(_) => depth += 1,
            TokenKind::Close(_) => depth = depth.saturating_sub(1),
            TokenKind::Punct(',') if depth == 0 => {
                arguments.push((start, i));
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < to {
        arguments.push((start, to));
    }
    arguments
}

/// `{` at `at`, or `({` (a parenthesized object)
fn object_at(tokens: &[Token], at: usize) -> Option<usize> {
    match tokens.get(at)?.kind {
        TokenKind::Open('{') => Some(at),
        TokenKind::Open('(') if tokens.get(at + 1)?.kind == TokenKind::Open('{') => Some(at + 1),
        _ => None,
    }
}

/// The object opened at `open` has `root: true` at its top level
fn object_has_root(tokens: &[Token], open: usize) -> bool {
    let close = matching_close(tokens, open).unwrap_or(tokens.len());
    let mut depth = 0usize;

    for i in open + 1..close {
        match &tokens[i].kind {
            TokenKind::Open(_) => depth += 1,
            TokenKind::Close(_) => depth = depth.saturating_sub(1),
            TokenKind::Ident(key) if depth == 0 && key == "root" => {
                if is_true_value(tokens, i) {
                    return true;
                }
            }
            TokenKind::Str { value, .. } if depth == 0 && value == "root" => {
                if is_true_value(tokens, i) {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

fn is_true_value(tokens: &[Token], key: usize) -> bool {
    tokens.get(key + 1).is_some_and(|t| t.is_punct(':'))
        && tokens.get(key + 2).and_then(Token::ident) == Some("true")
}

/// Indices of the value tokens of `name = value` assignments
fn assignments<'t>(tokens: &'t [Token], name: &'t str) -> impl Iterator<Item = usize> + 't {
    (0..tokens.len()).filter_map(move |i| {
        let is_target = tokens[i].ident() == Some(name)
            && (i == 0 || tokens[i - 1].kind != TokenKind::Dot)
            && tokens.get(i + 1).is_some_and(|t| t.is_punct('='))
            && !tokens.get(i + 2).is_some_and(|t| t.is_punct('='));
        is_target.then_some(i + 2)
    })
}

/// `name` is bound to a root-option object, directly or through one
/// factory call
fn binding_has_root(tokens: &[Token], name: &str) -> bool {
    assignments(tokens, name).any(|value| {
        if object_at(tokens, value).is_some_and(|at| object_has_root(tokens, at)) {
            return true;
        }
        match tokens.get(value).and_then(Token::ident) {
            Some(factory) if tokens.get(value + 1).map(|t| &t.kind) == Some(&TokenKind::Open('(')) => {
                factory_returns_root(tokens, factory)
            }
            _ => false,
        }
    })
}

/// `function f() { return { root: true } }` or an arrow/function expression
/// assigned to `f`
fn factory_returns_root(tokens: &[Token], factory: &str) -> bool {
    for i in 0..tokens.len().saturating_sub(2) {
        if tokens[i].ident() == Some("function") && tokens[i + 1].ident() == Some(factory) {
            if function_returns_root(tokens, i + 2) {
                return true;
            }
        }
    }

    assignments(tokens, factory).any(|mut value| {
        if tokens.get(value).and_then(Token::ident) == Some("async") {
            value += 1;
        }
        if tokens.get(value).and_then(Token::ident) == Some("function") {
            value += 1;
            if tokens.get(value).and_then(Token::ident).is_some() {
                value += 1;
            }
            return function_returns_root(tokens, value);
        }
        arrow_returns_root(tokens, value)
    })
}

/// Parameter list opening at `params`, then a block body
fn function_returns_root(tokens: &[Token], params: usize) -> bool {
    if tokens.get(params).map(|t| &t.kind) != Some(&TokenKind::Open('(')) {
        return false;
    }
    let Some(close) = matching_close(tokens, params) else {
        return false;
    };
    block_returns_root(tokens, close + 1)
}

fn arrow_returns_root(tokens: &[Token], params: usize) -> bool {
    let arrow = match tokens.get(params).map(|t| &t.kind) {
        Some(TokenKind::Ident(_)) => params + 1,
        Some(TokenKind::Open('(')) => match matching_close(tokens, params) {
            Some(close) => close + 1,
            None => return false,
        },
        _ => return false,
    };
    if tokens.get(arrow).map(|t| &t.kind) != Some(&TokenKind::Arrow) {
        return false;
    }

    let body = arrow + 1;
    match tokens.get(body).map(|t| &t.kind) {
        Some(TokenKind::Open('(')) => {
            object_at(tokens, body).is_some_and(|at| object_has_root(tokens, at))
        }
        Some(TokenKind::Open('{')) => block_returns_root(tokens, body),
        _ => false,
    }
}

fn block_returns_root(tokens: &[Token], open: usize) -> bool {
    if tokens.get(open).map(|t| &t.kind) != Some(&TokenKind::Open('{')) {
        return false;
    }
    let close = matching_close(tokens, open).unwrap_or(tokens.len());
    (open + 1..close).any(|i| {
        tokens[i].ident() == Some("return")
            && object_at(tokens, i + 1).is_some_and(|at| object_has_root(tokens, at))
    })
}
