//! Cursor context resolution
//!
//! Given the text before a cursor, decide which kind of store symbol is being
//! referenced and through which idiom:
//!
//! - helper calls: `mapState('user', ['na|`, `commit('SET|`
//! - getter brackets: `getters['user/is|`, `rootGetters[`
//! - dotted chains: `state.user.na|`, `this.$store.getters.|`
//!
//! The text is stripped of comments and tokenized, then scanned left to right
//! with a stack of open bracket frames. Each frame remembers the identifier
//! in front of its opener and the string literals written directly inside
//! it. The innermost frame with a recognised identifier wins.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use ahash::AHashMap;
use parking_lot::Mutex;
use serde::Serialize;

use crate::schema::EntryKind;

use super::aliases::HelperNames;
use super::tokenizer::{opener_of, strip_comments, tokenize, Token, TokenKind};

/// Characters before the cursor that are scanned
pub const DEFAULT_LOOKBACK: usize = 2_000;

/// Memoized results kept across documents
pub const DEFAULT_MEMO_CAPACITY: usize = 512;

/// How the symbol is being accessed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Invocation {
    HelperCall,
    Commit,
    Dispatch,
    DirectAccess,
}

/// What the cursor is referencing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextDescriptor {
    pub kind: EntryKind,
    pub invocation: Invocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explicit_namespace: Option<String>,
}

const STATE_ROOTS: [&str; 2] = ["state", "rootState"];
const GETTER_ROOTS: [&str; 2] = ["getters", "rootGetters"];

/// Scan with the default lookback
pub fn scan_context(window: &str, cursor: usize, helpers: &HelperNames) -> Option<ContextDescriptor> {
    scan_context_with(window, cursor, helpers, DEFAULT_LOOKBACK)
}

/// Scan only the `lookback` characters in front of `cursor` (a byte offset
/// into `window`)
pub fn scan_context_with(
    window: &str,
    cursor: usize,
    helpers: &HelperNames,
    lookback: usize,
) -> Option<ContextDescriptor> {
    let text = strip_comments(bounded_prefix(window, cursor, lookback));
    let tokens = tokenize(&text);
    dotted_chain(&tokens, text.len()).or_else(|| enclosing_frame(&tokens, helpers))
}

/// The last `lookback` characters of `window[..cursor]`
pub(crate) fn bounded_prefix(window: &str, cursor: usize, lookback: usize) -> &str {
    let mut cursor = cursor.min(window.len());
    while !window.is_char_boundary(cursor) {
        cursor -= 1;
    }
    let prefix = &window[..cursor];
    if lookback == 0 {
        return "";
    }
    let start = prefix
        .char_indices()
        .rev()
        .nth(lookback - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &prefix[start..]
}

struct Frame {
    opener: char,
    ident: Option<String>,
    strings: Vec<String>,
}

fn enclosing_frame(tokens: &[Token], helpers: &HelperNames) -> Option<ContextDescriptor> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut previous: Option<&Token> = None;

    for token in tokens {
        match &token.kind {
            TokenKind::Open(opener) => stack.push(Frame {
                opener: *opener,
                ident: previous.and_then(Token::ident).map(str::to_string),
                strings: Vec::new(),
            }),
            TokenKind::Close(close) => {
                let opener = opener_of(*close);
                if let Some(position) = stack.iter().rposition(|f| f.opener == opener) {
                    stack.truncate(position);
                }
            }
            TokenKind::Str {
                value,
                terminated: true,
            } => {
                if let Some(frame) = stack.last_mut() {
                    frame.strings.push(value.clone());
                }
            }
            _ => {}
        }
        previous = Some(token);
    }

    for frame in stack.iter().rev() {
        let Some(ident) = frame.ident.as_deref() else {
            continue;
        };
        match frame.opener {
            '[' if GETTER_ROOTS.contains(&ident) => {
                return Some(ContextDescriptor {
                    kind: EntryKind::Getter,
                    invocation: Invocation::DirectAccess,
                    explicit_namespace: None,
                });
            }
            '(' => {
                if let Some(binding) = helpers.get(ident) {
                    let explicit_namespace = binding
                        .namespace
                        .clone()
                        .or_else(|| frame.strings.first().cloned());
                    return Some(ContextDescriptor {
                        kind: binding.kind,
                        invocation: binding.invocation,
                        explicit_namespace,
                    });
                }
            }
            _ => {}
        }
    }

    None
}

/// `state.a.b.|` / `getters.|` chains ending at the cursor
fn dotted_chain(tokens: &[Token], cursor: usize) -> Option<ContextDescriptor> {
    let last = tokens.last()?;
    if last.end != cursor {
        return None;
    }

    // drop the identifier being typed
    let mut rest = tokens;
    if last.ident().is_some() {
        rest = &rest[..rest.len() - 1];
    }

    let mut segments = Vec::new();
    let mut i = rest.len();
    while i >= 2 && rest[i - 1].kind == TokenKind::Dot {
        match rest[i - 2].ident() {
            Some(name) => segments.push(name),
            None => break,
        }
        i -= 2;
    }
    segments.reverse();

    let root = segments
        .iter()
        .rposition(|s| STATE_ROOTS.contains(s) || GETTER_ROOTS.contains(s))?;
    let tail = &segments[root + 1..];

    if GETTER_ROOTS.contains(&segments[root]) {
        // getter keys are flat; `getters.a.|` is a property of a getter result
        return tail.is_empty().then_some(ContextDescriptor {
            kind: EntryKind::Getter,
            invocation: Invocation::DirectAccess,
            explicit_namespace: None,
        });
    }

    Some(ContextDescriptor {
        kind: EntryKind::State,
        invocation: Invocation::DirectAccess,
        explicit_namespace: (!tail.is_empty()).then(|| tail.join("/")),
    })
}

// ============================================================================
// Memoized scanner
// ============================================================================

struct DocumentMemo {
    version: u64,
    last_used: u64,
    results: AHashMap<usize, Option<ContextDescriptor>>,
}

/// Memo statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScannerStats {
    pub documents: usize,
    pub entries: usize,
    pub tokenize_calls: usize,
}

/// Memoizing front of [`scan_context`], keyed by `(document, version, cursor)`.
///
/// A query for a newer version of a document drops everything memoized for
/// older versions; a query for an older version is answered but not stored.
/// Helper names are not part of the key: they are derived from the document
/// text, which the version already identifies.
pub struct ContextScanner {
    lookback: usize,
    capacity: usize,
    memo: Mutex<AHashMap<String, DocumentMemo>>,
    tick: AtomicU64,
    tokenize_calls: AtomicUsize,
}

impl ContextScanner {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_LOOKBACK, DEFAULT_MEMO_CAPACITY)
    }

    pub fn with_limits(lookback: usize, capacity: usize) -> Self {
        Self {
            lookback,
            capacity: capacity.max(1),
            memo: Mutex::new(AHashMap::new()),
            tick: AtomicU64::new(0),
            tokenize_calls: AtomicUsize::new(0),
        }
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    /// Context at `cursor` in version `version` of `document`
    pub fn get_context(
        &self,
        document: &str,
        version: u64,
        window: &str,
        cursor: usize,
        helpers: &HelperNames,
    ) -> Option<ContextDescriptor> {
        let tick = self.tick.fetch_add(1, Ordering::Relaxed);

        {
            let mut memo = self.memo.lock();
            if let Some(doc) = memo.get_mut(document) {
                if doc.version == version {
                    if let Some(result) = doc.results.get(&cursor) {
                        doc.last_used = tick;
                        return result.clone();
                    }
                }
            }
        }

        self.tokenize_calls.fetch_add(1, Ordering::Relaxed);
        let result = scan_context_with(window, cursor, helpers, self.lookback);
        self.remember(document, version, cursor, result.clone(), tick);
        result
    }

    fn remember(
        &self,
        document: &str,
        version: u64,
        cursor: usize,
        result: Option<ContextDescriptor>,
        tick: u64,
    ) {
        let mut memo = self.memo.lock();

        match memo.get_mut(document) {
            Some(doc) if doc.version > version => return,
            Some(doc) if doc.version < version => {
                tracing::debug!(
                    "[CONTEXT] {} moved to version {}, dropping {} memoized results",
                    document,
                    version,
                    doc.results.len()
                );
                doc.version = version;
                doc.results.clear();
            }
            Some(_) => {}
            None => {
                memo.insert(
                    document.to_string(),
                    DocumentMemo {
                        version,
                        last_used: tick,
                        results: AHashMap::new(),
                    },
                );
            }
        }

        while memo.values().map(|doc| doc.results.len()).sum::<usize>() >= self.capacity {
            let victim = memo
                .iter()
                .filter(|(name, doc)| name.as_str() != document && !doc.results.is_empty())
                .min_by_key(|(_, doc)| doc.last_used)
                .map(|(name, _)| name.clone());
            match victim {
                Some(name) => {
                    memo.remove(&name);
                }
                None => {
                    if let Some(doc) = memo.get_mut(document) {
                        doc.results.clear();
                    }
                    break;
                }
            }
        }

        if let Some(doc) = memo.get_mut(document) {
            doc.last_used = tick;
            doc.results.insert(cursor, result);
        }
    }

    /// Forget a closed document
    pub fn invalidate(&self, document: &str) {
        self.memo.lock().remove(document);
    }

    pub fn clear(&self) {
        self.memo.lock().clear();
    }

    /// Number of scans that actually tokenized text
    pub fn tokenize_count(&self) -> usize {
        self.tokenize_calls.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> ScannerStats {
        let memo = self.memo.lock();
        ScannerStats {
            documents: memo.len(),
            entries: memo.values().map(|doc| doc.results.len()).sum(),
            tokenize_calls: self.tokenize_count(),
        }
    }
}

impl Default for ContextScanner {
    fn default() -> Self {
        Self::new()
    }
}
