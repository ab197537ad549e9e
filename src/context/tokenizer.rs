//! Lightweight tokenizer for cursor-context scanning
//!
//! This is not a parser: it only distinguishes what the scanners need
//! (string literals, brackets, identifiers, dots and arrows) and tolerates
//! arbitrary broken input, since the text is usually mid-edit.

/// Token category
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// String or template literal; `terminated` is false when the text ends
    /// inside it
    Str { value: String, terminated: bool },
    /// `(`, `[` or `{`
    Open(char),
    /// `)`, `]` or `}`
    Close(char),
    Ident(String),
    Number,
    /// `.` or `?.`
    Dot,
    /// `=>`
    Arrow,
    Punct(char),
}

/// A token with byte offsets into the scanned text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }
}

/// Opening bracket for a closing one
pub fn opener_of(close: char) -> char {
    match close {
        ')' => '(',
        ']' => '[',
        _ => '{',
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Blank out `//` and `/* */` comments, keeping byte offsets and newlines.
///
/// Comment markers inside string and template literals are left alone.
pub fn strip_comments(text: &str) -> String {
    #[derive(PartialEq)]
    enum State {
        Code,
        Quoted(char),
        Line,
        Block,
    }

    let mut out = String::with_capacity(text.len());
    let mut state = State::Code;
    let mut chars = text.chars().peekable();

    let blank = |out: &mut String, c: char| {
        if c == '\n' {
            out.push('\n');
        } else {
            out.extend(std::iter::repeat(' ').take(c.len_utf8()));
        }
    };

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::Line;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::Block;
                }
                '\'' | '"' | '`' => {
                    out.push(c);
                    state = State::Quoted(c);
                }
                _ => out.push(c),
            },
            State::Quoted(quote) => {
                out.push(c);
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                } else if c == quote || (c == '\n' && quote != '`') {
                    state = State::Code;
                }
            }
            State::Line => {
                blank(&mut out, c);
                if c == '\n' {
                    state = State::Code;
                }
            }
            State::Block => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("  ");
                    state = State::Code;
                } else {
                    blank(&mut out, c);
                }
            }
        }
    }

    out
}

/// Tokenize comment-free text
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let kind = match c {
            c if c.is_whitespace() => continue,
            '\'' | '"' | '`' => {
                let mut value = String::new();
                let mut terminated = false;
                while let Some((_, next)) = chars.next() {
                    match next {
                        '\\' => {
                            if let Some((_, escaped)) = chars.next() {
                                value.push(escaped);
                            }
                        }
                        n if n == c => {
                            terminated = true;
                            break;
                        }
                        '\n' if c != '`' => break,
                        n => value.push(n),
                    }
                }
                TokenKind::Str { value, terminated }
            }
            '(' | '[' | '{' => TokenKind::Open(c),
            ')' | ']' | '}' => TokenKind::Close(c),
            '.' => TokenKind::Dot,
            '?' if matches!(chars.peek(), Some((_, '.'))) => {
                chars.next();
                TokenKind::Dot
            }
            '=' if matches!(chars.peek(), Some((_, '>'))) => {
                chars.next();
                TokenKind::Arrow
            }
            c if is_ident_start(c) => {
                let mut name = c.to_string();
                while let Some(&(_, next)) = chars.peek() {
                    if !is_ident_char(next) {
                        break;
                    }
                    name.push(next);
                    chars.next();
                }
                TokenKind::Ident(name)
            }
            c if c.is_ascii_digit() => {
                while let Some(&(_, next)) = chars.peek() {
                    if !(next.is_ascii_alphanumeric() || next == '_') {
                        break;
                    }
                    chars.next();
                }
                TokenKind::Number
            }
            other => TokenKind::Punct(other),
        };

        let end = chars.peek().map(|&(i, _)| i).unwrap_or(text.len());
        tokens.push(Token { kind, start, end });
    }

    tokens
}

/// Index of the token closing the bracket opened at `open`, if any
pub fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token.kind {
            TokenKind::Open(_) => depth += 1,
            TokenKind::Close(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
