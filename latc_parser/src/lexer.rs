//! Lexer for Lat source code
//!
//! Wraps the logos-generated lexer with manual scanning for string
//! literals and block comments.

use logos::Logos;

use crate::error::{LexError, LexErrorKind};
use crate::span::Span;
use crate::token::Token;

/// A token with its span and source slice
#[derive(Debug, Clone)]
pub struct SpannedToken<'a> {
    pub token: Token,
    pub span: Span,
    pub text: &'a str,
}

/// Lat lexer
pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            inner: Token::lexer(source),
        }
    }

    /// Get the next token, finishing strings and skipping block comments.
    pub fn next_token(&mut self) -> Option<Result<SpannedToken<'a>, LexError>> {
        loop {
            let result = self.inner.next()?;
            let span = self.inner.span();
            let (start, end) = (span.start, span.end);

            match result {
                Ok(Token::BlockCommentStart) => {
                    // Scan past the matching `*/`; comments do not nest.
                    match self.scan_block_comment(start, end) {
                        Ok(comment_end) => {
                            self.inner.bump(comment_end - end);
                            continue;
                        }
                        Err(e) => return Some(Err(e)),
                    }
                }

                Ok(Token::StringLiteral) => {
                    // Scan to the closing quote, validating escapes, and
                    // widen the token over the whole literal.
                    match self.scan_string(start, end) {
                        Ok(string_end) => {
                            self.inner.bump(string_end - end);
                            return Some(Ok(SpannedToken {
                                token: Token::StringLiteral,
                                span: Span::new(start, string_end),
                                text: &self.source[start..string_end],
                            }));
                        }
                        Err(e) => return Some(Err(e)),
                    }
                }

                Ok(token) => {
                    return Some(Ok(SpannedToken {
                        token,
                        span: Span::new(start, end),
                        text: &self.source[start..end],
                    }));
                }

                Err(()) => {
                    return Some(Err(LexError::new(LexErrorKind::Unrecognized, start)));
                }
            }
        }
    }

    /// Scan a non-nesting block comment; `body` is the offset just past
    /// the opening `/*`. Returns the offset just past the closing `*/`.
    fn scan_block_comment(&self, start: usize, body: usize) -> Result<usize, LexError> {
        let bytes = self.source.as_bytes();
        let mut pos = body;
        while pos < bytes.len() {
            match memchr::memchr(b'*', &bytes[pos..]) {
                None => break,
                Some(offset) => {
                    pos += offset;
                    if pos + 1 < bytes.len() && bytes[pos + 1] == b'/' {
                        return Ok(pos + 2);
                    }
                    pos += 1;
                }
            }
        }
        Err(LexError::new(LexErrorKind::UnterminatedComment, start))
    }

    /// Scan a string literal; `body` is the offset just past the opening
    /// quote. Returns the offset just past the closing quote.
    fn scan_string(&self, start: usize, body: usize) -> Result<usize, LexError> {
        let bytes = self.source.as_bytes();
        let mut pos = body;
        while pos < bytes.len() {
            match memchr::memchr2(b'\\', b'"', &bytes[pos..]) {
                None => break,
                Some(offset) => {
                    pos += offset;
                    if bytes[pos] == b'"' {
                        return Ok(pos + 1);
                    }
                    // Escape sequence: exactly the supported set.
                    if pos + 1 >= bytes.len() {
                        break;
                    }
                    match bytes[pos + 1] {
                        b't' | b'b' | b'n' | b'r' | b'f' | b'\'' | b'"' | b'\\' => pos += 2,
                        _ => return Err(LexError::new(LexErrorKind::InvalidEscape, pos)),
                    }
                }
            }
        }
        Err(LexError::new(LexErrorKind::UnterminatedString, start))
    }
}

/// Decode a string literal token's text (quotes included) into its value.
///
/// The lexer has already validated the escape set, so unknown escapes
/// cannot occur here; they decode to the raw character to keep this
/// function total.
pub fn unescape(literal: &str) -> String {
    let inner = &literal[1..literal.len().saturating_sub(1)];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Tokenize a whole source text. The first lexical fault aborts.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken<'_>>, LexError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next_token() {
        tokens.push(result?);
    }
    Ok(tokens)
}
