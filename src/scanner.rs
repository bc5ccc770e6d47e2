//! Tokenizer for the ZTK format.
//!
//! Tokens are separated by whitespace, commas and colons. A `#` starts a
//! comment running to the end of the line. A token written as `[name]` is a
//! tag; anything else is a bare token whose role (key or value) is decided by
//! [`Scanner::post_check_key`] right after it has been read.

use std::borrow::Cow;

use tracing::{trace, warn};

/// Separates a key from its values.
pub const KEY_SEPARATOR: char = ':';

const COMMENT: char = '#';
const QUOTE: char = '"';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `[name]`; the token text is the bare name.
    Tag,
    /// A key or a value.
    Bare,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: Cow<'src, str>,
    /// Whether the token was written between double quotes.
    pub quoted: bool,
    /// 1-based line the token starts on.
    pub line: u32,
}

impl Token<'_> {
    pub fn is_tag(&self) -> bool {
        self.kind == TokenKind::Tag
    }
}

/// Pulls tokens out of ZTK source text.
#[derive(Debug, Clone)]
pub struct Scanner<'src> {
    source: &'src str,
    pos: usize,
    line: u32,
}

impl<'src> Scanner<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
        }
    }

    /// Current 1-based line number.
    pub fn line(&self) -> u32 {
        self.line
    }

    fn remaining(&self) -> &'src str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_delimiters(&mut self) {
        while let Some(c) = self.peek() {
            if c == COMMENT {
                while let Some(c) = self.advance() {
                    if c == '\n' {
                        break;
                    }
                }
            } else if is_delimiter(c) {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Reads the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Option<Token<'src>> {
        self.skip_delimiters();
        let line = self.line;
        let token = match self.peek()? {
            '[' => self.scan_tag(line),
            QUOTE => self.scan_quoted(line),
            _ => self.scan_bare(line),
        };
        trace!(kind = ?token.kind, text = %token.text, line, "token");
        Some(token)
    }

    /// Consumes a key separator following the last token, if there is one
    /// on the same line.
    pub fn post_check_key(&mut self) -> bool {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.advance();
        }
        if self.peek() == Some(KEY_SEPARATOR) {
            self.advance();
            return true;
        }
        false
    }

    fn scan_tag(&mut self, line: u32) -> Token<'src> {
        self.advance();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == ']' || c == '\n' {
                break;
            }
            self.advance();
        }
        let name = self.source[start..self.pos].trim();
        if self.peek() == Some(']') {
            self.advance();
        } else {
            warn!(line, tag = name, "unterminated tag");
        }
        Token {
            kind: TokenKind::Tag,
            text: Cow::Borrowed(name),
            quoted: false,
            line,
        }
    }

    fn scan_quoted(&mut self, line: u32) -> Token<'src> {
        self.advance();
        let mut text = String::new();
        let mut closed = false;
        while let Some(c) = self.advance() {
            match c {
                '\\' => {
                    if let Some(escaped) = self.advance() {
                        text.push(escaped);
                    }
                }
                QUOTE => {
                    closed = true;
                    break;
                }
                c => text.push(c),
            }
        }
        if !closed {
            warn!(line, "unterminated quoted token");
        }
        Token {
            kind: TokenKind::Bare,
            text: Cow::Owned(text),
            quoted: true,
            line,
        }
    }

    fn scan_bare(&mut self, line: u32) -> Token<'src> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_delimiter(c) || c == COMMENT {
                break;
            }
            self.advance();
        }
        Token {
            kind: TokenKind::Bare,
            text: Cow::Borrowed(&self.source[start..self.pos]),
            quoted: false,
            line,
        }
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || c == ',' || c == KEY_SEPARATOR
}
