// This file is part of flow, a Flow language interpreter.
//
// flow is free software: you can redistribute it and/or modify it
// under the terms of the GNU General Public License as published
// by the Free Software Foundation, either version 3 of the License,
// or (at your option) any later version.
//
// flow is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See
// the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with flow.  If not, see <http://www.gnu.org/licenses/>.

//! Lexical analysis: source bytes to a flat token sequence.

use crate::diagnostics::Diagnostics;
use crate::token::{keyword, Token, TokenKind};
use crate::util::Location;

/// Scans a Flow source buffer into tokens.
///
/// The scanner works over raw bytes, not `char`s: Flow source is ASCII-only
/// by contract (§6), so byte-at-a-time indexing is both simpler and faster
/// than decoding UTF-8, and unrecognized non-ASCII bytes fall through to the
/// same "unrecognized character" diagnostic as any other unknown byte.
pub struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    line: u32,
    diags: &'a mut Diagnostics,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, diags: &'a mut Diagnostics) -> Self {
        Self { source: source.as_bytes(), pos: 0, line: 1, diags }
    }

    /// Scans the entire source buffer, returning a token list terminated by
    /// a single `Eof` token. Total, for any input: every iteration either
    /// consumes at least one byte or reaches `Eof`, so this always halts.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let done = self.scan_one(&mut tokens);
            if done {
                break;
            }
        }
        tokens
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let byte = self.peek();
        if byte.is_some() {
            self.pos += 1;
        }
        byte
    }

    /// Scans and pushes the next token. Returns `true` once `Eof` has been
    /// pushed.
    fn scan_one(&mut self, tokens: &mut Vec<Token>) -> bool {
        let Some(c) = self.peek() else {
            tokens.push(Token::new(TokenKind::Eof, "", self.line));
            return true;
        };

        match c {
            b' ' | b'\t' | b'\r' => {
                self.advance();
            }
            b'#' => {
                while !matches!(self.peek(), None | Some(b'\n')) {
                    self.advance();
                }
            }
            b'\n' => {
                self.advance();
                tokens.push(Token::new(TokenKind::Newline, "\n", self.line));
                self.line += 1;
            }
            b'"' => tokens.push(self.read_string()),
            b'0'..=b'9' => tokens.push(self.read_number()),
            c if c.is_ascii_alphabetic() => tokens.push(self.read_ident()),
            b'+' => tokens.push(self.single(TokenKind::Plus)),
            b'*' => tokens.push(self.single(TokenKind::Star)),
            b'/' => tokens.push(self.single(TokenKind::Slash)),
            b'%' => tokens.push(self.single(TokenKind::Percent)),
            b'(' => tokens.push(self.single(TokenKind::LParen)),
            b')' => tokens.push(self.single(TokenKind::RParen)),
            b',' => tokens.push(self.single(TokenKind::Comma)),
            b'-' => tokens.push(self.read_minus_or_arrow()),
            b'<' => tokens.push(self.read_less()),
            b'>' => tokens.push(self.read_greater()),
            b'=' => tokens.push(self.read_equal()),
            b'!' => {
                let line = self.line;
                self.advance();
                if self.peek() == Some(b'=') {
                    self.advance();
                    tokens.push(Token::new(TokenKind::NotEq, "!=", line));
                } else {
                    self.diags.warn(Location::at_line(line), "unrecognized character: '!'");
                }
            }
            other => {
                let line = self.line;
                self.advance();
                self.diags.warn(
                    Location::at_line(line),
                    format!("unrecognized character: '{}'", other as char),
                );
            }
        }

        false
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let line = self.line;
        let c = self.advance().unwrap();
        Token::new(kind, (c as char).to_string(), line)
    }

    /// `-` alone, or `->` as the block-header arrow.
    fn read_minus_or_arrow(&mut self) -> Token {
        let line = self.line;
        self.advance();
        if self.peek() == Some(b'>') {
            self.advance();
            Token::new(TokenKind::ArrowRight, "->", line)
        } else {
            Token::new(TokenKind::Minus, "-", line)
        }
    }

    /// `<`, `<=`, or `<-` as the block-end marker.
    fn read_less(&mut self) -> Token {
        let line = self.line;
        self.advance();
        match self.peek() {
            Some(b'-') => {
                self.advance();
                Token::new(TokenKind::ArrowLeft, "<-", line)
            }
            Some(b'=') => {
                self.advance();
                Token::new(TokenKind::LessEq, "<=", line)
            }
            _ => Token::new(TokenKind::Less, "<", line),
        }
    }

    /// `>` or `>=`.
    fn read_greater(&mut self) -> Token {
        let line = self.line;
        self.advance();
        if self.peek() == Some(b'=') {
            self.advance();
            Token::new(TokenKind::MoreEq, ">=", line)
        } else {
            Token::new(TokenKind::More, ">", line)
        }
    }

    /// `=` or `==`.
    fn read_equal(&mut self) -> Token {
        let line = self.line;
        self.advance();
        if self.peek() == Some(b'=') {
            self.advance();
            Token::new(TokenKind::Eq, "==", line)
        } else {
            Token::new(TokenKind::Assign, "=", line)
        }
    }

    /// A string literal between ASCII double quotes. No escape sequences.
    /// An unterminated string silently consumes to end of input — no
    /// diagnostic is written, matching the reference interpreter.
    fn read_string(&mut self) -> Token {
        let line = self.line;
        self.advance(); // opening quote
        let start = self.pos;
        while !matches!(self.peek(), None | Some(b'"')) {
            self.advance();
        }
        let text = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
        if self.peek() == Some(b'"') {
            self.advance();
        }
        Token::new(TokenKind::Str, text, line)
    }

    /// A maximal run of digits and `.`. Multiple dots are accepted lexically
    /// (`§4.1`); the evaluator reports a malformed lexeme when it converts
    /// to `f64`.
    fn read_number(&mut self) -> Token {
        let line = self.line;
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9') | Some(b'.')) {
            self.advance();
        }
        let text = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
        Token::new(TokenKind::Number, text, line)
    }

    /// A letter followed by letters, digits, or underscores.
    fn read_ident(&mut self) -> Token {
        let line = self.line;
        let start = self.pos;
        self.advance();
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
            self.advance();
        }
        let text = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
        let kind = keyword(&text).unwrap_or(TokenKind::Ident);
        Token::new(kind, text, line)
    }
}

/// Tokenizes `source`, reporting lexical faults through `diags`.
pub fn tokenize(source: &str, diags: &mut Diagnostics) -> Vec<Token> {
    Lexer::new(source, diags).tokenize()
}
