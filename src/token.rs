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

//! Lexical tokens.

use crate::util::Location;

/// The kind of a lexical token. Every variant is a bare tag with no payload,
/// so this is `Copy` like any other small enum of flags.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    // === Keywords ===
    Let, Print, Input, InputNum, When, Otherwise,
    Repeat, Times, Loop, While, From, To,
    Label, Goto, Random, Sqrt, Pow, Abs, Floor, Ceil,
    Call, Define,

    // === Literals & identifiers ===

    /// An identifier; the lexeme is its name.
    Ident,

    /// A numeric literal; the lexeme is the source text, not yet converted
    /// to `f64` (conversion happens in the evaluator, since a malformed
    /// lexeme such as `1.2.3` is a semantic fault, not a lexical one).
    Number,

    /// A string literal; the lexeme is the text between the quotes, with no
    /// escape processing.
    Str,

    // === Operators ===
    Plus, Minus, Star, Slash, Percent,
    LParen, RParen, Comma,
    Assign, Eq, NotEq, Less, More, LessEq, MoreEq,
    ArrowRight, ArrowLeft,

    // === Terminators ===
    Newline,
    Eof,
}

/// A single lexical token: a kind, the source text it came from, and the
/// 1-based line on which it started.
#[derive(Clone, PartialEq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32) -> Self {
        Self { kind, lexeme: lexeme.into(), line }
    }

    pub fn loc(&self) -> Location {
        Location::at_line(self.line)
    }
}

/// Looks up the reserved-word kind for an identifier, if any.
pub fn keyword(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ident {
        "let"        => Let,
        "print"      => Print,
        "input"      => Input,
        "input_num"  => InputNum,
        "when"       => When,
        "otherwise"  => Otherwise,
        "repeat"     => Repeat,
        "times"      => Times,
        "loop"       => Loop,
        "while"      => While,
        "from"       => From,
        "to"         => To,
        "label"      => Label,
        "goto"       => Goto,
        "random"     => Random,
        "sqrt"       => Sqrt,
        "pow"        => Pow,
        "abs"        => Abs,
        "floor"      => Floor,
        "ceil"       => Ceil,
        "call"       => Call,
        "define"     => Define,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_recognizes_reserved_words() {
        assert_eq!(keyword("loop"), Some(TokenKind::Loop));
        assert_eq!(keyword("goto"), Some(TokenKind::Goto));
        assert_eq!(keyword("define"), Some(TokenKind::Define));
    }

    #[test]
    fn keyword_rejects_identifiers() {
        assert_eq!(keyword("x"), None);
        assert_eq!(keyword("loopy"), None);
    }
}
