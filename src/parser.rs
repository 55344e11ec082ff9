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

//! Recursive-descent parsing: tokens to a `Program` tree.
//!
//! The three expression tiers (comparison, additive, multiplicative) are
//! three mutually recursive functions, each calling down to the next —
//! cascading descent, not a precedence table. The grammar fixes exactly
//! three tiers, so there is nothing a table would buy here that three
//! functions don't already give directly.
//!
//! The parser never aborts. A mismatched token writes a diagnostic and
//! advances past it; a block or program left unterminated by `EOF` simply
//! ends. Every entry point returns the best tree it could build.

use crate::ast::{Block, Builtin, BinOp, Expr, Program, Stmt, UnOp};
use crate::diagnostics::Diagnostics;
use crate::token::{Token, TokenKind};

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    diags: &'a mut Diagnostics,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, diags: &'a mut Diagnostics) -> Self {
        Self { tokens, pos: 0, diags }
    }

    pub fn parse_program(mut self) -> Program {
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !self.at_eof() {
            if let Some(stmt) = self.statement() {
                stmts.push(stmt);
            }
            self.skip_newlines();
        }
        Program { stmts }
    }

    // === Token cursor ===

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    fn at_eof(&self) -> bool {
        self.kind() == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if !self.at_eof() {
            self.pos += 1;
        }
        tok
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    /// Consumes `kind` if present. Otherwise reports a diagnostic and, if
    /// not at `EOF`, advances past whatever token is there — the
    /// "best-effort advance" error recovery the grammar calls for.
    fn expect(&mut self, kind: TokenKind, what: &str) {
        if self.check(kind) {
            self.advance();
        } else {
            let loc = self.current().loc();
            self.diags.warn(loc, format!("expected {} here", what));
            if !self.at_eof() {
                self.advance();
            }
        }
    }

    /// Consumes a closing `)` if present; otherwise leaves the cursor
    /// alone. A missing close paren is explicitly tolerated, not an error.
    fn expect_rparen_soft(&mut self) {
        if self.check(TokenKind::RParen) {
            self.advance();
        }
    }

    fn expect_ident(&mut self) -> String {
        if self.check(TokenKind::Ident) {
            self.advance().lexeme
        } else {
            let loc = self.current().loc();
            self.diags.warn(loc, "expected an identifier here");
            if !self.at_eof() {
                self.advance();
            }
            String::new()
        }
    }

    // === Statements ===

    fn statement(&mut self) -> Option<Stmt> {
        match self.kind() {
            TokenKind::Let => Some(self.let_stmt()),
            TokenKind::Print => Some(self.print_stmt()),
            TokenKind::When => Some(self.when_stmt()),
            TokenKind::Repeat => Some(self.repeat_stmt()),
            TokenKind::Loop => self.loop_stmt(),
            TokenKind::Label => Some(self.label_stmt()),
            TokenKind::Goto => Some(self.goto_stmt()),
            _ => {
                let loc = self.current().loc();
                let lexeme = self.advance().lexeme;
                self.diags.warn(loc, format!("unexpected token: '{}'", lexeme));
                None
            }
        }
    }

    fn let_stmt(&mut self) -> Stmt {
        self.advance(); // 'let'
        let name = self.expect_ident();
        self.expect(TokenKind::Assign, "'='");
        let value = self.expression();
        Stmt::Let { name, value }
    }

    fn print_stmt(&mut self) -> Stmt {
        self.advance(); // 'print'
        Stmt::Print(self.expression())
    }

    fn when_stmt(&mut self) -> Stmt {
        self.advance(); // 'when'
        let cond = self.expression();
        self.expect(TokenKind::ArrowRight, "'->'");
        let then_block = self.block();
        let else_block = if self.check(TokenKind::Otherwise) {
            self.advance();
            self.expect(TokenKind::ArrowRight, "'->'");
            Some(self.block())
        } else {
            None
        };
        Stmt::When { cond, then_block, else_block }
    }

    fn repeat_stmt(&mut self) -> Stmt {
        self.advance(); // 'repeat'
        let count = self.expression();
        if self.check(TokenKind::Times) {
            self.advance();
        }
        self.expect(TokenKind::ArrowRight, "'->'");
        let body = self.block();
        Stmt::Repeat { count, body }
    }

    /// Returns `None` when neither `while` nor `from` follows `loop` — a
    /// syntactic fault with no well-formed loop kind to recover into.
    fn loop_stmt(&mut self) -> Option<Stmt> {
        self.advance(); // 'loop'
        match self.kind() {
            TokenKind::While => Some(self.while_form()),
            TokenKind::From => Some(self.for_form()),
            _ => {
                let loc = self.current().loc();
                self.diags.warn(loc, "expected 'while' or 'from' after 'loop'");
                None
            }
        }
    }

    fn while_form(&mut self) -> Stmt {
        self.advance(); // 'while'
        let cond = self.expression();
        self.expect(TokenKind::ArrowRight, "'->'");
        let body = self.block();
        Stmt::LoopWhile { cond, body }
    }

    fn for_form(&mut self) -> Stmt {
        self.advance(); // 'from'
        let var = self.expect_ident();
        self.expect(TokenKind::Assign, "'='");
        let start = self.expression();
        self.expect(TokenKind::To, "'to'");
        let end = self.expression();
        self.expect(TokenKind::ArrowRight, "'->'");
        let body = self.block();
        Stmt::LoopFor { var, start, end, body }
    }

    fn label_stmt(&mut self) -> Stmt {
        self.advance(); // 'label'
        Stmt::Label(self.expect_ident())
    }

    fn goto_stmt(&mut self) -> Stmt {
        self.advance(); // 'goto'
        Stmt::Goto(self.expect_ident())
    }

    /// A run of statements terminated by `<-`. Reaching `EOF` first ends
    /// the block silently, with no diagnostic.
    fn block(&mut self) -> Block {
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !self.check(TokenKind::ArrowLeft) && !self.at_eof() {
            if let Some(stmt) = self.statement() {
                stmts.push(stmt);
            }
            self.skip_newlines();
        }
        if self.check(TokenKind::ArrowLeft) {
            self.advance();
        }
        stmts
    }

    // === Expressions ===
    //
    // Three cascading tiers, tightest precedence last: comparison defers to
    // term, term defers to factor, factor defers to primary. No newline
    // skipping happens anywhere in this section.

    fn expression(&mut self) -> Expr {
        self.comparison()
    }

    fn comparison(&mut self) -> Expr {
        let mut left = self.term();
        loop {
            let op = match self.kind() {
                TokenKind::Eq => BinOp::Eq,
                TokenKind::NotEq => BinOp::NotEq,
                TokenKind::Less => BinOp::Less,
                TokenKind::More => BinOp::More,
                TokenKind::LessEq => BinOp::LessEq,
                TokenKind::MoreEq => BinOp::MoreEq,
                _ => break,
            };
            self.advance();
            let right = self.term();
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        left
    }

    fn term(&mut self) -> Expr {
        let mut left = self.factor();
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.factor();
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        left
    }

    fn factor(&mut self) -> Expr {
        let mut left = self.primary();
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.primary();
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        left
    }

    fn primary(&mut self) -> Expr {
        match self.kind() {
            TokenKind::Minus => {
                self.advance();
                Expr::Unary(UnOp::Neg, Box::new(self.primary()))
            }
            TokenKind::Number => Expr::Number(self.advance().lexeme),
            TokenKind::Str => Expr::Str(self.advance().lexeme),
            TokenKind::Input => {
                self.advance();
                Expr::Input(self.optional_prompt())
            }
            TokenKind::InputNum => {
                self.advance();
                Expr::InputNum(self.optional_prompt())
            }
            TokenKind::Random | TokenKind::Sqrt | TokenKind::Pow
            | TokenKind::Abs | TokenKind::Floor | TokenKind::Ceil => self.builtin_call(),
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression();
                self.expect_rparen_soft();
                inner
            }
            TokenKind::Ident => Expr::Ident(self.advance().lexeme),
            _ => {
                let loc = self.current().loc();
                let lexeme = self.advance().lexeme;
                self.diags.warn(loc, format!("unexpected token in expression: '{}'", lexeme));
                Expr::Number("0".to_string())
            }
        }
    }

    /// `[ '(' [expression] ')' ]` after `input` or `input_num`.
    fn optional_prompt(&mut self) -> Option<Box<Expr>> {
        if !self.check(TokenKind::LParen) {
            return None;
        }
        self.advance();
        let prompt = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(Box::new(self.expression()))
        };
        self.expect_rparen_soft();
        prompt
    }

    fn builtin_call(&mut self) -> Expr {
        let builtin = match self.kind() {
            TokenKind::Random => Builtin::Random,
            TokenKind::Sqrt => Builtin::Sqrt,
            TokenKind::Pow => Builtin::Pow,
            TokenKind::Abs => Builtin::Abs,
            TokenKind::Floor => Builtin::Floor,
            TokenKind::Ceil => Builtin::Ceil,
            _ => unreachable!("builtin_call only entered from a builtin token"),
        };
        self.advance();
        self.expect(TokenKind::LParen, "'('");
        let mut args = Vec::with_capacity(builtin.arity());
        args.push(self.expression());
        for _ in 1..builtin.arity() {
            self.expect(TokenKind::Comma, "','");
            args.push(self.expression());
        }
        self.expect_rparen_soft();
        Expr::Call(builtin, args)
    }
}

/// Parses `tokens` into a `Program`, reporting syntactic faults through
/// `diags`.
pub fn parse(tokens: Vec<Token>, diags: &mut Diagnostics) -> Program {
    Parser::new(tokens, diags).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_src(src: &str) -> Program {
        let mut diags = Diagnostics::new("test.flow");
        let tokens = tokenize(src, &mut diags);
        parse(tokens, &mut diags)
    }

    #[test]
    fn parses_let_with_arithmetic_precedence() {
        let program = parse_src("let x = 2 + 3 * 4\n");
        assert_eq!(program.stmts.len(), 1);
        match &program.stmts[0] {
            Stmt::Let { name, value } => {
                assert_eq!(name, "x");
                match value {
                    Expr::Binary(BinOp::Add, left, right) => {
                        assert!(matches!(left.as_ref(), Expr::Number(n) if n == "2"));
                        assert!(matches!(right.as_ref(), Expr::Binary(BinOp::Mul, ..)));
                    }
                    other => panic!("expected top-level Add, got {:?}", other),
                }
            }
            other => panic!("expected Let, got {:?}", other),
        }
    }

    #[test]
    fn unary_minus_binds_to_first_operand_only() {
        let program = parse_src("let x = -a + b\n");
        match &program.stmts[0] {
            Stmt::Let { value: Expr::Binary(BinOp::Add, left, right), .. } => {
                assert!(matches!(left.as_ref(), Expr::Unary(UnOp::Neg, _)));
                assert!(matches!(right.as_ref(), Expr::Ident(n) if n == "b"));
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn parses_when_with_otherwise() {
        let program = parse_src("when 0 ->\nprint \"a\"\n<- otherwise ->\nprint \"b\"\n<-\n");
        match &program.stmts[0] {
            Stmt::When { then_block, else_block, .. } => {
                assert_eq!(then_block.len(), 1);
                assert!(else_block.is_some());
                assert_eq!(else_block.as_ref().unwrap().len(), 1);
            }
            other => panic!("expected When, got {:?}", other),
        }
    }

    #[test]
    fn parses_loop_for_form() {
        let program = parse_src("loop from i = 1 to 3 ->\nprint i\n<-\n");
        match &program.stmts[0] {
            Stmt::LoopFor { var, body, .. } => {
                assert_eq!(var, "i");
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected LoopFor, got {:?}", other),
        }
    }

    #[test]
    fn parses_repeat_with_optional_times() {
        let program = parse_src("repeat 3 times ->\nprint 1\n<-\n");
        assert!(matches!(program.stmts[0], Stmt::Repeat { .. }));

        let program = parse_src("repeat 3 ->\nprint 1\n<-\n");
        assert!(matches!(program.stmts[0], Stmt::Repeat { .. }));
    }

    #[test]
    fn parses_builtin_calls_with_correct_arity() {
        let program = parse_src("print random(1, 6)\n");
        match &program.stmts[0] {
            Stmt::Print(Expr::Call(Builtin::Random, args)) => assert_eq!(args.len(), 2),
            other => panic!("expected Call(Random, ..), got {:?}", other),
        }
    }

    #[test]
    fn missing_closing_paren_is_tolerated() {
        // No panic, no infinite loop; a best-effort tree comes back.
        let program = parse_src("print sqrt(4\n");
        assert_eq!(program.stmts.len(), 1);
    }

    #[test]
    fn block_unterminated_by_eof_ends_silently() {
        let program = parse_src("when 1 ->\nprint 1\n");
        match &program.stmts[0] {
            Stmt::When { then_block, .. } => assert_eq!(then_block.len(), 1),
            other => panic!("expected When, got {:?}", other),
        }
    }

    #[test]
    fn goto_inside_loop_body_still_parses_as_a_plain_goto() {
        let program = parse_src(
            "label start\nloop while 1 ->\ngoto start\n<-\n",
        );
        assert_eq!(program.stmts.len(), 2);
        match &program.stmts[1] {
            Stmt::LoopWhile { body, .. } => {
                assert!(matches!(body[0], Stmt::Goto(ref s) if s == "start"));
            }
            other => panic!("expected LoopWhile, got {:?}", other),
        }
    }

    #[test]
    fn parser_is_total_over_an_empty_program() {
        let program = parse_src("");
        assert!(program.stmts.is_empty());
    }

    #[test]
    fn unexpected_token_is_skipped_and_parsing_continues() {
        let mut diags = Diagnostics::new("test.flow");
        let tokens = tokenize(") let x = 1\n", &mut diags);
        let program = parse(tokens, &mut diags);
        assert_eq!(program.stmts.len(), 1);
        assert!(diags.warning_count() >= 1);
    }
}
