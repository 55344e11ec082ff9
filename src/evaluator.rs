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

//! Tree-walking evaluation of a parsed `Program`.
//!
//! Two passes. The first walks only the top-level statements and records
//! where each `label` sits; the second executes them, and a `goto` anywhere
//! below the top level propagates upward as a [`Flow::Jump`] value until it
//! reaches the dispatcher that owns the label index. Every statement- and
//! block-executing function returns `Flow` for exactly this reason — the
//! alternative, a non-local exit that every loop frame would have to catch
//! and rethrow, buys nothing here and hides the propagation in control flow
//! a reader can't see in the function signature.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ast::{BinOp, Block, Builtin, Expr, Program, Stmt, UnOp};
use crate::diagnostics::Diagnostics;
use crate::util::Location;
use crate::value::Value;

/// The pending-jump control signal threaded back out of every statement
/// execution. `Normal` means "proceed to the next statement in this
/// sequence"; `Jump` means "a goto is unresolved, unwind this sequence and
/// hand control to whoever owns the label index."
#[derive(Debug)]
enum Flow {
    Normal,
    Jump(String),
}

/// Holds everything the evaluator needs that production normally derives
/// from the environment, but that a test might want to fix: the random
/// seed and the stdin source. See `SPEC_FULL.md` §10.3.
pub struct Interpreter<R: BufRead> {
    env: HashMap<String, Value>,
    rng: StdRng,
    stdin: R,
    diags: Diagnostics,
}

impl<R: BufRead> Interpreter<R> {
    /// Builds an interpreter reading from `stdin`. `seed` fixes the random
    /// source for reproducible runs; `None` falls back to wall-clock time.
    pub fn new(stdin: R, diags: Diagnostics, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });
        Self {
            env: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
            stdin,
            diags,
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diags
    }

    /// Runs a whole program: indexes labels, then executes from the top.
    pub fn run(&mut self, program: &Program) {
        let labels = Self::index_labels(&program.stmts);
        self.run_top_level(&program.stmts, &labels);
    }

    /// First pass: records the position of every top-level `Label`. Labels
    /// nested inside loop bodies or conditional branches are invisible to
    /// this index and so can never be a goto target.
    fn index_labels(stmts: &[Stmt]) -> HashMap<String, usize> {
        let mut labels = HashMap::new();
        for (i, stmt) in stmts.iter().enumerate() {
            if let Stmt::Label(name) = stmt {
                labels.insert(name.clone(), i);
            }
        }
        labels
    }

    /// Second pass: the top-level dispatcher. Owns the only cursor able to
    /// resolve a jump, per the grammar's "label resolution targets
    /// top-level statements only" invariant.
    fn run_top_level(&mut self, stmts: &[Stmt], labels: &HashMap<String, usize>) {
        let mut cursor = 0usize;
        while cursor < stmts.len() {
            match self.exec(&stmts[cursor]) {
                Flow::Normal => cursor += 1,
                Flow::Jump(target) => match labels.get(&target) {
                    Some(&index) => cursor = index,
                    None => {
                        self.diags.error(Location::UNKNOWN, format!("unknown label: '{}'", target));
                        cursor += 1;
                    }
                },
            }
        }
    }

    /// Executes a block (or any statement sequence below the top level),
    /// stopping early and propagating the first unresolved jump.
    fn run_block(&mut self, stmts: &Block) -> Flow {
        for stmt in stmts {
            match self.exec(stmt) {
                Flow::Normal => {}
                jump @ Flow::Jump(_) => return jump,
            }
        }
        Flow::Normal
    }

    fn exec(&mut self, stmt: &Stmt) -> Flow {
        match stmt {
            Stmt::Let { name, value } => {
                let v = self.eval(value);
                self.env.insert(name.clone(), v);
                Flow::Normal
            }
            Stmt::Print(expr) => {
                let v = self.eval(expr);
                println!("{}", v);
                Flow::Normal
            }
            Stmt::When { cond, then_block, else_block } => {
                if self.eval(cond).truthy() {
                    self.run_block(then_block)
                } else if let Some(else_block) = else_block {
                    self.run_block(else_block)
                } else {
                    Flow::Normal
                }
            }
            Stmt::Repeat { count, body } => {
                let n = self.eval(count);
                let n = Self::truncate(&n);
                for _ in 0..n.max(0) {
                    match self.run_block(body) {
                        Flow::Normal => {}
                        jump @ Flow::Jump(_) => return jump,
                    }
                }
                Flow::Normal
            }
            Stmt::LoopWhile { cond, body } => {
                while self.eval(cond).truthy() {
                    match self.run_block(body) {
                        Flow::Normal => {}
                        jump @ Flow::Jump(_) => return jump,
                    }
                }
                Flow::Normal
            }
            Stmt::LoopFor { var, start, end, body } => {
                let start = self.numeric(start);
                let end = self.numeric(end);
                let mut i = start;
                while i <= end {
                    self.env.insert(var.clone(), Value::Number(i));
                    match self.run_block(body) {
                        Flow::Normal => {}
                        jump @ Flow::Jump(_) => return jump,
                    }
                    i += 1.0;
                }
                Flow::Normal
            }
            Stmt::Label(_) => Flow::Normal,
            Stmt::Goto(target) => Flow::Jump(target.clone()),
        }
    }

    /// Truncates a Value toward zero as a signed integer, per `repeat`'s
    /// count semantics.
    fn truncate(v: &Value) -> i64 {
        match v {
            Value::Number(n) => *n as i64,
            Value::Str(_) => 0,
        }
    }

    fn numeric(&mut self, expr: &Expr) -> f64 {
        match self.eval(expr) {
            Value::Number(n) => n,
            Value::Str(_) => 0.0,
        }
    }

    fn eval(&mut self, expr: &Expr) -> Value {
        match expr {
            Expr::Number(lexeme) => match lexeme.parse::<f64>() {
                Ok(n) => Value::Number(n),
                Err(_) => {
                    self.diags.error(Location::UNKNOWN, format!("malformed number literal: '{}'", lexeme));
                    Value::Number(0.0)
                }
            },
            Expr::Str(s) => Value::Str(s.clone()),
            Expr::Ident(name) => match self.env.get(name) {
                Some(v) => v.clone(),
                None => {
                    self.diags.error(Location::UNKNOWN, format!("undefined variable: '{}'", name));
                    Value::Number(0.0)
                }
            },
            Expr::Unary(UnOp::Neg, operand) => match self.eval(operand) {
                Value::Number(n) => Value::Number(-n),
                Value::Str(_) => {
                    self.diags.error(Location::UNKNOWN, "cannot negate a string");
                    Value::Number(0.0)
                }
            },
            Expr::Binary(op, left, right) => {
                let l = self.eval(left);
                let r = self.eval(right);
                self.eval_binary(*op, l, r)
            }
            Expr::Input(prompt) => {
                self.prompt(prompt);
                Value::Str(self.read_line())
            }
            Expr::InputNum(prompt) => {
                self.prompt(prompt);
                let line = self.read_line();
                match line.trim().parse::<f64>() {
                    Ok(n) => Value::Number(n),
                    Err(_) => {
                        self.diags.error(Location::UNKNOWN, format!("not a number: '{}'", line));
                        Value::Number(0.0)
                    }
                }
            }
            Expr::Call(builtin, args) => self.eval_builtin(*builtin, args),
        }
    }

    fn prompt(&mut self, prompt: &Option<Box<Expr>>) {
        if let Some(expr) = prompt {
            let v = self.eval(expr);
            print!("{}", v);
            let _ = io::stdout().flush();
        }
    }

    fn read_line(&mut self) -> String {
        let mut line = String::new();
        if self.stdin.read_line(&mut line).is_err() {
            return String::new();
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        line
    }

    fn eval_binary(&mut self, op: BinOp, l: Value, r: Value) -> Value {
        use Value::*;

        if op == BinOp::Add && (matches!(&l, Str(_)) || matches!(&r, Str(_))) {
            return Str(format!("{}{}", Self::concat_repr(&l), Self::concat_repr(&r)));
        }

        match (l, r) {
            (Str(a), Str(b)) => match op {
                BinOp::Eq => Self::bool_value(a == b),
                BinOp::NotEq => Self::bool_value(a != b),
                _ => {
                    self.diags.error(Location::UNKNOWN, format!("operator not defined for two strings: {:?}", op));
                    Number(0.0)
                }
            },
            (Number(a), Number(b)) => match op {
                BinOp::Add => Number(a + b),
                BinOp::Sub => Number(a - b),
                BinOp::Mul => Number(a * b),
                BinOp::Div => Number(a / b),
                BinOp::Mod => {
                    let (ia, ib) = (a as i64, b as i64);
                    if ib == 0 {
                        self.diags.error(Location::UNKNOWN, "modulo by zero");
                        Number(0.0)
                    } else {
                        Number((ia % ib) as f64)
                    }
                }
                BinOp::Eq => Self::bool_value(a == b),
                BinOp::NotEq => Self::bool_value(a != b),
                BinOp::Less => Self::bool_value(a < b),
                BinOp::More => Self::bool_value(a > b),
                BinOp::LessEq => Self::bool_value(a <= b),
                BinOp::MoreEq => Self::bool_value(a >= b),
            },
            _ => {
                self.diags.error(Location::UNKNOWN, format!("type mismatch in operator: {:?}", op));
                Number(0.0)
            }
        }
    }

    fn bool_value(b: bool) -> Value {
        Value::Number(if b { 1.0 } else { 0.0 })
    }

    /// The decimal form a numeric operand takes when coerced into a `+`
    /// string concatenation: integer-truncated, per the concatenation rule.
    fn concat_repr(v: &Value) -> String {
        match v {
            Value::Str(s) => s.clone(),
            Value::Number(n) => format!("{}", *n as i64),
        }
    }

    fn eval_builtin(&mut self, builtin: Builtin, args: &[Expr]) -> Value {
        let nums: Vec<f64> = args.iter().map(|a| self.eval_numeric_arg(a)).collect();
        match builtin {
            Builtin::Random => {
                let lo = nums.first().copied().unwrap_or(0.0) as i64;
                let hi = nums.get(1).copied().unwrap_or(0.0) as i64;
                let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
                Value::Number(self.rng.gen_range(lo..=hi) as f64)
            }
            Builtin::Sqrt => Value::Number(nums.first().copied().unwrap_or(0.0).sqrt()),
            Builtin::Pow => Value::Number(nums.first().copied().unwrap_or(0.0).powf(nums.get(1).copied().unwrap_or(0.0))),
            Builtin::Abs => Value::Number(nums.first().copied().unwrap_or(0.0).abs()),
            Builtin::Floor => Value::Number(nums.first().copied().unwrap_or(0.0).floor()),
            Builtin::Ceil => Value::Number(nums.first().copied().unwrap_or(0.0).ceil()),
        }
    }

    /// Evaluates an argument expected to be numeric; a string argument is a
    /// type-mismatch fault that yields zero, per every builtin's contract.
    fn eval_numeric_arg(&mut self, expr: &Expr) -> f64 {
        match self.eval(expr) {
            Value::Number(n) => n,
            Value::Str(s) => {
                self.diags.error(Location::UNKNOWN, format!("expected a number, found string: '{}'", s));
                0.0
            }
        }
    }
}

/// Builds an interpreter over the process's real stdin and executes
/// `program` against it.
pub fn run_with_stdin(program: &Program, diags: Diagnostics, seed: Option<u64>) -> Diagnostics {
    let stdin = io::stdin();
    let mut interp = Interpreter::new(stdin.lock(), diags, seed);
    interp.run(program);
    interp.diags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use std::io::Cursor;

    fn run(src: &str, stdin: &str, seed: u64) -> (Interpreter<Cursor<Vec<u8>>>, ()) {
        let mut diags = Diagnostics::new("test.flow");
        let tokens = tokenize(src, &mut diags);
        let program = parse(tokens, &mut diags);
        let cursor = Cursor::new(stdin.as_bytes().to_vec());
        let mut interp = Interpreter::new(cursor, diags, Some(seed));
        interp.run(&program);
        (interp, ())
    }

    fn env_number(interp: &Interpreter<Cursor<Vec<u8>>>, name: &str) -> f64 {
        match interp.env.get(name) {
            Some(Value::Number(n)) => *n,
            other => panic!("expected Number in '{}', got {:?}", name, other),
        }
    }

    #[test]
    fn precedence_matches_reference_evaluation() {
        let (interp, _) = run("let x = 2 + 3 * 4\n", "", 1);
        assert_eq!(env_number(&interp, "x"), 14.0);
    }

    #[test]
    fn string_concatenation_coerces_numbers_to_truncated_decimal() {
        let (interp, _) = run("let s = \"hi\"\nlet s = s + 1\n", "", 1);
        match interp.env.get("s") {
            Some(Value::Str(s)) => assert_eq!(s, "hi1"),
            other => panic!("expected Str, got {:?}", other),
        }
    }

    #[test]
    fn loop_for_executes_inclusive_range_and_binds_counter() {
        let (interp, _) = run("loop from i = 1 to 3 ->\nlet last = i\n<-\n", "", 1);
        assert_eq!(env_number(&interp, "last"), 3.0);
    }

    #[test]
    fn loop_for_with_start_greater_than_end_never_executes() {
        let (interp, _) = run("let ran = 0\nloop from i = 3 to 1 ->\nlet ran = 1\n<-\n", "", 1);
        assert_eq!(env_number(&interp, "ran"), 0.0);
    }

    #[test]
    fn repeat_executes_truncated_count_times() {
        let (interp, _) = run("let n = 0\nrepeat 3.9 times ->\nlet n = n + 1\n<-\n", "", 1);
        assert_eq!(env_number(&interp, "n"), 3.0);
    }

    #[test]
    fn repeat_with_nonpositive_count_never_executes() {
        let (interp, _) = run("let n = 0\nrepeat 0 times ->\nlet n = 99\n<-\n", "", 1);
        assert_eq!(env_number(&interp, "n"), 0.0);
    }

    #[test]
    fn truthiness_is_uniform_across_when_and_loop_while() {
        let (interp, _) = run(
            "let a = 0\nwhen \"\" -> let a = 1 <- otherwise -> let a = 2 <-\n",
            "",
            1,
        );
        assert_eq!(env_number(&interp, "a"), 2.0);

        let (interp, _) = run(
            "let n = 3\nlet count = 0\nloop while n -> let count = count + 1\nlet n = n - 1\n<-\n",
            "",
            1,
        );
        assert_eq!(env_number(&interp, "count"), 3.0);
    }

    #[test]
    fn goto_transfers_control_and_terminates_enclosing_loop() {
        let (interp, _) = run(
            "label start\nlet i = 0\nlabel again\nlet i = i + 1\nwhen i < 3 -> goto again <-\n",
            "",
            1,
        );
        assert_eq!(env_number(&interp, "i"), 3.0);
    }

    #[test]
    fn goto_inside_a_loop_body_stops_that_loop() {
        let src = "let n = 0\nloop while 1 ->\nlet n = n + 1\nwhen n == 2 -> goto done <-\n<-\nlabel done\nlet n = 99\n";
        let (interp, _) = run(src, "", 1);
        assert_eq!(env_number(&interp, "n"), 99.0);
    }

    #[test]
    fn goto_to_unknown_label_reports_a_diagnostic_and_continues() {
        let (interp, _) = run("goto nowhere\nlet reached = 1\n", "", 1);
        assert_eq!(env_number(&interp, "reached"), 1.0);
        assert_eq!(interp.diagnostics().error_count(), 1);
    }

    #[test]
    fn undefined_variable_yields_zero_and_a_diagnostic() {
        let (interp, _) = run("let x = y + 1\n", "", 1);
        assert_eq!(env_number(&interp, "x"), 1.0);
        assert_eq!(interp.diagnostics().error_count(), 1);
    }

    #[test]
    fn modulo_by_zero_is_a_fault_not_a_panic() {
        let (interp, _) = run("let x = 5 % 0\n", "", 1);
        assert_eq!(env_number(&interp, "x"), 0.0);
        assert_eq!(interp.diagnostics().error_count(), 1);
    }

    #[test]
    fn division_by_zero_follows_ieee754() {
        let (interp, _) = run("let x = 5 / 0\n", "", 1);
        assert_eq!(env_number(&interp, "x"), f64::INFINITY);
    }

    #[test]
    fn random_result_is_within_the_requested_inclusive_range() {
        for seed in 0..20 {
            let (interp, _) = run("let x = random(1, 6)\n", "", seed);
            let v = env_number(&interp, "x");
            assert!((1.0..=6.0).contains(&v));
        }
    }

    #[test]
    fn input_reads_one_line_and_strips_the_terminator() {
        let (interp, _) = run("let name = input\n", "alice\n", 1);
        match interp.env.get("name") {
            Some(Value::Str(s)) => assert_eq!(s, "alice"),
            other => panic!("expected Str, got {:?}", other),
        }
    }

    #[test]
    fn input_num_parses_the_line_as_a_number() {
        let (interp, _) = run("let n = input_num\n", "42\n", 1);
        assert_eq!(env_number(&interp, "n"), 42.0);
    }

    #[test]
    fn input_num_on_unparseable_text_yields_zero_and_a_diagnostic() {
        let (interp, _) = run("let n = input_num\n", "abc\n", 1);
        assert_eq!(env_number(&interp, "n"), 0.0);
        assert_eq!(interp.diagnostics().error_count(), 1);
    }

    #[test]
    fn variables_persist_across_loop_and_conditional_boundaries() {
        let (interp, _) = run(
            "let x = 0\nwhen 1 -> let x = 5 <-\nloop from i = 1 to 1 -> let x = x + 1 <-\n",
            "",
            1,
        );
        assert_eq!(env_number(&interp, "x"), 6.0);
    }

    #[test]
    fn end_to_end_scenario_fibonacci_like_countdown() {
        let (interp, _) = run(
            "let n = 3\nloop while n > 0 ->\nlet n = n - 1\n<-\n",
            "",
            1,
        );
        assert_eq!(env_number(&interp, "n"), 0.0);
    }
}
