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

mod ast;
mod diagnostics;
mod evaluator;
mod lexer;
mod parser;
mod token;
mod util;
mod value;

use std::env;
use std::fs;
use std::process::ExitCode;

use diagnostics::Diagnostics;

/// The name of the interpreter binary, used in usage text.
pub const PROGRAM_NAME: &str = "flow";

fn main() -> ExitCode {
    let mut args = env::args();
    args.next(); // argv[0]

    let Some(path) = args.next() else {
        eprintln!("Usage: {} <filename.flow>", PROGRAM_NAME);
        return ExitCode::FAILURE;
    };

    let source = match fs::read_to_string(&path) {
        Ok(source) => source,
        Err(_) => {
            eprintln!("Could not open file: {}", path);
            return ExitCode::FAILURE;
        }
    };

    let seed = env::var("FLOW_SEED").ok().and_then(|s| s.parse::<u64>().ok());

    let mut diags = Diagnostics::new(path);
    let tokens = lexer::tokenize(&source, &mut diags);
    let program = parser::parse(tokens, &mut diags);
    evaluator::run_with_stdin(&program, diags, seed);

    // Diagnostics never affect the exit code (§6/§7): a run that completes
    // exits zero regardless of how many lexical, syntactic, or semantic
    // faults it reported along the way.
    ExitCode::SUCCESS
}

