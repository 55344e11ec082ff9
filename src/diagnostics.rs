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

//! Non-fatal diagnostic reporting.
//!
//! Lexical, syntactic, and semantic faults never abort a run (host errors
//! do, but those are reported directly by the driver in `main`, not through
//! this module). Every fault reported here writes one colorized line to
//! standard error and the interpreter carries on.

use std::fmt::Display;

use colored::Colorize;

use crate::util::Location;

/// Severity of a non-fatal diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Severity {
    /// A lexical or syntactic problem; the offending token was skipped or a
    /// partial tree was produced.
    Warning,

    /// A semantic runtime fault; a safe default value was substituted.
    Error,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error   => "error",
        }
    }
}

/// Reports diagnostics for a single interpreter run and tallies them by
/// severity.
///
/// The tally exists for visibility only — per the interpreter's error
/// policy, no count here ever changes the process exit status.
#[derive(Debug)]
pub struct Diagnostics {
    path: String,
    warning_count: u32,
    error_count: u32,
}

impl Diagnostics {
    /// Creates a reporter for the source file at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            warning_count: 0,
            error_count: 0,
        }
    }

    pub fn warning_count(&self) -> u32 {
        self.warning_count
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Reports a lexical or syntactic fault at `loc`.
    pub fn warn(&mut self, loc: Location, message: impl Display) {
        self.warning_count += 1;
        self.report(Severity::Warning, loc, message);
    }

    /// Reports a semantic runtime fault at `loc`.
    pub fn error(&mut self, loc: Location, message: impl Display) {
        self.error_count += 1;
        self.report(Severity::Error, loc, message);
    }

    fn report(&self, severity: Severity, loc: Location, message: impl Display) {
        let prefix = format!("{}:{}: {}:", self.path, loc, severity.label());
        let prefix = match severity {
            Severity::Warning => prefix.yellow(),
            Severity::Error   => prefix.red(),
        };
        eprintln!("{} {}", prefix, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_start_at_zero() {
        let diags = Diagnostics::new("test.flow");
        assert_eq!(diags.warning_count(), 0);
        assert_eq!(diags.error_count(), 0);
    }

    #[test]
    fn warn_increments_warning_count() {
        let mut diags = Diagnostics::new("test.flow");
        diags.warn(Location::at_line(3), "unknown character: '@'");
        assert_eq!(diags.warning_count(), 1);
        assert_eq!(diags.error_count(), 0);
    }

    #[test]
    fn error_increments_error_count() {
        let mut diags = Diagnostics::new("test.flow");
        diags.error(Location::at_line(7), "undefined variable: x");
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.warning_count(), 0);
    }
}
