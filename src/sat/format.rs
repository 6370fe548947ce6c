#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Textual output in the conventions of SAT competition tooling.
//!
//! Kept apart from the data structures so that formatting concerns do not
//! mix with solver internals.

use crate::sat::assignment::{Assignment, VarState};
use crate::sat::clause::Clause;
use crate::sat::formula::Formula;
use crate::sat::literal::Literal;
use crate::sat::solver::SolverStatus;
use itertools::Itertools;
use std::fmt::{Display, Formatter, Result};

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}", self.get())
    }
}

impl Display for Clause {
    /// Space-separated literals followed by the `0` terminator.
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for literal in self {
            write!(f, "{literal} ")?;
        }
        write!(f, "{}", Literal::TERMINATOR)
    }
}

impl Display for Formula {
    /// DIMACS rendition: preamble, then one clause per line.
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "p cnf {} {}", self.num_variables(), self.len())?;
        for clause in self {
            write!(f, "\n{clause}")?;
        }
        Ok(())
    }
}

impl Display for Assignment {
    /// Signed integers of the assigned variables, space-separated.
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let assigned = self
            .iter()
            .filter_map(|(variable, state)| match state {
                VarState::Assigned(value) => Some(Literal::new(variable, value)),
                VarState::Unassigned => None,
            })
            .join(" ");
        write!(f, "{assigned}")
    }
}

impl Display for SolverStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let name = match self {
            Self::Unknown => "UNKNOWN",
            Self::Solving => "SOLVING",
            Self::Satisfied => "SATISFIABLE",
            Self::Unsatisfied => "UNSATISFIABLE",
        };
        write!(f, "{name}")
    }
}

/// Solver verdict in competition output format: an `s` status line, plus a
/// `v` model line when satisfied and model output is enabled.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    status: SolverStatus,
    assignment: &'a Assignment,
    include_model: bool,
}

impl<'a> Report<'a> {
    #[must_use]
    pub const fn new(status: SolverStatus, assignment: &'a Assignment, include_model: bool) -> Self {
        Self {
            status,
            assignment,
            include_model,
        }
    }
}

impl Display for Report<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "s {}", self.status)?;
        if self.status == SolverStatus::Satisfied && self.include_model {
            write!(f, "\nv {} {}", self.assignment, Literal::TERMINATOR)?;
        }
        Ok(())
    }
}
