#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Chronological DPLL search.
//!
//! Not competitive on its own, but it shares the propagation machinery with
//! the CDCL engine and makes a useful reference oracle for debugging.

use crate::sat::assignment::{Assignment, VarState};
use crate::sat::clause::Clause;
use crate::sat::formula::Formula;
use crate::sat::literal::Literal;
use crate::sat::solver::{Incremental, Propagation, Solver, SolverCore, SolverStatus};
use crate::sat::trail::Reason;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// DPLL solver over an owned formula.
#[derive(Debug)]
pub struct DpllSolver {
    core: SolverCore,
}

impl DpllSolver {
    /// Version string reported by the command line front end.
    pub const SIGNATURE: &'static str = concat!("ferrosat (DPLL) v", env!("CARGO_PKG_VERSION"));

    #[must_use]
    pub fn new(formula: Formula) -> Self {
        Self {
            core: SolverCore::new(formula),
        }
    }

    /// Registers a predicate polled at the interrupt safe points.
    pub fn interrupt_on(&mut self, predicate: impl FnMut() -> bool + 'static) {
        self.core.interrupt_on(predicate);
    }

    fn solve_impl(&mut self) -> SolverStatus {
        loop {
            if self.core.interrupted() {
                return SolverStatus::Unknown;
            }

            match self.core.unit_propagation() {
                Propagation::Satisfied => return SolverStatus::Satisfied,
                Propagation::Conflict(_) => {
                    if !self.backtrack() {
                        return SolverStatus::Unsatisfied;
                    }
                }
                Propagation::Pass => {
                    if let Some(pending) = self.core.take_pending() {
                        if !self.core.perform_pending(pending) {
                            return SolverStatus::Unsatisfied;
                        }
                    } else if !self.decide() {
                        return SolverStatus::Unsatisfied;
                    }
                }
            }
        }
    }

    /// Undoes the trail down to the most recent decision and flips it,
    /// recording the flip as a propagation at the remaining level. `false`
    /// when no decision is left to flip.
    fn backtrack(&mut self) -> bool {
        loop {
            let Some(entry) = self.core.trail.top() else {
                return false;
            };
            let (variable, value, reason) = (entry.variable, entry.value, entry.reason);
            self.core.trail.pop();

            if reason == Reason::Decision {
                self.core.trail.propagation(variable, !value);
                self.core.assign(variable, VarState::Assigned(!value));
                return true;
            }
            self.core.assign(variable, VarState::Unassigned);
        }
    }

    /// Branches on the highest-indexed unassigned variable, trying true
    /// first.
    fn decide(&mut self) -> bool {
        for variable in (1..=self.core.formula.num_variables()).rev() {
            if self.core.assignment.value(variable).is_unassigned() {
                self.core.trail.decision(variable, true);
                self.core.assign(variable, VarState::Assigned(true));
                return true;
            }
        }
        false
    }
}

impl Solver for DpllSolver {
    fn solve(&mut self) -> SolverStatus {
        self.solve_with_assumptions(&[])
    }

    fn solve_with_assumptions(&mut self, assumptions: &[Literal]) -> SolverStatus {
        if self.core.needs_reset() {
            self.core.reset_state();
        }
        self.core.begin_solve();
        self.core.save_assumptions(assumptions);

        let status = self.solve_impl();
        self.core.set_status(status);
        status
    }

    fn status(&self) -> SolverStatus {
        self.core.status()
    }

    fn formula(&self) -> &Formula {
        &self.core.formula
    }

    fn assignment(&self) -> &Assignment {
        &self.core.assignment
    }

    fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.core.interrupt_handle()
    }
}

impl Incremental for DpllSolver {
    fn append_clause(&mut self, clause: Clause) -> usize {
        let index = self.core.formula.append_clause(clause);
        self.core.attach_clause(index);
        index
    }

    fn remove_clause(&mut self, index: usize) {
        self.core.detach_clause(index);
        self.core.formula.remove_clause(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::clause::test_support::clause;

    fn solver(clauses: &[&[i32]]) -> DpllSolver {
        let mut formula = Formula::new();
        for literals in clauses {
            formula.append_clause(clause(literals));
        }
        DpllSolver::new(formula)
    }

    fn model_satisfies(solver: &DpllSolver) -> bool {
        solver.formula().iter().all(|clause| {
            clause
                .iter()
                .any(|&lit| solver.assignment().literal_value(lit) == Some(true))
        })
    }

    #[test]
    fn test_single_unit() {
        let mut solver = solver(&[&[1]]);
        assert_eq!(solver.solve(), SolverStatus::Satisfied);
        assert_eq!(
            solver.assignment().literal_value(Literal::new(1, true)),
            Some(true)
        );
    }

    #[test]
    fn test_contradictory_units() {
        let mut solver = solver(&[&[1], &[-1]]);
        assert_eq!(solver.solve(), SolverStatus::Unsatisfied);
    }

    #[test]
    fn test_backtracking_flips_decisions() {
        // All assignments of (x1, x2) except (F, F) are excluded.
        let mut solver = solver(&[&[-1, -2], &[-1, 2, -2], &[1, -2], &[-2, -1]]);
        assert_eq!(solver.solve(), SolverStatus::Satisfied);
        assert!(model_satisfies(&solver));
    }

    #[test]
    fn test_full_exclusion_is_unsat() {
        let mut solver = solver(&[&[1, 2], &[-1, 2], &[1, -2], &[-1, -2]]);
        assert_eq!(solver.solve(), SolverStatus::Unsatisfied);
    }

    #[test]
    fn test_empty_clause_is_unsat() {
        let mut formula = Formula::new();
        formula.append_clause(Clause::default());
        let mut solver = DpllSolver::new(formula);
        assert_eq!(solver.solve(), SolverStatus::Unsatisfied);
    }

    #[test]
    fn test_assumptions_restrict_models() {
        let mut solver = solver(&[&[1, 2]]);
        assert_eq!(
            solver.solve_with_assumptions(&[Literal::new(1, false)]),
            SolverStatus::Satisfied
        );
        assert_eq!(
            solver.assignment().literal_value(Literal::new(2, true)),
            Some(true)
        );
    }

    #[test]
    fn test_resolvable_after_solve() {
        let mut solver = solver(&[&[1, 2], &[-1, 2]]);
        assert_eq!(solver.solve(), SolverStatus::Satisfied);
        assert_eq!(solver.solve(), SolverStatus::Satisfied);
        assert!(model_satisfies(&solver));
    }

    #[test]
    fn test_incremental_append_invalidates_model() {
        let mut solver = solver(&[&[1]]);
        assert_eq!(solver.solve(), SolverStatus::Satisfied);

        solver.append_clause(clause(&[-1]));
        assert_eq!(solver.status(), SolverStatus::Unknown);
        assert_eq!(solver.solve(), SolverStatus::Unsatisfied);
    }

    #[test]
    fn test_interrupt_returns_unknown() {
        let mut solver = solver(&[&[1, 2], &[-1, 2]]);
        solver.interrupt_on(|| true);
        assert_eq!(solver.solve(), SolverStatus::Unknown);
    }
}
