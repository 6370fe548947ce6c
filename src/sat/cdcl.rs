#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Conflict-driven clause learning search.
//!
//! The main loop interleaves unit propagation, pending-assignment intake
//! (assumptions first, then pure literals) and EVSIDS-guided decisions.
//! Each conflict is analysed down to the first unique implication point;
//! the learned clause is appended through the regular attach path, making
//! it indistinguishable from user input afterwards, and search resumes at
//! the computed backjump level. When a conflict cannot be escaped without
//! undoing an assumption the formula is unsatisfiable under the given
//! assumptions, and the subset of assumptions responsible is reconstructed
//! by walking the implication graph backwards.

use crate::sat::assignment::{Assignment, VarState};
use crate::sat::clause::{Clause, ClauseBuilder};
use crate::sat::formula::Formula;
use crate::sat::heuristic::{Evsids, ScoringParameters};
use crate::sat::literal::{Literal, Variable};
use crate::sat::solver::{Incremental, Propagation, Solver, SolverCore, SolverStatus};
use crate::sat::trail::Reason;
use rustc_hash::FxHashSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Feature switches of the CDCL engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CdclParameters {
    /// Assign pure literals before the search starts.
    pub pure_literal_elimination: bool,
    /// Reuse the previously assigned value when re-deciding a variable.
    pub phase_saving: bool,
}

impl Default for CdclParameters {
    fn default() -> Self {
        Self {
            pure_literal_elimination: true,
            phase_saving: true,
        }
    }
}

/// Marking of a trail entry during conflict analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum TrackState {
    #[default]
    Untracked,
    Pending,
    Processed,
}

/// Last values assigned to each variable, for phase saving.
#[derive(Debug, Clone, Default)]
struct SavedPhases(Vec<Option<bool>>);

impl SavedPhases {
    fn save(&mut self, variable: Variable, value: bool) {
        self.0[variable as usize - 1] = Some(value);
    }

    fn get(&self, variable: Variable) -> Option<bool> {
        self.0[variable as usize - 1]
    }

    fn set_num_variables(&mut self, num_variables: usize) {
        self.0.resize(num_variables, None);
    }
}

type LearnedClauseListener = Box<dyn FnMut(&Clause)>;

/// CDCL solver over an owned formula.
pub struct CdclSolver {
    core: SolverCore,
    parameters: CdclParameters,
    analysis_track: Vec<TrackState>,
    learned_clause: ClauseBuilder,
    evsids: Evsids,
    saved_phases: SavedPhases,
    final_conflict: FxHashSet<Literal>,
    on_learned: Option<LearnedClauseListener>,
}

impl std::fmt::Debug for CdclSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdclSolver")
            .field("formula", &self.core.formula)
            .field("parameters", &self.parameters)
            .field("status", &self.core.status())
            .finish_non_exhaustive()
    }
}

impl CdclSolver {
    /// Version string reported by the command line front end.
    pub const SIGNATURE: &'static str = concat!("ferrosat (CDCL) v", env!("CARGO_PKG_VERSION"));

    #[must_use]
    pub fn new(formula: Formula) -> Self {
        Self::with_scoring(formula, ScoringParameters::default())
    }

    #[must_use]
    pub fn with_scoring(formula: Formula, scoring: ScoringParameters) -> Self {
        let num_variables = formula.num_variables() as usize;
        let mut saved_phases = SavedPhases::default();
        saved_phases.set_num_variables(num_variables);

        Self {
            core: SolverCore::new(formula),
            parameters: CdclParameters::default(),
            analysis_track: vec![TrackState::Untracked; num_variables],
            learned_clause: ClauseBuilder::default(),
            evsids: Evsids::new(num_variables, scoring),
            saved_phases,
            final_conflict: FxHashSet::default(),
            on_learned: None,
        }
    }

    pub fn parameters_mut(&mut self) -> &mut CdclParameters {
        &mut self.parameters
    }

    /// Registers a listener invoked for every learned clause.
    pub fn on_learned_clause(&mut self, listener: impl FnMut(&Clause) + 'static) {
        self.on_learned = Some(Box::new(listener));
    }

    pub fn clear_learned_clause_listener(&mut self) {
        self.on_learned = None;
    }

    /// Registers a predicate polled at the interrupt safe points.
    pub fn interrupt_on(&mut self, predicate: impl FnMut() -> bool + 'static) {
        self.core.interrupt_on(predicate);
    }

    pub fn clear_interrupt_predicate(&mut self) {
        self.core.clear_interrupt_predicate();
    }

    /// Solves under assumptions and, on unsatisfiability, extracts the
    /// subset of assumptions responsible into `final_conflict`.
    pub fn solve_with_final_conflict(
        &mut self,
        assumptions: &[Literal],
        final_conflict: &mut Vec<Literal>,
    ) -> SolverStatus {
        self.prepare_solve(assumptions);
        let status = self.solve_impl(true);
        self.core.set_status(status);

        if status == SolverStatus::Unsatisfied {
            final_conflict.extend(self.final_conflict.iter().copied());
            self.final_conflict.clear();
        }
        status
    }

    fn prepare_solve(&mut self, assumptions: &[Literal]) {
        if self.core.needs_reset() {
            self.core.reset_state();
            // State resets do not emit per-variable assignment events, so
            // re-seed the decision heap by hand.
            self.evsids.reset();
        }
        self.core.begin_solve();
        self.core.save_assumptions(assumptions);
        self.final_conflict.clear();
    }

    fn solve_impl(&mut self, analyze_final: bool) -> SolverStatus {
        if self.parameters.pure_literal_elimination {
            self.core.scan_pure_literals();
        }

        let mut assumptions_applied = 0_usize;
        loop {
            if self.core.interrupted() {
                return SolverStatus::Unknown;
            }

            match self.core.unit_propagation() {
                Propagation::Satisfied => {
                    // Propagation may satisfy the formula before every
                    // assumption was applied; those still have to hold.
                    if let Some(conflict) = self.core.verify_pending() {
                        if analyze_final {
                            self.analyze_final_conflict(&[conflict], true);
                        }
                        return SolverStatus::Unsatisfied;
                    }
                    return SolverStatus::Satisfied;
                }

                Propagation::Conflict(conflict_index) => {
                    if self.core.trail.level() == 0 {
                        if analyze_final {
                            self.analyze_final_clause(conflict_index);
                        }
                        return SolverStatus::Unsatisfied;
                    }

                    let (learned, backjump_level) = self.analyze_conflict(conflict_index);
                    let learned_index = self.append_clause(learned);
                    if let Some(listener) = self.on_learned.as_mut() {
                        listener(&self.core.formula[learned_index]);
                    }

                    if backjump_level < assumptions_applied || !self.backjump(backjump_level) {
                        if analyze_final {
                            self.analyze_final_clause(conflict_index);
                        }
                        return SolverStatus::Unsatisfied;
                    }
                    self.evsids.next_iteration();
                }

                Propagation::Pass => {
                    if let Some(pending) = self.core.take_pending() {
                        if !self.core.perform_pending(pending) {
                            if analyze_final {
                                let conflict = Literal::new(pending.variable, pending.value);
                                self.analyze_final_conflict(&[conflict], true);
                            }
                            return SolverStatus::Unsatisfied;
                        }
                        if pending.is_assumption {
                            assumptions_applied += 1;
                        }
                    } else {
                        self.decide();
                    }
                }
            }
        }
    }

    /// Picks the most active unassigned variable and assigns it, reusing a
    /// saved phase when enabled.
    fn decide(&mut self) {
        let variable = self
            .evsids
            .pop_variable(&self.core.assignment)
            .expect("propagation passed, so an unassigned variable exists");
        debug_assert!(self.core.assignment.value(variable).is_unassigned());

        let value = if self.parameters.phase_saving {
            self.saved_phases.get(variable).unwrap_or(true)
        } else {
            true
        };
        self.core.trail.decision(variable, value);
        self.assign(variable, VarState::Assigned(value));
    }

    /// Assignment wrapper keeping the decision heuristic informed.
    fn assign(&mut self, variable: Variable, state: VarState) {
        self.core.assign(variable, state);
        self.evsids.variable_assigned(&self.core.assignment, variable);
    }

    /// 1-UIP conflict analysis.
    ///
    /// Walks the implication graph restricted to the current decision level
    /// backwards from the conflict clause until a single path remains; the
    /// literals cut off below the current level form the learned clause
    /// together with the negated UIP assignment. Returns the learned clause
    /// and the backjump level.
    fn analyze_conflict(&mut self, conflict_index: usize) -> (Clause, usize) {
        let level = self.core.trail.level();
        debug_assert!(level > 0);
        self.analysis_track.fill(TrackState::Untracked);

        let mut clause_index = conflict_index;
        let mut trail_index = self.core.trail.len() - 1;
        let mut remaining_paths = 1_usize;
        let mut backjump_level = 0_usize;

        loop {
            for literal_index in 0..self.core.formula[clause_index].len() {
                let variable = self.core.formula[clause_index][literal_index].variable();
                if self.track(variable) != TrackState::Untracked {
                    continue;
                }

                let Some(entry) = self.core.trail.find(variable) else {
                    continue;
                };
                if entry.level >= level {
                    self.set_track(variable, TrackState::Pending);
                    remaining_paths += 1;
                } else {
                    self.learned_clause.add(Literal::new(variable, !entry.value));
                    backjump_level = backjump_level.max(entry.level);
                }
                self.evsids.variable_active(variable);
            }
            remaining_paths -= 1;

            while self.track(self.core.trail[trail_index].variable) != TrackState::Pending {
                debug_assert!(trail_index > 0);
                trail_index -= 1;
            }
            self.set_track(self.core.trail[trail_index].variable, TrackState::Processed);

            if remaining_paths == 1 {
                break;
            }
            match self.core.trail[trail_index].reason {
                Reason::Clause(reason_index) => clause_index = reason_index,
                reason => {
                    debug_assert!(
                        false,
                        "conflict paths remain but hit a {reason:?} entry"
                    );
                    break;
                }
            }
        }

        // The entry every conflict path passes through: the UIP. Its negation
        // makes the learned clause asserting after the backjump.
        let uip = self.core.trail[trail_index];
        self.learned_clause.add(Literal::new(uip.variable, !uip.value));
        self.evsids.variable_active(uip.variable);
        debug_assert!(uip.level > 0);

        if backjump_level == 0 {
            backjump_level = backjump_level.max(uip.level - 1);
        }
        debug_assert!(backjump_level < level);

        (self.learned_clause.build(), backjump_level)
    }

    /// Undoes assignments until the trail is back at `level`. Refuses (and
    /// reports `false`) when doing so would pop an assumption.
    fn backjump(&mut self, level: usize) -> bool {
        while self.core.trail.level() > level {
            let Some(entry) = self.core.trail.top() else {
                return false;
            };
            let (variable, value, reason, entry_level) =
                (entry.variable, entry.value, entry.reason, entry.level);

            if reason == Reason::Assumption && entry_level > level {
                return false;
            }
            if self.parameters.phase_saving && reason == Reason::Decision && entry_level > level {
                // Decisions above the backjump target did not cause the
                // conflict; their values are worth retrying.
                self.saved_phases.save(variable, value);
            }

            self.assign(variable, VarState::Unassigned);
            self.core.trail.pop();
        }
        true
    }

    fn analyze_final_clause(&mut self, conflict_index: usize) {
        let literals: Vec<Literal> = self.core.formula[conflict_index].iter().copied().collect();
        self.analyze_final_conflict(&literals, false);
    }

    /// Final-conflict analysis: collects the subset of assumptions that
    /// suffice for unsatisfiability by walking reasons backwards from the
    /// conflict literals.
    fn analyze_final_conflict(&mut self, conflict: &[Literal], assumption_clause: bool) {
        self.analysis_track.fill(TrackState::Untracked);

        let mut pending = self.mark_final_conflict_literals(conflict, assumption_clause);
        let mut trail_index = self.core.trail.len().saturating_sub(1);
        while pending > 0 {
            while self.track(self.core.trail[trail_index].variable) != TrackState::Pending {
                debug_assert!(trail_index > 0);
                trail_index -= 1;
            }

            let entry = self.core.trail[trail_index];
            self.set_track(entry.variable, TrackState::Processed);
            pending -= 1;

            match entry.reason {
                Reason::Clause(reason_index) => {
                    let literals: Vec<Literal> =
                        self.core.formula[reason_index].iter().copied().collect();
                    pending += self.mark_final_conflict_literals(&literals, false);
                }
                Reason::Assumption => {
                    self.final_conflict
                        .insert(Literal::new(entry.variable, entry.value));
                }
                Reason::Decision | Reason::Propagation => {}
            }
        }
    }

    /// Marks the trail entries behind a clause's literals for analysis;
    /// assumptions (or everything, for an assumption clause) go straight
    /// into the final conflict. Returns how many entries became pending.
    fn mark_final_conflict_literals(
        &mut self,
        literals: &[Literal],
        assumption_clause: bool,
    ) -> usize {
        let mut pending = 0;
        for literal in literals {
            let variable = literal.variable();
            if self.track(variable) != TrackState::Untracked {
                continue;
            }
            let Some(entry) = self.core.trail.find(variable) else {
                continue;
            };
            let (reason, value) = (entry.reason, entry.value);

            if !assumption_clause && matches!(reason, Reason::Clause(_) | Reason::Propagation) {
                self.set_track(variable, TrackState::Pending);
                pending += 1;
            } else if assumption_clause || reason == Reason::Assumption {
                self.final_conflict.insert(Literal::new(variable, value));
            }
        }
        pending
    }

    fn track(&self, variable: Variable) -> TrackState {
        self.analysis_track[variable as usize - 1]
    }

    fn set_track(&mut self, variable: Variable, state: TrackState) {
        self.analysis_track[variable as usize - 1] = state;
    }
}

impl Solver for CdclSolver {
    fn solve(&mut self) -> SolverStatus {
        self.solve_with_assumptions(&[])
    }

    fn solve_with_assumptions(&mut self, assumptions: &[Literal]) -> SolverStatus {
        self.prepare_solve(assumptions);
        let status = self.solve_impl(false);
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

impl Incremental for CdclSolver {
    fn append_clause(&mut self, clause: Clause) -> usize {
        let index = self.core.formula.append_clause(clause);
        self.core.attach_clause(index);

        let num_variables = self.core.formula.num_variables() as usize;
        self.analysis_track
            .resize(num_variables, TrackState::Untracked);
        self.evsids.formula_updated(num_variables);
        self.saved_phases.set_num_variables(num_variables);
        index
    }

    fn remove_clause(&mut self, index: usize) {
        self.core.detach_clause(index);
        self.core.formula.remove_clause(index);

        let num_variables = self.core.formula.num_variables() as usize;
        self.analysis_track
            .resize(num_variables, TrackState::Untracked);
        self.evsids.formula_updated(num_variables);
        self.saved_phases.set_num_variables(num_variables);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::clause::test_support::clause;

    fn solver(clauses: &[&[i32]]) -> CdclSolver {
        let mut formula = Formula::new();
        for literals in clauses {
            formula.append_clause(clause(literals));
        }
        CdclSolver::new(formula)
    }

    fn lit(value: i32) -> Literal {
        Literal::try_from(value).unwrap()
    }

    fn model_satisfies(solver: &CdclSolver) -> bool {
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
        assert_eq!(solver.assignment().literal_value(lit(1)), Some(true));
    }

    #[test]
    fn test_contradictory_units() {
        let mut solver = solver(&[&[1], &[-1]]);
        assert_eq!(solver.solve(), SolverStatus::Unsatisfied);
    }

    #[test]
    fn test_exhaustive_binary_exclusion() {
        let mut solver = solver(&[&[1, 2], &[-1, 2], &[1, -2], &[-1, -2]]);
        assert_eq!(solver.solve(), SolverStatus::Unsatisfied);
    }

    #[test]
    fn test_learns_clauses_on_conflict() {
        let learned = std::rc::Rc::new(std::cell::Cell::new(0_usize));
        let counter = std::rc::Rc::clone(&learned);

        // Pigeonhole PHP(3, 2): three pigeons, two holes.
        let mut solver = solver(&[
            &[1, 2],
            &[3, 4],
            &[5, 6],
            &[-1, -3],
            &[-1, -5],
            &[-3, -5],
            &[-2, -4],
            &[-2, -6],
            &[-4, -6],
        ]);
        solver.on_learned_clause(move |_| counter.set(counter.get() + 1));

        assert_eq!(solver.solve(), SolverStatus::Unsatisfied);
        assert!(learned.get() > 0, "CDCL must learn at least one clause");
    }

    #[test]
    fn test_satisfiable_with_search() {
        let mut solver = solver(&[&[1, 2, 3], &[-1, 2], &[-2, 3], &[-3, -1]]);
        assert_eq!(solver.solve(), SolverStatus::Satisfied);
        assert!(model_satisfies(&solver));
    }

    #[test]
    fn test_assumption_conflict_yields_final_conflict() {
        let mut solver = solver(&[&[1, 2], &[-1, 3], &[-2, 3]]);
        let mut final_conflict = Vec::new();
        let status = solver.solve_with_final_conflict(&[lit(-3)], &mut final_conflict);

        assert_eq!(status, SolverStatus::Unsatisfied);
        assert_eq!(final_conflict, vec![lit(-3)]);
    }

    #[test]
    fn test_contradicting_assumptions() {
        let mut solver = solver(&[&[1, 2]]);
        let mut final_conflict = Vec::new();
        let status = solver.solve_with_final_conflict(&[lit(1), lit(-1)], &mut final_conflict);

        assert_eq!(status, SolverStatus::Unsatisfied);
        assert!(!final_conflict.is_empty());
        assert!(final_conflict.iter().all(|l| l.variable() == 1));
    }

    #[test]
    fn test_assumptions_hold_in_model() {
        let mut solver = solver(&[&[1, 2], &[-2, 3]]);
        let status = solver.solve_with_assumptions(&[lit(-1)]);

        assert_eq!(status, SolverStatus::Satisfied);
        assert_eq!(solver.assignment().literal_value(lit(-1)), Some(true));
        assert!(model_satisfies(&solver));
    }

    #[test]
    fn test_unsat_without_assumptions_leaves_final_conflict_empty() {
        let mut solver = solver(&[&[1], &[-1]]);
        let mut final_conflict = Vec::new();
        let status = solver.solve_with_final_conflict(&[], &mut final_conflict);

        assert_eq!(status, SolverStatus::Unsatisfied);
        assert!(final_conflict.is_empty());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut solver = solver(&[&[1, 2, 3], &[-1, 2], &[-2, 3]]);
        assert_eq!(solver.solve(), SolverStatus::Satisfied);
        assert_eq!(solver.solve(), SolverStatus::Satisfied);
        assert!(model_satisfies(&solver));
    }

    #[test]
    fn test_incremental_append_invalidates_model() {
        let mut solver = solver(&[&[1, 2]]);
        assert_eq!(solver.solve(), SolverStatus::Satisfied);

        // Contradict the model the solver just reported.
        let model: Vec<Literal> = solver
            .formula()
            .iter()
            .flat_map(|c| c.iter().copied())
            .filter(|&l| solver.assignment().literal_value(l) == Some(true))
            .collect();
        for literal in model {
            solver.append_clause([literal.negated()].into_iter().collect());
        }
        assert_eq!(solver.status(), SolverStatus::Unknown);

        let status = solver.solve();
        assert!(matches!(
            status,
            SolverStatus::Satisfied | SolverStatus::Unsatisfied
        ));
        if status == SolverStatus::Satisfied {
            assert!(model_satisfies(&solver));
        }
    }

    #[test]
    fn test_remove_clause_restores_satisfiability() {
        let mut solver = solver(&[&[1], &[-1]]);
        assert_eq!(solver.solve(), SolverStatus::Unsatisfied);

        solver.remove_clause(1);
        assert_eq!(solver.solve(), SolverStatus::Satisfied);
        assert_eq!(solver.assignment().literal_value(lit(1)), Some(true));
    }

    #[test]
    fn test_phase_saving_toggle() {
        for phase_saving in [false, true] {
            let mut solver = solver(&[&[1, 2, 3], &[-1, 2], &[-2, 3], &[-3, -1]]);
            solver.parameters_mut().phase_saving = phase_saving;
            assert_eq!(solver.solve(), SolverStatus::Satisfied);
            assert!(model_satisfies(&solver));
        }
    }

    #[test]
    fn test_pure_literal_elimination_toggle() {
        for pure_literals in [false, true] {
            let mut solver = solver(&[&[1, 2], &[1, -2], &[2, 3]]);
            solver.parameters_mut().pure_literal_elimination = pure_literals;
            assert_eq!(solver.solve(), SolverStatus::Satisfied);
            assert!(model_satisfies(&solver));
        }
    }

    #[test]
    fn test_interrupt_returns_unknown() {
        let mut solver = solver(&[&[1, 2], &[-1, 2]]);
        solver.interrupt_on(|| true);
        assert_eq!(solver.solve(), SolverStatus::Unknown);
        // The solver stays usable after an interrupt.
        assert_eq!(solver.solve(), SolverStatus::Unknown);
    }
}
