#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Shared engine infrastructure and the public solver traits.
//!
//! [`SolverCore`] carries everything the search algorithms have in common:
//! the owned formula, the per-clause watchers, the variable occurrence
//! index, the assignment, the decision trail, the pending-assignment queue
//! and the interrupt/status plumbing. The DPLL and CDCL engines embed a core
//! and drive it; clause attachment and detachment run through the core so
//! that learned clauses and user clauses are indistinguishable once
//! attached.

use crate::sat::assignment::{Assignment, VarState};
use crate::sat::clause::Clause;
use crate::sat::formula::Formula;
use crate::sat::literal::{Literal, Variable};
use crate::sat::trail::Trail;
use crate::sat::variable_index::{Polarity, VariableIndex};
use crate::sat::watcher::{ClauseStatus, Watcher};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Externally observable state of a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SolverStatus {
    Unknown = 0,
    Solving = 1,
    Satisfied = 2,
    Unsatisfied = 3,
}

impl SolverStatus {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Solving,
            2 => Self::Satisfied,
            3 => Self::Unsatisfied,
            _ => Self::Unknown,
        }
    }
}

/// Outcome of a unit-propagation round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Propagation {
    /// Every clause is satisfied.
    Satisfied,
    /// The clause at this index is falsified.
    Conflict(usize),
    /// Nothing left to propagate, formula not yet decided.
    Pass,
}

/// A queued assignment to perform between propagation rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingAssignment {
    pub variable: Variable,
    pub value: bool,
    pub is_assumption: bool,
}

/// Common interface of the solving engines.
pub trait Solver {
    /// Decides the owned formula.
    fn solve(&mut self) -> SolverStatus;

    /// Decides the owned formula under unit assumptions.
    fn solve_with_assumptions(&mut self, assumptions: &[Literal]) -> SolverStatus;

    /// Current status; readable while another thread owns the solver only
    /// through [`Solver::interrupt_handle`]-style sharing, but cheap and
    /// race-free here.
    fn status(&self) -> SolverStatus;

    fn formula(&self) -> &Formula;

    fn assignment(&self) -> &Assignment;

    /// Handle for requesting a cooperative interrupt from another thread.
    fn interrupt_handle(&self) -> Arc<AtomicBool>;
}

/// Incremental clause surface shared by the engines: user clauses and
/// learned clauses are appended through the same path.
pub trait Incremental {
    /// Appends a clause and attaches it, returning its index.
    fn append_clause(&mut self, clause: Clause) -> usize;

    /// Detaches and removes the clause at `index`; later clause indices
    /// shift down by one.
    fn remove_clause(&mut self, index: usize);
}

pub(crate) struct SolverCore {
    pub formula: Formula,
    pub variable_index: VariableIndex,
    pub watchers: Vec<Watcher>,
    pub assignment: Assignment,
    pub trail: Trail,
    pub pending: Vec<PendingAssignment>,
    pub pending_cursor: usize,
    interrupt_requested: Arc<AtomicBool>,
    interrupt_predicate: Option<Box<dyn FnMut() -> bool>>,
    status: AtomicU8,
    fresh: bool,
}

impl std::fmt::Debug for SolverCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverCore")
            .field("formula", &self.formula)
            .field("assignment", &self.assignment)
            .field("trail", &self.trail)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl SolverCore {
    pub fn new(formula: Formula) -> Self {
        let num_variables = formula.num_variables() as usize;
        let mut core = Self {
            variable_index: VariableIndex::new(num_variables),
            watchers: Vec::with_capacity(formula.len()),
            assignment: Assignment::new(num_variables),
            trail: Trail::new(num_variables),
            pending: Vec::new(),
            pending_cursor: 0,
            interrupt_requested: Arc::new(AtomicBool::new(false)),
            interrupt_predicate: None,
            status: AtomicU8::new(SolverStatus::Unknown as u8),
            fresh: true,
            formula,
        };

        for (clause_index, clause) in core.formula.iter().enumerate() {
            core.watchers.push(Watcher::new(clause));
            core.variable_index.attach(clause_index, clause);
        }
        core
    }

    pub fn status(&self) -> SolverStatus {
        SolverStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub fn set_status(&self, status: SolverStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    /// Resets a terminal status back to `Unknown` without overwriting the
    /// transient states, as required on clause attach/detach.
    fn reset_terminal_status(&self) {
        let mut observed = self.status.load(Ordering::Acquire);
        loop {
            match SolverStatus::from_u8(observed) {
                SolverStatus::Unknown | SolverStatus::Solving => return,
                SolverStatus::Satisfied | SolverStatus::Unsatisfied => {}
            }
            match self.status.compare_exchange_weak(
                observed,
                SolverStatus::Unknown as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(current) => observed = current,
            }
        }
    }

    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt_requested)
    }

    pub fn interrupt_on(&mut self, predicate: impl FnMut() -> bool + 'static) {
        self.interrupt_predicate = Some(Box::new(predicate));
    }

    pub fn clear_interrupt_predicate(&mut self) {
        self.interrupt_predicate = None;
    }

    /// Checks the interrupt flag and predicate; a safe point before each
    /// propagation round.
    pub fn interrupted(&mut self) -> bool {
        self.interrupt_requested.load(Ordering::Acquire)
            || self
                .interrupt_predicate
                .as_mut()
                .is_some_and(|predicate| predicate())
    }

    /// Writes a variable state and updates every watcher of a clause the
    /// variable occurs in, via the occurrence index.
    pub fn assign(&mut self, variable: Variable, state: VarState) {
        self.assignment.set(variable, state);

        let entry = self.variable_index.entry(variable);
        let satisfies = state == VarState::Assigned(true);
        for &clause_index in entry.positive_clauses() {
            self.watchers[clause_index].update(
                &self.assignment,
                &self.formula[clause_index],
                variable,
                state,
                satisfies,
            );
        }
        let satisfies = state == VarState::Assigned(false);
        for &clause_index in entry.negative_clauses() {
            self.watchers[clause_index].update(
                &self.assignment,
                &self.formula[clause_index],
                variable,
                state,
                satisfies,
            );
        }
    }

    /// Boolean constraint propagation over the watcher vector.
    ///
    /// Repeats full passes until a pass completes without propagating.
    /// Within a pass, unit clauses are discovered in increasing clause-index
    /// order; a falsified clause aborts immediately with its index.
    pub fn unit_propagation(&mut self) -> Propagation {
        let mut all_satisfied = false;
        let mut propagated = true;

        while propagated && !all_satisfied {
            propagated = false;
            all_satisfied = true;

            let mut clause_index = 0;
            while clause_index < self.watchers.len() && !propagated {
                match self.watchers[clause_index].status() {
                    ClauseStatus::Satisfied => {}
                    ClauseStatus::Unsatisfied => return Propagation::Conflict(clause_index),
                    ClauseStatus::Undecided => all_satisfied = false,
                    ClauseStatus::Unit => {
                        all_satisfied = false;
                        if let Some(literal) = self.watchers[clause_index]
                            .unit_literal(&self.formula[clause_index])
                        {
                            let (variable, state) = literal.assignment();
                            self.trail
                                .propagation_from(variable, literal.polarity(), clause_index);
                            self.assign(variable, state);
                            propagated = true;
                        }
                    }
                }
                clause_index += 1;
            }
        }

        if all_satisfied {
            Propagation::Satisfied
        } else {
            Propagation::Pass
        }
    }

    /// Attach callback: resizes variable-addressed state, indexes the new
    /// clause and sets up its watcher. Terminal statuses fall back to
    /// `Unknown`.
    pub fn attach_clause(&mut self, clause_index: usize) {
        self.reset_terminal_status();
        let num_variables = self.formula.num_variables() as usize;
        self.assignment.set_num_variables(num_variables);
        self.trail.set_num_variables(num_variables);
        if num_variables > self.variable_index.num_variables() {
            self.variable_index.set_num_variables(num_variables);
        }

        let clause = &self.formula[clause_index];
        self.variable_index.attach(clause_index, clause);
        let mut watcher = Watcher::new(clause);
        watcher.rescan(&self.assignment, clause);
        self.watchers.insert(clause_index, watcher);
    }

    /// Detach callback: must run *before* the clause leaves the formula.
    /// Drops the watcher and renumbers clause references in the index.
    pub fn detach_clause(&mut self, clause_index: usize) {
        self.reset_terminal_status();
        let num_variables = self.formula.num_variables() as usize;
        self.assignment.set_num_variables(num_variables);
        self.trail.set_num_variables(num_variables);
        if num_variables < self.variable_index.num_variables() {
            self.variable_index.set_num_variables(num_variables);
        }

        self.variable_index.detach(clause_index);
        self.watchers.remove(clause_index);
    }

    /// Queues every currently pure (or unreferenced) variable as a
    /// non-assumption pending assignment.
    pub fn scan_pure_literals(&mut self) {
        for variable in 1..=self.formula.num_variables() {
            if self.assignment.value(variable).is_assigned() {
                continue;
            }
            match self.variable_index.entry(variable).polarity() {
                Polarity::PurePositive | Polarity::None => {
                    self.push_pending(variable, true, false);
                }
                Polarity::PureNegative => self.push_pending(variable, false, false),
                Polarity::Mixed => {}
            }
        }
    }

    fn push_pending(&mut self, variable: Variable, value: bool, is_assumption: bool) {
        self.pending.push(PendingAssignment {
            variable,
            value,
            is_assumption,
        });
    }

    /// Translates the assumptions of a solve call into pending assignments,
    /// preserving order.
    pub fn save_assumptions(&mut self, assumptions: &[Literal]) {
        for literal in assumptions {
            self.push_pending(literal.variable(), literal.polarity(), true);
        }
    }

    /// Applies one queued assignment. Assumptions are enforced: an
    /// assumption contradicting the current assignment fails (`false`).
    /// Non-assumptions are skipped silently when the variable is taken.
    pub fn perform_pending(&mut self, pending: PendingAssignment) -> bool {
        let current = self.assignment.value(pending.variable);
        if pending.is_assumption {
            match current {
                VarState::Unassigned => {
                    self.assign(pending.variable, VarState::Assigned(pending.value));
                    self.trail.assumption(pending.variable, pending.value);
                }
                VarState::Assigned(value) if value == pending.value => {
                    self.trail.assumption(pending.variable, pending.value);
                }
                VarState::Assigned(_) => return false,
            }
        } else if current.is_unassigned() {
            self.assign(pending.variable, VarState::Assigned(pending.value));
            self.trail.decision(pending.variable, pending.value);
        }
        true
    }

    /// Checks the not-yet-consumed assumptions against the assignment. Used
    /// when the formula is satisfied before the queue drains; returns the
    /// first violated assumption as a literal.
    pub fn verify_pending(&self) -> Option<Literal> {
        self.pending[self.pending_cursor..]
            .iter()
            .find(|pending| {
                pending.is_assumption
                    && matches!(
                        self.assignment.value(pending.variable),
                        VarState::Assigned(value) if value != pending.value
                    )
            })
            .map(|pending| Literal::new(pending.variable, pending.value))
    }

    /// Next queued assignment, advancing the consume cursor.
    pub fn take_pending(&mut self) -> Option<PendingAssignment> {
        let pending = self.pending.get(self.pending_cursor).copied();
        if pending.is_some() {
            self.pending_cursor += 1;
        }
        pending
    }

    /// Drops the assignment, trail and queue, then rescans every watcher.
    pub fn reset_state(&mut self) {
        self.pending.clear();
        self.pending_cursor = 0;
        self.assignment.reset();
        self.trail.reset();
        for (watcher, clause) in self.watchers.iter_mut().zip(self.formula.iter()) {
            watcher.rescan(&self.assignment, clause);
        }
    }

    /// Whether any state reset is needed before the next solve; the first
    /// solve on a freshly built solver skips it.
    pub fn needs_reset(&mut self) -> bool {
        let fresh = std::mem::replace(&mut self.fresh, false);
        !fresh
    }

    pub fn begin_solve(&mut self) {
        self.interrupt_requested.store(false, Ordering::Release);
        self.set_status(SolverStatus::Solving);
    }
}
