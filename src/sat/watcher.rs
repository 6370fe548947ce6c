#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Two-watched-literal clause status tracking.
//!
//! A [`Watcher`] caches the status of one clause so that most variable
//! assignments touch only the two watched literals instead of rescanning the
//! whole clause. [`Watcher::update`] must be called for every assignment to
//! a variable occurring in the clause (the variable index drives this);
//! after bulk state changes (reset, clause attach) [`Watcher::rescan`]
//! recomputes everything from scratch.
//!
//! Invariant after any `update`/`rescan`:
//! - `Satisfied`: at least one watched literal is satisfied;
//! - `Undecided`: both watched slots refer to unassigned literals;
//! - `Unit`: exactly the first slot refers to an unassigned literal and no
//!   literal of the clause is satisfied;
//! - `Unsatisfied`: no watched slot refers to an unassigned or satisfied
//!   literal.

use crate::sat::assignment::{Assignment, VarState};
use crate::sat::clause::Clause;
use crate::sat::literal::{Literal, Variable};

/// Cached evaluation of a clause under the current assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseStatus {
    Satisfied,
    Unsatisfied,
    Unit,
    Undecided,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watcher {
    status: ClauseStatus,
    watched: [Option<usize>; 2],
}

impl Watcher {
    /// Sets up watches for a clause with no assignments made yet.
    #[must_use]
    pub fn new(clause: &Clause) -> Self {
        match clause.len() {
            0 => Self {
                status: ClauseStatus::Unsatisfied,
                watched: [None, None],
            },
            1 => Self {
                status: ClauseStatus::Unit,
                watched: [Some(0), None],
            },
            _ => Self {
                status: ClauseStatus::Undecided,
                watched: [Some(0), Some(1)],
            },
        }
    }

    #[must_use]
    pub const fn status(&self) -> ClauseStatus {
        self.status
    }

    #[must_use]
    pub const fn watched(&self) -> [Option<usize>; 2] {
        self.watched
    }

    /// The sole unassigned literal of a unit clause, taken from the first
    /// watched slot.
    #[must_use]
    pub fn unit_literal(&self, clause: &Clause) -> Option<Literal> {
        match self.status {
            ClauseStatus::Unit => self.watched[0].map(|index| clause[index]),
            _ => None,
        }
    }

    /// Incrementally refreshes the watcher after `variable` changed state.
    ///
    /// `satisfies_clause` tells whether the new state satisfies the literal
    /// of `variable` occurring in this clause (the caller knows the
    /// occurrence polarity from the variable index). Unassignment is
    /// delivered with `satisfies_clause == false`.
    pub fn update(
        &mut self,
        assignment: &Assignment,
        clause: &Clause,
        variable: Variable,
        state: VarState,
        satisfies_clause: bool,
    ) {
        if satisfies_clause {
            let VarState::Assigned(value) = state else {
                return;
            };
            let satisfying = Literal::new(variable, value);
            if self.status != ClauseStatus::Satisfied
                && !self.watches_literal(clause, satisfying)
            {
                // Move a watch onto the newly satisfying literal, preferring
                // to displace a slot that is not itself satisfied.
                if let Some(index) = clause.find(satisfying) {
                    if !Self::is_satisfied(assignment, clause, self.watched[0]) {
                        self.watched[1] = self.watched[0];
                        self.watched[0] = Some(index);
                    } else if !Self::is_satisfied(assignment, clause, self.watched[1]) {
                        self.watched[1] = Some(index);
                    }
                }
            }
            self.status = ClauseStatus::Satisfied;
        } else {
            if self.watched_variables(clause).is_some_and(|[first, second]| {
                first != variable && second != variable
            }) {
                return;
            }

            if Self::is_falsified(assignment, clause, self.watched[0]) {
                self.watched[0] = Self::find_unassigned(assignment, clause, None);
            }
            if self.watched[1] == self.watched[0]
                || Self::is_falsified(assignment, clause, self.watched[1])
            {
                self.watched[1] = Self::find_unassigned(assignment, clause, self.watched[0]);
            }

            self.refresh_status(assignment, clause);
        }
    }

    /// Recomputes both watches and the status by a single pass over the
    /// clause. Required after resets and clause attachment.
    pub fn rescan(&mut self, assignment: &Assignment, clause: &Clause) {
        self.watched = [None, None];
        for (index, &literal) in clause.iter().enumerate() {
            let state = assignment.value(literal.variable());
            if literal.eval(state) {
                self.watched[1] = self.watched[0];
                self.watched[0] = Some(index);
            } else if state.is_unassigned() {
                if self.watched[0].is_none() {
                    self.watched[0] = Some(index);
                } else if self.watched[1].is_none() {
                    self.watched[1] = Some(index);
                }
            }
        }
        self.refresh_status(assignment, clause);
    }

    fn refresh_status(&mut self, assignment: &Assignment, clause: &Clause) {
        self.status = if Self::is_satisfied(assignment, clause, self.watched[0])
            || Self::is_satisfied(assignment, clause, self.watched[1])
        {
            ClauseStatus::Satisfied
        } else if self.watched[1].is_some() {
            ClauseStatus::Undecided
        } else if self.watched[0].is_some() {
            ClauseStatus::Unit
        } else {
            ClauseStatus::Unsatisfied
        };
    }

    /// Both watched variables, when both slots are occupied.
    fn watched_variables(&self, clause: &Clause) -> Option<[Variable; 2]> {
        match self.watched {
            [Some(first), Some(second)] => {
                Some([clause[first].variable(), clause[second].variable()])
            }
            _ => None,
        }
    }

    fn watches_literal(&self, clause: &Clause, literal: Literal) -> bool {
        self.watched
            .iter()
            .flatten()
            .any(|&index| clause[index] == literal)
    }

    fn find_unassigned(
        assignment: &Assignment,
        clause: &Clause,
        other: Option<usize>,
    ) -> Option<usize> {
        clause.iter().enumerate().position(|(index, literal)| {
            assignment.value(literal.variable()).is_unassigned() && Some(index) != other
        })
    }

    fn is_satisfied(assignment: &Assignment, clause: &Clause, slot: Option<usize>) -> bool {
        slot.is_some_and(|index| {
            let literal = clause[index];
            literal.eval(assignment.value(literal.variable()))
        })
    }

    fn is_falsified(assignment: &Assignment, clause: &Clause, slot: Option<usize>) -> bool {
        slot.is_none_or(|index| {
            let literal = clause[index];
            let state = assignment.value(literal.variable());
            state.is_assigned() && !literal.eval(state)
        })
    }
}
