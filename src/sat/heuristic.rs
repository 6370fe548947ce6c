#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Exponential VSIDS decision heuristic.
//!
//! Every variable carries a floating-point activity score. Variables touched
//! by conflict analysis are bumped by a global increment which itself grows
//! by the decay rate each conflict, so recent activity outweighs old
//! activity exponentially. When a score crosses the rescore threshold all
//! scores and the increment are scaled down by the rescore factor.
//!
//! Candidate variables live in a lazy max-heap of `(score, variable)`
//! entries: bumping a variable pushes a fresh entry instead of re-ordering
//! the heap, and entries whose score no longer matches the score table are
//! discarded when popped. The membership set records which variables
//! currently have a live entry, so unassigned variables are never lost.

use crate::sat::assignment::Assignment;
use crate::sat::literal::Variable;
use ordered_float::OrderedFloat;
use rustc_hash::FxHashSet;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Tunable parameters of the scoring scheme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringParameters {
    /// Scores above this trigger a global rescore.
    pub rescore_threshold: f64,
    /// Factor applied to every score and the increment on rescore.
    pub rescore_factor: f64,
    /// Starting value of the activity increment.
    pub initial_increment: f64,
    /// Multiplier applied to the increment after each conflict.
    pub decay_rate: f64,
}

impl Default for ScoringParameters {
    fn default() -> Self {
        Self {
            rescore_threshold: 1e100,
            rescore_factor: 1e-100,
            initial_increment: 1.0,
            decay_rate: 1.05,
        }
    }
}

type HeapEntry = (OrderedFloat<f64>, Reverse<Variable>);

/// EVSIDS state: score table, activity increment and the candidate heap.
#[derive(Debug, Clone)]
pub struct Evsids {
    scoring: ScoringParameters,
    scores: Vec<f64>,
    increment: f64,
    heap: BinaryHeap<HeapEntry>,
    members: FxHashSet<Variable>,
}

impl Evsids {
    #[must_use]
    pub fn new(num_variables: usize, scoring: ScoringParameters) -> Self {
        let mut evsids = Self {
            scoring,
            scores: Vec::new(),
            increment: scoring.initial_increment,
            heap: BinaryHeap::new(),
            members: FxHashSet::default(),
        };
        evsids.formula_updated(num_variables);
        evsids
    }

    /// Zeroes all scores, restores the initial increment and re-seeds the
    /// heap with every variable.
    pub fn reset(&mut self) {
        self.scores.fill(0.0);
        self.increment = self.scoring.initial_increment;
        self.members.clear();
        self.heap.clear();
        for index in 0..self.scores.len() {
            #[allow(clippy::cast_possible_truncation)]
            let variable = (index + 1) as Variable;
            self.insert(variable);
        }
    }

    /// Bumps the activity of a variable, rescoring globally when the score
    /// crosses the threshold.
    pub fn variable_active(&mut self, variable: Variable) {
        let score = &mut self.scores[variable as usize - 1];
        *score += self.increment;
        debug_assert!(score.is_finite() && *score >= 0.0);

        if *score > self.scoring.rescore_threshold {
            for score in &mut self.scores {
                *score *= self.scoring.rescore_factor;
            }
            self.increment *= self.scoring.rescore_factor;
            self.rebuild();
        } else if self.members.contains(&variable) {
            // The stored entry went stale; push a fresh one alongside it.
            self.heap
                .push((OrderedFloat(self.scores[variable as usize - 1]), Reverse(variable)));
        }
    }

    /// Observes an assignment change of a variable. A variable that is
    /// (again) unassigned and absent from the heap is re-inserted; anything
    /// else is a no-op.
    pub fn variable_assigned(&mut self, assignment: &Assignment, variable: Variable) {
        if assignment.value(variable).is_unassigned() && !self.members.contains(&variable) {
            self.insert(variable);
        }
    }

    /// Pops the highest-scoring unassigned variable, breaking score ties
    /// toward the smaller variable id. `None` when the heap drains.
    pub fn pop_variable(&mut self, assignment: &Assignment) -> Option<Variable> {
        while let Some((score, Reverse(variable))) = self.heap.pop() {
            if self.scores.get(variable as usize - 1) != Some(&score.0) {
                continue;
            }
            self.members.remove(&variable);
            if assignment.value(variable).is_unassigned() {
                return Some(variable);
            }
        }
        None
    }

    /// Grows the activity increment; called once per conflict.
    pub fn next_iteration(&mut self) {
        self.increment *= self.scoring.decay_rate;
    }

    /// Adapts to a changed variable count: new variables start at score 0
    /// and enter the heap, dropped variables leave it.
    pub fn formula_updated(&mut self, num_variables: usize) {
        let known = self.scores.len();
        if known < num_variables {
            self.scores.resize(num_variables, 0.0);
            for index in known..num_variables {
                #[allow(clippy::cast_possible_truncation)]
                let variable = (index + 1) as Variable;
                self.insert(variable);
            }
        } else if known > num_variables {
            self.scores.truncate(num_variables);
            #[allow(clippy::cast_possible_truncation)]
            self.members
                .retain(|&variable| (variable as usize) <= num_variables);
            self.rebuild();
        }
    }

    fn insert(&mut self, variable: Variable) {
        self.members.insert(variable);
        self.heap
            .push((OrderedFloat(self.scores[variable as usize - 1]), Reverse(variable)));
    }

    /// Rebuilds the heap from the membership set with current scores.
    fn rebuild(&mut self) {
        self.heap = self
            .members
            .iter()
            .map(|&variable| (OrderedFloat(self.scores[variable as usize - 1]), Reverse(variable)))
            .collect();
    }
}
