#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use crate::sat::literal::Variable;
use std::ops::Index;

/// Why a variable was assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    /// A free choice made by the search.
    Decision,
    /// A literal the caller insists on for this solve call.
    Assumption,
    /// Forced by propagation without a specific reason clause.
    Propagation,
    /// Forced by the clause at this index becoming unit.
    Clause(usize),
}

impl Reason {
    /// Whether the assignment was forced by a concrete clause.
    #[must_use]
    pub const fn clause_index(self) -> Option<usize> {
        match self {
            Self::Clause(index) => Some(index),
            _ => None,
        }
    }
}

/// One assignment record on the trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub variable: Variable,
    pub value: bool,
    pub reason: Reason,
    pub level: usize,
}

/// Stack of assignment records with O(1) lookup by variable.
///
/// The decision level increments with every decision or assumption;
/// propagations inherit the current level. Entries whose variable exceeds
/// the current variable count are skipped lazily by `top`/`pop`; the
/// per-variable position map is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trail {
    entries: Vec<Entry>,
    level: usize,
    var_index: Vec<Option<usize>>,
}

impl Trail {
    #[must_use]
    pub fn new(num_variables: usize) -> Self {
        Self {
            entries: Vec::new(),
            level: 0,
            var_index: vec![None; num_variables],
        }
    }

    #[must_use]
    pub const fn level(&self) -> usize {
        self.level
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn decision(&mut self, variable: Variable, value: bool) {
        self.level += 1;
        self.push(variable, value, Reason::Decision, self.level);
    }

    pub fn assumption(&mut self, variable: Variable, value: bool) {
        self.level += 1;
        self.push(variable, value, Reason::Assumption, self.level);
    }

    pub fn propagation(&mut self, variable: Variable, value: bool) {
        self.push(variable, value, Reason::Propagation, self.level);
    }

    pub fn propagation_from(&mut self, variable: Variable, value: bool, clause_index: usize) {
        self.push(variable, value, Reason::Clause(clause_index), self.level);
    }

    fn push(&mut self, variable: Variable, value: bool, reason: Reason, level: usize) {
        self.var_index[variable as usize - 1] = Some(self.entries.len());
        self.entries.push(Entry {
            variable,
            value,
            reason,
            level,
        });
    }

    /// The topmost live entry; stale entries for variables beyond the
    /// current variable count are discarded on the way.
    pub fn top(&mut self) -> Option<&Entry> {
        self.drop_stale();
        self.entries.last()
    }

    /// Removes the topmost live entry and recomputes the level from the new
    /// top (0 when the trail empties).
    pub fn pop(&mut self) {
        self.drop_stale();
        if let Some(entry) = self.entries.pop() {
            self.var_index[entry.variable as usize - 1] = None;
            self.level = self.entries.last().map_or(0, |top| top.level);
        }
    }

    /// O(1) lookup of the trail entry assigning `variable`.
    #[must_use]
    pub fn find(&self, variable: Variable) -> Option<&Entry> {
        let position = (*self.var_index.get(variable as usize - 1)?)?;
        self.entries.get(position)
    }

    /// Truncates or extends the per-variable position map. Entries for
    /// variables past the new count become stale and are skipped lazily.
    pub fn set_num_variables(&mut self, num_variables: usize) {
        self.var_index.resize(num_variables, None);
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.level = 0;
        self.var_index.fill(None);
    }

    fn drop_stale(&mut self) {
        while self
            .entries
            .last()
            .is_some_and(|entry| entry.variable as usize > self.var_index.len())
        {
            self.entries.pop();
        }
    }
}

impl Index<usize> for Trail {
    type Output = Entry;

    fn index(&self, index: usize) -> &Self::Output {
        &self.entries[index]
    }
}
