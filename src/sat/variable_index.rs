#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use crate::sat::clause::Clause;
use crate::sat::literal::Variable;
use smallvec::SmallVec;

/// Aggregate polarity of a variable across all current clauses.
///
/// `Mixed` iff the variable occurs with both polarities, the pure variants
/// iff it occurs with exactly one, `None` iff it occurs in no clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    #[default]
    None,
    PurePositive,
    PureNegative,
    Mixed,
}

/// Occurrence lists for a single variable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariableIndexEntry {
    positive_clauses: SmallVec<[usize; 6]>,
    negative_clauses: SmallVec<[usize; 6]>,
    polarity: Polarity,
}

impl VariableIndexEntry {
    #[must_use]
    pub fn positive_clauses(&self) -> &[usize] {
        &self.positive_clauses
    }

    #[must_use]
    pub fn negative_clauses(&self) -> &[usize] {
        &self.negative_clauses
    }

    #[must_use]
    pub const fn polarity(&self) -> Polarity {
        self.polarity
    }

    fn record_positive(&mut self, clause_index: usize) {
        self.positive_clauses.push(clause_index);
        self.polarity = match self.polarity {
            Polarity::None => Polarity::PurePositive,
            Polarity::PureNegative => Polarity::Mixed,
            keep => keep,
        };
    }

    fn record_negative(&mut self, clause_index: usize) {
        self.negative_clauses.push(clause_index);
        self.polarity = match self.polarity {
            Polarity::None => Polarity::PureNegative,
            Polarity::PurePositive => Polarity::Mixed,
            keep => keep,
        };
    }
}

/// Per-variable lists of the clauses the variable occurs in, split by
/// occurrence polarity.
///
/// Built incrementally as clauses attach; detaching renumbers the stored
/// clause indices. The polarity tag is monotone towards `Mixed` while
/// clauses attach and is left untouched by detach; it feeds the
/// pure-literal scan and is not a correctness-critical value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariableIndex {
    entries: Vec<VariableIndexEntry>,
}

impl VariableIndex {
    #[must_use]
    pub fn new(num_variables: usize) -> Self {
        Self {
            entries: vec![VariableIndexEntry::default(); num_variables],
        }
    }

    #[must_use]
    pub fn num_variables(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn entry(&self, variable: Variable) -> &VariableIndexEntry {
        &self.entries[variable as usize - 1]
    }

    /// Grows or shrinks to cover `num_variables` entries.
    pub fn set_num_variables(&mut self, num_variables: usize) {
        self.entries
            .resize_with(num_variables, VariableIndexEntry::default);
    }

    /// Records every literal occurrence of a newly attached clause.
    pub fn attach(&mut self, clause_index: usize, clause: &Clause) {
        for literal in clause {
            let entry = &mut self.entries[literal.variable() as usize - 1];
            if literal.polarity() {
                entry.record_positive(clause_index);
            } else {
                entry.record_negative(clause_index);
            }
        }
    }

    /// Drops every reference to a detached clause and renumbers the
    /// references to clauses past it.
    pub fn detach(&mut self, clause_index: usize) {
        for entry in &mut self.entries {
            for list in [&mut entry.positive_clauses, &mut entry.negative_clauses] {
                list.retain(|&mut index| index != clause_index);
                for index in list.iter_mut() {
                    if *index > clause_index {
                        *index -= 1;
                    }
                }
            }
        }
    }
}
