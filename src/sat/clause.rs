#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Clause representation used across the solver.
//!
//! A clause is a disjunction of distinct literals (e.g. `x1 OR !x2 OR x3`).
//! Clauses are immutable once built: the solver never rewrites clause
//! contents, it only appends or removes whole clauses from the formula.
//! [`ClauseBuilder`] deduplicates literals on insertion and is intended to be
//! kept around and reused, which lets learned clauses be assembled without
//! fresh allocations for the common short-clause case (the inline capacity of
//! the backing [`SmallVec`] covers them).

use crate::sat::error::SatError;
use crate::sat::literal::{Literal, Variable};
use smallvec::SmallVec;
use std::ops::Index;

/// Inline capacity of clause literal storage; clauses at most this long
/// live entirely inside the clause value.
const INLINE_LITERALS: usize = 8;

/// An immutable ordered set of distinct literals together with the maximum
/// variable index it references.
///
/// The empty clause is permitted and is trivially unsatisfiable. Literal
/// order is unspecified but stable after construction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Clause {
    literals: SmallVec<[Literal; INLINE_LITERALS]>,
    num_variables: Variable,
}

impl Clause {
    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// The largest variable index referenced by this clause, 0 when empty.
    #[must_use]
    pub const fn num_variables(&self) -> Variable {
        self.num_variables
    }

    /// Checked literal access.
    ///
    /// # Errors
    ///
    /// Fails when `index` is past the clause length.
    pub fn at(&self, index: usize) -> Result<Literal, SatError> {
        self.literals.get(index).copied().ok_or_else(|| {
            SatError::new(format!(
                "literal index {index} out of bounds for clause of length {}",
                self.literals.len()
            ))
        })
    }

    /// Position of a literal within the clause, if present.
    #[must_use]
    pub fn find(&self, literal: Literal) -> Option<usize> {
        self.literals.iter().position(|&lit| lit == literal)
    }

    #[must_use]
    pub fn contains(&self, literal: Literal) -> bool {
        self.find(literal).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Literal> {
        self.literals.iter()
    }

    #[must_use]
    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }
}

impl Index<usize> for Clause {
    type Output = Literal;

    fn index(&self, index: usize) -> &Self::Output {
        &self.literals[index]
    }
}

impl<'a> IntoIterator for &'a Clause {
    type Item = &'a Literal;
    type IntoIter = std::slice::Iter<'a, Literal>;

    fn into_iter(self) -> Self::IntoIter {
        self.literals.iter()
    }
}

impl FromIterator<Literal> for Clause {
    /// Collects literals into a clause, deduplicating on the way.
    fn from_iter<I: IntoIterator<Item = Literal>>(iter: I) -> Self {
        let mut builder = ClauseBuilder::default();
        for literal in iter {
            builder.add(literal);
        }
        builder.build()
    }
}

/// Accumulates distinct literals and produces a [`Clause`].
///
/// Duplicate insertions are ignored. The builder is reusable: `build`
/// leaves it empty for the next clause.
#[derive(Debug, Clone, Default)]
pub struct ClauseBuilder {
    literals: SmallVec<[Literal; INLINE_LITERALS]>,
    num_variables: Variable,
}

impl ClauseBuilder {
    pub fn add(&mut self, literal: Literal) -> &mut Self {
        if !self.literals.contains(&literal) {
            self.num_variables = self.num_variables.max(literal.variable());
            self.literals.push(literal);
        }
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn reset(&mut self) -> &mut Self {
        self.literals.clear();
        self.num_variables = 0;
        self
    }

    /// Finishes the clause under construction and resets the builder.
    pub fn build(&mut self) -> Clause {
        let clause = Clause {
            literals: std::mem::take(&mut self.literals),
            num_variables: self.num_variables,
        };
        self.num_variables = 0;
        clause
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::clause;
    use super::*;

    #[test]
    fn test_builder_dedup() {
        let mut builder = ClauseBuilder::default();
        builder
            .add(Literal::new(1, true))
            .add(Literal::new(2, false))
            .add(Literal::new(1, true));
        let clause = builder.build();

        assert_eq!(clause.len(), 2);
        assert!(clause.contains(Literal::new(1, true)));
        assert!(clause.contains(Literal::new(2, false)));
    }

    #[test]
    fn test_builder_keeps_complementary_literals() {
        // x and !x are distinct literals; tautology detection is not the
        // builder's job.
        let clause = clause(&[1, -1]);
        assert_eq!(clause.len(), 2);
    }

    #[test]
    fn test_num_variables() {
        let clause = clause(&[1, -7, 3]);
        assert_eq!(clause.num_variables(), 7);
        assert_eq!(Clause::default().num_variables(), 0);
    }

    #[test]
    fn test_builder_reuse() {
        let mut builder = ClauseBuilder::default();
        builder.add(Literal::new(9, true));
        let first = builder.build();
        assert_eq!(first.num_variables(), 9);

        builder.add(Literal::new(2, false));
        let second = builder.build();
        assert_eq!(second.len(), 1);
        assert_eq!(second.num_variables(), 2);
    }

    #[test]
    fn test_checked_access() {
        let clause = clause(&[4, -2]);
        assert_eq!(clause.at(0), Ok(Literal::new(4, true)));
        assert!(clause.at(2).is_err());
    }

    #[test]
    fn test_empty_clause() {
        let clause = Clause::default();
        assert!(clause.is_empty());
        assert_eq!(clause.len(), 0);
    }

    #[test]
    fn test_find() {
        let clause = clause(&[1, 2, -3]);
        assert_eq!(clause.find(Literal::new(2, true)), Some(1));
        assert_eq!(clause.find(Literal::new(3, false)), Some(2));
        assert_eq!(clause.find(Literal::new(3, true)), None);
    }
}
