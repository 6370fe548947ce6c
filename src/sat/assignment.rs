#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use crate::sat::literal::{Literal, Variable};

/// Assignment state of a single propositional variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, PartialOrd, Ord)]
pub enum VarState {
    /// The variable has not been assigned a truth value.
    #[default]
    Unassigned,
    /// The variable carries a truth value.
    Assigned(bool),
}

impl VarState {
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        !self.is_assigned()
    }

    /// The opposite truth value; `Unassigned` flips to itself.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Assigned(value) => Self::Assigned(!value),
            Self::Unassigned => Self::Unassigned,
        }
    }
}

impl From<VarState> for Option<bool> {
    fn from(state: VarState) -> Self {
        match state {
            VarState::Assigned(value) => Some(value),
            VarState::Unassigned => None,
        }
    }
}

/// Dense per-variable tri-state, indexed by 1-based variable id.
///
/// Whenever the number of variables in the formula changes, the assignment
/// must be resized through [`Assignment::set_num_variables`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    states: Vec<VarState>,
}

impl Assignment {
    #[must_use]
    pub fn new(num_variables: usize) -> Self {
        Self {
            states: vec![VarState::Unassigned; num_variables],
        }
    }

    #[must_use]
    pub fn num_variables(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn value(&self, variable: Variable) -> VarState {
        self.states
            .get(variable as usize - 1)
            .copied()
            .unwrap_or_default()
    }

    pub fn set(&mut self, variable: Variable, state: VarState) {
        self.states[variable as usize - 1] = state;
    }

    /// Evaluates a literal under the current assignment.
    ///
    /// `Some(true)` when satisfied, `Some(false)` when falsified, `None`
    /// when its variable is unassigned.
    #[must_use]
    pub fn literal_value(&self, literal: Literal) -> Option<bool> {
        Option::<bool>::from(self.value(literal.variable())).map(|value| value == literal.polarity())
    }

    /// Extends with unassigned slots or truncates from the tail.
    pub fn set_num_variables(&mut self, num_variables: usize) {
        self.states.resize(num_variables, VarState::Unassigned);
    }

    pub fn reset(&mut self) {
        self.states.fill(VarState::Unassigned);
    }

    /// Iterates `(variable, state)` pairs over all variables.
    pub fn iter(&self) -> impl Iterator<Item = (Variable, VarState)> + '_ {
        self.states.iter().enumerate().map(|(index, &state)| {
            #[allow(clippy::cast_possible_truncation)]
            let variable = (index + 1) as Variable;
            (variable, state)
        })
    }

    /// Iterates the variables currently unassigned.
    pub fn unassigned(&self) -> impl Iterator<Item = Variable> + '_ {
        self.iter()
            .filter_map(|(variable, state)| state.is_unassigned().then_some(variable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_value() {
        let mut assignment = Assignment::new(3);
        assert_eq!(assignment.value(1), VarState::Unassigned);

        assignment.set(1, VarState::Assigned(true));
        assignment.set(3, VarState::Assigned(false));

        assert_eq!(assignment.value(1), VarState::Assigned(true));
        assert_eq!(assignment.value(2), VarState::Unassigned);
        assert_eq!(assignment.value(3), VarState::Assigned(false));
    }

    #[test]
    fn test_literal_value() {
        let mut assignment = Assignment::new(2);
        assignment.set(1, VarState::Assigned(true));

        assert_eq!(assignment.literal_value(Literal::new(1, true)), Some(true));
        assert_eq!(assignment.literal_value(Literal::new(1, false)), Some(false));
        assert_eq!(assignment.literal_value(Literal::new(2, true)), None);
    }

    #[test]
    fn test_resize() {
        let mut assignment = Assignment::new(2);
        assignment.set(2, VarState::Assigned(true));

        assignment.set_num_variables(4);
        assert_eq!(assignment.num_variables(), 4);
        assert_eq!(assignment.value(2), VarState::Assigned(true));
        assert_eq!(assignment.value(4), VarState::Unassigned);

        assignment.set_num_variables(1);
        assert_eq!(assignment.num_variables(), 1);
    }

    #[test]
    fn test_reset_and_unassigned_iter() {
        let mut assignment = Assignment::new(3);
        assignment.set(2, VarState::Assigned(false));
        assert_eq!(assignment.unassigned().collect::<Vec<_>>(), vec![1, 3]);

        assignment.reset();
        assert_eq!(assignment.unassigned().count(), 3);
    }

    #[test]
    fn test_flipped() {
        assert_eq!(
            VarState::Assigned(true).flipped(),
            VarState::Assigned(false)
        );
        assert_eq!(VarState::Unassigned.flipped(), VarState::Unassigned);
    }
}
