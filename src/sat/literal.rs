#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use crate::sat::assignment::VarState;
use crate::sat::error::SatError;
use std::fmt::Debug;

/// Identifier of a propositional variable. Variables are 1-based; 0 is
/// reserved as the clause terminator and never names a variable.
pub type Variable = u32;

/// A variable with a polarity, encoded as a nonzero signed integer in the
/// DIMACS convention: `L > 0` means the variable must be true, `L < 0` that
/// it must be false.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal(i32);

impl Literal {
    /// The reserved clause terminator value. Not a valid literal.
    pub const TERMINATOR: i32 = 0;

    /// Creates a literal from a variable and a polarity.
    ///
    /// `polarity == true` yields the positive literal.
    #[must_use]
    pub fn new(variable: Variable, polarity: bool) -> Self {
        debug_assert_ne!(variable, 0, "variable 0 is reserved");
        #[allow(clippy::cast_possible_wrap)]
        let encoded = variable as i32;
        Self(if polarity { encoded } else { -encoded })
    }

    /// The underlying signed integer.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn variable(self) -> Variable {
        self.0.unsigned_abs()
    }

    #[must_use]
    pub const fn polarity(self) -> bool {
        self.0 > 0
    }

    /// The variable and the assignment that satisfies this literal.
    #[must_use]
    pub const fn assignment(self) -> (Variable, VarState) {
        (self.variable(), VarState::Assigned(self.polarity()))
    }

    /// Evaluates the literal under a variable state: true iff the state
    /// matches the literal's polarity.
    #[must_use]
    pub fn eval(self, state: VarState) -> bool {
        state == VarState::Assigned(self.polarity())
    }

    #[must_use]
    pub const fn negated(self) -> Self {
        Self(-self.0)
    }
}

impl TryFrom<i32> for Literal {
    type Error = SatError;

    /// Checked construction from a raw integer; rejects the terminator.
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if value == Self::TERMINATOR {
            Err(SatError::new("literal cannot be zero"))
        } else {
            Ok(Self(value))
        }
    }
}

impl Debug for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Literal({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding() {
        let lit = Literal::new(3, true);
        assert_eq!(lit.get(), 3);
        assert_eq!(lit.variable(), 3);
        assert!(lit.polarity());

        let lit = Literal::new(3, false);
        assert_eq!(lit.get(), -3);
        assert_eq!(lit.variable(), 3);
        assert!(!lit.polarity());
    }

    #[test]
    fn test_negation() {
        assert_eq!(Literal::new(1, true).negated(), Literal::new(1, false));
        assert_eq!(Literal::new(1, false).negated(), Literal::new(1, true));
        assert_eq!(
            Literal::new(7, true).negated().negated(),
            Literal::new(7, true)
        );
    }

    #[test]
    fn test_eval() {
        let lit = Literal::new(2, true);
        assert!(lit.eval(VarState::Assigned(true)));
        assert!(!lit.eval(VarState::Assigned(false)));
        assert!(!lit.eval(VarState::Unassigned));

        let lit = lit.negated();
        assert!(lit.eval(VarState::Assigned(false)));
        assert!(!lit.eval(VarState::Assigned(true)));
    }

    #[test]
    fn test_checked_construction() {
        assert!(Literal::try_from(0).is_err());
        assert_eq!(Literal::try_from(-4).unwrap(), Literal::new(4, false));
    }

    #[test]
    fn test_assignment_pair() {
        let (variable, state) = Literal::new(5, false).assignment();
        assert_eq!(variable, 5);
        assert_eq!(state, VarState::Assigned(false));
    }
}
