use thiserror::Error;

/// The single error kind used across the solver, distinguished by message.
///
/// Covers invalid literals, out-of-bounds clause access, malformed DIMACS
/// input and bad command-line options. A failing assumption is deliberately
/// not an error: it surfaces as an unsatisfiable result together with a
/// final conflict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SatError {
    message: String,
}

impl SatError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for SatError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = SatError::new("invalid DIMACS preamble");
        assert_eq!(err.to_string(), "invalid DIMACS preamble");
        assert_eq!(err.message(), "invalid DIMACS preamble");
    }
}
