#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Reader for the DIMACS CNF format.
//!
//! Comment lines begin with `c`; a preamble `p cnf <variables> <clauses>`
//! announces the expected counts; the remainder is whitespace-separated
//! integers forming clauses terminated by `0`. A missing or malformed
//! preamble is an error, while count mismatches between the preamble and the
//! observed formula are only warnings, since plenty of benchmark files get
//! them wrong.

use crate::sat::error::SatError;
use crate::sat::formula::{Formula, FormulaBuilder};
use crate::sat::literal::Literal;
use std::io::BufRead;
use std::path::Path;

/// Parses DIMACS input into a fresh formula.
///
/// # Errors
///
/// Fails when the preamble is absent or unparseable, when a literal token is
/// not an integer, or on an underlying I/O error.
pub fn parse<R: BufRead>(mut reader: R) -> Result<Formula, SatError> {
    let declared = scan_preamble(&mut reader)?;

    let mut formula = Formula::new();
    let mut builder = FormulaBuilder::new(&mut formula);
    let mut line = String::new();
    'input: loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        for token in line.split_whitespace() {
            if token == "%" {
                // End-of-data marker used by competition benchmark files.
                break 'input;
            }
            let value: i32 = token
                .parse()
                .map_err(|_| SatError::new(format!("invalid DIMACS literal '{token}'")))?;
            if value == Literal::TERMINATOR {
                builder.end_clause();
            } else {
                builder.append_literal(Literal::try_from(value)?);
            }
        }
    }
    builder.finish();

    if declared.clauses != formula.len() {
        log::warn!(
            "DIMACS preamble declares {} clause(s), input contains {}",
            declared.clauses,
            formula.len()
        );
    }
    if declared.variables != formula.num_variables() as usize {
        log::warn!(
            "DIMACS preamble declares {} variable(s), input uses {}",
            declared.variables,
            formula.num_variables()
        );
    }
    Ok(formula)
}

/// Opens and parses a DIMACS file.
///
/// # Errors
///
/// See [`parse`]; additionally fails when the file cannot be opened.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Formula, SatError> {
    let file = std::fs::File::open(path.as_ref()).map_err(|err| {
        SatError::new(format!("cannot open {}: {err}", path.as_ref().display()))
    })?;
    parse(std::io::BufReader::new(file))
}

struct Preamble {
    variables: usize,
    clauses: usize,
}

fn scan_preamble<R: BufRead>(reader: &mut R) -> Result<Preamble, SatError> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(SatError::new("DIMACS preamble is missing"));
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('c') {
            continue;
        }
        let mut fields = trimmed.split_whitespace();
        if fields.next() != Some("p") || fields.next() != Some("cnf") {
            return Err(SatError::new(format!(
                "invalid DIMACS preamble line '{trimmed}'"
            )));
        }

        let mut count = |name: &str| -> Result<usize, SatError> {
            fields
                .next()
                .and_then(|field| field.parse().ok())
                .ok_or_else(|| SatError::new(format!("invalid {name} count in DIMACS preamble")))
        };
        return Ok(Preamble {
            variables: count("variable")?,
            clauses: count("clause")?,
        });
    }
}
