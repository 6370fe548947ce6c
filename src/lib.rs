//! An incremental SAT solver for CNF formulas.
//!
//! The crate provides a CDCL engine with two-watched-literal propagation,
//! 1-UIP clause learning, non-chronological backjumping, EVSIDS decision
//! scoring, phase saving and final-conflict extraction under assumptions,
//! plus a simpler DPLL engine sharing the same propagation machinery. The
//! formula can be modified between solve calls; clauses stream in through
//! the DIMACS reader, the incremental API or the IPASIR-style C interface.

/// IPASIR-style incremental C interface to the CDCL engine.
pub mod ipasir;

/// The solver: data structures, engines and text I/O.
pub mod sat;
