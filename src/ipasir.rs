#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(unsafe_code, clippy::missing_safety_doc)]

//! IPASIR-style incremental C interface.
//!
//! Exposes the CDCL engine behind the de-facto incremental SAT solver ABI:
//! an opaque handle created by [`ipasir_init`], clauses streamed literal by
//! literal through [`ipasir_add`] (zero finalizes a clause), assumptions
//! consumed by the next [`ipasir_solve`] call, and model/failed-assumption
//! queries afterwards. Panics never cross the FFI boundary: every entry
//! point catches them, logs, and returns a neutral value.

use crate::sat::cdcl::CdclSolver;
use crate::sat::clause::ClauseBuilder;
use crate::sat::formula::Formula;
use crate::sat::literal::Literal;
use crate::sat::solver::{Incremental, Solver, SolverStatus};
use std::ffi::{c_char, c_int, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Solver handle behind the opaque `void *`.
struct IpasirSolver {
    solver: CdclSolver,
    clause: ClauseBuilder,
    assumptions: Vec<Literal>,
    final_conflict: Vec<Literal>,
}

impl IpasirSolver {
    fn new() -> Self {
        Self {
            solver: CdclSolver::new(Formula::new()),
            clause: ClauseBuilder::default(),
            assumptions: Vec::new(),
            final_conflict: Vec::new(),
        }
    }
}

fn guarded<T>(entry: &str, neutral: T, body: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(value) => value,
        Err(_) => {
            log::error!("{entry}: caught a panic at the FFI boundary");
            neutral
        }
    }
}

unsafe fn solver_mut<'a>(handle: *mut c_void) -> &'a mut IpasirSolver {
    &mut *handle.cast::<IpasirSolver>()
}

/// Returns the solver name and version as a NUL-terminated string.
#[no_mangle]
pub extern "C" fn ipasir_signature() -> *const c_char {
    static SIGNATURE: &[u8] = concat!("ferrosat (CDCL) v", env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    SIGNATURE.as_ptr().cast()
}

/// Creates a fresh solver handle.
#[no_mangle]
pub extern "C" fn ipasir_init() -> *mut c_void {
    guarded("ipasir_init", std::ptr::null_mut(), || {
        Box::into_raw(Box::new(IpasirSolver::new())).cast()
    })
}

/// Destroys a handle created by [`ipasir_init`].
#[no_mangle]
pub unsafe extern "C" fn ipasir_release(handle: *mut c_void) {
    guarded("ipasir_release", (), || {
        drop(Box::from_raw(handle.cast::<IpasirSolver>()));
    });
}

/// Adds a literal to the clause under construction; 0 finalizes the clause
/// and appends it to the formula.
#[no_mangle]
pub unsafe extern "C" fn ipasir_add(handle: *mut c_void, lit_or_zero: i32) {
    guarded("ipasir_add", (), || {
        let state = solver_mut(handle);
        match Literal::try_from(lit_or_zero) {
            Ok(literal) => {
                state.clause.add(literal);
            }
            Err(_) => {
                let clause = state.clause.build();
                state.solver.append_clause(clause);
            }
        }
    });
}

/// Registers an assumption for the next solve call.
#[no_mangle]
pub unsafe extern "C" fn ipasir_assume(handle: *mut c_void, lit: i32) {
    guarded("ipasir_assume", (), || {
        let state = solver_mut(handle);
        if let Ok(literal) = Literal::try_from(lit) {
            state.assumptions.push(literal);
        } else {
            log::error!("ipasir_assume: ignoring invalid literal 0");
        }
    });
}

/// Solves under the registered assumptions, which are consumed by the call.
///
/// Returns 10 when satisfiable, 20 when unsatisfiable, 0 otherwise.
#[no_mangle]
pub unsafe extern "C" fn ipasir_solve(handle: *mut c_void) -> c_int {
    guarded("ipasir_solve", 0, || {
        let state = solver_mut(handle);
        state.final_conflict.clear();

        // Assumptions on variables the formula never declares are vacuous;
        // keeping them would index state sized by the formula.
        let mut assumptions = std::mem::take(&mut state.assumptions);
        assumptions.retain(|literal| {
            let known = literal.variable() <= state.solver.formula().num_variables();
            if !known {
                log::warn!("ipasir_solve: dropping assumption {literal} on an unknown variable");
            }
            known
        });
        let status = state
            .solver
            .solve_with_final_conflict(&assumptions, &mut state.final_conflict);

        match status {
            SolverStatus::Satisfied => 10,
            SolverStatus::Unsatisfied => 20,
            SolverStatus::Unknown | SolverStatus::Solving => 0,
        }
    })
}

/// Value of a literal in the model: `lit` when true, `-lit` when false, 0
/// when the variable is unassigned.
#[no_mangle]
pub unsafe extern "C" fn ipasir_val(handle: *mut c_void, lit: i32) -> i32 {
    guarded("ipasir_val", 0, || {
        let state = solver_mut(handle);
        let Ok(literal) = Literal::try_from(lit) else {
            return 0;
        };
        match state.solver.assignment().literal_value(literal) {
            Some(true) => lit,
            Some(false) => -lit,
            None => 0,
        }
    })
}

/// Whether an assumption literal is part of the final conflict of the last
/// unsatisfiable solve call.
#[no_mangle]
pub unsafe extern "C" fn ipasir_failed(handle: *mut c_void, lit: i32) -> c_int {
    guarded("ipasir_failed", 0, || {
        let state = solver_mut(handle);
        let failed = Literal::try_from(lit)
            .is_ok_and(|literal| state.final_conflict.contains(&literal));
        c_int::from(failed)
    })
}

/// Installs (or clears, with a null callback) a termination predicate
/// polled at the solver's interrupt safe points.
#[no_mangle]
pub unsafe extern "C" fn ipasir_set_terminate(
    handle: *mut c_void,
    data: *mut c_void,
    callback: Option<extern "C" fn(*mut c_void) -> c_int>,
) {
    guarded("ipasir_set_terminate", (), || {
        let state = solver_mut(handle);
        match callback {
            Some(callback) => state.solver.interrupt_on(move || callback(data) != 0),
            None => state.solver.clear_interrupt_predicate(),
        }
    });
}

/// Installs (or clears, with a null callback) a learned-clause listener.
/// The callback receives clauses of at most `maxlen` literals as a
/// 0-terminated array.
#[no_mangle]
pub unsafe extern "C" fn ipasir_set_learn(
    handle: *mut c_void,
    data: *mut c_void,
    maxlen: c_int,
    callback: Option<extern "C" fn(*mut c_void, *const i32)>,
) {
    guarded("ipasir_set_learn", (), || {
        let state = solver_mut(handle);
        match callback {
            Some(callback) => {
                state.solver.on_learned_clause(move |clause| {
                    let length = clause.len();
                    if length > usize::try_from(maxlen).unwrap_or(0) {
                        return;
                    }
                    let mut content: Vec<i32> = Vec::with_capacity(length + 1);
                    content.extend(clause.iter().map(|literal| literal.get()));
                    content.push(Literal::TERMINATOR);
                    callback(data, content.as_ptr());
                });
            }
            None => state.solver.clear_learned_clause_listener(),
        }
    });
}
