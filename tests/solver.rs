//! End-to-end scenarios exercising both engines through the public API.

use ferrosat::sat::cdcl::CdclSolver;
use ferrosat::sat::clause::{Clause, ClauseBuilder};
use ferrosat::sat::dimacs;
use ferrosat::sat::dpll::DpllSolver;
use ferrosat::sat::formula::Formula;
use ferrosat::sat::literal::Literal;
use ferrosat::sat::solver::{Incremental, Solver, SolverStatus};
use rand::prelude::*;

fn lit(value: i32) -> Literal {
    Literal::try_from(value).expect("test literals are nonzero")
}

fn clause(literals: &[i32]) -> Clause {
    let mut builder = ClauseBuilder::default();
    for &value in literals {
        builder.add(lit(value));
    }
    builder.build()
}

fn formula(clauses: &[&[i32]]) -> Formula {
    let mut formula = Formula::new();
    for literals in clauses {
        formula.append_clause(clause(literals));
    }
    formula
}

fn assert_model(solver: &impl Solver) {
    for clause in solver.formula() {
        assert!(
            clause
                .iter()
                .any(|&lit| solver.assignment().literal_value(lit) == Some(true)),
            "model does not satisfy clause '{clause}'"
        );
    }
}

#[test]
fn single_positive_unit() {
    let mut solver = CdclSolver::new(formula(&[&[1]]));
    assert_eq!(solver.solve(), SolverStatus::Satisfied);
    assert_eq!(solver.assignment().literal_value(lit(1)), Some(true));
    assert_model(&solver);
}

#[test]
fn contradictory_units_without_assumptions() {
    let mut solver = CdclSolver::new(formula(&[&[1], &[-1]]));
    let mut final_conflict = Vec::new();
    assert_eq!(
        solver.solve_with_final_conflict(&[], &mut final_conflict),
        SolverStatus::Unsatisfied
    );
    assert!(final_conflict.is_empty());
}

#[test]
fn exhaustive_exclusion_of_two_variables() {
    let clauses: &[&[i32]] = &[&[1, 2], &[-1, 2], &[1, -2], &[-1, -2]];

    let mut cdcl = CdclSolver::new(formula(clauses));
    assert_eq!(cdcl.solve(), SolverStatus::Unsatisfied);

    let mut dpll = DpllSolver::new(formula(clauses));
    assert_eq!(dpll.solve(), SolverStatus::Unsatisfied);
}

#[test]
fn final_conflict_under_assumption() {
    let mut solver = CdclSolver::new(formula(&[&[1, 2], &[-1, 3], &[-2, 3]]));
    let mut final_conflict = Vec::new();
    let status = solver.solve_with_final_conflict(&[lit(-3)], &mut final_conflict);

    assert_eq!(status, SolverStatus::Unsatisfied);
    assert_eq!(final_conflict, vec![lit(-3)]);

    // Without the assumption the formula is satisfiable.
    assert_eq!(solver.solve(), SolverStatus::Satisfied);
    assert_model(&solver);
}

#[test]
fn pigeonhole_three_into_two_learns_clauses() {
    let php: &[&[i32]] = &[
        &[1, 2],
        &[3, 4],
        &[5, 6],
        &[-1, -3],
        &[-1, -5],
        &[-3, -5],
        &[-2, -4],
        &[-2, -6],
        &[-4, -6],
    ];

    let learned = std::rc::Rc::new(std::cell::Cell::new(0_usize));
    let counter = std::rc::Rc::clone(&learned);

    let mut solver = CdclSolver::new(formula(php));
    solver.on_learned_clause(move |_| counter.set(counter.get() + 1));

    assert_eq!(solver.solve(), SolverStatus::Unsatisfied);
    assert!(learned.get() > 0);
}

#[test]
fn appended_clause_invalidates_previous_model() {
    let mut solver = CdclSolver::new(formula(&[&[1, 2], &[-1, 2]]));
    assert_eq!(solver.solve(), SolverStatus::Satisfied);

    // Forbid the exact model the solver produced.
    let mut blocker = ClauseBuilder::default();
    for (variable, state) in solver.assignment().iter() {
        if let Some(value) = Option::<bool>::from(state) {
            blocker.add(Literal::new(variable, !value));
        }
    }
    solver.append_clause(blocker.build());
    assert_eq!(solver.status(), SolverStatus::Unknown);

    let status = solver.solve();
    assert!(matches!(
        status,
        SolverStatus::Satisfied | SolverStatus::Unsatisfied
    ));
    if status == SolverStatus::Satisfied {
        assert_model(&solver);
    }
}

#[test]
fn assumptions_are_honoured_by_models() {
    let mut solver = CdclSolver::new(formula(&[&[1, 2], &[-2, 3], &[3, 4]]));
    let assumptions = [lit(-1), lit(4)];
    assert_eq!(
        solver.solve_with_assumptions(&assumptions),
        SolverStatus::Satisfied
    );
    for assumption in assumptions {
        assert_eq!(solver.assignment().literal_value(assumption), Some(true));
    }
    assert_model(&solver);
}

#[test]
fn final_conflict_is_a_subset_of_assumptions() {
    // x1 and x2 together falsify the first two clauses; x4 is unrelated.
    let mut solver = CdclSolver::new(formula(&[&[-1, -2, 3], &[-1, -2, -3], &[4, 5]]));
    let assumptions = [lit(1), lit(2), lit(4)];
    let mut final_conflict = Vec::new();

    let status = solver.solve_with_final_conflict(&assumptions, &mut final_conflict);
    assert_eq!(status, SolverStatus::Unsatisfied);
    assert!(!final_conflict.is_empty());
    for literal in &final_conflict {
        assert!(assumptions.contains(literal));
    }
    assert!(!final_conflict.contains(&lit(4)));
}

#[test]
fn dimacs_to_solver_to_report() {
    let input = "c scenario\np cnf 3 3\n1 2 0\n-1 3 0\n-2 3 0\n";
    let formula = dimacs::parse(std::io::Cursor::new(input)).unwrap();
    assert_eq!(formula.to_string(), "p cnf 3 3\n1 2 0\n-1 3 0\n-2 3 0");

    let mut solver = CdclSolver::new(formula);
    assert_eq!(solver.solve(), SolverStatus::Satisfied);
    assert_model(&solver);
}

#[test]
fn solvers_are_reusable_after_interrupt() {
    let mut solver = CdclSolver::new(formula(&[&[1, 2], &[-1, 2]]));
    solver.interrupt_handle().store(true, std::sync::atomic::Ordering::Release);

    // The flag is consumed by the next solve call, which clears it first;
    // setting it from this thread before solving is a data-race-free way to
    // exercise the cooperative path.
    solver.interrupt_on(|| true);
    assert_eq!(solver.solve(), SolverStatus::Unknown);

    solver.clear_interrupt_predicate();
    assert_eq!(solver.solve(), SolverStatus::Satisfied);
    assert_model(&solver);
}

fn random_three_cnf(rng: &mut StdRng, num_variables: u32, num_clauses: usize) -> Vec<Vec<i32>> {
    (0..num_clauses)
        .map(|_| {
            let mut literals = Vec::with_capacity(3);
            while literals.len() < 3 {
                let variable = rng.gen_range(1..=num_variables) as i32;
                let literal = if rng.gen_bool(0.5) { variable } else { -variable };
                if !literals.contains(&literal) && !literals.contains(&-literal) {
                    literals.push(literal);
                }
            }
            literals
        })
        .collect()
}

#[test]
fn dpll_and_cdcl_agree_on_random_three_cnf() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for round in 0_u32..60 {
        let num_variables = 5 + round % 16; // up to 20 variables
        let num_clauses = (f64::from(num_variables) * 4.0) as usize;
        let clauses = random_three_cnf(&mut rng, num_variables, num_clauses);

        let build = || {
            let mut formula = Formula::new();
            for literals in &clauses {
                formula.append_clause(literals.iter().map(|&l| lit(l)).collect());
            }
            formula
        };

        let mut dpll = DpllSolver::new(build());
        let mut cdcl = CdclSolver::new(build());
        let dpll_status = dpll.solve();
        let cdcl_status = cdcl.solve();

        assert_eq!(
            dpll_status, cdcl_status,
            "engines disagree on {clauses:?}"
        );
        if cdcl_status == SolverStatus::Satisfied {
            assert_model(&cdcl);
            assert_model(&dpll);
        }
    }
}
