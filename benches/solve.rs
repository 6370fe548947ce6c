use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ferrosat::sat::cdcl::CdclSolver;
use ferrosat::sat::clause::ClauseBuilder;
use ferrosat::sat::dpll::DpllSolver;
use ferrosat::sat::formula::Formula;
use ferrosat::sat::literal::Literal;
use ferrosat::sat::solver::Solver;

/// Pigeonhole principle PHP(n + 1, n): unsatisfiable, forces clause
/// learning to earn its keep.
fn pigeonhole(holes: u32) -> Formula {
    let pigeons = holes + 1;
    let var = |pigeon: u32, hole: u32| pigeon * holes + hole + 1;

    let mut formula = Formula::new();
    let mut builder = ClauseBuilder::default();

    for pigeon in 0..pigeons {
        for hole in 0..holes {
            builder.add(Literal::new(var(pigeon, hole), true));
        }
        formula.append_clause(builder.build());
    }
    for hole in 0..holes {
        for first in 0..pigeons {
            for second in (first + 1)..pigeons {
                builder.add(Literal::new(var(first, hole), false));
                builder.add(Literal::new(var(second, hole), false));
                formula.append_clause(builder.build());
            }
        }
    }
    formula
}

fn bench_pigeonhole(c: &mut Criterion) {
    let formula = pigeonhole(5);

    c.bench_function("cdcl - php(6,5)", |b| {
        b.iter(|| {
            let mut solver = CdclSolver::new(formula.clone());
            black_box(solver.solve());
        });
    });

    let formula = pigeonhole(4);
    c.bench_function("dpll - php(5,4)", |b| {
        b.iter(|| {
            let mut solver = DpllSolver::new(formula.clone());
            black_box(solver.solve());
        });
    });
}

criterion_group!(benches, bench_pigeonhole);
criterion_main!(benches);
