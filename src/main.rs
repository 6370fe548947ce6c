#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use clap::{ArgAction, Parser};
use ferrosat::sat::cdcl::CdclSolver;
use ferrosat::sat::dimacs;
use ferrosat::sat::dpll::DpllSolver;
use ferrosat::sat::error::SatError;
use ferrosat::sat::format::Report;
use ferrosat::sat::formula::Formula;
use ferrosat::sat::heuristic::ScoringParameters;
use ferrosat::sat::literal::Literal;
use ferrosat::sat::solver::{Solver, SolverStatus};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    name = "ferrosat",
    version,
    about = "An incremental CDCL/DPLL SAT solver",
    disable_version_flag = true
)]
struct Cli {
    /// Add literal L to the set of assumptions.
    #[arg(short = 'a', long = "assume", value_name = "L", allow_negative_numbers = true)]
    assume: Vec<i32>,

    /// Suppress auxiliary information.
    #[arg(short, long)]
    quiet: bool,

    /// Print learned clauses (CDCL solver only).
    #[arg(short, long)]
    learnts: bool,

    /// Do not print the satisfying assignment.
    #[arg(short = 'n', long = "no-model")]
    no_model: bool,

    /// Use the DPLL solver instead of CDCL.
    #[arg(short = 'D', long = "use-dpll")]
    use_dpll: bool,

    /// Set a solver parameter, e.g. `-s evsids-decay-rate=1.1`.
    #[arg(short = 's', long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,

    /// Print version information.
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    /// DIMACS CNF file; standard input when omitted.
    path: Option<PathBuf>,
}

/// Solver tunables collected from repeated `-s name=value` flags.
///
/// Supported names: `evsids-decay-rate`, `evsids-rescore-at`,
/// `evsids-init-increment`, `cdcl-phase-saving=on|off`,
/// `cdcl-pure-literal-elim=on|off`.
#[derive(Debug)]
struct Tuning {
    scoring: ScoringParameters,
    phase_saving: bool,
    pure_literal_elimination: bool,
}

impl Tuning {
    fn parse(settings: &[String]) -> Result<Self, SatError> {
        let mut tuning = Self {
            scoring: ScoringParameters::default(),
            phase_saving: true,
            pure_literal_elimination: true,
        };

        for setting in settings {
            let (name, value) = setting
                .split_once('=')
                .ok_or_else(|| SatError::new(format!("expected name=value, got '{setting}'")))?;
            match name {
                "evsids-decay-rate" => tuning.scoring.decay_rate = parse_real(name, value)?,
                "evsids-rescore-at" => {
                    let threshold = parse_real(name, value)?;
                    tuning.scoring.rescore_threshold = threshold;
                    tuning.scoring.rescore_factor = 1.0 / threshold;
                }
                "evsids-init-increment" => {
                    tuning.scoring.initial_increment = parse_real(name, value)?;
                }
                "cdcl-phase-saving" => tuning.phase_saving = value == "on",
                "cdcl-pure-literal-elim" => tuning.pure_literal_elimination = value == "on",
                _ => return Err(SatError::new(format!("unknown parameter '{name}'"))),
            }
        }
        Ok(tuning)
    }
}

fn parse_real(name: &str, value: &str) -> Result<f64, SatError> {
    value
        .parse()
        .map_err(|_| SatError::new(format!("parameter '{name}' expects a real number, got '{value}'")))
}

fn parse_assumptions(raw: &[i32]) -> Result<Vec<Literal>, SatError> {
    raw.iter().map(|&value| Literal::try_from(value)).collect()
}

/// Assumptions may only name variables the formula declares; anything else
/// would never be constrained by a clause.
fn check_assumptions(formula: &Formula, assumptions: &[Literal]) -> Result<(), SatError> {
    match assumptions
        .iter()
        .find(|literal| literal.variable() > formula.num_variables())
    {
        Some(literal) => Err(SatError::new(format!(
            "assumption {literal} references a variable beyond the formula's {}",
            formula.num_variables()
        ))),
        None => Ok(()),
    }
}

fn load_formula(path: Option<&PathBuf>) -> Result<Formula, SatError> {
    match path {
        Some(path) => dimacs::parse_file(path),
        None => dimacs::parse(std::io::stdin().lock()),
    }
}

fn greeting(cli: &Cli, signature: &str) {
    if !cli.quiet {
        println!("{signature}");
        println!(
            "Input: {}",
            cli.path
                .as_ref()
                .map_or_else(|| "<stdin>".to_string(), |path| path.display().to_string())
        );
    }
}

fn run_cdcl(cli: &Cli, tuning: Tuning, assumptions: &[Literal]) -> Result<(), SatError> {
    greeting(cli, CdclSolver::SIGNATURE);

    let formula = load_formula(cli.path.as_ref())?;
    check_assumptions(&formula, assumptions)?;

    let mut solver = CdclSolver::with_scoring(formula, tuning.scoring);
    solver.parameters_mut().phase_saving = tuning.phase_saving;
    solver.parameters_mut().pure_literal_elimination = tuning.pure_literal_elimination;

    let learned = std::rc::Rc::new(std::cell::Cell::new(0_usize));
    let counter = std::rc::Rc::clone(&learned);
    if cli.learnts {
        solver.on_learned_clause(move |clause| {
            counter.set(counter.get() + 1);
            println!("Learn clause: {clause}");
        });
    } else {
        solver.on_learned_clause(move |_| counter.set(counter.get() + 1));
    }

    let start = Instant::now();
    let mut final_conflict = Vec::new();
    let status = if assumptions.is_empty() {
        solver.solve()
    } else {
        solver.solve_with_final_conflict(assumptions, &mut final_conflict)
    };
    let elapsed = start.elapsed();

    if !cli.quiet {
        println!("Solved in {} microsecond(s)", elapsed.as_micros());
        if status == SolverStatus::Unsatisfied && !assumptions.is_empty() {
            let conflict = final_conflict
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            println!("Final conflict: {conflict}");
        }
        println!("Learned {} clause(s)", learned.get());
    }
    println!("{}", Report::new(status, solver.assignment(), !cli.no_model));
    Ok(())
}

fn run_dpll(cli: &Cli, assumptions: &[Literal]) -> Result<(), SatError> {
    greeting(cli, DpllSolver::SIGNATURE);

    let formula = load_formula(cli.path.as_ref())?;
    check_assumptions(&formula, assumptions)?;
    let mut solver = DpllSolver::new(formula);

    let start = Instant::now();
    let status = solver.solve_with_assumptions(assumptions);
    let elapsed = start.elapsed();

    if !cli.quiet {
        println!("Solved in {} microsecond(s)", elapsed.as_micros());
    }
    println!("{}", Report::new(status, solver.assignment(), !cli.no_model));
    Ok(())
}

fn run(cli: &Cli) -> Result<(), SatError> {
    if cli.use_dpll && cli.learnts {
        return Err(SatError::new("the DPLL solver has no learned clauses"));
    }

    let assumptions = parse_assumptions(&cli.assume)?;
    let tuning = Tuning::parse(&cli.set)?;
    if cli.use_dpll {
        run_dpll(cli, &assumptions)
    } else {
        run_cdcl(cli, tuning, &assumptions)
    }
}

fn main() -> std::process::ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::ExitCode::FAILURE
        }
    }
}
