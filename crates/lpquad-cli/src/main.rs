use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lpquad_integrate::{Interval, PlotData, Polynomial, Quadrature, SampleSchedule, render_svg, report};
use lpquad_solver::{LpProblem, ModelSpec, Solution, SolutionStatus, Solver, beverage_model};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lpquad")]
#[command(about = "Beverage allocation LP and quadrature vs Monte Carlo integration", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG wins when set
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the beverage production model (or a model file) and print the plan
    Allocate {
        /// JSON model file; defaults to the built-in beverage model
        #[arg(short, long, value_name = "FILE")]
        model: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
        /// Show slack, shadow prices and reduced costs
        #[arg(short, long)]
        analysis: bool,
    },
    /// Compare adaptive quadrature with Monte Carlo estimates of x^2 + 4x - 3
    Integrate {
        /// Lower integration bound (a)
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        lower: f64,
        /// Upper integration bound (b)
        #[arg(long, default_value_t = 5.0, allow_hyphen_values = true)]
        upper: f64,
        /// Comma-separated Monte Carlo sample counts
        #[arg(long, value_delimiter = ',')]
        samples: Option<Vec<usize>>,
        /// Master seed for reproducible Monte Carlo runs
        #[arg(long, env = "LPQUAD_SEED")]
        seed: Option<u64>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
        /// Write an SVG plot of the integrand and integrated region
        #[arg(long, value_name = "FILE")]
        plot: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Allocate { model, format, analysis } => allocate(model, format, analysis),
        Commands::Integrate {
            lower,
            upper,
            samples,
            seed,
            format,
            plot,
        } => integrate(lower, upper, samples, seed, format, plot),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn load_model(path: Option<PathBuf>) -> Result<LpProblem> {
    let Some(path) = path else {
        return Ok(beverage_model());
    };
    let source = std::fs::read_to_string(&path)
        .with_context(|| format!("reading model file {}", path.display()))?;
    let spec: ModelSpec = serde_json::from_str(&source)
        .with_context(|| format!("parsing model file {}", path.display()))?;
    let problem = spec.into_problem().context("building model")?;
    Ok(problem)
}

/// Returns whether the solve reached an optimum
fn allocate(model: Option<PathBuf>, format: Format, analysis: bool) -> Result<bool> {
    let problem = load_model(model)?;
    info!(
        model = %problem.name,
        variables = problem.num_variables(),
        constraints = problem.num_constraints(),
        "solving allocation model"
    );

    let solver = Solver::new();
    let solution = solver.solve(&problem);

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&solution)?),
        Format::Pretty => print_solution(&problem, &solution, analysis),
    }

    if solution.is_optimal() {
        let violations = solution.check(&problem, solver.tolerance() * 1e3);
        for v in &violations {
            tracing::warn!(constraint = %v.constraint, amount = v.violation_amount, "optimum violates a constraint");
        }
    }

    Ok(solution.is_optimal())
}

fn print_solution(problem: &LpProblem, solution: &Solution, analysis: bool) {
    println!("--- Linear Programming Optimization Results ---");
    println!("Model: {}", problem.name);
    println!("Solver Status: {}", solution.status);

    match solution.status {
        SolutionStatus::Optimal => {}
        SolutionStatus::Infeasible => {
            println!("No solution exists that satisfies all constraints.");
            return;
        }
        SolutionStatus::Unbounded => {
            println!("The problem has no finite optimal solution.");
            return;
        }
        SolutionStatus::Undefined => {
            println!("The solver stopped after {} pivots without a conclusion.", solution.iterations);
            return;
        }
    }

    for (name, value) in solution.variables.iter().zip(&solution.values) {
        println!("Optimal {}: {}", name, value);
    }
    println!("{}: {}", problem.objective.name, solution.objective_value);

    if analysis {
        println!();
        println!("Constraints:");
        for c in &solution.analysis.constraints {
            println!(
                "  {:24} {:10.4} / {:<10.4} slack {:10.4}  shadow price {:8.4}",
                c.constraint, c.activity, c.rhs, c.slack, c.shadow_price
            );
        }

        if !solution.analysis.binding_constraints.is_empty() {
            println!();
            println!("Binding constraints:");
            for name in &solution.analysis.binding_constraints {
                println!("  - {}", name);
            }
        }

        let non_basic: Vec<_> = solution
            .analysis
            .reduced_costs
            .iter()
            .filter(|rc| !rc.is_basic && rc.reduced_cost.abs() > 1e-9)
            .collect();
        if !non_basic.is_empty() {
            println!();
            println!("Reduced costs (variables at zero):");
            for rc in non_basic {
                println!("  {:24} {:10.4}", rc.variable, rc.reduced_cost);
            }
        }
    }
}

fn integrate(
    lower: f64,
    upper: f64,
    samples: Option<Vec<usize>>,
    seed: Option<u64>,
    format: Format,
    plot: Option<PathBuf>,
) -> Result<bool> {
    let interval = Interval::new(lower, upper)?;
    let f = Polynomial::demo();

    let mut schedule = match samples {
        Some(counts) => SampleSchedule::new(counts),
        None => SampleSchedule::default(),
    };
    if let Some(seed) = seed {
        schedule = schedule.with_seed(seed);
    }
    info!(integrand = %f, lower, upper, seed = ?schedule.seed(), "running integration comparison");

    let report = report::run(&f, &interval, &Quadrature::new(), &schedule)?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Pretty => print!("{}", report),
    }

    if let Some(path) = plot {
        let data = PlotData::compute(&f, &report.integrand, &interval);
        std::fs::write(&path, render_svg(&data))
            .with_context(|| format!("writing plot to {}", path.display()))?;
        info!(path = %path.display(), "plot written");
    }

    Ok(true)
}
