use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use nordic_pf::prelude::*;

#[derive(Parser)]
#[command(name = "nordic-pf", about = "Newton-Raphson AC power-flow studies")]
struct Cli {
    /// Case file in the Barra/Generador/Carga/Compensador/Línea/Transformador record format.
    case_file: PathBuf,

    /// System base in MVA.
    #[arg(long, default_value_t = 100.0)]
    s_base: f64,

    /// Mismatch tolerance in per-unit power.
    #[arg(long, default_value_t = 1e-12)]
    tol: f64,

    /// Maximum Newton-Raphson iterations per solve.
    #[arg(long, default_value_t = 20)]
    max_iters: usize,

    /// Raise the tracing log level to debug.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single power flow and print the bus report.
    Solve,
    /// Trace a loadability (nose) curve by scaling the load at the given buses.
    Loadability {
        /// Bus names to scale together.
        #[arg(long, num_args = 1..)]
        buses: Vec<String>,
        /// Load-scaling step per iteration.
        #[arg(long, default_value_t = 0.001)]
        step: f64,
    },
    /// Screen every line for a critical (non-convergent) N-1 contingency.
    Contingency,
}

fn load_case(cli: &Cli) -> PfResult<System> {
    let text = fs::read_to_string(&cli.case_file)?;
    parse_system(&text, cli.s_base)
}

fn run(cli: &Cli) -> PfResult<()> {
    match &cli.command {
        Command::Solve => {
            let mut system = load_case(cli)?;
            let report = run_pf(&mut system, cli.tol, cli.max_iters)?;
            info!(status = %report.status, "solve finished");
            println!("{}", report.status);
            println!("{}", bus_report(&system));
        }
        Command::Loadability { buses, step } => {
            let mut system = load_case(cli)?;
            let bus_indices = resolve_bus_names(&system, buses)?;
            let result = loadability_curve(&mut system, &bus_indices, *step, cli.tol, cli.max_iters)?;
            println!(
                "loadability curve: {} points, max lambda = {:.4}, converged = {}",
                result.curve.len(),
                result.max_lambda,
                result.converged
            );
            for point in &result.curve {
                println!("  lambda={:.4} voltages={:?}", point.lambda, point.voltages);
            }
        }
        Command::Contingency => {
            let mut system = load_case(cli)?;
            run_pf(&mut system, cli.tol, cli.max_iters)?;
            let results = screen_contingencies(&mut system, cli.tol, cli.max_iters)?;
            for result in &results {
                let label = system
                    .lines
                    .get(result.line.0)
                    .map(|l| format!("{}-{}", l.from_bus.get(), l.to_bus.get()))
                    .unwrap_or_default();
                println!(
                    "line {} ({}): critical={} iterations={}",
                    result.line.0, label, result.critical, result.iterations
                );
            }
        }
    }
    Ok(())
}

fn resolve_bus_names(system: &System, names: &[String]) -> PfResult<Vec<BusIndex>> {
    names
        .iter()
        .map(|name| {
            system
                .buses
                .iter()
                .position(|b| &b.name == name)
                .map(BusIndex)
                .ok_or_else(|| PfError::ParseError(format!("unknown bus '{name}'")))
        })
        .collect()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "study failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
