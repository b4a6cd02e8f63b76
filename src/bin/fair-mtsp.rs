use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use log::{info, warn};

use fair_mtsp::io::{load_tsplib, DepotPlacement};
use fair_mtsp::models::{Objective, SolverConfig};
use fair_mtsp::solver::BranchAndCutSolver;
use fair_mtsp::Result;

#[derive(Parser, Debug)]
#[clap(about = "Solves a fair multiple TSP on a TSPLIB instance", long_about = None)]
struct Args {
    /// TSPLIB instance file
    #[clap(short = 'n', long)]
    instance: PathBuf,

    /// Number of vehicles
    #[clap(short = 'v', long, default_value = "2")]
    vehicles: usize,

    /// One of min, min-max, eps-fair, delta-fair, p-norm
    #[clap(long, default_value = "min")]
    objective: String,

    /// Fairness coefficient in [0, 1] for eps-fair and delta-fair
    #[clap(long, default_value = "0.5")]
    eps: f64,

    /// Norm order for p-norm
    #[clap(long, default_value = "2")]
    p: u32,

    /// Wall-clock budget in seconds
    #[clap(long, default_value = "3600")]
    time_limit: u64,

    /// Use the first file vertex as depot instead of the centroid
    #[clap(long)]
    depot_at_first_vertex: bool,

    /// Directory for the JSON result
    #[clap(short = 'r', long, default_value = "results")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let objective = match Objective::from_name(&args.objective, args.eps, args.p) {
        Ok(objective) => objective,
        Err(message) => Args::command().error(ErrorKind::InvalidValue, message).exit(),
    };
    let placement = if args.depot_at_first_vertex {
        DepotPlacement::Vertex(0)
    } else {
        DepotPlacement::Centroid
    };

    let instance = load_tsplib(&args.instance, args.vehicles, placement)?;
    let config = SolverConfig::new(objective).with_time_limit(Duration::from_secs(args.time_limit));
    info!("solving {} with {objective}", instance.name());

    let solver = BranchAndCutSolver::with_default_engine(instance, config)?;
    let result = solver.solve()?;

    if result.is_infeasible() {
        warn!("{} is infeasible for {objective}", result.instance_name);
    } else if let (Some(value), Some(fairness)) = (result.objective_value, result.fairness) {
        info!(
            "objective {value:.3}, gap {:?} %, jain {:.4}, gini {:.4}, time {:.2}s",
            result.gap_percent(),
            fairness.jain,
            fairness.gini,
            result.computation_time_secs
        );
    }

    fs::create_dir_all(&args.output)?;
    let path = args.output.join(format!(
        "{}-{}-{}.json",
        result.instance_name,
        objective.name(),
        result.num_vehicles
    ));
    let json = result.to_json_pretty().map_err(std::io::Error::from)?;
    fs::write(&path, json)?;
    info!("wrote {}", path.display());

    Ok(())
}
