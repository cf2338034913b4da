use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use forage_app::{loader, parse_start};
use forage_core::{Cell, ForageConfig, SwarmCoordinator, SwarmReport};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "forage",
    version,
    about = "Plan drone foraging paths over a regenerating reward grid"
)]
struct Cli {
    /// Grid file: N lines of N whitespace-separated non-negative integers.
    grid: PathBuf,

    /// Drone starting coordinate as `row,col`; repeat once per drone.
    #[arg(long = "start", value_parser = parse_start, required = true)]
    starts: Vec<Cell>,

    /// Number of simulation ticks to plan.
    #[arg(long, default_value_t = 50)]
    ticks: u64,

    /// Wall-clock planning budget in milliseconds.
    #[arg(long, default_value_t = 1_000)]
    budget_ms: u64,

    /// Rollout depth when scoring candidate moves (cost grows as 8^depth).
    #[arg(long, default_value_t = 3)]
    lookahead: u32,

    /// Fraction of a cell's baseline restored per tick after collection.
    #[arg(long, default_value_t = 0.1)]
    growth_rate: f64,

    /// Print the run report as JSON instead of plain text.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let matrix = loader::load_grid(&cli.grid)
        .with_context(|| format!("loading grid from {}", cli.grid.display()))?;
    let config = ForageConfig {
        growth_rate: cli.growth_rate,
        lookahead: cli.lookahead,
        max_ticks: cli.ticks,
        time_budget_ms: cli.budget_ms,
        ..ForageConfig::default()
    };
    let mut swarm =
        SwarmCoordinator::new(config, matrix, &cli.starts).context("building the swarm")?;

    info!(
        grid = swarm.grid().size(),
        drones = cli.starts.len(),
        ticks = cli.ticks,
        lookahead = cli.lookahead,
        "starting planning run"
    );
    let report = swarm.run().context("planning run failed")?;
    if report.deadline_hit {
        warn!(
            ticks_completed = report.ticks_completed,
            budget_ms = cli.budget_ms,
            "stopped early: wall-clock budget exhausted"
        );
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn print_report(report: &SwarmReport) {
    println!("grid: {0}x{0}", report.grid_size);
    println!("ticks completed: {}", report.ticks_completed);
    for (index, drone) in report.drones.iter().enumerate() {
        println!("drone {index}: collected {:.2}", drone.collected);
        let path = drone
            .path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ");
        println!("  {path}");
    }
    println!("total collected: {:.2}", report.total_collected);
}
