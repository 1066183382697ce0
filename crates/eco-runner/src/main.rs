//! Headless runner: paces simulation steps and logs population counts.

mod config;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use config::RunnerConfig;
use eco_core::RandomSource;
use eco_world::{Grid, RunState, Simulation, StepSummary};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs;
use std::path::PathBuf;
use tokio::signal;
use tokio::time::{interval, Duration};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "eco-runner", about = "Run the grazing-ecology automaton headless")]
struct Args {
    /// JSON runner configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Text grid to start from ('.', 'v', 'h', 'p', 'x' per cell)
    #[arg(long)]
    pattern: Option<PathBuf>,

    /// Random seed, overrides the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Milliseconds between steps
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Print the grid after every step
    #[arg(long)]
    render: bool,

    /// Emit JSON logs
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    telemetry::init_telemetry(args.log_json)?;

    let mut config = RunnerConfig::load(args.config.as_deref())?;
    apply_overrides(&mut config, &args);

    let pattern = args
        .pattern
        .as_deref()
        .map(|path| {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading pattern {}", path.display()))?;
            text.parse::<Grid>()
                .with_context(|| format!("parsing pattern {}", path.display()))
        })
        .transpose()?;
    if let Some(grid) = &pattern {
        config.simulation.grid.height = grid.height();
        config.simulation.grid.width = grid.width();
    }
    config.validate()?;

    let initial = match pattern {
        Some(grid) => grid,
        None => {
            let mut rng = ChaCha8Rng::seed_from_u64(config.simulation.seed);
            // Keep the layout draws apart from the rule draws.
            rng.set_stream(1);
            Grid::random(&config.simulation.grid, &config.seeding, &mut rng)
        }
    };

    info!(
        height = config.simulation.grid.height,
        width = config.simulation.grid.width,
        seed = config.simulation.seed,
        tick_limit = ?config.simulation.tick_limit,
        interval_ms = config.interval_ms,
        "Starting eco-runner"
    );

    let mut sim = Simulation::new(config.simulation.clone())?;
    sim.load(initial)?;
    present_initial(&sim, config.render);

    run_loop(&mut sim, &config).await?;

    let census = sim.census();
    info!(
        event = "run_finished",
        tick = sim.tick(),
        census = %census,
        regrowth_locked = sim.regrowth_locked(),
        "Run finished"
    );

    Ok(())
}

fn apply_overrides(config: &mut RunnerConfig, args: &Args) {
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(ticks) = args.ticks {
        config.simulation.tick_limit = Some(ticks);
    }
    if let Some(interval_ms) = args.interval_ms {
        config.interval_ms = interval_ms;
    }
    config.render |= args.render;
}

/// Step once per interval until the simulation goes idle or we are asked to stop.
async fn run_loop<R: RandomSource>(sim: &mut Simulation<R>, config: &RunnerConfig) -> Result<()> {
    let mut ticker = interval(Duration::from_millis(config.interval_ms));
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    sim.start()?;

    while sim.state() == RunState::Running {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                sim.stop();
                break;
            }
        }

        let summary = sim.step()?;
        present(&summary, sim.grid(), config.render);
    }

    Ok(())
}

fn present_initial<R: RandomSource>(sim: &Simulation<R>, render: bool) {
    info!(event = "census", tick = sim.tick(), census = %sim.census(), "Initial configuration");
    if render {
        println!("tick {}\n{}", sim.tick(), sim.grid());
    }
}

fn present(summary: &StepSummary, grid: &Grid, render: bool) {
    let census = summary.census;
    info!(
        event = "census",
        tick = summary.tick,
        vegetation = census.vegetation(),
        herbivores = census.herbivores(),
        decayed = census.decayed(),
        occupied = census.occupied(),
        applied = summary.report.applied,
        discarded = summary.report.discarded,
        "Tick complete"
    );
    if render {
        println!("tick {}\n{}", summary.tick, grid);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
