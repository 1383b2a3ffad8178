//! `broadside`: run space battles from the command line.
//!
//! ```bash
//! # One battle, doctrine captains on both sides, record to a file
//! broadside run --scenario duel --seed 7 --out duel.json
//!
//! # Let one side sit on its hands
//! broadside run --scenario skirmish --beta hold
//!
//! # Parallel batch over 100 seeds
//! broadside batch --scenario torpedo_run --count 100 --out results.json
//! ```
//!
//! Logs go to stderr; `RUST_LOG` overrides the level.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use broadside_core::enums::Side;
use broadside_core::types::ShipId;
use broadside_runner::batch::{run_tournament, BattleSummary, TournamentTally};
use broadside_runner::battle::start_engine;
use broadside_runner::{
    load_scenario, run_battle, DoctrineCaptain, HoldCaptain, Result, RunnerConfig, RunnerError,
    Seat,
};
use broadside_sim::scenario::SCENARIOS;

#[derive(Parser)]
#[command(name = "broadside")]
#[command(about = "Deterministic tactical space combat runner")]
#[command(version)]
struct Cli {
    /// Enable debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single battle
    Run {
        /// Built-in scenario name or scenario JSON file
        #[arg(short, long, default_value = "duel")]
        scenario: String,

        /// Random seed (defaults to the scenario's)
        #[arg(long)]
        seed: Option<u64>,

        /// Write the full battle record here
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Per-captain order timeout in milliseconds
        #[arg(long, default_value = "5000")]
        timeout_ms: u64,

        /// Stop after this many checkpoints
        #[arg(long, default_value = "200")]
        max_checkpoints: u32,

        /// Captain for the alpha fleet
        #[arg(long, value_enum, default_value = "doctrine")]
        alpha: CaptainKind,

        /// Captain for the beta fleet
        #[arg(long, value_enum, default_value = "doctrine")]
        beta: CaptainKind,
    },

    /// Run many seeds of one scenario in parallel
    Batch {
        #[arg(short, long, default_value = "duel")]
        scenario: String,

        /// Number of battles
        #[arg(short, long, default_value = "10")]
        count: u32,

        /// First seed; battles use consecutive seeds
        #[arg(long, default_value = "0")]
        seed_start: u64,

        /// Worker threads (0 = auto)
        #[arg(short, long, default_value = "0")]
        threads: usize,

        #[arg(long, default_value = "200")]
        max_checkpoints: u32,

        /// Write the summaries here as JSON
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List built-in scenarios
    Scenarios,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CaptainKind {
    Doctrine,
    Hold,
}

impl CaptainKind {
    fn seat(self, ship: ShipId) -> Seat {
        match self {
            CaptainKind::Doctrine => Seat::new(ship, DoctrineCaptain),
            CaptainKind::Hold => Seat::new(ship, HoldCaptain),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Run {
            scenario,
            seed,
            out,
            timeout_ms,
            max_checkpoints,
            alpha,
            beta,
        } => cmd_run(
            &scenario,
            seed,
            out,
            RunnerConfig {
                order_timeout_ms: timeout_ms,
                max_checkpoints,
                record_snapshots: true,
            },
            [alpha, beta],
        ),
        Commands::Batch {
            scenario,
            count,
            seed_start,
            threads,
            max_checkpoints,
            out,
        } => cmd_batch(
            &scenario,
            count,
            seed_start,
            threads,
            out,
            RunnerConfig {
                max_checkpoints,
                ..RunnerConfig::default()
            },
        ),
        Commands::Scenarios => {
            for name in SCENARIOS {
                println!("{name}");
            }
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_run(
    scenario_name: &str,
    seed: Option<u64>,
    out: Option<PathBuf>,
    config: RunnerConfig,
    captains: [CaptainKind; 2],
) -> Result<()> {
    let scenario = load_scenario(scenario_name)?;
    let seed = seed.unwrap_or(scenario.config.seed);
    let engine = start_engine(&scenario, seed)?;
    let mut seats: Vec<Seat> = engine
        .ships()
        .iter()
        .map(|ship| match ship.side {
            Side::Alpha => captains[0].seat(ship.id),
            Side::Beta => captains[1].seat(ship.id),
        })
        .collect();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(RunnerError::Runtime)?;
    let record = runtime.block_on(run_battle(&scenario.name, engine, &mut seats, &config))?;

    let summary = BattleSummary::from_record(&record);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    if let Some(path) = out {
        record.write_to(&path)?;
        tracing::info!(path = %path.display(), "battle record written");
    }
    Ok(())
}

fn cmd_batch(
    scenario_name: &str,
    count: u32,
    seed_start: u64,
    threads: usize,
    out: Option<PathBuf>,
    config: RunnerConfig,
) -> Result<()> {
    let scenario = load_scenario(scenario_name)?;
    let seeds: Vec<u64> = (0..count as u64)
        .map(|i| seed_start.wrapping_add(i))
        .collect();
    let summaries = run_tournament(&scenario, &seeds, threads, &config)?;
    let tally = TournamentTally::from_summaries(&summaries);
    println!("{}", serde_json::to_string_pretty(&tally)?);

    if let Some(path) = out {
        let json = serde_json::to_string_pretty(&summaries)?;
        std::fs::write(&path, json).map_err(|source| RunnerError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), battles = summaries.len(), "summaries written");
    }
    Ok(())
}
