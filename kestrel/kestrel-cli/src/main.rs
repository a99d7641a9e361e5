//! Kestrel CLI - drive the assignment engine from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Run the smart-city demo for 30 seconds
//! kestrel simulate --duration 30
//!
//! # Same, learning at the training rate
//! kestrel simulate --duration 30 --training
//!
//! # Five deterministic cycles, dumped as JSON
//! kestrel snapshot --cycles 5 --seed 7
//!
//! # Configuration
//! kestrel config init
//! kestrel config show
//! ```

mod demo;
mod output;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use kestrel_core::{Controller, KestrelConfig, SharedController};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::demo::DeviceFallback;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "kestrel")]
#[command(about = "Kestrel - capability-based task assignment with learned confidence", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (human, json, plain)
    #[arg(long, global = true, default_value = "human")]
    format: OutputFormatArg,

    /// Configuration file (default: ~/.kestrel/config.toml)
    #[arg(long, global = true, env = "KESTREL_CONFIG_PATH")]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormatArg {
    Human,
    Json,
    Plain,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Plain => OutputFormat::Plain,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo scenario on timers
    Simulate {
        /// Wall-clock seconds to run
        #[arg(short, long, default_value_t = 30)]
        duration: u64,

        /// Learn at the training rate
        #[arg(short, long)]
        training: bool,

        /// Simulated minutes that pass per wall-clock second
        #[arg(long, default_value_t = 5.0)]
        minutes_per_second: f64,

        /// Spawn a dynamic task every N assignment cycles (0 disables)
        #[arg(long, default_value_t = 10)]
        spawn_every: u64,

        /// Run without the simulated device registry
        #[arg(long)]
        no_devices: bool,
    },

    /// Run synchronous cycles and print the resulting state as JSON
    Snapshot {
        /// Number of tick-then-assign cycles
        #[arg(short, long, default_value_t = 3)]
        cycles: u32,

        /// Simulated minutes between cycles
        #[arg(long, default_value_t = 10.0)]
        minutes_per_cycle: f64,

        /// RNG seed for outcomes
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Learn at the training rate
        #[arg(short, long)]
        training: bool,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the configuration file location
    Path,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => KestrelConfig::config_path().context("Failed to resolve config path")?,
    };

    if let Commands::Config(command) = &cli.command {
        return config_command(command, &config_path);
    }

    let config = KestrelConfig::load_or_default_from(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    init_logging(cli.verbose, &config.general.log_level);

    let format = OutputFormat::from(cli.format);
    match cli.command {
        Commands::Simulate {
            duration,
            training,
            minutes_per_second,
            spawn_every,
            no_devices,
        } => {
            let options = SimulateOptions {
                duration: Duration::from_secs(duration),
                training,
                minutes_per_second,
                spawn_every,
                devices: !no_devices,
            };
            simulate(&config, options, format).await
        }
        Commands::Snapshot {
            cycles,
            minutes_per_cycle,
            seed,
            training,
        } => snapshot(&config, cycles, minutes_per_cycle, seed, training),
        Commands::Config(_) => Ok(()),
    }
}

fn init_logging(verbose: bool, log_level: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = if verbose {
        EnvFilter::new("kestrel=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("kestrel={},warn", log_level)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

// ============================================================================
// Simulate
// ============================================================================

struct SimulateOptions {
    duration: Duration,
    training: bool,
    minutes_per_second: f64,
    spawn_every: u64,
    devices: bool,
}

/// Maps wall-clock time onto accelerated simulated time
#[derive(Debug, Clone, Copy)]
struct SimClock {
    origin: DateTime<Utc>,
    started: Instant,
    minutes_per_second: f64,
}

impl SimClock {
    fn start(minutes_per_second: f64) -> Self {
        Self {
            origin: Utc::now(),
            started: Instant::now(),
            minutes_per_second,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        let simulated_ms = self.started.elapsed().as_secs_f64() * self.minutes_per_second * 60_000.0;
        self.origin + chrono::Duration::milliseconds(simulated_ms as i64)
    }
}

async fn simulate(config: &KestrelConfig, options: SimulateOptions, format: OutputFormat) -> Result<()> {
    if options.minutes_per_second <= 0.0 {
        anyhow::bail!("--minutes-per-second must be greater than 0");
    }

    let mut controller = Controller::from_config(config);
    if options.devices {
        controller.set_device_registry(Box::new(demo::demo_registry()));
    }
    if config.simulation.seed_demo {
        demo::seed(&mut controller);
    }
    if options.training {
        controller.set_training_mode(true);
    }

    let clock = SimClock::start(options.minutes_per_second);
    if config.simulation.auto_start {
        controller.start_simulation_at(clock.now());
    } else {
        warn!("simulation.auto_start is off; tasks will be assigned but never finish");
    }

    let shared = SharedController::new(controller);
    let assignment_every = Duration::from_millis(config.simulation.assignment_interval_ms);
    let tick_every = Duration::from_millis(config.simulation.tick_interval_ms);

    let assigner = {
        let shared = shared.clone();
        let spawn_every = options.spawn_every;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(assignment_every);
            let mut fallback = DeviceFallback::new();
            let mut rng = StdRng::from_rng(&mut rand::rng());
            let mut cycle: u64 = 0;
            loop {
                interval.tick().await;
                let mut controller = shared.lock();
                if spawn_every > 0 && cycle > 0 && cycle % spawn_every == 0 {
                    demo::spawn_dynamic_task(&mut controller, &mut rng);
                }
                controller.assign_tasks_at(clock.now());
                if controller.has_device_registry() {
                    fallback.run(&mut controller);
                }
                cycle += 1;
            }
        })
    };

    let ticker = {
        let shared = shared.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_every);
            loop {
                interval.tick().await;
                let mut controller = shared.lock();
                controller.simulate_tick(clock.now());
            }
        })
    };

    info!(
        seconds = options.duration.as_secs(),
        minutes_per_second = options.minutes_per_second,
        "simulation running"
    );

    tokio::select! {
        _ = tokio::time::sleep(options.duration) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            info!("interrupted");
        }
    }

    assigner.abort();
    ticker.abort();

    let (snapshot, devices) = {
        let mut controller = shared.lock();
        controller.stop_simulation();
        (controller.snapshot(), controller.devices())
    };
    output::print_report(&snapshot, &devices, format)
}

// ============================================================================
// Snapshot
// ============================================================================

fn snapshot(config: &KestrelConfig, cycles: u32, minutes_per_cycle: f64, seed: u64, training: bool) -> Result<()> {
    let mut controller = Controller::from_config(config);
    demo::seed(&mut controller);
    controller.set_training_mode(training);

    let mut rng = StdRng::seed_from_u64(seed);
    let origin = Utc::now();
    controller.start_simulation_at(origin);

    for cycle in 0..cycles {
        let now = origin + chrono::Duration::milliseconds((f64::from(cycle) * minutes_per_cycle * 60_000.0) as i64);
        controller.simulate_tick_with_rng(now, &mut rng);
        controller.assign_tasks_at(now);
    }

    println!("{}", controller.snapshot().to_json()?);
    Ok(())
}

// ============================================================================
// Config
// ============================================================================

fn config_command(command: &ConfigCommands, path: &Path) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = KestrelConfig::load_or_default_from(path)?;
            print!("{}", config.to_toml()?);
        }
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            KestrelConfig::default()
                .save_to_path(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        ConfigCommands::Path => println!("{}", path.display()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sim_clock_accelerates() {
        let clock = SimClock {
            origin: Utc::now(),
            started: Instant::now() - Duration::from_secs(2),
            minutes_per_second: 5.0,
        };
        let simulated = (clock.now() - clock.origin).num_seconds();
        assert!((600..=660).contains(&simulated));
    }

    #[test]
    fn test_config_init_refuses_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        config_command(&ConfigCommands::Init { force: false }, &path).unwrap();
        assert!(config_command(&ConfigCommands::Init { force: false }, &path).is_err());
        config_command(&ConfigCommands::Init { force: true }, &path).unwrap();
    }
}
