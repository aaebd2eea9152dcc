//! Gimbal CLI: drive the fuzzy pan/tilt controller from the command line.
//!
//! Usage:
//!   gimbal track <LOG>           Replay a detection log through the tracking loop
//!   gimbal simulate              Run a closed-loop simulation
//!   gimbal evaluate --x --y      Show memberships and actions for a point
//!   gimbal servo-test            Move one servo interactively
//!   gimbal config <ACTION>       Manage the configuration file

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use gimbal_control_model::{AppConfig, SoftDirection};

mod commands;

#[derive(Parser)]
#[command(
    name = "gimbal",
    about = "Fuzzy pan/tilt tracking controller",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the user config location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSONL detection log through the tracking loop
    Track {
        /// Path to the detection log
        log: PathBuf,

        /// Drive the sysfs PWM servos instead of the in-memory driver
        #[arg(long)]
        pwm: bool,

        /// Run detection on a worker with a latest-value handoff
        #[arg(long)]
        worker: bool,

        /// Override the soft correction direction
        #[arg(long, value_enum)]
        soft: Option<SoftArg>,

        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a closed-loop simulation against a virtual subject
    Simulate {
        /// Subject pan position (normalized)
        #[arg(long, default_value = "0.3", allow_hyphen_values = true)]
        pan: f64,

        /// Subject tilt position (normalized)
        #[arg(long, default_value = "-0.4", allow_hyphen_values = true)]
        tilt: f64,

        /// Number of frames to simulate
        #[arg(long, default_value = "300")]
        frames: u64,

        /// Subject pan drift per frame
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        drift: f64,

        /// Drop every Nth frame
        #[arg(long)]
        drop_every: Option<u64>,

        /// Soft correction direction
        #[arg(long, value_enum, default_value = "toward-center")]
        soft: SoftArg,

        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show membership degrees and actions for a centroid
    Evaluate {
        /// Horizontal coordinate in pixels
        #[arg(long, allow_hyphen_values = true)]
        x: f64,

        /// Vertical coordinate in pixels
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
    },

    /// Move a single servo from typed input
    ServoTest {
        /// Drive the sysfs PWM servos instead of the in-memory driver
        #[arg(long)]
        pwm: bool,

        /// Swing the selected axis between its extremes this many times
        /// instead of reading input
        #[arg(long)]
        sweep: Option<u32>,

        /// Axis to sweep
        #[arg(long, default_value = "pan")]
        axis: String,

        /// Pause after each move (milliseconds)
        #[arg(long, default_value = "1000")]
        settle_ms: u64,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
    /// Check a configuration file for errors
    Validate,
}

/// Soft correction direction as a CLI value.
#[derive(Clone, Copy, ValueEnum)]
enum SoftArg {
    TowardDrift,
    TowardCenter,
}

impl From<SoftArg> for SoftDirection {
    fn from(arg: SoftArg) -> Self {
        match arg {
            SoftArg::TowardDrift => SoftDirection::TowardDrift,
            SoftArg::TowardCenter => SoftDirection::TowardCenter,
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display())),
        None => Ok(AppConfig::load()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // `config validate` reports load errors itself.
    let config = match &cli.command {
        Commands::Config {
            action: ConfigAction::Validate,
        } => AppConfig::default(),
        _ => load_config(cli.config.as_ref())?,
    };

    gimbal_common::logging::init_logging(&gimbal_common::logging::with_verbosity(
        &config.logging,
        cli.verbose,
    ));

    match cli.command {
        Commands::Track {
            log,
            pwm,
            worker,
            soft,
            json,
        } => {
            let mut config = config;
            if let Some(soft) = soft {
                config.tracking.soft_direction = soft.into();
            }
            commands::track::run(config, log, pwm, worker, json).await
        }
        Commands::Simulate {
            pan,
            tilt,
            frames,
            drift,
            drop_every,
            soft,
            json,
        } => {
            let mut config = config;
            config.tracking.soft_direction = soft.into();
            commands::simulate::run(config, pan, tilt, frames, drift, drop_every, json).await
        }
        Commands::Evaluate { x, y } => commands::evaluate::run(&config, x, y),
        Commands::ServoTest {
            pwm,
            sweep,
            axis,
            settle_ms,
        } => commands::servo_test::run(&config, pwm, sweep, &axis, settle_ms),
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => commands::config::init(cli.config, force),
            ConfigAction::Show => commands::config::show(&config),
            ConfigAction::Validate => commands::config::validate(cli.config),
        },
    }
}
