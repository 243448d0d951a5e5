//! CLI argument definitions
//!
//! All Clap derive structs for `collapse` command-line parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::agents::Scenario;

// ============================================================================
// Root CLI
// ============================================================================

/// Phase and contention orchestration engine for a two-agent generative piece.
#[derive(Parser, Debug)]
#[command(name = "collapse", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "COLLAPSE_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(long, default_value = "human", global = true, env = "COLLAPSE_LOG_FORMAT")]
    pub log_format: LogFormat,
}

// ============================================================================
// Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive the engine headlessly with synthetic agents.
    Run(RunArgs),

    /// Validate configuration files.
    Validate(ValidateArgs),

    /// Print the default configuration as YAML.
    Config,
}

/// Arguments for `run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to YAML engine configuration.
    #[arg(short, long, env = "COLLAPSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Synthetic agent scenario.
    #[arg(short, long, default_value = "contested")]
    pub scenario: Scenario,

    /// RNG seed for the engine and agents (random when omitted).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Simulated duration to run (e.g. `90s`, `5m`); runs until interrupted when omitted.
    #[arg(short, long, value_parser = humantime::parse_duration)]
    pub duration: Option<Duration>,

    /// Frames per second of the simulated driver.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub fps: u32,

    /// Pace ticks in wall-clock time instead of fast-forwarding.
    #[arg(long)]
    pub realtime: bool,

    /// Write a JSON snapshot to stdout every N frames.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub snapshot_every: Option<u64>,

    /// Fraction of feature reads that fail, in `[0, 1]`.
    #[arg(long, default_value_t = 0.0)]
    pub unavailable_rate: f64,

    /// Write structured events to this file instead of stderr.
    #[arg(long, env = "COLLAPSE_EVENTS_FILE")]
    pub events_file: Option<PathBuf>,

    /// Expose Prometheus metrics on `127.0.0.1:<port>`.
    #[arg(long, env = "COLLAPSE_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Reset the engine every interval of simulated time (e.g. `2m`).
    #[arg(long, value_parser = humantime::parse_duration)]
    pub reset_every: Option<Duration>,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,
}

// ============================================================================
// Supporting enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Log rendering on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Compact text lines, colored when the terminal allows.
    #[default]
    Human,
    /// One JSON object per line.
    Json,
}

// ============================================================================
// Tests
// ============================================================================
