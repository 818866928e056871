//! # CLI Interface
//!
//! Defines the command-line argument structure for `edupool` using
//! `clap` derive. Subcommands: `init`, `run`, `status`, `quote`,
//! `events`, and `version`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// EduPool lending-pool ledger.
///
/// Keeps a single lending pool and its stablecoin in a local database.
/// Scenario files drive deposits, loans, and repayments against it.
#[derive(Parser, Debug)]
#[command(
    name = "edupool",
    about = "EduPool lending-pool ledger",
    version,
    propagate_version = true
)]
pub struct EduPoolCli {
    /// Directory holding the ledger database.
    #[arg(
        long,
        short = 'd',
        global = true,
        env = "EDUPOOL_DATA_DIR",
        default_value = "edupool-data"
    )]
    pub data_dir: PathBuf,

    /// Log output format.
    #[arg(
        long,
        global = true,
        value_enum,
        env = "EDUPOOL_LOG_FORMAT",
        default_value_t = LogFormatArg::Pretty
    )]
    pub log_format: LogFormatArg,

    /// Default log filter when `RUST_LOG` is not set.
    #[arg(
        long,
        global = true,
        env = "EDUPOOL_LOG",
        default_value = "edupool=info,edupool_contracts=info"
    )]
    pub log_level: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// `--log-format` values.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

/// Top-level subcommands for the `edupool` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy a stablecoin and an initialized pool into an empty data directory.
    Init(InitArgs),
    /// Apply a scenario file to the stored ledger.
    Run(RunArgs),
    /// Print the pool's current state.
    Status(StatusArgs),
    /// Quote interest and amount due for a principal under the pool's terms.
    Quote(QuoteArgs),
    /// Print the pool's event log as JSON lines.
    Events(EventsArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Pool setup file (JSON).
    #[arg(long, short = 'c', env = "EDUPOOL_CONFIG")]
    pub config: PathBuf,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Scenario file (JSON).
    #[arg(long, short = 's')]
    pub scenario: PathBuf,

    /// Stop at the first rejected step.
    #[arg(long)]
    pub fail_fast: bool,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `quote` subcommand.
#[derive(Parser, Debug)]
pub struct QuoteArgs {
    /// Principal as a decimal token amount, e.g. `10` or `2.5`.
    #[arg(long, short = 'p')]
    pub principal: String,
}

/// Arguments for the `events` subcommand.
#[derive(Parser, Debug)]
pub struct EventsArgs {
    /// Only print records with a sequence number at or above this one.
    #[arg(long, default_value_t = 0)]
    pub since: u64,
}
