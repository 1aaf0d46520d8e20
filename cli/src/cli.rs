//! # CLI Interface
//!
//! Defines the command-line argument structure for `renew` using `clap`
//! derive. Supports four subcommands: `init`, `deploy`, `run`, and
//! `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// RENEW lockable token ledger.
///
/// Deploys an in-memory RENEW ledger from a TOML config and replays
/// scripted calls against it. Logs go to stderr; results are printed to
/// stdout as JSON.
#[derive(Parser, Debug)]
#[command(
    name = "renew",
    about = "RENEW lockable token ledger",
    version,
    propagate_version = true
)]
pub struct RenewCli {
    /// Log output format: `pretty` or `json`.
    #[arg(long, global = true, env = "RENEW_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the `renew` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a token config file with default parameters.
    Init(InitArgs),
    /// Deploy a ledger from a config file and print its metadata.
    Deploy(DeployArgs),
    /// Deploy a ledger, replay a script of calls, and print the result.
    Run(RunArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Where to write the config (TOML).
    #[arg(long, short = 'o', default_value = "token.toml")]
    pub output: PathBuf,

    /// Initial owner. Receives the whole supply and becomes the controller.
    #[arg(long, env = "RENEW_TOKEN_OWNER")]
    pub owner: String,

    /// Token name. Defaults to "ReNew".
    #[arg(long)]
    pub name: Option<String>,

    /// Ticker symbol. Defaults to "RENEW".
    #[arg(long)]
    pub symbol: Option<String>,

    /// Initial supply in whole tokens. Defaults to one billion.
    #[arg(long)]
    pub initial_supply: Option<u64>,

    /// Decimal precision. Defaults to 18.
    #[arg(long)]
    pub decimals: Option<u8>,

    /// Overwrite `output` if it already exists.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `deploy` subcommand.
#[derive(Parser, Debug)]
pub struct DeployArgs {
    /// Path to the token config file (TOML).
    #[arg(long, short = 'c', env = "RENEW_CONFIG", default_value = "token.toml")]
    pub config: PathBuf,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the token config file (TOML).
    #[arg(long, short = 'c', env = "RENEW_CONFIG", default_value = "token.toml")]
    pub config: PathBuf,

    /// Path to the script of calls (JSON array).
    ///
    /// Each entry is `{"caller": ..., "op": ..., ...}`; amounts are decimal
    /// strings in whole tokens, e.g. `"amount": "12.5"`.
    #[arg(long, short = 's')]
    pub script: PathBuf,

    /// Continue past rejected calls instead of stopping at the first one.
    #[arg(long)]
    pub keep_going: bool,
}
