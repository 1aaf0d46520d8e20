// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # RENEW Ledger CLI
//!
//! Entry point for the `renew` binary. Parses CLI arguments, initializes
//! logging, and drives an in-memory RENEW ledger.
//!
//! The binary supports four subcommands:
//!
//! - `init`: write a token config with default parameters
//! - `deploy`: deploy a ledger from a config and print its metadata
//! - `run`: deploy, replay a script of calls, print the final state
//! - `version`: print build version information

mod cli;
mod logging;
mod script;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;

use renew_contracts::config::TokenConfig;
use renew_contracts::ledger::{Ledger, LedgerSnapshot};

use cli::{Commands, RenewCli};
use script::ReplayReport;

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_LOG_LEVEL: &str = "renew=info,renew_contracts=info";

/// Printed to stdout by `run`.
#[derive(Serialize)]
struct RunOutput<'a> {
    report: &'a ReplayReport,
    state: LedgerSnapshot,
}

fn main() -> Result<()> {
    let cli = RenewCli::parse();
    logging::init_logging(DEFAULT_LOG_LEVEL, cli.log_format);

    match cli.command {
        Commands::Init(args) => init_config(args),
        Commands::Deploy(args) => deploy(args),
        Commands::Run(args) => run_script(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Writes a token config built from defaults and command-line overrides.
fn init_config(args: cli::InitArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        bail!(
            "{} already exists; pass --force to overwrite",
            args.output.display()
        );
    }

    let mut config = TokenConfig::with_owner(args.owner);
    if let Some(name) = args.name {
        config.name = name;
    }
    if let Some(symbol) = args.symbol {
        config.symbol = symbol;
    }
    if let Some(initial_supply) = args.initial_supply {
        config.initial_supply = initial_supply;
    }
    if let Some(decimals) = args.decimals {
        config.decimals = decimals;
    }

    // Refuse to write a config that `deploy` would reject.
    config.validate().context("invalid token parameters")?;
    config
        .save(&args.output)
        .with_context(|| format!("failed to write config to {}", args.output.display()))?;

    tracing::info!(
        path = %args.output.display(),
        symbol = %config.symbol,
        owner = %config.initial_owner,
        "token config written"
    );

    println!("Token config written to {}", args.output.display());
    Ok(())
}

/// Loads and deploys the ledger described by `path`.
fn deploy_from(path: &std::path::Path) -> Result<Ledger> {
    let config = TokenConfig::load(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    Ledger::deploy(&config).with_context(|| format!("failed to deploy {}", path.display()))
}

/// Deploys a ledger and prints its metadata as JSON.
fn deploy(args: cli::DeployArgs) -> Result<()> {
    let ledger = deploy_from(&args.config)?;
    let json = serde_json::to_string_pretty(ledger.metadata())
        .context("failed to encode ledger metadata")?;
    println!("{}", json);
    Ok(())
}

/// Deploys a ledger, replays the script, and prints the report and final
/// state as JSON.
fn run_script(args: cli::RunArgs) -> Result<()> {
    let mut ledger = deploy_from(&args.config)?;
    let steps = script::load_script(&args.script)?;

    tracing::info!(
        script = %args.script.display(),
        steps = steps.len(),
        keep_going = args.keep_going,
        "replaying script"
    );

    let report = script::replay(&mut ledger, &steps, args.keep_going);
    ledger
        .check_invariants()
        .context("ledger invariants violated after replay")?;

    // `to_string_pretty` rather than `to_value`: `Value` cannot hold
    // amounts above `u64::MAX`.
    let output = RunOutput {
        report: &report,
        state: ledger.snapshot(),
    };
    let json = serde_json::to_string_pretty(&output).context("failed to encode run output")?;
    println!("{}", json);

    if !args.keep_going {
        if let Some(first) = report.rejected.first() {
            bail!("step {} ({}) rejected: {}", first.step, first.op, first.error);
        }
    }
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("renew     {}", env!("CARGO_PKG_VERSION"));
    println!("rustc     {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
