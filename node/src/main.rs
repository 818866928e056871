// Copyright (c) 2026 EduPool Contributors. MIT License.
// See LICENSE for details.

//! # EduPool Ledger Node
//!
//! Entry point for the `edupool` binary. Parses CLI arguments, initializes
//! logging, opens the ledger store, and dispatches the subcommand:
//!
//! - `init`    deploy a stablecoin and an initialized pool
//! - `run`     apply a scenario file, persisting after each committed step
//! - `status`  print the pool summary
//! - `quote`   interest and amount due for a principal
//! - `events`  dump the event log as JSON lines
//! - `version` print build version information

mod cli;
mod ledger;
mod logging;
mod scenario;
mod store;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;

use edupool_contracts::config::POOL_VERSION;
use edupool_contracts::FundsAsset;

use cli::{Commands, EduPoolCli};
use ledger::{display_amount, parse_amount, Ledger, PoolSetup};
use scenario::Scenario;
use store::LedgerStore;

fn main() -> Result<()> {
    let cli = EduPoolCli::parse();

    if matches!(cli.command, Commands::Version) {
        print_version();
        return Ok(());
    }

    logging::init_logging(&cli.log_level, cli.log_format.into());

    match cli.command {
        Commands::Init(args) => init_ledger(&cli.data_dir, args),
        Commands::Run(args) => run_scenario(&cli.data_dir, args),
        Commands::Status(args) => print_status(&cli.data_dir, args),
        Commands::Quote(args) => quote(&cli.data_dir, args),
        Commands::Events(args) => print_events(&cli.data_dir, args),
        Commands::Version => Ok(()),
    }
}

fn open_store(data_dir: &Path) -> Result<LedgerStore> {
    let db_path = data_dir.join("db");
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;
    let store = LedgerStore::open(&db_path)
        .with_context(|| format!("failed to open ledger store at {}", db_path.display()))?;
    tracing::debug!(path = %db_path.display(), "ledger store opened");
    Ok(store)
}

fn load_ledger(store: &LedgerStore, data_dir: &Path) -> Result<Ledger> {
    if !store.is_initialized()? {
        bail!(
            "no ledger in {}; run `edupool init --config <file>` first",
            data_dir.display()
        );
    }
    store.load().context("failed to load ledger")
}

/// Creates the stablecoin and pool described by the setup file.
fn init_ledger(data_dir: &Path, args: cli::InitArgs) -> Result<()> {
    let setup = PoolSetup::from_file(&args.config)?;
    let store = open_store(data_dir)?;
    if store.is_initialized()? {
        bail!("{} already holds a ledger", data_dir.display());
    }

    let ledger = Ledger::genesis(&setup)?;
    store.create(&ledger).context("failed to save new ledger")?;

    tracing::info!(
        pool = %ledger.pool.address(),
        name = %setup.name,
        borrower = %setup.borrower,
        "pool initialized"
    );

    println!("Pool initialized.");
    println!("  Data directory : {}", data_dir.display());
    println!("  Pool address   : {}", ledger.pool.address());
    println!("  Stablecoin     : {}", ledger.asset.id());
    println!("  Minter         : {}", ledger.asset.owner());
    Ok(())
}

/// Applies a scenario, saving the ledger after every committed step.
fn run_scenario(data_dir: &Path, args: cli::RunArgs) -> Result<()> {
    let scenario = Scenario::from_file(&args.scenario)?;
    let store = open_store(data_dir)?;
    let mut ledger = load_ledger(&store, data_dir)?;

    tracing::info!(
        scenario = %args.scenario.display(),
        steps = scenario.steps.len(),
        fail_fast = args.fail_fast,
        "running scenario"
    );

    let outcomes = scenario::run(&mut ledger, &scenario, args.fail_fast, |l| {
        store.save(l).context("failed to save ledger")
    })?;

    for outcome in &outcomes {
        match &outcome.result {
            Ok(()) => println!("[{:>3}] {:<8} ok", outcome.index, outcome.op),
            Err(e) => println!("[{:>3}] {:<8} rejected: {}", outcome.index, outcome.op, e),
        }
    }

    let report = scenario::report(&outcomes);
    println!(
        "{} committed, {} rejected",
        report.committed, report.rejected
    );

    ledger
        .pool
        .reconcile(&ledger.asset)
        .context("ledger failed reconciliation after run")?;

    if args.fail_fast && report.rejected > 0 {
        bail!("scenario stopped at first rejected step");
    }
    Ok(())
}

fn print_status(data_dir: &Path, args: cli::StatusArgs) -> Result<()> {
    let store = open_store(data_dir)?;
    let ledger = load_ledger(&store, data_dir)?;
    let summary = ledger.summary();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
    }
    Ok(())
}

fn quote(data_dir: &Path, args: cli::QuoteArgs) -> Result<()> {
    let principal = parse_amount(&args.principal)?;
    let store = open_store(data_dir)?;
    let ledger = load_ledger(&store, data_dir)?;

    let interest = ledger.pool.interest(principal)?;
    let due = principal
        .checked_add(interest)
        .context("amount due overflows")?;

    println!("principal  : {}", display_amount(principal));
    println!("interest   : {}", display_amount(interest));
    println!("amount due : {}", display_amount(due));
    Ok(())
}

fn print_events(data_dir: &Path, args: cli::EventsArgs) -> Result<()> {
    let store = open_store(data_dir)?;
    // Validates the store as a whole before dumping the log.
    load_ledger(&store, data_dir)?;

    for record in store.events()?.iter().filter(|r| r.seq >= args.since) {
        println!("{}", serde_json::to_string(record)?);
    }
    Ok(())
}

fn print_version() {
    println!("edupool {}", env!("CARGO_PKG_VERSION"));
    println!("pool    {}", POOL_VERSION);
    println!("rustc   {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
