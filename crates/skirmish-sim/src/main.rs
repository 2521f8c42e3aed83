//! # Skirmish Sim
//!
//! Headless encounter harness for the combat core.
//!
//! Runs a scripted duel (one player against a boss and a grunt) at a fixed
//! 60 Hz step and prints an encounter report as JSON:
//! - Configuration comes from an optional TOML path, defaults otherwise
//! - `RUST_LOG` controls logging; signals are logged at `debug`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod encounter;
mod report;
mod script;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use skirmish_combat::config::CombatConfig;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::encounter::Encounter;
use crate::script::InputScript;

/// Headless Skirmish encounter
#[derive(Parser, Debug)]
#[command(name = "skirmish-sim")]
#[command(about = "Runs a scripted duel and prints a JSON report", long_about = None)]
#[command(version)]
struct Cli {
    /// Combat config (TOML); defaults are used when absent
    config: Option<PathBuf>,

    /// Simulated seconds to run
    #[arg(long, default_value_t = 30.0)]
    seconds: f64,

    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("skirmish=info".parse()?))
        .init();

    let cli = Cli::parse();
    info!("Skirmish sim {}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => CombatConfig::load_from(path),
        None => CombatConfig::default(),
    };

    let encounter = Encounter::new(config, InputScript::duel());
    info!(
        "running {}s with player {} and {} actors",
        cli.seconds,
        encounter.player(),
        encounter.simulation().world().actors.len()
    );
    let report = encounter.run(cli.seconds);
    info!(
        "{} frames, {} zone hits, {} impacts, {} deaths",
        report.frames, report.zone_hits, report.impacts, report.deaths
    );

    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}
