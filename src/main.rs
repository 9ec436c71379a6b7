//! Parkbot - parking assistant session controller
//!
//! Runs a scenario file against the controller with scripted speech, or
//! the built-in walk-through when no file is given.

use anyhow::{Context, Result};
use clap::Parser;
use parkbot::parking::StaticFixtures;
use parkbot::scenario::{run_scenario, Scenario};
use parkbot::AppConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "parkbot")]
#[command(about = "Parking assistant session controller driven by TOML scenarios", long_about = None)]
struct Cli {
    /// Scenario file to run (defaults to the built-in walk-through)
    scenario: Option<PathBuf>,

    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    parkbot::telemetry::init_tracing();

    info!("Starting Parkbot session controller");

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AppConfig::load_or_default().context("Failed to load default config")?,
    };

    let scenario = match &cli.scenario {
        Some(path) => Scenario::load(path)
            .with_context(|| format!("Failed to load scenario {}", path.display()))?,
        None => Scenario::demo().context("Built-in scenario is invalid")?,
    };

    let fixtures = Arc::new(StaticFixtures::midtown());
    let report = run_scenario(config, fixtures, scenario)?;

    println!("{}", report.summary);
    for failure in &report.failures {
        println!("  - {}", failure);
    }
    println!("{}", serde_json::to_string_pretty(&report.final_snapshot)?);

    if report.exit_code != 0 {
        std::process::exit(report.exit_code);
    }
    Ok(())
}
