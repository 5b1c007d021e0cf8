//! Main application entry point (CLI binary).
//!
//! A thin wrapper around the `tor_relay_map` library that handles argument
//! parsing, configuration checks, logger setup and user-facing output.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use tor_relay_map::initialization::init_logger_with;
use tor_relay_map::{exit_code, run_map, summary_line, Config, Opt, EXIT_USAGE};

fn main() -> Result<()> {
    let config = Config::from(Opt::parse());

    if let Err(e) = config.validate() {
        eprintln!("tor_relay_map: {}", e);
        process::exit(EXIT_USAGE);
    }

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    match run_map(config) {
        Ok(report) => {
            println!("{}", summary_line(&report));
            println!("Map saved in {}", report.output_path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("tor_relay_map error: {:#}", e);
            process::exit(exit_code(&e));
        }
    }
}
