//! Strata - Entry point
//!
//! Loads configuration files, applies deep-path overrides and prints the
//! resulting tree as JSON.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use strata::cli::{self, Args, Output};
use strata::telemetry::{init_logging, LogConfig};

fn main() -> ExitCode {
    let args = Args::parse();

    let log_config = LogConfig {
        json_format: args.log_json,
        ..LogConfig::default().with_level(args.log_level.clone())
    };
    if let Err(e) = init_logging(&log_config) {
        eprintln!("{e}");
        return ExitCode::from(2);
    }

    info!(files = args.files.len(), env = args.env, "loading configuration");

    let value = match cli::run(&args) {
        Ok(Output::Tree(value) | Output::Value(value)) => value,
        Ok(Output::NotFound(path)) => {
            error!(path = %path, "path not found");
            return ExitCode::from(3);
        }
        Err(e) => {
            error!("Failed to load configuration: {e:#}");
            eprintln!("error: {e:#}");
            return ExitCode::from(1);
        }
    };

    match serde_json::to_string_pretty(&value) {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(1)
        }
    }
}
