//! Proctor CLI - exam proctoring violation detection.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{Cli, Commands, ExitCode};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load();

    let result = match cli.command {
        Commands::Monitor(args) => commands::monitor::run(&args.with_config(&config)),
        Commands::Calibrate(args) => commands::calibrate::run(&args.with_config(&config)),
        Commands::EnvCheck(args) => commands::environment::run(&args.with_config(&config)),
    };

    let exit_code = result.unwrap_or_else(|e| {
        eprintln!("error: {e:#}");
        ExitCode::Error
    });

    exit_code.into()
}
