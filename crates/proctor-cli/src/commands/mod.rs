//! CLI command definitions and handlers.

pub mod calibrate;
pub mod detection;
pub mod environment;
pub mod monitor;

use clap::{Parser, Subcommand};

/// Proctor - Exam proctoring violation detection
#[derive(Parser)]
#[command(name = "proctor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Monitor exam sessions and report violations per frame
    Monitor(monitor::MonitorArgs),
    /// Capture a head pose baseline from frames of the candidate
    Calibrate(calibrate::CalibrateArgs),
    /// Check lighting and face placement before an exam
    EnvCheck(environment::EnvCheckArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Nothing to report.
    Success = 0,
    /// Violations found, calibration failed or environment not ready.
    Flagged = 1,
    /// The command could not run.
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}
