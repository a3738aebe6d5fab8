//! Environment check command - lighting and face placement before an exam.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use proctor_adapters::fs::load_frame;
use proctor_core::FrameViolationPipeline;
use time::OffsetDateTime;

use super::detection::DetectionArgs;
use super::ExitCode;
use crate::config::AppConfig;
use crate::output::JsonOutput;

/// Arguments for the env-check command.
#[derive(Args, Clone)]
pub struct EnvCheckArgs {
    /// Frame from the candidate's camera
    #[arg(value_name = "FRAME")]
    pub frame: PathBuf,

    #[command(flatten)]
    pub detection: DetectionArgs,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl EnvCheckArgs {
    /// Apply configuration file values, respecting CLI precedence.
    #[must_use]
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.detection = self.detection.with_config(config);
        self
    }
}

/// Run the env-check command.
///
/// Prints the environment report as JSON. Exits with `Flagged` when the
/// candidate is not ready.
pub fn run(args: &EnvCheckArgs) -> Result<ExitCode> {
    let frame = load_frame(&args.frame, OffsetDateTime::now_utc())?;
    let pipeline = FrameViolationPipeline::new(
        args.detection.capabilities(None),
        args.detection.pipeline_config(),
    );
    let report = pipeline.check_environment(&frame)?;

    JsonOutput::stdout().write_value(&report, args.pretty)?;

    Ok(if report.is_ready() {
        ExitCode::Success
    } else {
        ExitCode::Flagged
    })
}
