//! Calibrate command - capture a head pose baseline.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use proctor_adapters::fs::load_frame;
use proctor_core::FrameViolationPipeline;
use time::OffsetDateTime;
use tracing::info;

use super::detection::DetectionArgs;
use super::ExitCode;
use crate::config::AppConfig;
use crate::output::JsonOutput;

/// Arguments for the calibrate command.
#[derive(Args, Clone)]
pub struct CalibrateArgs {
    /// Frames of the candidate looking at the screen; usable poses are averaged
    #[arg(required = true, value_name = "FRAME")]
    pub frames: Vec<PathBuf>,

    #[command(flatten)]
    pub detection: DetectionArgs,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl CalibrateArgs {
    /// Apply configuration file values, respecting CLI precedence.
    #[must_use]
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.detection = self.detection.with_config(config);
        self
    }
}

/// Run the calibrate command.
///
/// Prints the calibration outcome as JSON. Exits with `Flagged` when no
/// frame yields a pose.
pub fn run(args: &CalibrateArgs) -> Result<ExitCode> {
    let now = OffsetDateTime::now_utc();
    let frames = args
        .frames
        .iter()
        .map(|path| load_frame(path, now))
        .collect::<Result<Vec<_>>>()?;

    let pipeline = FrameViolationPipeline::new(
        args.detection.capabilities(None),
        args.detection.pipeline_config(),
    );
    let outcome = pipeline.calibrate_window(&frames)?;
    info!("Calibration: {}", outcome.message);

    JsonOutput::stdout().write_value(&outcome, args.pretty)?;

    Ok(if outcome.success {
        ExitCode::Success
    } else {
        ExitCode::Flagged
    })
}
