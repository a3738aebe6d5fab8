//! Monitor command - run exam sessions through the violation pipeline.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Args;
use proctor_adapters::{FsEvidenceStore, FsFrameSource};
use proctor_core::{
    CalibrationBaseline, FrameSource, FrameViolationPipeline, PipelineConfig, ReportOutput,
    SessionRegistry, SessionRun, SessionSummary,
};
use rayon::prelude::*;
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::detection::{parse_non_negative, session_id, DetectionArgs};
use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{JsonOutput, ProgressBar};

/// Hardcoded defaults for monitor settings.
mod defaults {
    pub const FRAME_INTERVAL_SECS: f64 = 1.0;
    pub const CALIBRATION_FRAMES: usize = 1;
    pub const MAX_FRAME_INTERVAL_SECS: f64 = 86_400.0;
}

/// Parse the spacing between frames: positive and at most one day.
fn parse_interval(s: &str) -> Result<f64, String> {
    let value = parse_non_negative(s)?;
    if value <= 0.0 {
        Err(String::from("frame interval must be greater than zero"))
    } else if value > defaults::MAX_FRAME_INTERVAL_SECS {
        Err(format!(
            "{value} exceeds the maximum frame interval of {} seconds",
            defaults::MAX_FRAME_INTERVAL_SECS
        ))
    } else {
        Ok(value)
    }
}

fn parse_start(s: &str) -> Result<OffsetDateTime, String> {
    OffsetDateTime::parse(s, &Rfc3339).map_err(|e| format!("'{s}' is not an RFC 3339 time: {e}"))
}

fn parse_frame_count(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err(String::from("at least one calibration frame is needed")),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{s}' is not a valid count")),
    }
}

/// Arguments for the monitor command.
#[derive(Args, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct MonitorArgs {
    /// Session directories; each holds one session's frames in name order
    #[arg(required = true, value_name = "SESSION_DIR")]
    pub sessions: Vec<PathBuf>,

    #[command(flatten)]
    pub detection: DetectionArgs,

    /// Calibrated baseline pitch in degrees (skips calibration)
    #[arg(long, allow_negative_numbers = true)]
    pub baseline_pitch: Option<f64>,

    /// Calibrated baseline yaw in degrees (skips calibration)
    #[arg(long, allow_negative_numbers = true)]
    pub baseline_yaw: Option<f64>,

    /// Leading frames averaged into the baseline
    #[arg(long, value_parser = parse_frame_count)]
    pub calibration_frames: Option<usize>,

    /// Seconds between consecutive frames
    #[arg(long, value_parser = parse_interval)]
    pub interval: Option<f64>,

    /// Capture time of each session's first frame (RFC 3339, default: now)
    #[arg(long, value_parser = parse_start)]
    pub start: Option<OffsetDateTime>,

    /// Write evidence snapshots under this directory
    ///
    /// Without it, reports carry only the snapshot's type, size and
    /// dimensions; the image itself is not kept.
    #[arg(long, value_name = "DIR")]
    pub evidence_dir: Option<PathBuf>,

    /// Print a summary per session to stderr
    #[arg(long)]
    pub summary: bool,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl MonitorArgs {
    /// Apply configuration file values, respecting CLI precedence.
    #[must_use]
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.detection = self.detection.with_config(config);
        self.calibration_frames = self
            .calibration_frames
            .or(config.monitor.calibration_frames);
        self.interval = self.interval.or(config.monitor.frame_interval_secs);
        if self.evidence_dir.is_none() {
            self.evidence_dir.clone_from(&config.snapshot.dir);
        }
        if !self.summary {
            self.summary = config.output.summary.unwrap_or(false);
        }
        if !self.progress {
            self.progress = config.output.progress.unwrap_or(false);
        }
        self
    }

    fn interval(&self) -> f64 {
        self.interval.unwrap_or(defaults::FRAME_INTERVAL_SECS)
    }

    fn calibration_frames(&self) -> usize {
        self.calibration_frames
            .unwrap_or(defaults::CALIBRATION_FRAMES)
    }

    /// Baseline given on the command line, if any.
    fn fixed_baseline(&self) -> Option<CalibrationBaseline> {
        if self.baseline_pitch.is_none() && self.baseline_yaw.is_none() {
            return None;
        }
        Some(CalibrationBaseline::new(
            self.baseline_pitch.unwrap_or(0.0),
            self.baseline_yaw.unwrap_or(0.0),
        ))
    }
}

/// Everything shared by the sessions of one run.
struct Monitor<'a> {
    args: &'a MonitorArgs,
    config: PipelineConfig,
    registry: SessionRegistry,
    output: JsonOutput,
    diagnostics: JsonOutput,
    progress: ProgressBar,
    start: OffsetDateTime,
}

/// Run the monitor command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings. Sessions run in parallel; the
/// frames of a session run in order.
pub fn run(args: &MonitorArgs) -> Result<ExitCode> {
    info!("Monitoring {} sessions", args.sessions.len());

    let start = args.start.unwrap_or_else(OffsetDateTime::now_utc);
    let total: usize = args
        .sessions
        .iter()
        .filter_map(|dir| FsFrameSource::new(vec![dir.clone()], start, args.interval()).count_hint())
        .sum();
    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());

    let monitor = Monitor {
        args,
        config: args.detection.pipeline_config(),
        registry: SessionRegistry::new(),
        output: JsonOutput::stdout(),
        diagnostics: JsonOutput::stderr(),
        progress: ProgressBar::new(Some(total as u64), args.quiet, show_progress),
        start,
    };

    let runs: Vec<Result<SessionRun>> = args
        .sessions
        .par_iter()
        .map(|dir| monitor.run_session(dir))
        .collect();

    monitor.output.flush()?;
    monitor.progress.finish();

    let mut failed = false;
    let mut flagged = false;
    for (dir, run) in args.sessions.iter().zip(runs) {
        match run {
            Ok(run) => {
                debug!(
                    "{}: {} frames, {} skipped, {} with violations",
                    dir.display(),
                    run.processed,
                    run.skipped,
                    run.with_violations
                );
                flagged |= run.with_violations > 0;
            }
            Err(e) => {
                eprintln!("error: session {}: {e:#}", dir.display());
                failed = true;
            }
        }
    }

    Ok(if failed {
        ExitCode::Error
    } else if flagged {
        ExitCode::Flagged
    } else {
        ExitCode::Success
    })
}

impl Monitor<'_> {
    fn run_session(&self, dir: &Path) -> Result<SessionRun> {
        if !dir.is_dir() {
            bail!("Not a session directory: {}", dir.display());
        }

        let session_id = session_id(dir);
        if self.registry.contains(&session_id) {
            warn!("{session_id}: another directory with this name is running, frames share one session");
        }
        let source = FsFrameSource::new(vec![dir.to_path_buf()], self.start, self.args.interval());
        let mut pipeline = FrameViolationPipeline::new(
            self.args.detection.capabilities(Some(&session_id)),
            self.config.clone(),
        );
        if let Some(evidence_dir) = &self.args.evidence_dir {
            pipeline = pipeline.with_evidence_store(Arc::new(FsEvidenceStore::new(evidence_dir)));
        }

        let baseline = self.baseline(&pipeline, &source, &session_id);
        let run = pipeline.run_session(
            &self.registry,
            &session_id,
            &baseline,
            &source,
            &self.output,
            &self.progress,
        );

        debug!("Active sessions: {:?}", self.registry.active_sessions());
        let summary = self.registry.end_session(&session_id);
        let run = run?;
        if self.args.summary {
            self.print_summary(&session_id, &baseline, &summary.unwrap_or_default())?;
        }
        Ok(run)
    }

    fn baseline(
        &self,
        pipeline: &FrameViolationPipeline,
        source: &FsFrameSource,
        session_id: &str,
    ) -> CalibrationBaseline {
        if let Some(baseline) = self.args.fixed_baseline() {
            return baseline;
        }

        let frames: Vec<_> = source
            .frames()
            .flatten()
            .take(self.args.calibration_frames())
            .collect();
        let outcome = match pipeline.calibrate_window(&frames) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("{session_id}: calibration failed: {e}");
                return CalibrationBaseline::default();
            }
        };
        outcome.baseline().unwrap_or_else(|| {
            warn!(
                "{session_id}: calibration failed ({}); using a frontal baseline",
                outcome.message
            );
            CalibrationBaseline::default()
        })
    }

    fn print_summary(
        &self,
        session_id: &str,
        baseline: &CalibrationBaseline,
        summary: &SessionSummary,
    ) -> Result<()> {
        self.diagnostics.write_value(
            &json!({
                "session_id": session_id,
                "baseline": { "pitch": baseline.pitch, "yaw": baseline.yaw },
                "summary": summary,
                "total_violations": summary.total_violations(),
            }),
            false,
        )
    }
}
