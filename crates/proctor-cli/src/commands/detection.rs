//! Detection settings shared by every command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use proctor_adapters::SidecarAnnotations;
use proctor_core::modules::{
    EnvironmentConfig, EvidenceConfig, FaceGateConfig, GazeConfig, ObjectConfig, TrackerConfig,
};
use proctor_core::{Capabilities, PipelineConfig};

use crate::config::AppConfig;

/// Hardcoded default values for thresholds.
mod defaults {
    pub const YAW_THRESHOLD: f64 = 25.0;
    pub const PITCH_THRESHOLD: f64 = 20.0;
    pub const SUSTAINED_SECS: f64 = 8.0;
    pub const OBJECT_CONFIDENCE: f32 = 0.45;
    pub const SNAPSHOT_INTERVAL_SECS: f64 = 2.0;
}

/// Parse and validate a confidence value (0.0-1.0).
fn parse_confidence(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in 0.0..=1.0"))
    }
}

/// Parse a non-negative number of seconds or degrees.
pub fn parse_non_negative(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("{value} must be a non-negative number"))
    }
}

/// Detection thresholds and the location of detection results.
#[derive(Args, Clone, Default)]
pub struct DetectionArgs {
    /// Yaw offset in degrees that counts as looking away
    #[arg(long, value_parser = parse_non_negative)]
    pub yaw_threshold: Option<f64>,

    /// Pitch offset in degrees that counts as looking away
    #[arg(long, value_parser = parse_non_negative)]
    pub pitch_threshold: Option<f64>,

    /// Seconds a direction must be held before a violation is raised
    #[arg(long, value_parser = parse_non_negative)]
    pub sustained_secs: Option<f64>,

    /// Minimum object detection confidence (0.0-1.0)
    #[arg(long, value_parser = parse_confidence)]
    pub object_confidence: Option<f32>,

    /// Minimum seconds between evidence snapshots of a session
    #[arg(long, value_parser = parse_non_negative)]
    pub snapshot_interval: Option<f64>,

    /// Directory holding detection sidecars (default: next to each frame)
    #[arg(long, value_name = "DIR")]
    pub annotations_dir: Option<PathBuf>,

    /// Merged config (populated by `with_config`, not from CLI).
    #[arg(skip)]
    config: Option<AppConfig>,
}

impl DetectionArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in `pipeline_config`)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    #[must_use]
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.yaw_threshold = self.yaw_threshold.or(config.gaze.yaw_threshold);
        self.pitch_threshold = self.pitch_threshold.or(config.gaze.pitch_threshold);
        self.sustained_secs = self.sustained_secs.or(config.tracker.sustained_secs);
        self.object_confidence = self.object_confidence.or(config.objects.min_confidence);
        self.snapshot_interval = self.snapshot_interval.or(config.snapshot.interval_secs);
        if self.annotations_dir.is_none() {
            self.annotations_dir.clone_from(&config.monitor.annotations_dir);
        }
        self.config = Some(config.clone());
        self
    }

    /// Builds the pipeline configuration from merged args.
    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        let config = self.config.clone().unwrap_or_default();
        let gaze_defaults = GazeConfig::default();
        let tracker_defaults = TrackerConfig::default();
        let gate_defaults = FaceGateConfig::default();
        let object_defaults = ObjectConfig::default();
        let evidence_defaults = EvidenceConfig::default();
        let env_defaults = EnvironmentConfig::default();

        PipelineConfig {
            gaze: GazeConfig {
                yaw_threshold: self.yaw_threshold.unwrap_or(defaults::YAW_THRESHOLD),
                pitch_threshold: self.pitch_threshold.unwrap_or(defaults::PITCH_THRESHOLD),
                yaw_max: config.gaze.yaw_max.unwrap_or(gaze_defaults.yaw_max),
                pitch_max: config.gaze.pitch_max.unwrap_or(gaze_defaults.pitch_max),
                yaw_weight: config.gaze.yaw_weight.unwrap_or(gaze_defaults.yaw_weight),
                pitch_weight: config.gaze.pitch_weight.unwrap_or(gaze_defaults.pitch_weight),
            },
            tracker: TrackerConfig {
                sustained_secs: self.sustained_secs.unwrap_or(defaults::SUSTAINED_SECS),
                tiered_severity: config
                    .tracker
                    .tiered_severity
                    .unwrap_or(tracker_defaults.tiered_severity),
                high_confidence: config
                    .tracker
                    .high_confidence
                    .unwrap_or(tracker_defaults.high_confidence),
            },
            face_gate: FaceGateConfig {
                min_brightness: config
                    .face_gate
                    .min_brightness
                    .unwrap_or(gate_defaults.min_brightness),
                min_face_confidence: config
                    .face_gate
                    .min_face_confidence
                    .unwrap_or(gate_defaults.min_face_confidence),
            },
            objects: ObjectConfig {
                min_confidence: self.object_confidence.unwrap_or(defaults::OBJECT_CONFIDENCE),
                phone_labels: config
                    .objects
                    .phone_labels
                    .unwrap_or(object_defaults.phone_labels),
                book_labels: config
                    .objects
                    .book_labels
                    .unwrap_or(object_defaults.book_labels),
            },
            evidence: EvidenceConfig {
                jpeg_quality: config
                    .snapshot
                    .jpeg_quality
                    .unwrap_or(evidence_defaults.jpeg_quality),
                ..evidence_defaults
            },
            environment: EnvironmentConfig {
                min_lighting: config
                    .environment
                    .min_lighting
                    .unwrap_or(env_defaults.min_lighting),
                max_lighting: config
                    .environment
                    .max_lighting
                    .unwrap_or(env_defaults.max_lighting),
                centre_tolerance: config
                    .environment
                    .centre_tolerance
                    .unwrap_or(env_defaults.centre_tolerance),
            },
            snapshot_interval_secs: self
                .snapshot_interval
                .unwrap_or(defaults::SNAPSHOT_INTERVAL_SECS),
            ..PipelineConfig::default()
        }
    }

    /// Sidecar-backed capabilities for frames of one session.
    ///
    /// With an annotations directory, a session's sidecars live in
    /// `<dir>/<session>/`; without one they sit next to each frame.
    #[must_use]
    pub fn capabilities(&self, session: Option<&str>) -> Capabilities {
        let sidecars = match (&self.annotations_dir, session) {
            (Some(dir), Some(session)) => SidecarAnnotations::in_dir(dir.join(session)),
            (Some(dir), None) => SidecarAnnotations::in_dir(dir.clone()),
            (None, _) => SidecarAnnotations::new(),
        };
        let sidecars = Arc::new(sidecars);
        Capabilities {
            faces: sidecars.clone(),
            landmarks: sidecars.clone(),
            objects: sidecars,
        }
    }
}

/// Session id for a session directory: its final path component.
#[must_use]
pub fn session_id(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.to_string_lossy().into_owned(),
        |name| name.to_string_lossy().into_owned(),
    )
}
