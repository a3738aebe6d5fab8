//! Configuration file support for proctor.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/proctor/config.toml` (lowest priority)
//! - Project-local: `.proctor.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Gaze classification settings.
    pub gaze: GazeSection,
    /// Temporal debounce settings.
    pub tracker: TrackerSection,
    /// Face count gate settings.
    pub face_gate: FaceGateSection,
    /// Object presence settings.
    pub objects: ObjectsSection,
    /// Evidence snapshot settings.
    pub snapshot: SnapshotSection,
    /// Environment check settings.
    pub environment: EnvironmentSection,
    /// Monitor command settings.
    pub monitor: MonitorSection,
    /// Output settings.
    pub output: OutputSection,
}

/// Gaze classification configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GazeSection {
    /// Yaw offset threshold in degrees.
    pub yaw_threshold: Option<f64>,
    /// Pitch offset threshold in degrees.
    pub pitch_threshold: Option<f64>,
    /// Yaw offset that saturates confidence.
    pub yaw_max: Option<f64>,
    /// Pitch offset that saturates confidence.
    pub pitch_max: Option<f64>,
    /// Yaw weight in the confidence score (0.0-1.0).
    pub yaw_weight: Option<f64>,
    /// Pitch weight in the confidence score (0.0-1.0).
    pub pitch_weight: Option<f64>,
}

/// Temporal debounce configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerSection {
    /// Seconds a direction must be held.
    pub sustained_secs: Option<f64>,
    /// Grade looking-away severity by confidence.
    pub tiered_severity: Option<bool>,
    /// Confidence for `high` severity (0.0-1.0).
    pub high_confidence: Option<f64>,
}

/// Face gate configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FaceGateSection {
    /// Brightness below which an empty frame is not judged (0-255).
    pub min_brightness: Option<f64>,
    /// Minimum face confidence (0.0-1.0).
    pub min_face_confidence: Option<f32>,
}

/// Object presence configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ObjectsSection {
    /// Minimum detection confidence (0.0-1.0).
    pub min_confidence: Option<f32>,
    /// Labels treated as phones.
    pub phone_labels: Option<Vec<String>>,
    /// Labels treated as books.
    pub book_labels: Option<Vec<String>>,
}

/// Evidence snapshot configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SnapshotSection {
    /// Minimum seconds between snapshots of a session.
    pub interval_secs: Option<f64>,
    /// JPEG quality (1-100).
    pub jpeg_quality: Option<u8>,
    /// Directory for evidence files.
    pub dir: Option<PathBuf>,
}

/// Environment check configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct EnvironmentSection {
    /// Darkest acceptable mean brightness (0-255).
    pub min_lighting: Option<f64>,
    /// Brightest acceptable mean brightness (0-255).
    pub max_lighting: Option<f64>,
    /// Face centre tolerance (0.0-0.5).
    pub centre_tolerance: Option<f32>,
}

/// Monitor command configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorSection {
    /// Seconds between consecutive frames of a session directory.
    pub frame_interval_secs: Option<f64>,
    /// Frames averaged for calibration when no baseline is given.
    pub calibration_frames: Option<usize>,
    /// Directory holding sidecar annotations.
    pub annotations_dir: Option<PathBuf>,
}

/// Output configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Print per-session summaries to stderr.
    pub summary: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/proctor/config.toml`
    /// 2. Project-local: `.proctor.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are logged as warnings
    /// and the configuration falls back to defaults.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        if let Err(e) = config.validate() {
            eprintln!("warning: {e}; ignoring configuration files");
            return Self::default();
        }

        config
    }

    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), String> {
        check_positive("gaze.yaw_threshold", self.gaze.yaw_threshold)?;
        check_positive("gaze.pitch_threshold", self.gaze.pitch_threshold)?;
        check_positive("gaze.yaw_max", self.gaze.yaw_max)?;
        check_positive("gaze.pitch_max", self.gaze.pitch_max)?;
        check_unit("gaze.yaw_weight", self.gaze.yaw_weight)?;
        check_unit("gaze.pitch_weight", self.gaze.pitch_weight)?;

        check_non_negative("tracker.sustained_secs", self.tracker.sustained_secs)?;
        check_unit("tracker.high_confidence", self.tracker.high_confidence)?;

        check_range("face_gate.min_brightness", self.face_gate.min_brightness, 0.0, 255.0)?;
        check_unit(
            "face_gate.min_face_confidence",
            self.face_gate.min_face_confidence.map(f64::from),
        )?;

        check_unit(
            "objects.min_confidence",
            self.objects.min_confidence.map(f64::from),
        )?;

        check_non_negative("snapshot.interval_secs", self.snapshot.interval_secs)?;
        if let Some(q) = self.snapshot.jpeg_quality {
            if !(1..=100).contains(&q) {
                return Err(format!("snapshot.jpeg_quality must be 1-100, got {q}"));
            }
        }

        check_range("environment.min_lighting", self.environment.min_lighting, 0.0, 255.0)?;
        check_range("environment.max_lighting", self.environment.max_lighting, 0.0, 255.0)?;
        if let (Some(min), Some(max)) = (self.environment.min_lighting, self.environment.max_lighting) {
            if min > max {
                return Err(format!(
                    "environment.min_lighting ({min}) exceeds environment.max_lighting ({max})"
                ));
            }
        }
        check_range(
            "environment.centre_tolerance",
            self.environment.centre_tolerance.map(f64::from),
            0.0,
            0.5,
        )?;

        check_positive("monitor.frame_interval_secs", self.monitor.frame_interval_secs)?;
        check_range(
            "monitor.frame_interval_secs",
            self.monitor.frame_interval_secs,
            0.0,
            86_400.0,
        )?;
        if self.monitor.calibration_frames == Some(0) {
            return Err(String::from("monitor.calibration_frames must be at least 1"));
        }

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    pub fn merge(&mut self, other: Self) {
        // Gaze
        self.gaze.yaw_threshold = other.gaze.yaw_threshold.or(self.gaze.yaw_threshold);
        self.gaze.pitch_threshold = other.gaze.pitch_threshold.or(self.gaze.pitch_threshold);
        self.gaze.yaw_max = other.gaze.yaw_max.or(self.gaze.yaw_max);
        self.gaze.pitch_max = other.gaze.pitch_max.or(self.gaze.pitch_max);
        self.gaze.yaw_weight = other.gaze.yaw_weight.or(self.gaze.yaw_weight);
        self.gaze.pitch_weight = other.gaze.pitch_weight.or(self.gaze.pitch_weight);

        // Tracker
        self.tracker.sustained_secs = other.tracker.sustained_secs.or(self.tracker.sustained_secs);
        self.tracker.tiered_severity = other
            .tracker
            .tiered_severity
            .or(self.tracker.tiered_severity);
        self.tracker.high_confidence = other
            .tracker
            .high_confidence
            .or(self.tracker.high_confidence);

        // Face gate
        self.face_gate.min_brightness = other
            .face_gate
            .min_brightness
            .or(self.face_gate.min_brightness);
        self.face_gate.min_face_confidence = other
            .face_gate
            .min_face_confidence
            .or(self.face_gate.min_face_confidence);

        // Objects
        self.objects.min_confidence = other.objects.min_confidence.or(self.objects.min_confidence);
        self.objects.phone_labels = other
            .objects
            .phone_labels
            .or_else(|| self.objects.phone_labels.take());
        self.objects.book_labels = other
            .objects
            .book_labels
            .or_else(|| self.objects.book_labels.take());

        // Snapshot
        self.snapshot.interval_secs = other.snapshot.interval_secs.or(self.snapshot.interval_secs);
        self.snapshot.jpeg_quality = other.snapshot.jpeg_quality.or(self.snapshot.jpeg_quality);
        self.snapshot.dir = other.snapshot.dir.or_else(|| self.snapshot.dir.take());

        // Environment
        self.environment.min_lighting = other
            .environment
            .min_lighting
            .or(self.environment.min_lighting);
        self.environment.max_lighting = other
            .environment
            .max_lighting
            .or(self.environment.max_lighting);
        self.environment.centre_tolerance = other
            .environment
            .centre_tolerance
            .or(self.environment.centre_tolerance);

        // Monitor
        self.monitor.frame_interval_secs = other
            .monitor
            .frame_interval_secs
            .or(self.monitor.frame_interval_secs);
        self.monitor.calibration_frames = other
            .monitor
            .calibration_frames
            .or(self.monitor.calibration_frames);
        self.monitor.annotations_dir = other
            .monitor
            .annotations_dir
            .or_else(|| self.monitor.annotations_dir.take());

        // Output
        self.output.summary = other.output.summary.or(self.output.summary);
        self.output.progress = other.output.progress.or(self.output.progress);
    }
}

fn check_range(name: &str, value: Option<f64>, min: f64, max: f64) -> Result<(), String> {
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(format!("{name} must be {min}-{max}, got {v}")),
        _ => Ok(()),
    }
}

fn check_unit(name: &str, value: Option<f64>) -> Result<(), String> {
    check_range(name, value, 0.0, 1.0)
}

fn check_positive(name: &str, value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if v.is_nan() || v <= 0.0 => Err(format!("{name} must be positive, got {v}")),
        _ => Ok(()),
    }
}

fn check_non_negative(name: &str, value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if v.is_nan() || v < 0.0 => Err(format!("{name} must not be negative, got {v}")),
        _ => Ok(()),
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("proctor").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.proctor.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(".proctor.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.gaze.yaw_threshold.is_none());
        assert!(config.tracker.sustained_secs.is_none());
        assert!(config.snapshot.dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r"
[gaze]
yaw_threshold = 30.0
pitch_threshold = 15.0
yaw_max = 50.0
pitch_max = 40.0
yaw_weight = 0.7
pitch_weight = 0.3

[tracker]
sustained_secs = 5.0
tiered_severity = false
high_confidence = 0.9

[face_gate]
min_brightness = 25.0
min_face_confidence = 0.6

[objects]
min_confidence = 0.5
phone_labels = ['cell phone', 'smartphone']
book_labels = ['book', 'notebook']

[snapshot]
interval_secs = 3.0
jpeg_quality = 90
dir = '/var/lib/proctor/evidence'

[environment]
min_lighting = 50.0
max_lighting = 220.0
centre_tolerance = 0.25

[monitor]
frame_interval_secs = 0.5
calibration_frames = 3

[output]
summary = true
progress = false
";
        let config: AppConfig = toml::from_str(toml).expect("parse full config");

        assert_eq!(config.gaze.yaw_threshold, Some(30.0));
        assert_eq!(config.tracker.tiered_severity, Some(false));
        assert_eq!(config.face_gate.min_face_confidence, Some(0.6));
        assert_eq!(
            config.objects.phone_labels,
            Some(vec!["cell phone".to_string(), "smartphone".to_string()])
        );
        assert_eq!(config.snapshot.jpeg_quality, Some(90));
        assert_eq!(config.environment.centre_tolerance, Some(0.25));
        assert_eq!(config.monitor.calibration_frames, Some(3));
        assert_eq!(config.output.summary, Some(true));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_configs() {
        let mut base: AppConfig = toml::from_str(
            r"
[gaze]
yaw_threshold = 20.0

[tracker]
sustained_secs = 6.0
",
        )
        .expect("parse base");

        let override_config: AppConfig = toml::from_str(
            r"
[gaze]
yaw_threshold = 35.0

[snapshot]
interval_secs = 5.0
",
        )
        .expect("parse override");

        base.merge(override_config);

        assert_eq!(base.gaze.yaw_threshold, Some(35.0));
        assert_eq!(base.tracker.sustained_secs, Some(6.0));
        assert_eq!(base.snapshot.interval_secs, Some(5.0));
    }

    #[test]
    fn test_merge_empty_override_preserves_base() {
        let mut base: AppConfig = toml::from_str(
            r"
[objects]
phone_labels = ['phone']

[monitor]
annotations_dir = '/srv/annotations'
",
        )
        .expect("parse base");
        base.merge(AppConfig::default());
        assert_eq!(base.objects.phone_labels, Some(vec!["phone".to_string()]));
        assert_eq!(
            base.monitor.annotations_dir,
            Some(PathBuf::from("/srv/annotations"))
        );
    }

    #[test]
    fn test_invalid_toml_syntax_handled() {
        let result: Result<AppConfig, _> = toml::from_str("[gaze\nyaw_threshold = 1");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_field_type_handled() {
        let result: Result<AppConfig, _> = toml::from_str("[tracker]\nsustained_secs = 'long'");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_section_ignored() {
        let config: AppConfig =
            toml::from_str("[future]\nfoo = 1\n\n[gaze]\nyaw_threshold = 30.0").unwrap();
        assert_eq!(config.gaze.yaw_threshold, Some(30.0));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let cases = [
            ("[gaze]\nyaw_threshold = -1.0", "gaze.yaw_threshold"),
            ("[gaze]\nyaw_weight = 1.5", "gaze.yaw_weight"),
            ("[tracker]\nsustained_secs = -2.0", "tracker.sustained_secs"),
            ("[objects]\nmin_confidence = 2.0", "objects.min_confidence"),
            ("[snapshot]\njpeg_quality = 0", "snapshot.jpeg_quality"),
            (
                "[environment]\nmin_lighting = 200.0\nmax_lighting = 100.0",
                "environment.min_lighting",
            ),
            ("[monitor]\ncalibration_frames = 0", "monitor.calibration_frames"),
            ("[monitor]\nframe_interval_secs = 0.0", "monitor.frame_interval_secs"),
            ("[monitor]\nframe_interval_secs = 1e12", "monitor.frame_interval_secs"),
        ];
        for (toml, field) in cases {
            let config: AppConfig = toml::from_str(toml).unwrap();
            let err = config.validate().unwrap_err();
            assert!(err.contains(field), "{field}: {err}");
        }
    }

    #[test]
    fn test_find_config_in_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(".proctor.toml"), "").unwrap();
        assert_eq!(
            find_config_in_parents(&nested),
            Some(dir.path().join(".proctor.toml"))
        );
    }
}
