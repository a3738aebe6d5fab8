//! Gaze classification relative to the calibration baseline.

use crate::domain::{CalibrationBaseline, GazeDirection, GazeEvaluation, PoseSample};

/// Thresholds and weights for gaze classification, in degrees.
#[derive(Debug, Clone)]
pub struct GazeConfig {
    /// Yaw offset above which the student is looking away.
    pub yaw_threshold: f64,
    /// Pitch offset above which the student is looking away.
    pub pitch_threshold: f64,
    /// Yaw offset that saturates the yaw confidence term.
    pub yaw_max: f64,
    /// Pitch offset that saturates the pitch confidence term.
    pub pitch_max: f64,
    /// Weight of the yaw term in the confidence score.
    pub yaw_weight: f64,
    /// Weight of the pitch term in the confidence score.
    pub pitch_weight: f64,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            yaw_threshold: 25.0,
            pitch_threshold: 20.0,
            yaw_max: 45.0,
            pitch_max: 35.0,
            yaw_weight: 0.8,
            pitch_weight: 0.2,
        }
    }
}

/// Stateless classifier comparing a pose to the baseline.
pub struct GazeClassifier {
    config: GazeConfig,
}

impl GazeClassifier {
    /// Creates a new classifier with the given configuration.
    #[must_use]
    pub const fn new(config: GazeConfig) -> Self {
        Self { config }
    }

    /// Classifies one pose.
    #[must_use]
    pub fn classify(&self, pose: &PoseSample, baseline: &CalibrationBaseline) -> GazeEvaluation {
        let yaw_offset = pose.yaw - baseline.yaw;
        let pitch_offset = pose.pitch - baseline.pitch;

        let is_looking_away = yaw_offset.abs() > self.config.yaw_threshold
            || pitch_offset.abs() > self.config.pitch_threshold;

        let direction = if !is_looking_away {
            GazeDirection::None
        } else if yaw_offset.abs() > pitch_offset.abs() {
            if yaw_offset > 0.0 {
                GazeDirection::Right
            } else {
                GazeDirection::Left
            }
        } else if pitch_offset > 0.0 {
            GazeDirection::Down
        } else {
            GazeDirection::Up
        };

        let confidence = (self.config.yaw_weight * saturate(yaw_offset, self.config.yaw_max)
            + self.config.pitch_weight * saturate(pitch_offset, self.config.pitch_max))
        .clamp(0.0, 1.0);

        GazeEvaluation {
            is_looking_away,
            confidence,
            direction,
            yaw_offset,
            pitch_offset,
        }
    }
}

impl Default for GazeClassifier {
    fn default() -> Self {
        Self::new(GazeConfig::default())
    }
}

fn saturate(offset: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 1.0;
    }
    (offset.abs() / max).min(1.0)
}
