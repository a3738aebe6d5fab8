//! Pre-exam environment check.

use crate::domain::{EnvironmentReport, Frame};

use super::brightness::mean_brightness;
use super::face_gate::FaceGateDecision;

/// Configuration for the environment check.
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    /// Darkest acceptable mean brightness.
    pub min_lighting: f64,
    /// Brightest acceptable mean brightness.
    pub max_lighting: f64,
    /// Largest accepted distance of the face centre from the frame centre,
    /// per axis, in normalized units.
    pub centre_tolerance: f32,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            min_lighting: 60.0,
            max_lighting: 230.0,
            centre_tolerance: 0.2,
        }
    }
}

/// Checks lighting and face placement before an exam starts.
pub struct EnvironmentCheck {
    config: EnvironmentConfig,
}

impl EnvironmentCheck {
    /// Creates a new check with the given configuration.
    #[must_use]
    pub const fn new(config: EnvironmentConfig) -> Self {
        Self { config }
    }

    /// Builds the report for a frame and its face gate decision.
    #[must_use]
    pub fn evaluate(&self, frame: &Frame, gate: &FaceGateDecision) -> EnvironmentReport {
        let brightness = mean_brightness(&frame.to_luma8());
        let lighting_ok =
            (self.config.min_lighting..=self.config.max_lighting).contains(&brightness);

        let (face_detected, face_centered) = match gate {
            FaceGateDecision::SingleFace(face) => {
                let centre = face.bbox.center();
                let tolerance = self.config.centre_tolerance;
                (
                    true,
                    (centre.x - 0.5).abs() <= tolerance && (centre.y - 0.5).abs() <= tolerance,
                )
            }
            _ => (false, false),
        };

        let message = if !lighting_ok && brightness < self.config.min_lighting {
            "Lighting is too dark. Please improve lighting."
        } else if !lighting_ok {
            "Lighting is too bright. Please reduce glare."
        } else if let FaceGateDecision::MultipleFaces { .. } = gate {
            "Multiple faces detected. Make sure you are alone."
        } else if !face_detected {
            "No face detected. Please face the camera directly."
        } else if !face_centered {
            "Please center your face in the frame."
        } else {
            "Environment check passed"
        };

        EnvironmentReport {
            lighting_ok,
            face_detected,
            face_centered,
            brightness,
            message: message.to_string(),
        }
    }
}

impl Default for EnvironmentCheck {
    fn default() -> Self {
        Self::new(EnvironmentConfig::default())
    }
}
