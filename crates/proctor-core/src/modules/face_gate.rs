//! Face count gating.
//!
//! Zero faces raise `no_person` only when the frame is lit well enough for a
//! face to have been visible; more than one face raises `multiple_person`
//! and skips the pose chain.

use tracing::{debug, warn};

use crate::domain::{FaceRegion, Frame, Severity, Violation, ViolationType};

use super::brightness::mean_brightness;

/// Configuration for the face gate.
#[derive(Debug, Clone)]
pub struct FaceGateConfig {
    /// Mean brightness below which an empty frame is considered too dark to judge.
    pub min_brightness: f64,
    /// Faces below this confidence are not counted.
    pub min_face_confidence: f32,
}

impl Default for FaceGateConfig {
    fn default() -> Self {
        Self {
            min_brightness: 20.0,
            min_face_confidence: 0.5,
        }
    }
}

/// Which branch of the pipeline a frame takes.
#[derive(Debug, Clone, PartialEq)]
pub enum FaceGateDecision {
    /// No face counted.
    NoFace {
        /// Mean grayscale brightness of the frame.
        brightness: f64,
        /// `no_person`, unless the frame was too dark.
        violation: Option<Violation>,
    },
    /// Exactly one face, continue with pose estimation.
    SingleFace(FaceRegion),
    /// Several faces.
    MultipleFaces {
        /// Faces counted.
        faces: Vec<FaceRegion>,
        /// `multiple_person` violation.
        violation: Violation,
    },
    /// The face detector failed, face checks are skipped for this frame.
    Unavailable,
}

impl FaceGateDecision {
    /// Number of faces counted (zero when unavailable).
    #[must_use]
    pub fn face_count(&self) -> usize {
        match self {
            Self::NoFace { .. } | Self::Unavailable => 0,
            Self::SingleFace(_) => 1,
            Self::MultipleFaces { faces, .. } => faces.len(),
        }
    }

    /// Faces counted, for evidence annotation.
    #[must_use]
    pub fn faces(&self) -> Vec<FaceRegion> {
        match self {
            Self::NoFace { .. } | Self::Unavailable => Vec::new(),
            Self::SingleFace(face) => vec![*face],
            Self::MultipleFaces { faces, .. } => faces.clone(),
        }
    }

    /// Violation raised by the gate, if any.
    #[must_use]
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Self::NoFace { violation, .. } => violation.as_ref(),
            Self::MultipleFaces { violation, .. } => Some(violation),
            Self::SingleFace(_) | Self::Unavailable => None,
        }
    }
}

/// Classifies frames by face count.
pub struct FaceCountGate {
    config: FaceGateConfig,
}

impl FaceCountGate {
    /// Creates a new gate with the given configuration.
    #[must_use]
    pub const fn new(config: FaceGateConfig) -> Self {
        Self { config }
    }

    /// Evaluates the outcome of the face detector for a frame.
    #[must_use]
    pub fn evaluate(&self, frame: &Frame, detected: anyhow::Result<Vec<FaceRegion>>) -> FaceGateDecision {
        match detected {
            Ok(faces) => self.decide(frame, faces),
            Err(e) => {
                warn!("Face detection failed for {}: {e:#}", frame.source);
                FaceGateDecision::Unavailable
            }
        }
    }

    /// Decides the branch for a frame with the given detections.
    #[must_use]
    pub fn decide(&self, frame: &Frame, faces: Vec<FaceRegion>) -> FaceGateDecision {
        let mut faces: Vec<FaceRegion> = faces
            .into_iter()
            .filter(|f| f.confidence >= self.config.min_face_confidence)
            .collect();

        match faces.len() {
            0 => {
                let brightness = mean_brightness(&frame.to_luma8());
                let violation = if brightness >= self.config.min_brightness {
                    Some(Violation::new(
                        ViolationType::NoPerson,
                        Severity::High,
                        "No person detected in frame",
                    ))
                } else {
                    debug!(brightness, "Frame too dark to judge presence");
                    None
                };
                FaceGateDecision::NoFace {
                    brightness,
                    violation,
                }
            }
            1 => FaceGateDecision::SingleFace(faces.remove(0)),
            count => FaceGateDecision::MultipleFaces {
                violation: Violation::new(
                    ViolationType::MultiplePerson,
                    Severity::High,
                    format!("Multiple people detected ({count})"),
                ),
                faces,
            },
        }
    }
}

impl Default for FaceCountGate {
    fn default() -> Self {
        Self::new(FaceGateConfig::default())
    }
}
