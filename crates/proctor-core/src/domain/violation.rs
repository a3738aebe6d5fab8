//! Violation events emitted by the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::GazeDirection;

/// Canonical violation vocabulary.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    /// Sustained head turn away from the screen.
    LookingAway,
    /// More than one face in frame.
    MultiplePerson,
    /// Lit frame without a face.
    NoPerson,
    /// Phone-like object visible.
    PhoneDetected,
    /// Book visible.
    BookDetected,
    /// Eye movement reported by an upstream gaze capability.
    EyeMovement,
}

impl ViolationType {
    /// Stable snake_case name, identical to the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LookingAway => "looking_away",
            Self::MultiplePerson => "multiple_person",
            Self::NoPerson => "no_person",
            Self::PhoneDetected => "phone_detected",
            Self::BookDetected => "book_detected",
            Self::EyeMovement => "eye_movement",
        }
    }
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How serious a violation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational.
    Low,
    /// Needs review.
    Medium,
    /// Strong evidence of misconduct.
    High,
}

/// A single violation found in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Violation kind.
    #[serde(rename = "type")]
    pub violation_type: ViolationType,
    /// Severity tier.
    pub severity: Severity,
    /// Human readable description.
    pub message: String,
    /// Gaze direction, for looking-away events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<GazeDirection>,
    /// Confidence score (0.0 to 1.0), when the detector provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// How long the behaviour lasted, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

impl Violation {
    /// Creates a violation without optional details.
    #[must_use]
    pub fn new(violation_type: ViolationType, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            violation_type,
            severity,
            message: message.into(),
            direction: None,
            confidence: None,
            duration_secs: None,
        }
    }

    /// Attaches a gaze direction.
    #[must_use]
    pub fn with_direction(mut self, direction: GazeDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Attaches a confidence score.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Attaches a duration in seconds.
    #[must_use]
    pub fn with_duration(mut self, duration_secs: f64) -> Self {
        self.duration_secs = Some(duration_secs);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_names_match_as_str() {
        for t in [
            ViolationType::LookingAway,
            ViolationType::MultiplePerson,
            ViolationType::NoPerson,
            ViolationType::PhoneDetected,
            ViolationType::BookDetected,
            ViolationType::EyeMovement,
        ] {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
    }

    #[test]
    fn test_optional_fields_skipped() {
        let v = Violation::new(ViolationType::NoPerson, Severity::High, "No person detected");
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["type"], "no_person");
        assert_eq!(json["severity"], "high");
        assert!(json.get("direction").is_none());
        assert!(json.get("duration_secs").is_none());
    }

    #[test]
    fn test_builder_details() {
        let v = Violation::new(ViolationType::LookingAway, Severity::Medium, "away")
            .with_direction(GazeDirection::Left)
            .with_confidence(0.5)
            .with_duration(9.0);
        assert_eq!(v.direction, Some(GazeDirection::Left));
        assert_eq!(v.confidence, Some(0.5));
        assert_eq!(v.duration_secs, Some(9.0));
    }
}
