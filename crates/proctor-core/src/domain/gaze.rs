//! Gaze classification output.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dominant direction of a head turn away from the calibrated baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GazeDirection {
    /// Turned towards the student's left.
    Left,
    /// Turned towards the student's right.
    Right,
    /// Tilted up.
    Up,
    /// Tilted down.
    Down,
    /// Facing the screen.
    #[default]
    None,
}

impl GazeDirection {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
            Self::None => "none",
        }
    }
}

impl fmt::Display for GazeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of comparing one pose to the calibration baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeEvaluation {
    /// Whether either offset exceeded its threshold.
    pub is_looking_away: bool,
    /// Weighted, normalized offset magnitude (0.0 to 1.0).
    pub confidence: f64,
    /// Dominant direction, `None` when not looking away.
    pub direction: GazeDirection,
    /// `yaw - baseline.yaw` in degrees.
    pub yaw_offset: f64,
    /// `pitch - baseline.pitch` in degrees.
    pub pitch_offset: f64,
}
