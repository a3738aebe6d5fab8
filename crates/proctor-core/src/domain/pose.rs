//! Head pose samples, calibration baselines and facial landmarks.

use serde::{Deserialize, Serialize};

use super::Point;

/// Head orientation in degrees.
///
/// Camera convention: positive pitch tilts the head down, positive yaw turns
/// it towards the image's left edge (the student's right), positive roll
/// tilts it clockwise as seen by the camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    /// Rotation about the camera x axis.
    pub pitch: f64,
    /// Rotation about the camera y axis.
    pub yaw: f64,
    /// Rotation about the camera z axis.
    pub roll: f64,
}

impl PoseSample {
    /// Creates a new pose sample.
    #[must_use]
    pub const fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }
}

/// The student's neutral head orientation, captured once at session start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBaseline {
    /// Neutral pitch in degrees.
    pub pitch: f64,
    /// Neutral yaw in degrees.
    pub yaw: f64,
}

impl CalibrationBaseline {
    /// Creates a baseline from explicit angles.
    #[must_use]
    pub const fn new(pitch: f64, yaw: f64) -> Self {
        Self { pitch, yaw }
    }

    /// Uses a single pose as the baseline.
    #[must_use]
    pub const fn from_pose(pose: &PoseSample) -> Self {
        Self {
            pitch: pose.pitch,
            yaw: pose.yaw,
        }
    }

    /// Averages the poses collected during a calibration window.
    ///
    /// Returns `None` when no samples were collected.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_samples(samples: &[PoseSample]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;
        let pitch = samples.iter().map(|s| s.pitch).sum::<f64>() / n;
        let yaw = samples.iter().map(|s| s.yaw).sum::<f64>() / n;
        Some(Self { pitch, yaw })
    }
}

/// Dense face-mesh indices of the six pose landmarks, in [`FaceLandmarks`] order.
pub const MESH_LANDMARK_INDICES: [usize; 6] = [1, 152, 33, 263, 61, 291];

/// The six facial landmarks used for pose estimation.
///
/// Left and right are as seen in the image, not from the student's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmarks {
    /// Tip of the nose.
    pub nose_tip: Point,
    /// Bottom of the chin.
    pub chin: Point,
    /// Outer corner of the eye on the image's left.
    pub left_eye_corner: Point,
    /// Outer corner of the eye on the image's right.
    pub right_eye_corner: Point,
    /// Mouth corner on the image's left.
    pub left_mouth_corner: Point,
    /// Mouth corner on the image's right.
    pub right_mouth_corner: Point,
}

impl FaceLandmarks {
    /// Builds landmarks from points in the canonical order
    /// (nose, chin, left eye, right eye, left mouth, right mouth).
    #[must_use]
    pub const fn from_points(points: [Point; 6]) -> Self {
        let [nose_tip, chin, left_eye_corner, right_eye_corner, left_mouth_corner, right_mouth_corner] =
            points;
        Self {
            nose_tip,
            chin,
            left_eye_corner,
            right_eye_corner,
            left_mouth_corner,
            right_mouth_corner,
        }
    }

    /// Returns the points in canonical order.
    #[must_use]
    pub const fn points(&self) -> [Point; 6] {
        [
            self.nose_tip,
            self.chin,
            self.left_eye_corner,
            self.right_eye_corner,
            self.left_mouth_corner,
            self.right_mouth_corner,
        ]
    }

    /// Picks the six pose landmarks out of a dense face mesh.
    ///
    /// Returns `None` if the mesh is too short.
    #[must_use]
    pub fn from_mesh(mesh: &[Point]) -> Option<Self> {
        let mut points = [Point::new(0.0, 0.0); 6];
        for (slot, &index) in points.iter_mut().zip(MESH_LANDMARK_INDICES.iter()) {
            *slot = *mesh.get(index)?;
        }
        Some(Self::from_points(points))
    }
}
