//! Detection modules.
//!
//! Each module covers one stage of the per-frame violation pipeline and is
//! configured by its own `Default`-implementing config struct.

mod brightness;
mod environment;
mod evidence;
mod face_gate;
mod gaze;
mod head_pose;
mod objects;
mod throttle;
mod tracker;

pub use brightness::{mean_brightness, Histogram};
pub use environment::{EnvironmentCheck, EnvironmentConfig};
pub use evidence::{EvidenceConfig, EvidenceRenderer};
pub use face_gate::{FaceCountGate, FaceGateConfig, FaceGateDecision};
pub use gaze::{GazeClassifier, GazeConfig};
pub use head_pose::{HeadPoseConfig, HeadPoseEstimator, FACE_MODEL};
pub use objects::{ObjectConfig, ObjectFindings, ObjectPresenceDetector};
pub use throttle::{SnapshotThrottle, ThrottleState};
pub use tracker::{TemporalViolationTracker, TrackerConfig, TrackingPhase, TrackingState, Transition};
