//! Core domain types for webcam exam proctoring.

mod detection;
mod frame;
mod gaze;
mod pose;
mod report;
mod violation;

pub use detection::{FaceRegion, NormalizedBox, ObjectDetection, Point};
pub use frame::{format_timestamp, Frame};
pub use gaze::{GazeDirection, GazeEvaluation};
pub use pose::{CalibrationBaseline, FaceLandmarks, PoseSample, MESH_LANDMARK_INDICES};
pub use report::{
    CalibrationOutcome, EnvironmentReport, Evidence, FrameReport, SessionSummary, ViolationFlags,
};
pub use violation::{Severity, Violation, ViolationType};
