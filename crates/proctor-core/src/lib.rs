//! Proctor Core - exam proctoring violation engine
//!
//! This crate contains the domain types, the capability ports, the detection
//! modules (head pose, gaze, temporal tracking, face gating, object presence,
//! evidence) and the per-frame pipeline with its session registry.

pub mod domain;
pub mod error;
pub mod modules;
pub mod pipeline;
pub mod ports;
pub mod session;

pub use domain::{
    CalibrationBaseline, CalibrationOutcome, EnvironmentReport, Evidence, FaceLandmarks,
    FaceRegion, Frame, FrameReport, GazeDirection, GazeEvaluation, NormalizedBox, ObjectDetection,
    Point, PoseSample, SessionSummary, Severity, Violation, ViolationFlags, ViolationType,
};
pub use error::{ProctorError, Result};
pub use pipeline::{Capabilities, FrameViolationPipeline, PipelineConfig, SessionRun};
pub use ports::{
    EvidenceStore, FaceDetector, FrameSource, LandmarkExtractor, ObjectDetector, ProgressEvent,
    ProgressSink, ReportOutput,
};
pub use session::{SessionRegistry, SessionState};
