//! Injected computer-vision capabilities.
//!
//! Errors from these ports never fail a frame; the pipeline degrades the
//! affected check and logs a warning.

use crate::domain::{FaceLandmarks, FaceRegion, Frame, ObjectDetection};

/// Face presence detection.
pub trait FaceDetector: Send + Sync {
    /// Returns every face found in the frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the detector could not run.
    fn detect_faces(&self, frame: &Frame) -> anyhow::Result<Vec<FaceRegion>>;
}

/// Facial landmark extraction for the single face in a frame.
pub trait LandmarkExtractor: Send + Sync {
    /// Returns the six pose landmarks, or `None` if no face mesh was found.
    ///
    /// # Errors
    ///
    /// Returns an error if the extractor could not run.
    fn extract(&self, frame: &Frame) -> anyhow::Result<Option<FaceLandmarks>>;
}

/// General object detection.
pub trait ObjectDetector: Send + Sync {
    /// Returns labelled detections with normalized boxes.
    ///
    /// # Errors
    ///
    /// Returns an error if the detector could not run.
    fn detect_objects(&self, frame: &Frame) -> anyhow::Result<Vec<ObjectDetection>>;
}
