//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the violation engine and the
//! detection services, frame feeds and sinks that surround it.

mod capabilities;
mod evidence_store;
mod frame_source;
mod progress;
mod report_output;

pub use capabilities::{FaceDetector, LandmarkExtractor, ObjectDetector};
pub use evidence_store::EvidenceStore;
pub use frame_source::FrameSource;
pub use progress::{ProgressEvent, ProgressSink};
pub use report_output::ReportOutput;
