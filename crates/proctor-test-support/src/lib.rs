//! Test support utilities for proctor.
//!
//! Provides mock capabilities, synthetic frame and landmark builders, and
//! capture sinks for testing the violation pipeline.
//!
//! # Example
//!
//! ```
//! use proctor_test_support::{LandmarkBuilder, MockFaceDetector, SyntheticFrameBuilder};
//!
//! // A well-lit frame one second into the session
//! let frame = SyntheticFrameBuilder::new().at(1.0).build();
//!
//! // Landmarks of a head turned 40 degrees
//! let landmarks = LandmarkBuilder::project(0.0, 40.0, 0.0, frame.width, frame.height);
//!
//! // A detector that always sees one face
//! let faces = MockFaceDetector::with_count(1);
//! ```

mod builders;
mod mocks;

pub use builders::{at_secs, session_start, LandmarkBuilder, SyntheticFrameBuilder};
pub use mocks::{
    centred_face, MockEvidenceStore, MockFaceDetector, MockFrameSource, MockLandmarkExtractor,
    MockObjectDetector, MockProgressSink, MockReportOutput,
};
