//! Mock implementations of core port traits.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use proctor_core::domain::{
    Evidence, FaceLandmarks, FaceRegion, Frame, FrameReport, NormalizedBox, ObjectDetection,
};
use proctor_core::ports::{
    EvidenceStore, FaceDetector, FrameSource, LandmarkExtractor, ObjectDetector, ProgressEvent,
    ProgressSink, ReportOutput,
};
use time::OffsetDateTime;

/// Mock implementation of `FrameSource` for testing.
///
/// Yields pre-built frames and tracks iteration for assertions.
pub struct MockFrameSource {
    frames: Vec<Frame>,
    iteration_count: Arc<Mutex<usize>>,
}

impl MockFrameSource {
    /// Creates a new mock source with the given frames.
    #[must_use]
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            iteration_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Creates an empty mock source.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// Returns the number of times the source has been iterated.
    #[must_use]
    pub fn iteration_count(&self) -> usize {
        *self
            .iteration_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl FrameSource for MockFrameSource {
    fn frames(&self) -> Box<dyn Iterator<Item = anyhow::Result<Frame>> + Send + '_> {
        *self
            .iteration_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        Box::new(self.frames.iter().cloned().map(Ok))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.frames.len())
    }
}

/// A centred face box with high confidence.
#[must_use]
pub fn centred_face() -> FaceRegion {
    FaceRegion::new(NormalizedBox::new(0.35, 0.25, 0.3, 0.45), 0.95)
}

/// Mock face detector returning a fixed set of faces, or failing.
pub struct MockFaceDetector {
    faces: Vec<FaceRegion>,
    error: Option<String>,
    calls: Arc<Mutex<usize>>,
}

impl MockFaceDetector {
    /// Returns the given faces for every frame.
    #[must_use]
    pub fn new(faces: Vec<FaceRegion>) -> Self {
        Self {
            faces,
            error: None,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns `count` side-by-side faces for every frame.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn with_count(count: usize) -> Self {
        if count == 1 {
            return Self::new(vec![centred_face()]);
        }
        let width = 1.0 / count.max(1) as f32;
        let faces = (0..count)
            .map(|i| {
                FaceRegion::new(
                    NormalizedBox::new(i as f32 * width, 0.3, width * 0.8, 0.4),
                    0.9,
                )
            })
            .collect();
        Self::new(faces)
    }

    /// Fails on every frame.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            faces: Vec::new(),
            error: Some(message.into()),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of frames inspected.
    #[must_use]
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FaceDetector for MockFaceDetector {
    fn detect_faces(&self, _frame: &Frame) -> anyhow::Result<Vec<FaceRegion>> {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        match &self.error {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(self.faces.clone()),
        }
    }
}

/// Mock landmark extractor replaying a script.
///
/// Each call consumes the next scripted result; the last one repeats once
/// the script is exhausted.
pub struct MockLandmarkExtractor {
    script: Mutex<VecDeque<Option<FaceLandmarks>>>,
    last: Mutex<Option<FaceLandmarks>>,
    error: Option<String>,
}

impl MockLandmarkExtractor {
    /// Returns the same landmarks for every frame.
    #[must_use]
    pub fn fixed(landmarks: Option<FaceLandmarks>) -> Self {
        Self::scripted(vec![landmarks])
    }

    /// Returns the scripted landmarks in order.
    #[must_use]
    pub fn scripted(script: Vec<Option<FaceLandmarks>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            error: None,
        }
    }

    /// Fails on every frame.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            error: Some(message.into()),
        }
    }
}

impl LandmarkExtractor for MockLandmarkExtractor {
    fn extract(&self, _frame: &Frame) -> anyhow::Result<Option<FaceLandmarks>> {
        if let Some(message) = &self.error {
            anyhow::bail!("{message}");
        }
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(next) = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
        {
            *last = next;
        }
        Ok(*last)
    }
}

/// Mock object detector returning fixed detections, or failing.
pub struct MockObjectDetector {
    detections: Vec<ObjectDetection>,
    error: Option<String>,
}

impl MockObjectDetector {
    /// Returns the given detections for every frame.
    #[must_use]
    pub fn new(detections: Vec<ObjectDetection>) -> Self {
        Self {
            detections,
            error: None,
        }
    }

    /// Detects nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Detects a single object with the given label and confidence.
    #[must_use]
    pub fn single(label: &str, confidence: f32) -> Self {
        Self::new(vec![ObjectDetection::new(
            label,
            confidence,
            NormalizedBox::new(0.05, 0.6, 0.15, 0.25),
        )])
    }

    /// Fails on every frame.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            detections: Vec::new(),
            error: Some(message.into()),
        }
    }
}

impl ObjectDetector for MockObjectDetector {
    fn detect_objects(&self, _frame: &Frame) -> anyhow::Result<Vec<ObjectDetection>> {
        match &self.error {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(self.detections.clone()),
        }
    }
}

/// Mock implementation of `ReportOutput` for testing.
///
/// Captures reports for later assertions.
pub struct MockReportOutput {
    reports: Arc<Mutex<Vec<FrameReport>>>,
    flush_count: Arc<Mutex<usize>>,
}

impl MockReportOutput {
    /// Creates a new mock output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reports: Arc::new(Mutex::new(Vec::new())),
            flush_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns all captured reports.
    #[must_use]
    pub fn reports(&self) -> Vec<FrameReport> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of times `flush()` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockReportOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportOutput for MockReportOutput {
    fn write(&self, report: &FrameReport) -> anyhow::Result<()> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.clone());
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
pub struct MockProgressSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of `Completed` events.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Completed { .. }))
            .count()
    }

    /// Returns the number of `Skipped` events.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Skipped { .. }))
            .count()
    }

    /// Returns the final counts from the session's `Finished` event, if any.
    #[must_use]
    pub fn finished_counts(&self, session: &str) -> Option<(usize, usize)> {
        self.events().iter().find_map(|e| match e {
            ProgressEvent::Finished {
                session_id,
                processed,
                skipped,
            } if session_id == session => Some((*processed, *skipped)),
            _ => None,
        })
    }
}

impl Default for MockProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Mock evidence store capturing what was stored.
pub struct MockEvidenceStore {
    stored: Arc<Mutex<Vec<(String, usize, OffsetDateTime)>>>,
    error: Option<String>,
}

impl MockEvidenceStore {
    /// Creates a store that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stored: Arc::new(Mutex::new(Vec::new())),
            error: None,
        }
    }

    /// Creates a store that rejects everything.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            stored: Arc::new(Mutex::new(Vec::new())),
            error: Some(message.into()),
        }
    }

    /// `(session_id, size_bytes, captured_at)` of every stored snapshot.
    #[must_use]
    pub fn stored(&self) -> Vec<(String, usize, OffsetDateTime)> {
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MockEvidenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EvidenceStore for MockEvidenceStore {
    fn store(
        &self,
        session_id: &str,
        evidence: &Evidence,
        captured_at: OffsetDateTime,
    ) -> anyhow::Result<String> {
        if let Some(message) = &self.error {
            anyhow::bail!("{message}");
        }
        let mut stored = self.stored.lock().unwrap_or_else(PoisonError::into_inner);
        stored.push((session_id.to_string(), evidence.size_bytes, captured_at));
        Ok(format!("mock://{session_id}/{}", stored.len()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::builders::{LandmarkBuilder, SyntheticFrameBuilder};

    #[test]
    fn test_mock_frame_source_empty() {
        let source = MockFrameSource::empty();
        assert_eq!(source.count_hint(), Some(0));
        assert_eq!(source.frames().count(), 0);
        assert_eq!(source.iteration_count(), 1);
    }

    #[test]
    fn test_face_detector_counts() {
        let frame = SyntheticFrameBuilder::new().size(8, 8).build();
        let detector = MockFaceDetector::with_count(3);
        assert_eq!(detector.detect_faces(&frame).unwrap().len(), 3);
        assert_eq!(detector.calls(), 1);
        assert!(MockFaceDetector::failing("down").detect_faces(&frame).is_err());
    }

    #[test]
    fn test_landmark_script_repeats_last() {
        let frame = SyntheticFrameBuilder::new().size(8, 8).build();
        let frontal = LandmarkBuilder::frontal(8, 8);
        let extractor = MockLandmarkExtractor::scripted(vec![None, Some(frontal)]);
        assert!(extractor.extract(&frame).unwrap().is_none());
        assert_eq!(extractor.extract(&frame).unwrap(), Some(frontal));
        assert_eq!(extractor.extract(&frame).unwrap(), Some(frontal));
    }

    #[test]
    fn test_mock_report_output() {
        let output = MockReportOutput::new();
        let report = FrameReport {
            session_id: "s".into(),
            source: "f.jpg".into(),
            timestamp: "2024-01-01T00:00:00Z".into(),
            violations: vec![],
            pose: None,
            face_count: 1,
            flags: proctor_core::domain::ViolationFlags::default(),
            evidence: None,
        };
        output.write(&report).unwrap();
        output.flush().unwrap();
        assert_eq!(output.reports().len(), 1);
        assert_eq!(output.flush_count(), 1);
    }

    #[test]
    fn test_mock_progress_sink() {
        let sink = MockProgressSink::new();
        sink.on_event(ProgressEvent::Finished {
            session_id: "s".into(),
            processed: 2,
            skipped: 1,
        });
        assert_eq!(sink.finished_counts("s"), Some((2, 1)));
        assert_eq!(sink.finished_counts("other"), None);
    }

    #[test]
    fn test_evidence_store_locator() {
        let store = MockEvidenceStore::new();
        let evidence = Evidence::jpeg(vec![0; 10], 2, 2);
        let at = OffsetDateTime::UNIX_EPOCH;
        assert_eq!(store.store("s1", &evidence, at).unwrap(), "mock://s1/1");
        assert_eq!(store.stored(), vec![(String::from("s1"), 10, at)]);
        assert!(MockEvidenceStore::failing("full").store("s1", &evidence, at).is_err());
    }
}
