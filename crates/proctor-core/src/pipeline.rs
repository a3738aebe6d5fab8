//! Per-frame violation pipeline.
//!
//! frame -> face gate -> (pose -> gaze -> tracker, single face only)
//! -> object presence -> report -> throttled evidence.

use std::sync::{Arc, PoisonError};

use tracing::{debug, info, warn};

use crate::domain::{
    CalibrationBaseline, CalibrationOutcome, EnvironmentReport, Frame, FrameReport, PoseSample,
    ViolationFlags,
};
use crate::error::Result;
use crate::modules::{
    EnvironmentCheck, EnvironmentConfig, EvidenceConfig, EvidenceRenderer, FaceCountGate,
    FaceGateConfig, FaceGateDecision, GazeClassifier, GazeConfig, HeadPoseConfig,
    HeadPoseEstimator, ObjectConfig, ObjectPresenceDetector, SnapshotThrottle, TemporalViolationTracker,
    ThrottleState, TrackerConfig, TrackingPhase,
};
use crate::ports::{
    EvidenceStore, FaceDetector, FrameSource, LandmarkExtractor, ObjectDetector, ProgressEvent,
    ProgressSink, ReportOutput,
};
use crate::session::SessionRegistry;

/// The injected computer-vision capabilities.
#[derive(Clone)]
pub struct Capabilities {
    /// Face presence.
    pub faces: Arc<dyn FaceDetector>,
    /// Facial landmarks.
    pub landmarks: Arc<dyn LandmarkExtractor>,
    /// Object detection.
    pub objects: Arc<dyn ObjectDetector>,
}

/// Configuration for every pipeline stage.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Face count gate.
    pub face_gate: FaceGateConfig,
    /// Head pose solve.
    pub head_pose: HeadPoseConfig,
    /// Gaze thresholds.
    pub gaze: GazeConfig,
    /// Temporal debounce.
    pub tracker: TrackerConfig,
    /// Object filtering.
    pub objects: ObjectConfig,
    /// Evidence rendering.
    pub evidence: EvidenceConfig,
    /// Environment check.
    pub environment: EnvironmentConfig,
    /// Minimum seconds between evidence snapshots of a session.
    pub snapshot_interval_secs: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            face_gate: FaceGateConfig::default(),
            head_pose: HeadPoseConfig::default(),
            gaze: GazeConfig::default(),
            tracker: TrackerConfig::default(),
            objects: ObjectConfig::default(),
            evidence: EvidenceConfig::default(),
            environment: EnvironmentConfig::default(),
            snapshot_interval_secs: 2.0,
        }
    }
}

/// Counts for one pass over a session's frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionRun {
    /// Frames that produced a report.
    pub processed: usize,
    /// Frames that failed to load or were rejected.
    pub skipped: usize,
    /// Reports with at least one violation.
    pub with_violations: usize,
}

/// Orchestrates the detection modules for each frame.
pub struct FrameViolationPipeline {
    capabilities: Capabilities,
    gate: FaceCountGate,
    estimator: HeadPoseEstimator,
    classifier: GazeClassifier,
    tracker: TemporalViolationTracker,
    objects: ObjectPresenceDetector,
    throttle: SnapshotThrottle,
    renderer: EvidenceRenderer,
    environment: EnvironmentCheck,
    evidence_store: Option<Arc<dyn EvidenceStore>>,
}

impl FrameViolationPipeline {
    /// Creates a pipeline over the given capabilities.
    #[must_use]
    pub fn new(capabilities: Capabilities, config: PipelineConfig) -> Self {
        Self {
            capabilities,
            gate: FaceCountGate::new(config.face_gate),
            estimator: HeadPoseEstimator::new(config.head_pose),
            classifier: GazeClassifier::new(config.gaze),
            tracker: TemporalViolationTracker::new(config.tracker),
            objects: ObjectPresenceDetector::new(config.objects),
            throttle: SnapshotThrottle::new(config.snapshot_interval_secs),
            renderer: EvidenceRenderer::new(config.evidence),
            environment: EnvironmentCheck::new(config.environment),
            evidence_store: None,
        }
    }

    /// Persists materialized evidence through the given store.
    #[must_use]
    pub fn with_evidence_store(mut self, store: Arc<dyn EvidenceStore>) -> Self {
        self.evidence_store = Some(store);
        self
    }

    /// Evaluates one frame of a session.
    ///
    /// The session's state is locked for the whole frame and replaced at the
    /// end, so frames of a session must be submitted in arrival order.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is empty. Capability failures are
    /// logged and degrade the affected check instead.
    pub fn process(
        &self,
        registry: &SessionRegistry,
        session_id: &str,
        baseline: &CalibrationBaseline,
        frame: &Frame,
    ) -> Result<FrameReport> {
        frame.validate()?;

        let cell = registry.session(session_id);
        let mut state = cell.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = state.clone();

        let gate = self
            .gate
            .evaluate(frame, self.capabilities.faces.detect_faces(frame));

        let mut violations = Vec::new();
        let mut flags = ViolationFlags::default();
        let mut pose = None;

        match &gate {
            // The candidate's gaze was not observed, so an episode cannot
            // span these frames.
            FaceGateDecision::NoFace { violation, .. } => {
                next.tracking = None;
                if let Some(v) = violation {
                    flags.no_person = true;
                    violations.push(v.clone());
                }
            }
            FaceGateDecision::MultipleFaces { violation, .. } => {
                next.tracking = None;
                flags.multiple_faces = true;
                violations.push(violation.clone());
            }
            FaceGateDecision::SingleFace(_) => {
                pose = self.estimate_pose(frame);
                if let Some(sample) = &pose {
                    let gaze = self.classifier.classify(sample, baseline);
                    flags.looking_away = gaze.is_looking_away;
                    let transition =
                        self.tracker
                            .observe(next.tracking.as_ref(), &gaze, frame.captured_at);
                    next.tracking = transition.next;
                    violations.extend(transition.violation);
                }
            }
            FaceGateDecision::Unavailable => {}
        }

        let phase = TrackingPhase::of(next.tracking.as_ref());
        if phase != TrackingPhase::of(state.tracking.as_ref()) {
            debug!(session_id, ?phase, "Tracking phase changed");
        }

        let findings = self
            .objects
            .scan(frame, self.capabilities.objects.detect_objects(frame));
        flags.phone_detected = findings.phone.is_some();
        flags.book_detected = findings.book.is_some();
        violations.extend(findings.violations());

        let mut evidence = None;
        if !violations.is_empty()
            && self
                .throttle
                .should_emit(next.throttle.as_ref(), frame.captured_at)
        {
            match self
                .renderer
                .render(frame, &gate.faces(), &findings.detections())
            {
                Ok(mut snapshot) => {
                    if let Some(store) = &self.evidence_store {
                        match store.store(session_id, &snapshot, frame.captured_at) {
                            Ok(location) => snapshot.location = Some(location),
                            Err(e) => warn!("Failed to store evidence for {session_id}: {e:#}"),
                        }
                    }
                    next.throttle = Some(ThrottleState {
                        last_emitted_at: frame.captured_at,
                    });
                    evidence = Some(snapshot);
                }
                Err(e) => warn!("Evidence for {} dropped: {e}", frame.source),
            }
        } else if !violations.is_empty() {
            debug!(
                session_id,
                interval_secs = self.throttle.interval_secs(),
                "Snapshot throttled"
            );
        }

        next.summary.record(&violations, evidence.is_some());
        *state = next;
        drop(state);

        if !violations.is_empty() {
            info!(
                session_id,
                source = %frame.source,
                count = violations.len(),
                "Violations detected"
            );
        }

        Ok(FrameReport {
            session_id: session_id.to_string(),
            source: frame.source.clone(),
            timestamp: frame.timestamp(),
            violations,
            pose,
            face_count: gate.face_count(),
            flags,
            evidence,
        })
    }

    /// Feeds every frame of a source through [`Self::process`] in order.
    ///
    /// Frames that fail to load or are rejected are reported as skipped and
    /// do not stop the session.
    ///
    /// # Errors
    ///
    /// Returns an error if a report cannot be written.
    pub fn run_session(
        &self,
        registry: &SessionRegistry,
        session_id: &str,
        baseline: &CalibrationBaseline,
        source: &dyn FrameSource,
        output: &dyn ReportOutput,
        progress: &dyn ProgressSink,
    ) -> anyhow::Result<SessionRun> {
        let total = source.count_hint();
        let mut run = SessionRun::default();

        for (index, frame) in source.frames().enumerate() {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    // The error message carries the path via anyhow context
                    progress.on_event(ProgressEvent::Skipped {
                        session_id: session_id.to_string(),
                        source: format!("frame {index}"),
                        reason: format!("{e:#}"),
                    });
                    run.skipped += 1;
                    continue;
                }
            };

            progress.on_event(ProgressEvent::Started {
                session_id: session_id.to_string(),
                source: frame.source.clone(),
                index,
                total,
            });

            let report = match self.process(registry, session_id, baseline, &frame) {
                Ok(report) => report,
                Err(e) => {
                    progress.on_event(ProgressEvent::Skipped {
                        session_id: session_id.to_string(),
                        source: frame.source.clone(),
                        reason: e.to_string(),
                    });
                    run.skipped += 1;
                    continue;
                }
            };

            output.write(&report)?;
            run.processed += 1;
            if report.has_violations() {
                run.with_violations += 1;
            }
            progress.on_event(ProgressEvent::Completed {
                report: Box::new(report),
            });
        }

        output.flush()?;
        progress.on_event(ProgressEvent::Finished {
            session_id: session_id.to_string(),
            processed: run.processed,
            skipped: run.skipped,
        });
        Ok(run)
    }

    /// Captures a calibration baseline from a frame with exactly one face.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is empty.
    pub fn calibrate(&self, frame: &Frame) -> Result<CalibrationOutcome> {
        frame.validate()?;
        Ok(match self.calibration_pose(frame) {
            Ok(pose) => {
                info!(pitch = pose.pitch, yaw = pose.yaw, "Calibrated");
                CalibrationOutcome::success(CalibrationBaseline::from_pose(&pose))
            }
            Err(message) => CalibrationOutcome::failure(message),
        })
    }

    /// Calibrates from several frames, averaging every usable pose.
    ///
    /// Fails only if no frame yields a pose; the message is then the last
    /// frame's failure reason.
    ///
    /// # Errors
    ///
    /// Returns an error if any frame is empty.
    pub fn calibrate_window(&self, frames: &[Frame]) -> Result<CalibrationOutcome> {
        let mut poses = Vec::with_capacity(frames.len());
        let mut last_failure = String::from("No calibration frames");
        for frame in frames {
            frame.validate()?;
            match self.calibration_pose(frame) {
                Ok(pose) => poses.push(pose),
                Err(message) => last_failure = message.to_string(),
            }
        }
        Ok(match CalibrationBaseline::from_samples(&poses) {
            Some(baseline) => {
                info!(
                    pitch = baseline.pitch,
                    yaw = baseline.yaw,
                    samples = poses.len(),
                    "Calibrated"
                );
                CalibrationOutcome::success(baseline)
            }
            None => CalibrationOutcome::failure(last_failure),
        })
    }

    /// Checks lighting and face placement.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is empty.
    pub fn check_environment(&self, frame: &Frame) -> Result<EnvironmentReport> {
        frame.validate()?;
        let gate = self
            .gate
            .evaluate(frame, self.capabilities.faces.detect_faces(frame));
        Ok(self.environment.evaluate(frame, &gate))
    }

    fn calibration_pose(&self, frame: &Frame) -> std::result::Result<PoseSample, &'static str> {
        let gate = self
            .gate
            .evaluate(frame, self.capabilities.faces.detect_faces(frame));
        match gate {
            FaceGateDecision::SingleFace(_) => self
                .estimate_pose(frame)
                .ok_or("Head pose could not be estimated. Please face the camera directly."),
            FaceGateDecision::NoFace { .. } => {
                Err("No face detected. Please face the camera directly.")
            }
            FaceGateDecision::MultipleFaces { .. } => {
                Err("Multiple faces detected. Make sure you are alone.")
            }
            FaceGateDecision::Unavailable => Err("Face detection unavailable. Please try again."),
        }
    }

    fn estimate_pose(&self, frame: &Frame) -> Option<PoseSample> {
        match self.capabilities.landmarks.extract(frame) {
            Ok(Some(landmarks)) => {
                let pose = self.estimator.estimate(&landmarks, frame.width, frame.height);
                if pose.is_none() {
                    debug!("No pose for {}", frame.source);
                }
                pose
            }
            Ok(None) => {
                debug!("No landmarks for {}", frame.source);
                None
            }
            Err(e) => {
                warn!("Landmark extraction failed for {}: {e:#}", frame.source);
                None
            }
        }
    }
}
