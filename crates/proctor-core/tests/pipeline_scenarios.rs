//! Pipeline scenarios driven by mock capabilities and projected landmarks.
//!
//! Covers the sustained looking-away debounce, face gating, object
//! presence, snapshot throttling and calibration.

#![allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::cast_precision_loss,
    clippy::missing_panics_doc
)]

use std::sync::Arc;

use proctor_core::domain::{
    CalibrationBaseline, FaceLandmarks, FrameReport, GazeDirection, Severity, ViolationType,
};
use proctor_core::{Capabilities, FrameViolationPipeline, PipelineConfig, SessionRegistry};
use proctor_test_support::{
    LandmarkBuilder, MockEvidenceStore, MockFaceDetector, MockLandmarkExtractor,
    MockObjectDetector, SyntheticFrameBuilder,
};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;

fn pipeline(
    faces: MockFaceDetector,
    landmarks: MockLandmarkExtractor,
    objects: MockObjectDetector,
) -> FrameViolationPipeline {
    FrameViolationPipeline::new(
        Capabilities {
            faces: Arc::new(faces),
            landmarks: Arc::new(landmarks),
            objects: Arc::new(objects),
        },
        PipelineConfig::default(),
    )
}

fn turned(yaw: f64) -> Option<FaceLandmarks> {
    Some(LandmarkBuilder::project(0.0, yaw, 0.0, WIDTH, HEIGHT))
}

fn frames() -> SyntheticFrameBuilder {
    SyntheticFrameBuilder::new().size(WIDTH, HEIGHT)
}

/// Runs `count` frames spaced `interval` apart through one session.
fn run(pipeline: &FrameViolationPipeline, count: usize, interval: f64) -> Vec<FrameReport> {
    let registry = SessionRegistry::new();
    let baseline = CalibrationBaseline::default();
    frames()
        .sequence(count, interval)
        .iter()
        .map(|frame| pipeline.process(&registry, "exam-1", &baseline, frame).unwrap())
        .collect()
}

fn looking_away_at(reports: &[FrameReport], interval: f64) -> Vec<f64> {
    reports
        .iter()
        .enumerate()
        .filter(|(_, r)| {
            r.violations
                .iter()
                .any(|v| v.violation_type == ViolationType::LookingAway)
        })
        .map(|(i, _)| i as f64 * interval)
        .collect()
}

// === Sustained looking away ===

#[test]
fn test_eleven_frames_turned_right() {
    let p = pipeline(
        MockFaceDetector::with_count(1),
        MockLandmarkExtractor::fixed(turned(40.0)),
        MockObjectDetector::empty(),
    );
    let reports = run(&p, 11, 1.0);

    assert_eq!(looking_away_at(&reports, 1.0), vec![8.0]);

    let violation = &reports[8].violations[0];
    assert_eq!(violation.direction, Some(GazeDirection::Right));
    assert!((violation.duration_secs.unwrap() - 8.0).abs() < 1e-6);
    assert_eq!(violation.severity, Severity::Medium);

    for report in &reports {
        assert!(report.flags.looking_away);
        assert_eq!(report.face_count, 1);
        let pose = report.pose.unwrap();
        assert!((pose.yaw - 40.0).abs() < 1.0);
    }
}

#[test]
fn test_debounce_independent_of_frame_rate() {
    for interval in [1.0, 0.5, 0.25] {
        let p = pipeline(
            MockFaceDetector::with_count(1),
            MockLandmarkExtractor::fixed(turned(-40.0)),
            MockObjectDetector::empty(),
        );
        let count = (10.0 / interval) as usize + 1;
        let reports = run(&p, count, interval);
        assert_eq!(
            looking_away_at(&reports, interval),
            vec![8.0],
            "interval {interval}"
        );
    }
}

#[test]
fn test_direction_change_restarts_clock() {
    // left for 0..=4 s, right from 5 s
    let mut script = vec![turned(-40.0); 5];
    script.push(turned(40.0));
    let p = pipeline(
        MockFaceDetector::with_count(1),
        MockLandmarkExtractor::scripted(script),
        MockObjectDetector::empty(),
    );
    let reports = run(&p, 16, 1.0);

    assert_eq!(looking_away_at(&reports, 1.0), vec![13.0]);
    assert_eq!(
        reports[13].violations[0].direction,
        Some(GazeDirection::Right)
    );
}

#[test]
fn test_return_to_baseline_resets() {
    let mut script = vec![turned(40.0); 6];
    script.push(turned(0.0));
    script.push(turned(40.0));
    let p = pipeline(
        MockFaceDetector::with_count(1),
        MockLandmarkExtractor::scripted(script),
        MockObjectDetector::empty(),
    );
    let reports = run(&p, 16, 1.0);

    assert!(!reports[6].flags.looking_away);
    assert_eq!(looking_away_at(&reports, 1.0), vec![15.0]);
}

#[test]
fn test_small_turn_never_fires() {
    let p = pipeline(
        MockFaceDetector::with_count(1),
        MockLandmarkExtractor::fixed(turned(15.0)),
        MockObjectDetector::empty(),
    );
    let reports = run(&p, 12, 1.0);
    assert!(reports.iter().all(|r| !r.has_violations()));
    assert!(reports.iter().all(|r| r.evidence.is_none()));
}

#[test]
fn test_missing_landmarks_leave_tracking_untouched() {
    // 0..=3 away, 4..=5 no landmarks, then away again: the clock keeps running
    let mut script = vec![turned(40.0); 4];
    script.extend([None, None]);
    script.push(turned(40.0));
    let p = pipeline(
        MockFaceDetector::with_count(1),
        MockLandmarkExtractor::scripted(script),
        MockObjectDetector::empty(),
    );
    let reports = run(&p, 10, 1.0);

    assert!(reports[4].pose.is_none());
    assert_eq!(looking_away_at(&reports, 1.0), vec![8.0]);
}

/// Frames `0..count` of one session, each evaluated by `present` or `absent`
/// depending on `away(index)`.
fn run_with_gaps(
    present: &FrameViolationPipeline,
    absent: &FrameViolationPipeline,
    count: usize,
    away: impl Fn(usize) -> bool,
) -> Vec<FrameReport> {
    let registry = SessionRegistry::new();
    let baseline = CalibrationBaseline::default();
    frames()
        .sequence(count, 1.0)
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            let p = if away(i) { absent } else { present };
            p.process(&registry, "exam-1", &baseline, frame).unwrap()
        })
        .collect()
}

#[test]
fn test_empty_room_ends_looking_away_episode() {
    let present = pipeline(
        MockFaceDetector::with_count(1),
        MockLandmarkExtractor::fixed(turned(40.0)),
        MockObjectDetector::empty(),
    );
    let absent = pipeline(
        MockFaceDetector::with_count(0),
        MockLandmarkExtractor::fixed(None),
        MockObjectDetector::empty(),
    );
    // 0..=1 away, 2..=60 nobody, 61.. away again
    let reports = run_with_gaps(&present, &absent, 70, |i| (2..=60).contains(&i));

    assert!(reports[2].flags.no_person);
    assert!(!reports[61]
        .violations
        .iter()
        .any(|v| v.violation_type == ViolationType::LookingAway));
    assert_eq!(looking_away_at(&reports, 1.0), vec![69.0]);
    let fired = &reports[69].violations[0];
    assert_eq!(fired.duration_secs, Some(8.0));
}

#[test]
fn test_second_person_ends_looking_away_episode() {
    let present = pipeline(
        MockFaceDetector::with_count(1),
        MockLandmarkExtractor::fixed(turned(40.0)),
        MockObjectDetector::empty(),
    );
    let crowded = pipeline(
        MockFaceDetector::with_count(2),
        MockLandmarkExtractor::fixed(turned(40.0)),
        MockObjectDetector::empty(),
    );
    // 0..=5 away, 6 two faces, 7.. away again: the clock restarts at 7
    let reports = run_with_gaps(&present, &crowded, 16, |i| i == 6);

    assert!(reports[6].flags.multiple_faces);
    assert_eq!(looking_away_at(&reports, 1.0), vec![15.0]);
}

// === Face gate ===

#[test]
fn test_empty_lit_frame_is_no_person() {
    let p = pipeline(
        MockFaceDetector::with_count(0),
        MockLandmarkExtractor::fixed(None),
        MockObjectDetector::empty(),
    );
    let reports = run(&p, 1, 1.0);
    assert_eq!(reports[0].face_count, 0);
    assert!(reports[0].flags.no_person);
    assert_eq!(reports[0].violations[0].violation_type, ViolationType::NoPerson);
    assert_eq!(reports[0].violations[0].severity, Severity::High);
}

#[test]
fn test_empty_dark_frame_is_silent() {
    let p = pipeline(
        MockFaceDetector::with_count(0),
        MockLandmarkExtractor::fixed(None),
        MockObjectDetector::empty(),
    );
    let registry = SessionRegistry::new();
    let frame = frames().dark().build();
    let report = p
        .process(&registry, "exam-1", &CalibrationBaseline::default(), &frame)
        .unwrap();
    assert!(!report.has_violations());
    assert!(!report.flags.no_person);
}

#[test]
fn test_two_faces_skip_pose() {
    let p = pipeline(
        MockFaceDetector::with_count(2),
        MockLandmarkExtractor::fixed(turned(40.0)),
        MockObjectDetector::empty(),
    );
    let reports = run(&p, 1, 1.0);
    assert_eq!(reports[0].face_count, 2);
    assert!(reports[0].pose.is_none());
    assert!(reports[0].flags.multiple_faces);
    assert_eq!(
        reports[0].violations[0].violation_type,
        ViolationType::MultiplePerson
    );
}

#[test]
fn test_face_detector_failure_degrades() {
    let p = pipeline(
        MockFaceDetector::failing("face service down"),
        MockLandmarkExtractor::fixed(turned(40.0)),
        MockObjectDetector::single("cell phone", 0.9),
    );
    let reports = run(&p, 1, 1.0);
    assert_eq!(reports[0].face_count, 0);
    assert!(!reports[0].flags.no_person);
    let types: Vec<_> = reports[0].violations.iter().map(|v| v.violation_type).collect();
    assert_eq!(types, vec![ViolationType::PhoneDetected]);
}

// === Objects ===

#[test]
fn test_objects_checked_with_any_face_count() {
    for faces in [0, 1, 3] {
        let p = pipeline(
            MockFaceDetector::with_count(faces),
            MockLandmarkExtractor::fixed(turned(0.0)),
            MockObjectDetector::single("Book", 0.8),
        );
        let reports = run(&p, 1, 1.0);
        assert!(reports[0].flags.book_detected, "faces {faces}");
        assert!(reports[0]
            .violations
            .iter()
            .any(|v| v.violation_type == ViolationType::BookDetected));
    }
}

#[test]
fn test_object_detector_failure_degrades() {
    let p = pipeline(
        MockFaceDetector::with_count(1),
        MockLandmarkExtractor::fixed(turned(0.0)),
        MockObjectDetector::failing("gpu lost"),
    );
    let reports = run(&p, 1, 1.0);
    assert!(!reports[0].has_violations());
    assert!(reports[0].pose.is_some());
}

// === Evidence throttling ===

#[test]
fn test_snapshot_throttle_timing() {
    let store = Arc::new(MockEvidenceStore::new());
    let p = pipeline(
        MockFaceDetector::with_count(1),
        MockLandmarkExtractor::fixed(turned(0.0)),
        MockObjectDetector::single("phone", 0.9),
    )
    .with_evidence_store(store.clone());

    let registry = SessionRegistry::new();
    let baseline = CalibrationBaseline::default();
    let reports: Vec<FrameReport> = [0.0, 1.0, 2.1]
        .into_iter()
        .map(|t| {
            let frame = frames().at(t).build();
            p.process(&registry, "exam-1", &baseline, &frame).unwrap()
        })
        .collect();

    assert!(reports.iter().all(FrameReport::has_violations));
    assert!(reports[0].evidence.is_some());
    assert!(reports[1].evidence.is_none());
    assert!(reports[2].evidence.is_some());

    let evidence = reports[2].evidence.as_ref().unwrap();
    assert_eq!(evidence.media_type, "image/jpeg");
    assert_eq!((evidence.width, evidence.height), (WIDTH, HEIGHT));
    assert_eq!(evidence.location.as_deref(), Some("mock://exam-1/2"));
    assert_eq!(store.stored().len(), 2);

    let summary = registry.end_session("exam-1").unwrap();
    assert_eq!(summary.snapshots_emitted, 2);
    assert_eq!(summary.frames_with_violations, 3);
}

#[test]
fn test_store_failure_keeps_evidence() {
    let p = pipeline(
        MockFaceDetector::with_count(0),
        MockLandmarkExtractor::fixed(None),
        MockObjectDetector::empty(),
    )
    .with_evidence_store(Arc::new(MockEvidenceStore::failing("bucket gone")));
    let reports = run(&p, 1, 1.0);
    let evidence = reports[0].evidence.as_ref().unwrap();
    assert!(evidence.location.is_none());
    assert!(evidence.size_bytes > 0);
}

// === Calibration and environment ===

#[test]
fn test_calibrated_baseline_is_attentive() {
    let landmarks = LandmarkBuilder::project(8.0, -12.0, 0.0, WIDTH, HEIGHT);
    let p = pipeline(
        MockFaceDetector::with_count(1),
        MockLandmarkExtractor::fixed(Some(landmarks)),
        MockObjectDetector::empty(),
    );
    let outcome = p.calibrate(&frames().build()).unwrap();
    assert!(outcome.success);
    let baseline = outcome.baseline().unwrap();
    assert!((baseline.pitch - 8.0).abs() < 1.0);
    assert!((baseline.yaw + 12.0).abs() < 1.0);

    let registry = SessionRegistry::new();
    let report = p
        .process(&registry, "exam-1", &baseline, &frames().build())
        .unwrap();
    assert!(!report.flags.looking_away);
    assert!(!report.has_violations());
}

#[test]
fn test_calibration_failures() {
    let none = pipeline(
        MockFaceDetector::with_count(0),
        MockLandmarkExtractor::fixed(None),
        MockObjectDetector::empty(),
    );
    let outcome = none.calibrate(&frames().build()).unwrap();
    assert!(!outcome.success);
    assert!(outcome.message.starts_with("No face detected"));

    let many = pipeline(
        MockFaceDetector::with_count(2),
        MockLandmarkExtractor::fixed(turned(0.0)),
        MockObjectDetector::empty(),
    );
    let outcome = many.calibrate(&frames().build()).unwrap();
    assert!(outcome.message.starts_with("Multiple faces detected"));

    let no_pose = pipeline(
        MockFaceDetector::with_count(1),
        MockLandmarkExtractor::fixed(None),
        MockObjectDetector::empty(),
    );
    let outcome = no_pose.calibrate(&frames().build()).unwrap();
    assert!(outcome.message.starts_with("Head pose could not be estimated"));
    assert!(outcome.baseline().is_none());
}

#[test]
fn test_calibration_window_averages() {
    let p = pipeline(
        MockFaceDetector::with_count(1),
        MockLandmarkExtractor::scripted(vec![turned(10.0), None, turned(20.0)]),
        MockObjectDetector::empty(),
    );
    let outcome = p.calibrate_window(&frames().sequence(3, 0.5)).unwrap();
    let baseline = outcome.baseline().unwrap();
    assert!((baseline.yaw - 15.0).abs() < 1.0);
}

#[test]
fn test_environment_check() {
    let p = pipeline(
        MockFaceDetector::with_count(1),
        MockLandmarkExtractor::fixed(None),
        MockObjectDetector::empty(),
    );
    let ready = p.check_environment(&frames().build()).unwrap();
    assert!(ready.is_ready());

    let dark = p.check_environment(&frames().brightness(30).build()).unwrap();
    assert!(!dark.lighting_ok);
    assert!(dark.face_detected);
}

#[test]
fn test_zero_sized_frame_rejected() {
    let p = pipeline(
        MockFaceDetector::with_count(1),
        MockLandmarkExtractor::fixed(None),
        MockObjectDetector::empty(),
    );
    let registry = SessionRegistry::new();
    let frame = frames().size(0, 0).build();
    let result = p.process(&registry, "exam-1", &CalibrationBaseline::default(), &frame);
    assert!(matches!(result, Err(proctor_core::ProctorError::InvalidFrame(_))));
    assert!(registry.is_empty());
}
