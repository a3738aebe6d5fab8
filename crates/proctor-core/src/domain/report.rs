//! Per-frame reports and per-session aggregates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CalibrationBaseline, PoseSample, Violation, ViolationType};

/// Instantaneous signals for a frame, independent of debouncing.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationFlags {
    /// The gaze classifier considered the student to be looking away.
    pub looking_away: bool,
    /// More than one face was counted.
    pub multiple_faces: bool,
    /// A lit frame had no face.
    pub no_person: bool,
    /// A phone-like object passed the confidence threshold.
    pub phone_detected: bool,
    /// A book passed the confidence threshold.
    pub book_detected: bool,
}

/// Annotated snapshot attached to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// MIME type of the encoded bytes.
    pub media_type: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Encoded size in bytes.
    pub size_bytes: usize,
    /// Encoded image, not serialized.
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Where the evidence was stored, once persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Evidence {
    /// Wraps encoded JPEG bytes.
    #[must_use]
    pub fn jpeg(bytes: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            media_type: String::from("image/jpeg"),
            width,
            height,
            size_bytes: bytes.len(),
            bytes,
            location: None,
        }
    }
}

/// Everything the engine found in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Session the frame belongs to.
    pub session_id: String,
    /// Frame source.
    pub source: String,
    /// Capture time (RFC 3339).
    pub timestamp: String,
    /// Violations raised by this frame.
    pub violations: Vec<Violation>,
    /// Estimated head pose, when exactly one face was present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose: Option<PoseSample>,
    /// Number of faces counted.
    pub face_count: usize,
    /// Instantaneous signals.
    pub flags: ViolationFlags,
    /// Snapshot, when the throttle allowed one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
}

impl FrameReport {
    /// Returns true if the frame raised at least one violation.
    #[must_use]
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }
}

/// Result of a calibration attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationOutcome {
    /// Whether a baseline was captured.
    pub success: bool,
    /// Baseline pitch, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    /// Baseline yaw, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f64>,
    /// Human readable outcome.
    pub message: String,
}

impl CalibrationOutcome {
    /// A successful calibration.
    #[must_use]
    pub fn success(baseline: CalibrationBaseline) -> Self {
        Self {
            success: true,
            pitch: Some(baseline.pitch),
            yaw: Some(baseline.yaw),
            message: String::from("Calibration successful"),
        }
    }

    /// A failed calibration.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            pitch: None,
            yaw: None,
            message: message.into(),
        }
    }

    /// The captured baseline, if calibration succeeded.
    #[must_use]
    pub fn baseline(&self) -> Option<CalibrationBaseline> {
        match (self.success, self.pitch, self.yaw) {
            (true, Some(pitch), Some(yaw)) => Some(CalibrationBaseline::new(pitch, yaw)),
            _ => None,
        }
    }
}

/// Pre-exam environment check.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentReport {
    /// Mean brightness is within the accepted range.
    pub lighting_ok: bool,
    /// Exactly one face was found.
    pub face_detected: bool,
    /// The face is near the frame centre.
    pub face_centered: bool,
    /// Mean grayscale brightness (0 to 255).
    pub brightness: f64,
    /// Human readable guidance.
    pub message: String,
}

impl EnvironmentReport {
    /// Returns true if the student can start the exam.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.lighting_ok && self.face_detected && self.face_centered
    }
}

/// Counters accumulated over a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Frames that produced a report.
    pub frames_processed: u64,
    /// Frames with at least one violation.
    pub frames_with_violations: u64,
    /// Snapshots materialized.
    pub snapshots_emitted: u64,
    /// Violation counts per type.
    pub violation_counts: BTreeMap<ViolationType, u64>,
}

impl SessionSummary {
    /// Accounts for one processed frame.
    pub fn record(&mut self, violations: &[Violation], snapshot: bool) {
        self.frames_processed += 1;
        if !violations.is_empty() {
            self.frames_with_violations += 1;
        }
        if snapshot {
            self.snapshots_emitted += 1;
        }
        for v in violations {
            *self.violation_counts.entry(v.violation_type).or_insert(0) += 1;
        }
    }

    /// Total violations across all types.
    #[must_use]
    pub fn total_violations(&self) -> u64 {
        self.violation_counts.values().sum()
    }

    /// Fraction of processed frames that raised the given violation type.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn rate(&self, violation_type: ViolationType) -> f64 {
        if self.frames_processed == 0 {
            return 0.0;
        }
        let count = self.violation_counts.get(&violation_type).copied().unwrap_or(0);
        count as f64 / self.frames_processed as f64
    }
}
