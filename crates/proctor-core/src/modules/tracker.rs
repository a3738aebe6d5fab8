//! Temporal debouncing of looking-away signals.
//!
//! A session is in one of three phases:
//!
//! - **Idle**: no tracking state, the student is attentive.
//! - **Tracking**: looking away in one direction since `start_time`.
//! - **Reported**: the current episode already produced its violation.
//!
//! A violation fires once the same direction has been held for
//! `sustained_secs` of wall time between frame timestamps. Switching
//! direction restarts the clock and re-arms reporting. Returning to the
//! baseline clears the state.

use time::OffsetDateTime;
use tracing::debug;

use crate::domain::{GazeDirection, GazeEvaluation, Severity, Violation, ViolationType};

/// Configuration for the temporal tracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Seconds a direction must be held before a violation fires.
    pub sustained_secs: f64,
    /// Grade severity by gaze confidence instead of always `medium`.
    pub tiered_severity: bool,
    /// Confidence at or above which a tiered violation is `high`.
    pub high_confidence: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            sustained_secs: 8.0,
            tiered_severity: true,
            high_confidence: 0.8,
        }
    }
}

/// Per-session looking-away episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingState {
    /// When the current direction was first observed.
    pub start_time: OffsetDateTime,
    /// Direction being tracked.
    pub direction: GazeDirection,
    /// Whether this episode already produced its violation.
    pub reported: bool,
}

/// Coarse phase of a session's tracking state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingPhase {
    /// Attentive.
    Idle,
    /// Looking away, not yet reported.
    Tracking,
    /// Looking away, violation already emitted.
    Reported,
}

impl TrackingPhase {
    /// Phase of an optional tracking state.
    #[must_use]
    pub const fn of(state: Option<&TrackingState>) -> Self {
        match state {
            None => Self::Idle,
            Some(s) if s.reported => Self::Reported,
            Some(_) => Self::Tracking,
        }
    }
}

/// Outcome of one observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// State to store for the session, replacing the previous one.
    pub next: Option<TrackingState>,
    /// Violation raised by this observation.
    pub violation: Option<Violation>,
}

/// Pure state machine over [`TrackingState`].
pub struct TemporalViolationTracker {
    config: TrackerConfig,
}

impl TemporalViolationTracker {
    /// Creates a new tracker with the given configuration.
    #[must_use]
    pub const fn new(config: TrackerConfig) -> Self {
        Self { config }
    }

    /// Feeds one gaze evaluation observed at `now`.
    #[must_use]
    pub fn observe(
        &self,
        previous: Option<&TrackingState>,
        gaze: &GazeEvaluation,
        now: OffsetDateTime,
    ) -> Transition {
        if !gaze.is_looking_away {
            if previous.is_some() {
                debug!("Attention returned, tracking cleared");
            }
            return Transition {
                next: None,
                violation: None,
            };
        }

        let mut state = match previous {
            Some(state) if state.direction == gaze.direction => *state,
            _ => {
                debug!(direction = %gaze.direction, "Tracking started");
                TrackingState {
                    start_time: now,
                    direction: gaze.direction,
                    reported: false,
                }
            }
        };

        let elapsed = (now - state.start_time).as_seconds_f64();
        let violation = if !state.reported && elapsed >= self.config.sustained_secs {
            state.reported = true;
            Some(self.violation(gaze, elapsed))
        } else {
            None
        };

        Transition {
            next: Some(state),
            violation,
        }
    }

    fn violation(&self, gaze: &GazeEvaluation, elapsed: f64) -> Violation {
        let severity =
            if self.config.tiered_severity && gaze.confidence >= self.config.high_confidence {
                Severity::High
            } else {
                Severity::Medium
            };
        Violation::new(
            ViolationType::LookingAway,
            severity,
            format!("Looking {} for {elapsed:.1}s", gaze.direction),
        )
        .with_direction(gaze.direction)
        .with_confidence(gaze.confidence)
        .with_duration(elapsed)
    }
}

impl Default for TemporalViolationTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}
