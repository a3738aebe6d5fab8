//! Evidence snapshot throttling.

use time::OffsetDateTime;

/// Per-session throttle state, created when the first snapshot is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleState {
    /// When the last snapshot was materialized.
    pub last_emitted_at: OffsetDateTime,
}

/// Limits how often evidence is materialized for a session.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotThrottle {
    interval_secs: f64,
}

impl SnapshotThrottle {
    /// Creates a throttle with the minimum interval between snapshots.
    #[must_use]
    pub const fn new(interval_secs: f64) -> Self {
        Self { interval_secs }
    }

    /// Minimum interval between snapshots.
    #[must_use]
    pub const fn interval_secs(&self) -> f64 {
        self.interval_secs
    }

    /// Returns true if a snapshot may be emitted at `now`.
    #[must_use]
    pub fn should_emit(&self, state: Option<&ThrottleState>, now: OffsetDateTime) -> bool {
        state.map_or(true, |s| {
            (now - s.last_emitted_at).as_seconds_f64() >= self.interval_secs
        })
    }
}

impl Default for SnapshotThrottle {
    fn default() -> Self {
        Self::new(2.0)
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;

    fn at(secs: f64) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + Duration::seconds_f64(secs)
    }

    #[test]
    fn test_first_snapshot_allowed() {
        assert!(SnapshotThrottle::default().should_emit(None, at(0.0)));
    }

    #[test]
    fn test_interval_respected() {
        let throttle = SnapshotThrottle::default();
        let state = ThrottleState {
            last_emitted_at: at(0.0),
        };
        assert!(!throttle.should_emit(Some(&state), at(1.0)));
        assert!(throttle.should_emit(Some(&state), at(2.0)));
        assert!(throttle.should_emit(Some(&state), at(2.1)));
    }
}
