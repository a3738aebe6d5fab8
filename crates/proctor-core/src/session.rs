//! Per-session mutable state.
//!
//! The registry's outer lock is only held to look up, create or evict an
//! entry. Each session has its own lock, held by the pipeline for a whole
//! frame, so frames of one session are serialized while distinct sessions
//! proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::domain::SessionSummary;
use crate::modules::{ThrottleState, TrackingState};

/// Everything the engine remembers about one session between frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Current looking-away episode.
    pub tracking: Option<TrackingState>,
    /// Last evidence snapshot.
    pub throttle: Option<ThrottleState>,
    /// Running counters.
    pub summary: SessionSummary,
}

/// Owner of all per-session state.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<Mutex<SessionState>>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Arc<Mutex<SessionState>>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the session's state cell, creating it on first use.
    #[must_use]
    pub fn session(&self, session_id: &str) -> Arc<Mutex<SessionState>> {
        let mut sessions = self.sessions();
        Arc::clone(sessions.entry(session_id.to_string()).or_insert_with(|| {
            debug!(session_id, "Session created");
            Arc::new(Mutex::new(SessionState::default()))
        }))
    }

    /// Returns a snapshot of the session's state, if it exists.
    #[must_use]
    pub fn state(&self, session_id: &str) -> Option<SessionState> {
        let cell = self.sessions().get(session_id).cloned()?;
        let state = cell.lock().unwrap_or_else(PoisonError::into_inner).clone();
        Some(state)
    }

    /// Returns true if the session has state.
    #[must_use]
    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions().contains_key(session_id)
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    /// Returns true if no session has state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }

    /// Ids of live sessions, sorted.
    #[must_use]
    pub fn active_sessions(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Evicts the session and returns its summary.
    ///
    /// Waits for any frame of the session that is still being processed.
    pub fn end_session(&self, session_id: &str) -> Option<SessionSummary> {
        let cell = self.sessions().remove(session_id)?;
        let state = cell.lock().unwrap_or_else(PoisonError::into_inner);
        debug!(
            session_id,
            frames = state.summary.frames_processed,
            "Session ended"
        );
        Some(state.summary.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_created_on_first_use() {
        let registry = SessionRegistry::new();
        assert!(registry.is_empty());
        let a = registry.session("a");
        let again = registry.session("a");
        assert!(Arc::ptr_eq(&a, &again));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("a"));
    }

    #[test]
    fn test_end_session_evicts() {
        let registry = SessionRegistry::new();
        let cell = registry.session("a");
        cell.lock().unwrap_or_else(PoisonError::into_inner).summary.frames_processed = 3;
        let _ = registry.session("b");

        let summary = registry.end_session("a");
        assert_eq!(summary.map(|s| s.frames_processed), Some(3));
        assert!(!registry.contains("a"));
        assert_eq!(registry.active_sessions(), vec![String::from("b")]);
        assert!(registry.end_session("a").is_none());
    }

    #[test]
    fn test_state_snapshot() {
        let registry = SessionRegistry::new();
        assert!(registry.state("x").is_none());
        let _ = registry.session("x");
        assert_eq!(registry.state("x"), Some(SessionState::default()));
    }
}
