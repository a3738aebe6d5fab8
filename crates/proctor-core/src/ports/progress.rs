//! Progress reporting port for UI integration.

use crate::domain::FrameReport;

/// Events emitted while a session is processed.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Processing started for a frame.
    Started {
        /// Session the frame belongs to.
        session_id: String,
        /// Frame source.
        source: String,
        /// Index in the session (0-based).
        index: usize,
        /// Total frames in the session, if known.
        total: Option<usize>,
    },
    /// A frame was processed.
    Completed {
        /// The frame report.
        report: Box<FrameReport>,
    },
    /// A frame was skipped due to an error.
    Skipped {
        /// Session the frame belongs to.
        session_id: String,
        /// Frame source.
        source: String,
        /// Reason for skipping.
        reason: String,
    },
    /// All frames of a session have been processed.
    Finished {
        /// Session that finished.
        session_id: String,
        /// Frames processed successfully.
        processed: usize,
        /// Frames skipped.
        skipped: usize,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}
