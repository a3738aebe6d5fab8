//! Frame source port for feeding a session.

use crate::domain::Frame;

/// Port for reading a session's frames in arrival order.
pub trait FrameSource: Send + Sync {
    /// Returns an iterator over frames.
    ///
    /// # Errors
    ///
    /// Individual items may be errors if a frame fails to load.
    fn frames(&self) -> Box<dyn Iterator<Item = anyhow::Result<Frame>> + Send + '_>;

    /// Returns the total number of frames, if known.
    fn count_hint(&self) -> Option<usize>;
}
