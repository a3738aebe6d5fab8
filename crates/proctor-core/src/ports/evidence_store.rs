//! Evidence persistence port.

use time::OffsetDateTime;

use crate::domain::Evidence;

/// Port for persisting evidence snapshots.
pub trait EvidenceStore: Send + Sync {
    /// Stores the snapshot and returns a locator (path, key, URL).
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot could not be stored.
    fn store(
        &self,
        session_id: &str,
        evidence: &Evidence,
        captured_at: OffsetDateTime,
    ) -> anyhow::Result<String>;
}
