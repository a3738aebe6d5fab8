//! Filesystem evidence store.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use proctor_core::domain::Evidence;
use proctor_core::ports::EvidenceStore;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tracing::debug;

/// Writes evidence snapshots to `<root>/<session>/<timestamp>.jpg`.
pub struct FsEvidenceStore {
    root: PathBuf,
}

impl FsEvidenceStore {
    /// Creates a store rooted at `root`. Directories are created on demand.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn target(&self, session_id: &str, captured_at: OffsetDateTime) -> Result<PathBuf> {
        let dir = self.root.join(sanitize(session_id));
        let stamp = captured_at
            .to_offset(UtcOffset::UTC)
            .format(format_description!(
                "[year][month][day]T[hour][minute][second].[subsecond digits:3]Z"
            ))
            .context("Failed to format evidence timestamp")?;

        let mut path = dir.join(format!("{stamp}.jpg"));
        let mut n = 1;
        while path.exists() {
            path = dir.join(format!("{stamp}-{n}.jpg"));
            n += 1;
        }
        Ok(path)
    }
}

impl EvidenceStore for FsEvidenceStore {
    fn store(
        &self,
        session_id: &str,
        evidence: &Evidence,
        captured_at: OffsetDateTime,
    ) -> Result<String> {
        let path = self.target(session_id, captured_at)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        std::fs::write(&path, &evidence.bytes)
            .with_context(|| format!("Failed to write evidence: {}", path.display()))?;
        debug!("Stored evidence {}", path.display());
        Ok(path.to_string_lossy().into_owned())
    }
}

/// Keeps session ids from escaping the evidence root.
fn sanitize(session_id: &str) -> String {
    let cleaned: String = session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        String::from("_")
    } else {
        cleaned
    }
}
