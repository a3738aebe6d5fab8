//! Filesystem adapter for loading frames.

use anyhow::{anyhow, Context, Result};
use proctor_core::{Frame, FrameSource};
use std::path::{Path, PathBuf};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

/// Supported image extensions.
const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "webp", "bmp", "gif"];

/// Filesystem frame source adapter.
///
/// Frames are the supported images found in the configured paths, ordered
/// by path. Frame `i` is stamped `start + i * interval`.
pub struct FsFrameSource {
    paths: Vec<PathBuf>,
    start: OffsetDateTime,
    interval_secs: f64,
}

impl FsFrameSource {
    /// Creates a new filesystem frame source.
    ///
    /// # Arguments
    ///
    /// * `paths` - Files or directories to scan
    /// * `start` - Capture time of the first frame
    /// * `interval_secs` - Seconds between consecutive frames
    #[must_use]
    pub const fn new(paths: Vec<PathBuf>, start: OffsetDateTime, interval_secs: f64) -> Self {
        Self {
            paths,
            start,
            interval_secs,
        }
    }

    /// Collects all frame files from the configured paths, sorted.
    fn collect_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for path in &self.paths {
            if path.is_file() {
                if is_supported_image(path) {
                    files.push(path.clone());
                } else {
                    warn!("Unsupported file type: {}", path.display());
                }
            } else if path.is_dir() {
                collect_from_dir(path, &mut files);
            } else {
                warn!("Path does not exist: {}", path.display());
            }
        }

        files.sort();
        files
    }

    #[allow(clippy::cast_precision_loss)]
    fn timestamp(&self, index: usize) -> Result<OffsetDateTime> {
        Duration::checked_seconds_f64(index as f64 * self.interval_secs)
            .and_then(|offset| self.start.checked_add(offset))
            .ok_or_else(|| anyhow!("Timestamp of frame {index} is out of range"))
    }
}

fn collect_from_dir(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!("Failed to read directory {}: {e}", dir.display());
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() && is_supported_image(&path) {
            files.push(path);
        }
    }
}

impl FrameSource for FsFrameSource {
    fn frames(&self) -> Box<dyn Iterator<Item = Result<Frame>> + Send + '_> {
        let files = self.collect_files();
        debug!("Found {} frame files", files.len());

        Box::new(
            files
                .into_iter()
                .enumerate()
                .map(|(i, path)| {
                    let captured_at = self
                        .timestamp(i)
                        .with_context(|| format!("Failed to stamp frame: {}", path.display()))?;
                    load_frame(&path, captured_at)
                }),
        )
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.collect_files().len())
    }
}

/// Checks if a path has a supported image extension.
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| RASTER_EXTENSIONS.contains(&e.as_str()))
}

/// Loads and decodes a frame from the filesystem.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn load_frame(path: &Path, captured_at: OffsetDateTime) -> Result<Frame> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read frame: {}", path.display()))?;
    let frame = Frame::decode(&bytes, path.to_string_lossy(), captured_at)
        .with_context(|| format!("Failed to decode frame: {}", path.display()))?;
    Ok(frame)
}
