//! Decoded webcam frames.

use image::{DynamicImage, GenericImageView, GrayImage};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;

use crate::error::{ProctorError, Result};

/// A single decoded webcam frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Where the frame came from (file path, upload id, ...).
    pub source: String,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Capture time, drives all time-windowed session state.
    pub captured_at: OffsetDateTime,
    /// Decoded pixel data.
    pub image: DynamicImage,
}

impl Frame {
    /// Wraps an already decoded image.
    #[must_use]
    pub fn new(source: impl Into<String>, image: DynamicImage, captured_at: OffsetDateTime) -> Self {
        let (width, height) = image.dimensions();
        Self {
            source: source.into(),
            width,
            height,
            captured_at,
            image,
        }
    }

    /// Decodes an encoded image (JPEG, PNG, ...) into a frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProctorError::Decode`] if the bytes are not a supported image
    /// and [`ProctorError::InvalidFrame`] if the decoded image is empty.
    pub fn decode(
        bytes: &[u8],
        source: impl Into<String>,
        captured_at: OffsetDateTime,
    ) -> Result<Self> {
        if bytes.is_empty() {
            return Err(ProctorError::InvalidFrame("empty frame data".into()));
        }
        let image = image::load_from_memory(bytes)?;
        let frame = Self::new(source, image, captured_at);
        frame.validate()?;
        Ok(frame)
    }

    /// Checks that the frame has pixels to analyze.
    ///
    /// # Errors
    ///
    /// Returns [`ProctorError::InvalidFrame`] for zero-sized frames.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ProctorError::InvalidFrame(format!(
                "{} has zero size ({}x{})",
                self.source, self.width, self.height
            )));
        }
        Ok(())
    }

    /// Grayscale copy of the frame.
    #[must_use]
    pub fn to_luma8(&self) -> GrayImage {
        self.image.to_luma8()
    }

    /// Capture time as an RFC 3339 string.
    #[must_use]
    pub fn timestamp(&self) -> String {
        format_timestamp(self.captured_at)
    }
}

/// Formats a timestamp as RFC 3339, falling back to the epoch on failure.
#[must_use]
pub fn format_timestamp(at: OffsetDateTime) -> String {
    match at.format(&Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_takes_dimensions() {
        let frame = Frame::new(
            "test",
            DynamicImage::new_rgb8(64, 48),
            OffsetDateTime::UNIX_EPOCH,
        );
        assert_eq!(frame.width, 64);
        assert_eq!(frame.height, 48);
        assert!(frame.validate().is_ok());
    }

    #[test]
    fn test_zero_size_rejected() {
        let frame = Frame::new("empty", DynamicImage::new_rgb8(0, 0), OffsetDateTime::UNIX_EPOCH);
        assert!(matches!(frame.validate(), Err(ProctorError::InvalidFrame(_))));
    }

    #[test]
    fn test_decode_garbage_is_error() {
        let result = Frame::decode(b"not an image", "garbage", OffsetDateTime::UNIX_EPOCH);
        assert!(matches!(result, Err(ProctorError::Decode(_))));
    }

    #[test]
    fn test_decode_empty_is_invalid() {
        let result = Frame::decode(&[], "empty", OffsetDateTime::UNIX_EPOCH);
        assert!(matches!(result, Err(ProctorError::InvalidFrame(_))));
    }

    #[test]
    fn test_timestamp_rfc3339() {
        let frame = Frame::new("t", DynamicImage::new_rgb8(1, 1), OffsetDateTime::UNIX_EPOCH);
        assert_eq!(frame.timestamp(), "1970-01-01T00:00:00Z");
    }
}
