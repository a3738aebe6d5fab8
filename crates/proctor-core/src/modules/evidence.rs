//! Evidence snapshots: the frame with detection boxes drawn on, JPEG encoded.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::domain::{Evidence, FaceRegion, Frame, NormalizedBox, ObjectDetection};
use crate::error::{ProctorError, Result};

const FACE_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
const PHONE_COLOR: Rgb<u8> = Rgb([220, 0, 0]);
const OBJECT_COLOR: Rgb<u8> = Rgb([0, 80, 220]);

/// Configuration for evidence rendering.
#[derive(Debug, Clone)]
pub struct EvidenceConfig {
    /// JPEG quality (1 to 100).
    pub jpeg_quality: u8,
    /// Box outline thickness in pixels.
    pub line_width: u32,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 85,
            line_width: 2,
        }
    }
}

/// Renders annotated evidence images.
pub struct EvidenceRenderer {
    config: EvidenceConfig,
}

impl EvidenceRenderer {
    /// Creates a new renderer with the given configuration.
    #[must_use]
    pub const fn new(config: EvidenceConfig) -> Self {
        Self { config }
    }

    /// Draws faces and objects on a copy of the frame and encodes it.
    ///
    /// # Errors
    ///
    /// Returns [`ProctorError::Encode`] if JPEG encoding fails.
    pub fn render(
        &self,
        frame: &Frame,
        faces: &[FaceRegion],
        objects: &[&ObjectDetection],
    ) -> Result<Evidence> {
        let mut canvas = frame.image.to_rgb8();

        for face in faces {
            self.outline(&mut canvas, &face.bbox, FACE_COLOR);
        }
        for object in objects {
            let color = if object.label.to_ascii_lowercase().contains("phone") {
                PHONE_COLOR
            } else {
                OBJECT_COLOR
            };
            self.outline(&mut canvas, &object.bbox, color);
        }

        let mut bytes = Vec::new();
        let quality = self.config.jpeg_quality.clamp(1, 100);
        JpegEncoder::new_with_quality(Cursor::new(&mut bytes), quality)
            .encode_image(&canvas)
            .map_err(ProctorError::Encode)?;

        Ok(Evidence::jpeg(bytes, canvas.width(), canvas.height()))
    }

    #[allow(clippy::cast_possible_wrap)]
    fn outline(&self, canvas: &mut RgbImage, bbox: &NormalizedBox, color: Rgb<u8>) {
        let Some((x, y, w, h)) = bbox.to_pixel_rect(canvas.width(), canvas.height()) else {
            return;
        };
        for inset in 0..self.config.line_width {
            if w <= 2 * inset || h <= 2 * inset {
                break;
            }
            let rect = Rect::at(x + inset as i32, y + inset as i32)
                .of_size(w - 2 * inset, h - 2 * inset);
            draw_hollow_rect_mut(canvas, rect, color);
        }
    }
}

impl Default for EvidenceRenderer {
    fn default() -> Self {
        Self::new(EvidenceConfig::default())
    }
}
