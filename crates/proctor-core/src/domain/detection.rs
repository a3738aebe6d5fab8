//! Outputs of the injected detection capabilities.

use serde::{Deserialize, Serialize};

/// A point in normalized image coordinates (`0.0..=1.0` on both axes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position, 0.0 is the left edge.
    pub x: f32,
    /// Vertical position, 0.0 is the top edge.
    pub y: f32,
}

impl Point {
    /// Creates a new normalized point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Converts to pixel coordinates for a frame of the given size.
    #[must_use]
    pub fn to_pixels(self, width: u32, height: u32) -> (f64, f64) {
        (
            f64::from(self.x) * f64::from(width),
            f64::from(self.y) * f64::from(height),
        )
    }
}

/// Axis-aligned box in normalized coordinates, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Box width.
    pub width: f32,
    /// Box height.
    pub height: f32,
}

impl NormalizedBox {
    /// Creates a new normalized box.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the box centre.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Pixel rectangle `(x, y, width, height)` clamped to a frame of the given size.
    ///
    /// Returns `None` when the clamped box is empty.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn to_pixel_rect(&self, width: u32, height: u32) -> Option<(i32, i32, u32, u32)> {
        let w = width as f32;
        let h = height as f32;
        let x0 = (self.x.clamp(0.0, 1.0) * w).round() as i32;
        let y0 = (self.y.clamp(0.0, 1.0) * h).round() as i32;
        let x1 = ((self.x + self.width).clamp(0.0, 1.0) * w).round() as i32;
        let y1 = ((self.y + self.height).clamp(0.0, 1.0) * h).round() as i32;

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some((x0, y0, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

/// A face found by the face-presence capability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceRegion {
    /// Face bounding box.
    pub bbox: NormalizedBox,
    /// Detection confidence (0.0 to 1.0).
    pub confidence: f32,
}

impl FaceRegion {
    /// Creates a new face region.
    #[must_use]
    pub const fn new(bbox: NormalizedBox, confidence: f32) -> Self {
        Self { bbox, confidence }
    }
}

/// An object found by the object-detection capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDetection {
    /// Class label as reported by the model (e.g. `cell phone`).
    pub label: String,
    /// Detection confidence (0.0 to 1.0).
    pub confidence: f32,
    /// Object bounding box.
    pub bbox: NormalizedBox,
}

impl ObjectDetection {
    /// Creates a new object detection.
    #[must_use]
    pub fn new(label: impl Into<String>, confidence: f32, bbox: NormalizedBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_center() {
        let bbox = NormalizedBox::new(0.2, 0.4, 0.4, 0.2);
        let c = bbox.center();
        assert!((c.x - 0.4).abs() < 1e-6);
        assert!((c.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_pixel_rect_clamped() {
        let bbox = NormalizedBox::new(0.9, -0.1, 0.5, 0.5);
        let rect = bbox.to_pixel_rect(100, 100);
        assert_eq!(rect, Some((90, 0, 10, 40)));
    }

    #[test]
    fn test_pixel_rect_outside_frame() {
        let bbox = NormalizedBox::new(1.2, 0.0, 0.3, 0.3);
        assert!(bbox.to_pixel_rect(100, 100).is_none());
    }
}
