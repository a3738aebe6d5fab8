//! Synthetic frame and landmark builders for testing.

use image::{DynamicImage, Rgb, RgbImage};
use nalgebra::{Rotation3, Vector3};
use proctor_core::domain::{FaceLandmarks, Frame, Point};
use proctor_core::modules::FACE_MODEL;
use time::{Duration, OffsetDateTime};

/// Fixed session start used by synthetic frames.
#[must_use]
pub fn session_start() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH + Duration::days(20_000)
}

/// `session_start() + secs`.
#[must_use]
pub fn at_secs(secs: f64) -> OffsetDateTime {
    session_start() + Duration::seconds_f64(secs)
}

/// Builder for synthetic webcam frames.
///
/// Frames are uniform gray; detections come from the mock capabilities, so
/// only size, brightness and timestamp matter.
#[derive(Debug, Clone)]
pub struct SyntheticFrameBuilder {
    width: u32,
    height: u32,
    brightness: u8,
    source: String,
    offset_secs: f64,
}

impl SyntheticFrameBuilder {
    /// Starts a well-lit 640x480 frame at the session start.
    #[must_use]
    pub fn new() -> Self {
        Self {
            width: 640,
            height: 480,
            brightness: 128,
            source: String::from("synthetic://frame"),
            offset_secs: 0.0,
        }
    }

    /// Sets the frame size.
    #[must_use]
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the uniform gray level.
    #[must_use]
    pub fn brightness(mut self, level: u8) -> Self {
        self.brightness = level;
        self
    }

    /// A frame too dark to judge presence.
    #[must_use]
    pub fn dark(self) -> Self {
        self.brightness(5)
    }

    /// An overexposed frame.
    #[must_use]
    pub fn bright(self) -> Self {
        self.brightness(250)
    }

    /// Sets the frame source name.
    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Sets the capture time relative to [`session_start`].
    #[must_use]
    pub fn at(mut self, offset_secs: f64) -> Self {
        self.offset_secs = offset_secs;
        self
    }

    /// Builds the frame.
    #[must_use]
    pub fn build(&self) -> Frame {
        let level = self.brightness;
        let img = RgbImage::from_pixel(self.width, self.height, Rgb([level, level, level]));
        Frame::new(
            self.source.clone(),
            DynamicImage::ImageRgb8(img),
            at_secs(self.offset_secs),
        )
    }

    /// Builds `count` frames spaced `interval_secs` apart, starting at the
    /// configured offset.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn sequence(&self, count: usize, interval_secs: f64) -> Vec<Frame> {
        (0..count)
            .map(|i| {
                self.clone()
                    .source(format!("{}#{i}", self.source))
                    .at(self.offset_secs + i as f64 * interval_secs)
                    .build()
            })
            .collect()
    }
}

impl Default for SyntheticFrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Projects the generic face model into normalized landmarks.
pub struct LandmarkBuilder;

impl LandmarkBuilder {
    /// Distance of the synthetic face from the camera, in model units.
    pub const DISTANCE: f64 = 1500.0;

    /// Landmarks of a face at the given pose (degrees), centred in a
    /// `width` x `height` frame.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn project(pitch: f64, yaw: f64, roll: f64, width: u32, height: u32) -> FaceLandmarks {
        let rotation =
            Rotation3::from_euler_angles(pitch.to_radians(), yaw.to_radians(), roll.to_radians());
        let translation = Vector3::new(0.0, 0.0, Self::DISTANCE);
        let (w, h) = (f64::from(width), f64::from(height));
        let focal = w;

        let mut points = [Point::new(0.0, 0.0); 6];
        for (slot, model) in points.iter_mut().zip(FACE_MODEL) {
            let p = rotation * Vector3::new(model[0], model[1], model[2]) + translation;
            let u = focal * p.x / p.z + w / 2.0;
            let v = focal * p.y / p.z + h / 2.0;
            *slot = Point::new((u / w) as f32, (v / h) as f32);
        }
        FaceLandmarks::from_points(points)
    }

    /// Landmarks of a face looking straight at the camera.
    #[must_use]
    pub fn frontal(width: u32, height: u32) -> FaceLandmarks {
        Self::project(0.0, 0.0, 0.0, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_timestamps() {
        let frames = SyntheticFrameBuilder::new().size(8, 8).sequence(3, 0.5);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].captured_at, at_secs(1.0));
        assert_eq!(frames[1].source, "synthetic://frame#1");
    }

    #[test]
    fn test_frontal_landmarks_symmetric() {
        let lm = LandmarkBuilder::frontal(640, 480);
        assert!((lm.nose_tip.x - 0.5).abs() < 1e-6);
        assert!((lm.nose_tip.y - 0.5).abs() < 1e-6);
        assert!((lm.left_eye_corner.x + lm.right_eye_corner.x - 1.0).abs() < 1e-6);
        assert!(lm.chin.y > lm.nose_tip.y);
    }

    #[test]
    fn test_turned_head_shifts_nose_relative_to_eyes() {
        let lm = LandmarkBuilder::project(0.0, 30.0, 0.0, 640, 480);
        let eye_mid = (lm.left_eye_corner.x + lm.right_eye_corner.x) / 2.0;
        assert!(lm.nose_tip.x < eye_mid);
    }
}
