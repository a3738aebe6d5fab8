//! Head pose estimation.
//!
//! Fits a fixed 3D face model to six image landmarks with a pinhole camera
//! (focal length = frame width, principal point = frame centre, no
//! distortion). The rotation vector and translation are refined with
//! Levenberg-Marquardt from a handful of seed orientations, and the best fit
//! is decomposed into pitch/yaw/roll.

use nalgebra::{Matrix6, Rotation3, SMatrix, SVector, Vector3, Vector6};
use tracing::debug;

use crate::domain::{FaceLandmarks, PoseSample};

/// Generic face model in camera axes (x right, y down, z forward), same
/// order as [`FaceLandmarks::points`].
pub const FACE_MODEL: [[f64; 3]; 6] = [
    [0.0, 0.0, 0.0],
    [0.0, 330.0, 65.0],
    [-225.0, -170.0, 135.0],
    [225.0, -170.0, 135.0],
    [-150.0, 150.0, 125.0],
    [150.0, 150.0, 125.0],
];

/// Distance between the model's outer eye corners.
const MODEL_EYE_SPAN: f64 = 450.0;

/// Smallest normalized eigenvalue of the normal equations for a unique fit.
const MIN_CONDITION: f64 = 1e-9;

type Residuals = SVector<f64, 12>;
type Jacobian = SMatrix<f64, 12, 6>;

/// Configuration for head pose estimation.
#[derive(Debug, Clone)]
pub struct HeadPoseConfig {
    /// Largest accepted RMS reprojection error, as a fraction of frame width.
    pub max_rms_error: f64,
    /// Iteration cap per seed orientation.
    pub max_iterations: usize,
}

impl Default for HeadPoseConfig {
    fn default() -> Self {
        Self {
            max_rms_error: 0.03,
            max_iterations: 100,
        }
    }
}

/// Pinhole camera derived from the frame size.
#[derive(Debug, Clone, Copy)]
struct Camera {
    focal: f64,
    cx: f64,
    cy: f64,
}

impl Camera {
    fn for_frame(width: u32, height: u32) -> Self {
        let w = f64::from(width);
        Self {
            focal: w,
            cx: w / 2.0,
            cy: f64::from(height) / 2.0,
        }
    }

    fn project(&self, p: &Vector3<f64>) -> (f64, f64) {
        (
            self.focal * p.x / p.z + self.cx,
            self.focal * p.y / p.z + self.cy,
        )
    }
}

/// A converged fit.
#[derive(Debug, Clone, Copy)]
struct Fit {
    params: Vector6<f64>,
    cost: f64,
}

/// Estimates head orientation from facial landmarks.
pub struct HeadPoseEstimator {
    config: HeadPoseConfig,
}

impl HeadPoseEstimator {
    /// Creates a new estimator with the given configuration.
    #[must_use]
    pub const fn new(config: HeadPoseConfig) -> Self {
        Self { config }
    }

    /// Estimates the pose of the face described by `landmarks` in a
    /// `width` x `height` frame.
    ///
    /// Returns `None` when the landmarks are degenerate, the solve has no
    /// unique or finite solution, the face lands behind the camera, or the
    /// reprojection error stays above the configured tolerance.
    #[must_use]
    pub fn estimate(&self, landmarks: &FaceLandmarks, width: u32, height: u32) -> Option<PoseSample> {
        if width == 0 || height == 0 {
            return None;
        }
        let camera = Camera::for_frame(width, height);

        let mut observed = [(0.0, 0.0); 6];
        for (slot, point) in observed.iter_mut().zip(landmarks.points()) {
            *slot = point.to_pixels(width, height);
        }
        if observed.iter().any(|(u, v)| !u.is_finite() || !v.is_finite()) {
            debug!("Non-finite landmarks");
            return None;
        }

        let (left_eye, right_eye) = (observed[2], observed[3]);
        let eye_span = (right_eye.0 - left_eye.0).hypot(right_eye.1 - left_eye.1);
        if eye_span < 1e-3 * camera.focal {
            debug!(eye_span, "Degenerate landmarks");
            return None;
        }

        let tz = camera.focal * MODEL_EYE_SPAN / eye_span;
        let nose = observed[0];
        let translation = Vector3::new(
            (nose.0 - camera.cx) * tz / camera.focal,
            (nose.1 - camera.cy) * tz / camera.focal,
            tz,
        );

        let best = seed_rotations()
            .into_iter()
            .filter_map(|rotation| {
                let seed = Vector6::new(
                    rotation.x,
                    rotation.y,
                    rotation.z,
                    translation.x,
                    translation.y,
                    translation.z,
                );
                self.refine(seed, &observed, &camera)
            })
            .min_by(|a, b| a.cost.total_cmp(&b.cost))?;

        self.accept(&best, &observed, &camera)
    }

    /// Levenberg-Marquardt refinement from one seed.
    fn refine(&self, seed: Vector6<f64>, observed: &[(f64, f64); 6], camera: &Camera) -> Option<Fit> {
        let mut params = seed;
        let mut r = residuals(&params, observed, camera);
        let mut cost = r.norm_squared();
        if !cost.is_finite() {
            return None;
        }
        let mut lambda = 1e-3;

        for _ in 0..self.config.max_iterations {
            let j = jacobian(&params, observed, camera);
            let jtj = j.transpose() * j;
            let jtr = j.transpose() * r;

            let mut damped = jtj;
            for k in 0..6 {
                damped[(k, k)] += lambda * jtj[(k, k)].max(1e-12);
            }
            let Some(cholesky) = damped.cholesky() else {
                lambda *= 10.0;
                if lambda > 1e12 {
                    break;
                }
                continue;
            };

            let step = cholesky.solve(&(-jtr));
            let candidate = params + step;
            let candidate_r = residuals(&candidate, observed, camera);
            let candidate_cost = candidate_r.norm_squared();

            if candidate_cost.is_finite() && candidate_cost < cost {
                let improvement = cost - candidate_cost;
                params = candidate;
                r = candidate_r;
                cost = candidate_cost;
                lambda = (lambda * 0.1).max(1e-12);
                if improvement <= 1e-12 * cost.max(1.0) || step.norm() < 1e-10 {
                    break;
                }
            } else {
                lambda *= 10.0;
                if lambda > 1e12 {
                    break;
                }
            }
        }

        Some(Fit { params, cost })
    }

    /// Validates a fit and converts it to Euler angles.
    fn accept(&self, fit: &Fit, observed: &[(f64, f64); 6], camera: &Camera) -> Option<PoseSample> {
        if fit.params.iter().any(|p| !p.is_finite()) {
            debug!("Non-finite pose solution");
            return None;
        }
        if fit.params[5] <= 0.0 {
            debug!(tz = fit.params[5], "Face behind camera");
            return None;
        }

        let j = jacobian(&fit.params, observed, camera);
        if !is_well_conditioned(&(j.transpose() * j)) {
            debug!("Pose solve has no unique solution");
            return None;
        }

        let rms = (fit.cost / 6.0).sqrt();
        let tolerance = self.config.max_rms_error * camera.focal;
        if rms > tolerance {
            debug!(rms, tolerance, "Pose solve did not converge");
            return None;
        }

        let rotation = Rotation3::from_scaled_axis(Vector3::new(
            fit.params[0],
            fit.params[1],
            fit.params[2],
        ));
        // R = Rz(roll) * Ry(yaw) * Rx(pitch)
        let (pitch, yaw, roll) = rotation.euler_angles();
        Some(PoseSample::new(
            pitch.to_degrees(),
            yaw.to_degrees(),
            roll.to_degrees(),
        ))
    }
}

impl Default for HeadPoseEstimator {
    fn default() -> Self {
        Self::new(HeadPoseConfig::default())
    }
}

/// Seed orientations as rotation vectors: frontal plus turned and tilted heads.
fn seed_rotations() -> [Vector3<f64>; 5] {
    [
        Vector3::zeros(),
        Vector3::new(0.0, 0.6, 0.0),
        Vector3::new(0.0, -0.6, 0.0),
        Vector3::new(0.4, 0.0, 0.0),
        Vector3::new(-0.4, 0.0, 0.0),
    ]
}

fn residuals(params: &Vector6<f64>, observed: &[(f64, f64); 6], camera: &Camera) -> Residuals {
    let rotation = Rotation3::from_scaled_axis(Vector3::new(params[0], params[1], params[2]));
    let translation = Vector3::new(params[3], params[4], params[5]);

    let mut r = Residuals::zeros();
    for (i, (model, obs)) in FACE_MODEL.iter().zip(observed).enumerate() {
        let p = rotation * Vector3::new(model[0], model[1], model[2]) + translation;
        let (u, v) = camera.project(&p);
        r[2 * i] = u - obs.0;
        r[2 * i + 1] = v - obs.1;
    }
    r
}

/// Central-difference Jacobian of the residuals.
fn jacobian(params: &Vector6<f64>, observed: &[(f64, f64); 6], camera: &Camera) -> Jacobian {
    let mut j = Jacobian::zeros();
    for k in 0..6 {
        let h = 1e-6 * params[k].abs().max(1.0);
        let mut forward = *params;
        let mut backward = *params;
        forward[k] += h;
        backward[k] -= h;
        let diff = (residuals(&forward, observed, camera) - residuals(&backward, observed, camera))
            / (2.0 * h);
        j.set_column(k, &diff);
    }
    j
}

/// Checks the diagonally normalized normal equations for a unique solution.
fn is_well_conditioned(jtj: &Matrix6<f64>) -> bool {
    let diagonal = jtj.diagonal();
    if diagonal.iter().any(|&d| !d.is_finite() || d <= 1e-12) {
        return false;
    }
    let scale = diagonal.map(|d| 1.0 / d.sqrt());
    let normalized = Matrix6::from_fn(|i, k| jtj[(i, k)] * scale[i] * scale[k]);
    normalized.symmetric_eigen().eigenvalues.min() >= MIN_CONDITION
}

#[cfg(test)]
#[allow(clippy::cast_possible_truncation, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::Point;

    const WIDTH: u32 = 640;
    const HEIGHT: u32 = 480;

    fn project_model(pitch: f64, yaw: f64, roll: f64) -> FaceLandmarks {
        let camera = Camera::for_frame(WIDTH, HEIGHT);
        let rotation =
            Rotation3::from_euler_angles(pitch.to_radians(), yaw.to_radians(), roll.to_radians());
        let translation = Vector3::new(0.0, 0.0, 1500.0);
        let mut points = [Point::new(0.0, 0.0); 6];
        for (slot, model) in points.iter_mut().zip(FACE_MODEL) {
            let p = rotation * Vector3::new(model[0], model[1], model[2]) + translation;
            let (u, v) = camera.project(&p);
            *slot = Point::new(
                (u / f64::from(WIDTH)) as f32,
                (v / f64::from(HEIGHT)) as f32,
            );
        }
        FaceLandmarks::from_points(points)
    }

    fn assert_recovers(pitch: f64, yaw: f64, roll: f64) {
        let estimator = HeadPoseEstimator::default();
        let pose = estimator
            .estimate(&project_model(pitch, yaw, roll), WIDTH, HEIGHT)
            .unwrap();
        assert!((pose.pitch - pitch).abs() < 1.0, "pitch {} vs {pitch}", pose.pitch);
        assert!((pose.yaw - yaw).abs() < 1.0, "yaw {} vs {yaw}", pose.yaw);
        assert!((pose.roll - roll).abs() < 1.0, "roll {} vs {roll}", pose.roll);
    }

    #[test]
    fn test_frontal_face_is_zero_pose() {
        assert_recovers(0.0, 0.0, 0.0);
    }

    #[test]
    fn test_recovers_turned_head() {
        assert_recovers(0.0, 30.0, 0.0);
        assert_recovers(0.0, -35.0, 0.0);
    }

    #[test]
    fn test_recovers_tilted_head() {
        assert_recovers(15.0, 0.0, 0.0);
        assert_recovers(-12.0, 10.0, 5.0);
    }

    #[test]
    fn test_collapsed_landmarks_have_no_pose() {
        let landmarks = FaceLandmarks::from_points([Point::new(0.5, 0.5); 6]);
        assert!(HeadPoseEstimator::default()
            .estimate(&landmarks, WIDTH, HEIGHT)
            .is_none());
    }

    #[test]
    fn test_zero_sized_frame_has_no_pose() {
        let landmarks = project_model(0.0, 0.0, 0.0);
        assert!(HeadPoseEstimator::default().estimate(&landmarks, 0, 0).is_none());
    }

    #[test]
    fn test_well_conditioned_rejects_zero_column() {
        let mut jtj = Matrix6::identity();
        jtj[(3, 3)] = 0.0;
        assert!(!is_well_conditioned(&jtj));
        assert!(is_well_conditioned(&Matrix6::identity()));
    }
}
