//! Sidecar annotation adapter.
//!
//! The detection services run out of process and leave their results in a
//! JSON file next to each frame (`frame_0001.jpg` -> `frame_0001.json`):
//!
//! ```json
//! {
//!   "faces": [{ "bbox": { "x": 0.3, "y": 0.2, "width": 0.4, "height": 0.5 }, "confidence": 0.97 }],
//!   "landmarks": { "nose_tip": { "x": 0.5, "y": 0.45 }, "chin": { "x": 0.5, "y": 0.7 }, "...": {} },
//!   "objects": [{ "label": "cell phone", "confidence": 0.81, "bbox": { "x": 0.1, "y": 0.6, "width": 0.1, "height": 0.2 } }]
//! }
//! ```
//!
//! `landmarks` may be replaced by a dense `mesh` array of points. A missing
//! or malformed sidecar, or one without `faces`, is a capability error.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use proctor_core::domain::{FaceLandmarks, FaceRegion, Frame, ObjectDetection, Point};
use proctor_core::ports::{FaceDetector, LandmarkExtractor, ObjectDetector};
use serde::Deserialize;
use tracing::debug;

/// Detection results for one frame.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Annotation {
    /// Face presence results; absent when the face detector did not run.
    #[serde(default)]
    pub faces: Option<Vec<FaceRegion>>,
    /// Six pose landmarks.
    #[serde(default)]
    pub landmarks: Option<FaceLandmarks>,
    /// Dense face mesh, used when `landmarks` is absent.
    #[serde(default)]
    pub mesh: Option<Vec<Point>>,
    /// Object detections.
    #[serde(default)]
    pub objects: Vec<ObjectDetection>,
}

impl Annotation {
    /// Parses an annotation from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not match the annotation schema.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid annotation JSON")
    }

    /// Pose landmarks, taken from `landmarks` or picked out of `mesh`.
    #[must_use]
    pub fn pose_landmarks(&self) -> Option<FaceLandmarks> {
        self.landmarks
            .or_else(|| self.mesh.as_deref().and_then(FaceLandmarks::from_mesh))
    }
}

/// Reads detection results from JSON sidecar files.
///
/// Implements all three capability ports. The last parsed sidecar is cached
/// because the pipeline queries each capability for the same frame.
#[derive(Default)]
pub struct SidecarAnnotations {
    dir: Option<PathBuf>,
    cache: Mutex<Option<(PathBuf, Arc<Annotation>)>>,
}

impl SidecarAnnotations {
    /// Looks for sidecars next to each frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks for sidecars in `dir`, named after each frame's file stem.
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            cache: Mutex::new(None),
        }
    }

    /// Path of the sidecar for a frame source.
    #[must_use]
    pub fn sidecar_path(&self, source: &str) -> PathBuf {
        let frame_path = Path::new(source);
        match &self.dir {
            Some(dir) => {
                let stem = frame_path.file_stem().unwrap_or(frame_path.as_os_str());
                dir.join(stem).with_extension("json")
            }
            None => frame_path.with_extension("json"),
        }
    }

    /// Loads (or reuses) the annotation for a frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the sidecar is missing or malformed.
    pub fn annotation(&self, frame: &Frame) -> Result<Arc<Annotation>> {
        let path = self.sidecar_path(&frame.source);

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((cached_path, annotation)) = cache.as_ref() {
            if *cached_path == path {
                return Ok(Arc::clone(annotation));
            }
        }

        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read sidecar: {}", path.display()))?;
        let annotation = Arc::new(
            Annotation::from_json(&json)
                .with_context(|| format!("Failed to parse sidecar: {}", path.display()))?,
        );
        debug!("Loaded sidecar {}", path.display());

        *cache = Some((path, Arc::clone(&annotation)));
        Ok(annotation)
    }
}

impl FaceDetector for SidecarAnnotations {
    fn detect_faces(&self, frame: &Frame) -> Result<Vec<FaceRegion>> {
        let annotation = self.annotation(frame)?;
        annotation
            .faces
            .clone()
            .with_context(|| format!("No face results for {}", frame.source))
    }
}

impl LandmarkExtractor for SidecarAnnotations {
    fn extract(&self, frame: &Frame) -> Result<Option<FaceLandmarks>> {
        Ok(self.annotation(frame)?.pose_landmarks())
    }
}

impl ObjectDetector for SidecarAnnotations {
    fn detect_objects(&self, frame: &Frame) -> Result<Vec<ObjectDetection>> {
        Ok(self.annotation(frame)?.objects.clone())
    }
}
