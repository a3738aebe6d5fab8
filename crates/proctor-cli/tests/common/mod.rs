//! Session fixtures: PNG frames with detection sidecars.

#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc)]

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use proctor_test_support::{centred_face, LandmarkBuilder};
use serde_json::{json, Value};

pub const WIDTH: u32 = 320;
pub const HEIGHT: u32 = 240;

/// Writes `frame_NNN.png` with a uniform grey level.
pub fn write_frame(dir: &Path, index: usize, level: u8) -> PathBuf {
    let path = dir.join(format!("frame_{index:03}.png"));
    RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([level, level, level]))
        .save(&path)
        .unwrap();
    path
}

/// Sidecar for one centred face turned by the given angles.
pub fn face_sidecar(pitch: f64, yaw: f64) -> Value {
    json!({
        "faces": [centred_face()],
        "landmarks": LandmarkBuilder::project(pitch, yaw, 0.0, WIDTH, HEIGHT),
        "objects": [],
    })
}

/// Writes the sidecar for a frame written by `write_frame`.
pub fn write_sidecar(frame: &Path, sidecar: &Value) {
    fs::write(frame.with_extension("json"), sidecar.to_string()).unwrap();
}

/// Creates `<root>/<name>` holding `count` frames whose head pose is
/// given by `pose(index)`.
pub fn session_dir(
    root: &Path,
    name: &str,
    count: usize,
    pose: impl Fn(usize) -> (f64, f64),
) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    for i in 0..count {
        let frame = write_frame(&dir, i, 128);
        let (pitch, yaw) = pose(i);
        write_sidecar(&frame, &face_sidecar(pitch, yaw));
    }
    dir
}

/// Parses the JSON object lines of command output, skipping log lines.
pub fn json_lines(output: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(output)
        .lines()
        .filter(|l| l.starts_with('{'))
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}
