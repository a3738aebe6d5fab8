//! Proctor Adapters - External adapters for proctor.
//!
//! This crate provides adapters for:
//! - Filesystem frame source
//! - Sidecar annotation files standing in for the detection services
//! - Filesystem evidence store

pub mod annotations;
pub mod evidence;
pub mod fs;

pub use annotations::{Annotation, SidecarAnnotations};
pub use evidence::FsEvidenceStore;
pub use fs::FsFrameSource;
