//! Error type for frame processing.

use thiserror::Error;

/// Errors that abort processing of a single frame.
#[derive(Debug, Error)]
pub enum ProctorError {
    /// The frame has no usable pixels.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// The frame bytes could not be decoded.
    #[error("failed to decode frame: {0}")]
    Decode(#[from] image::ImageError),

    /// The evidence snapshot could not be encoded.
    #[error("failed to encode evidence: {0}")]
    Encode(#[source] image::ImageError),
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, ProctorError>;
