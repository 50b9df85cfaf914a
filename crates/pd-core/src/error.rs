//! Error types for the core crate.

use thiserror::Error;

/// Errors raised while computing or rasterizing a cover-fit crop.
#[derive(Error, Debug)]
pub enum FitError {
    /// The source image has a zero dimension.
    #[error("source image has no area: {width}x{height}")]
    EmptySource { width: u32, height: u32 },

    /// The target slot has a zero, negative or non-finite dimension.
    #[error("target slot has no area: {width}x{height}")]
    EmptyTarget { width: f64, height: f64 },

    /// The position settings cannot be applied.
    #[error("invalid image position: x={x}, y={y}, scale={scale}")]
    InvalidPosition { x: f64, y: f64, scale: f64 },

    /// The image could not be decoded or encoded.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
