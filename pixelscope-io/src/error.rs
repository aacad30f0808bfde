//! Load and persistence errors.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Errors raised while loading images or display state.
///
/// Decoder errors are carried unchanged so callers can show them verbatim.
#[derive(Error, Debug)]
pub enum LoadError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raster decoder failure.
    #[error("image decode failure: {0}")]
    Image(#[from] image::ImageError),

    /// TIFF decoder failure.
    #[error("TIFF decode failure: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// No registered loader accepts the file.
    #[error("unsupported image file: {}", .0.display())]
    Unsupported(PathBuf),

    /// Decoded data that cannot be represented as an image.
    #[error("cannot decode {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    /// Core library error.
    #[error("core error: {0}")]
    Core(#[from] pixelscope_core::Error),

    /// Malformed state file.
    #[error("state file error: {0}")]
    State(#[from] serde_json::Error),
}
