//! Error types for pixelscope-core.

use thiserror::Error;

use crate::image::ImageShape;

/// Result type alias for pixelscope operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for pixelscope operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A display parameter was zero, negative or not finite.
    #[error("invalid {field}: {value} (must be a finite value greater than zero)")]
    InvalidParameter { field: &'static str, value: f64 },

    /// Two buffers that must match in shape do not.
    #[error("shape mismatch: {left} vs {right}")]
    ShapeMismatch { left: ImageShape, right: ImageShape },

    /// An index outside the range a store has been sized for.
    ///
    /// Reaching this means a caller skipped the image-switch reconciliation.
    #[error("index {index} out of bounds (len {len})")]
    OutOfBounds { index: usize, len: usize },

    /// Sample data whose length does not match the declared shape.
    #[error("buffer length {actual} does not match shape {shape} ({expected} samples)")]
    BufferLength {
        shape: ImageShape,
        expected: usize,
        actual: usize,
    },

    /// A buffer with zero rows, columns or channels.
    #[error("image has no pixels: {0}")]
    EmptyImage(ImageShape),
}
