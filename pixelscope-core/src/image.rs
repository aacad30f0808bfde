//! Image model: numeric type class, shape and pixel buffer.

use std::fmt;

use ndarray::{s, Array3, ArrayView3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::ImageRect;

/// Numeric storage category of pixel values.
///
/// The class decides default display range and saturation, and keys the
/// per-type brightness profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DtypeClass {
    /// Floating-point samples, nominal display range `[0, 1]`.
    Float,
    /// 8-bit unsigned integers.
    Uint8,
    /// 16-bit unsigned integers.
    Uint16,
    /// Integers wider than 16 bits.
    #[cfg_attr(feature = "serde", serde(rename = "wide"))]
    WideInt,
}

impl DtypeClass {
    /// All classes, in key order.
    pub const ALL: [Self; 4] = [Self::Float, Self::Uint8, Self::Uint16, Self::WideInt];

    /// Stable key used for persistence and display.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::WideInt => "wide",
        }
    }

    /// Largest representable sample, for integer classes.
    #[must_use]
    pub const fn natural_max(self) -> Option<f64> {
        match self {
            Self::Float => None,
            Self::Uint8 => Some(255.0),
            Self::Uint16 => Some(65_535.0),
            Self::WideInt => Some(4_294_967_295.0),
        }
    }

    #[must_use]
    pub const fn is_integer(self) -> bool {
        !matches!(self, Self::Float)
    }
}

impl fmt::Display for DtypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for DtypeClass {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "float" | "f32" | "f64" => Ok(Self::Float),
            "uint8" | "u8" => Ok(Self::Uint8),
            "uint16" | "u16" => Ok(Self::Uint16),
            "wide" | "uint32" | "u32" | "int32" | "i32" => Ok(Self::WideInt),
            other => Err(format!("unknown dtype class '{other}'")),
        }
    }
}

/// Image dimensions. Grayscale images have a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImageShape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl ImageShape {
    #[must_use]
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// Number of samples (`height * width * channels`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.height * self.width * self.channels
    }

    /// Returns true if the shape holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_grayscale(&self) -> bool {
        self.channels == 1
    }
}

impl fmt::Display for ImageShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.height, self.width, self.channels)
    }
}

/// Pixel samples laid out as `[y, x, channel]`, tagged with their type class.
///
/// Samples are widened to `f64` so analysis and display share one code path
/// regardless of the source type.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    data: Array3<f64>,
    dtype: DtypeClass,
}

impl PixelBuffer {
    /// Wrap an array. Fails if any dimension is zero.
    pub fn new(data: Array3<f64>, dtype: DtypeClass) -> Result<Self> {
        let (height, width, channels) = data.dim();
        let shape = ImageShape::new(height, width, channels);
        if shape.is_empty() {
            return Err(Error::EmptyImage(shape));
        }
        Ok(Self { data, dtype })
    }

    /// Build from interleaved row-major samples.
    pub fn from_samples(shape: ImageShape, samples: Vec<f64>, dtype: DtypeClass) -> Result<Self> {
        if samples.len() != shape.len() {
            return Err(Error::BufferLength {
                shape,
                expected: shape.len(),
                actual: samples.len(),
            });
        }
        let data = Array3::from_shape_vec((shape.height, shape.width, shape.channels), samples)
            .map_err(|_| Error::BufferLength {
                shape,
                expected: shape.len(),
                actual: shape.len(),
            })?;
        Self::new(data, dtype)
    }

    /// A buffer with every sample set to `value`.
    pub fn filled(shape: ImageShape, value: f64, dtype: DtypeClass) -> Result<Self> {
        Self::new(
            Array3::from_elem((shape.height, shape.width, shape.channels), value),
            dtype,
        )
    }

    #[must_use]
    pub fn shape(&self) -> ImageShape {
        let (height, width, channels) = self.data.dim();
        ImageShape::new(height, width, channels)
    }

    #[must_use]
    pub fn dtype(&self) -> DtypeClass {
        self.dtype
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    #[must_use]
    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    /// The full extent as a rectangle.
    #[must_use]
    pub fn bounds(&self) -> ImageRect {
        ImageRect::full(self.width(), self.height())
    }

    #[must_use]
    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    /// Sample at `(x, y, channel)`, if in range.
    #[must_use]
    pub fn get(&self, x: usize, y: usize, channel: usize) -> Option<f64> {
        self.data.get((y, x, channel)).copied()
    }

    /// The samples inside `rect`, clipped to the buffer bounds.
    #[must_use]
    pub fn region(&self, rect: ImageRect) -> ArrayView3<'_, f64> {
        let rect = rect.clipped_to(self.width(), self.height());
        self.data
            .slice(s![rect.y0()..rect.y1(), rect.x0()..rect.x1(), ..])
    }

    /// A new buffer of the same shape with `f` applied to every sample.
    #[must_use]
    pub fn map_samples(&self, f: impl Fn(f64) -> f64, dtype: DtypeClass) -> Self {
        Self {
            data: self.data.mapv(f),
            dtype,
        }
    }
}

/// A loaded image: pixel data plus an optional source label.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub buffer: PixelBuffer,
    /// Path or synthetic name (e.g. `diff:1-2`).
    pub source: Option<String>,
}

impl Image {
    #[must_use]
    pub fn new(buffer: PixelBuffer) -> Self {
        Self {
            buffer,
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn shape(&self) -> ImageShape {
        self.buffer.shape()
    }

    #[must_use]
    pub fn dtype(&self) -> DtypeClass {
        self.buffer.dtype()
    }
}
