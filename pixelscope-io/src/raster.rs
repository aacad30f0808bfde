//! PNG, JPEG, BMP and other raster formats via the `image` crate.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageReader};
use pixelscope_core::{DtypeClass, Image, ImageShape, PixelBuffer};

use crate::loader::{extension, ImageLoader, SUPPORTED_EXTENSIONS};
use crate::mapped::MappedFile;
use crate::Result;

/// Generic raster loader. Keeps 8-bit, 16-bit and float samples as stored.
#[derive(Debug, Default, Clone, Copy)]
pub struct RasterLoader;

fn samples<T: Copy + Into<f64>>(raw: &[T]) -> Vec<f64> {
    raw.iter().map(|&v| v.into()).collect()
}

/// Interleaved samples, channel count and class for a decoded image.
fn widen(image: &DynamicImage) -> (Vec<f64>, usize, DtypeClass) {
    match image {
        DynamicImage::ImageLuma8(buf) => (samples(buf.as_raw()), 1, DtypeClass::Uint8),
        DynamicImage::ImageLumaA8(buf) => (samples(buf.as_raw()), 2, DtypeClass::Uint8),
        DynamicImage::ImageRgb8(buf) => (samples(buf.as_raw()), 3, DtypeClass::Uint8),
        DynamicImage::ImageRgba8(buf) => (samples(buf.as_raw()), 4, DtypeClass::Uint8),
        DynamicImage::ImageLuma16(buf) => (samples(buf.as_raw()), 1, DtypeClass::Uint16),
        DynamicImage::ImageLumaA16(buf) => (samples(buf.as_raw()), 2, DtypeClass::Uint16),
        DynamicImage::ImageRgb16(buf) => (samples(buf.as_raw()), 3, DtypeClass::Uint16),
        DynamicImage::ImageRgba16(buf) => (samples(buf.as_raw()), 4, DtypeClass::Uint16),
        DynamicImage::ImageRgb32F(buf) => (samples(buf.as_raw()), 3, DtypeClass::Float),
        DynamicImage::ImageRgba32F(buf) => (samples(buf.as_raw()), 4, DtypeClass::Float),
        other => (samples(other.to_rgb8().as_raw()), 3, DtypeClass::Uint8),
    }
}

impl ImageLoader for RasterLoader {
    fn name(&self) -> &str {
        "raster"
    }

    fn can_load(&self, path: &Path) -> bool {
        extension(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
    }

    fn try_load(&self, path: &Path) -> Result<Option<Image>> {
        let file = MappedFile::open(path)?;
        let decoded = ImageReader::new(Cursor::new(file.as_bytes()))
            .with_guessed_format()?
            .decode()?;

        let (samples, channels, dtype) = widen(&decoded);
        let shape = ImageShape::new(
            decoded.height() as usize,
            decoded.width() as usize,
            channels,
        );
        let buffer = PixelBuffer::from_samples(shape, samples, dtype)?;
        Ok(Some(Image::new(buffer)))
    }
}
