//! TIFF decoding that keeps the stored sample type.

use std::io::Cursor;
use std::path::Path;

use log::debug;
use pixelscope_core::{DtypeClass, Image, ImageShape, PixelBuffer};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::ColorType;

use crate::loader::{extension, ImageLoader};
use crate::mapped::MappedFile;
use crate::{LoadError, Result};

/// Single-page TIFF loader for 8/16/32/64-bit integer and float samples.
#[derive(Debug, Default, Clone, Copy)]
pub struct TiffLoader;

fn channel_count(color_type: ColorType) -> Option<usize> {
    match color_type {
        ColorType::Gray(_) => Some(1),
        ColorType::GrayA(_) => Some(2),
        ColorType::RGB(_) => Some(3),
        ColorType::RGBA(_) => Some(4),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn widen(result: DecodingResult) -> Option<(Vec<f64>, DtypeClass)> {
    let widened = match result {
        DecodingResult::U8(buf) => (buf.into_iter().map(f64::from).collect(), DtypeClass::Uint8),
        DecodingResult::U16(buf) => (buf.into_iter().map(f64::from).collect(), DtypeClass::Uint16),
        DecodingResult::U32(buf) => (buf.into_iter().map(f64::from).collect(), DtypeClass::WideInt),
        DecodingResult::U64(buf) => (buf.into_iter().map(|v| v as f64).collect(), DtypeClass::WideInt),
        DecodingResult::I8(buf) => (buf.into_iter().map(f64::from).collect(), DtypeClass::WideInt),
        DecodingResult::I16(buf) => (buf.into_iter().map(f64::from).collect(), DtypeClass::WideInt),
        DecodingResult::I32(buf) => (buf.into_iter().map(f64::from).collect(), DtypeClass::WideInt),
        DecodingResult::I64(buf) => (buf.into_iter().map(|v| v as f64).collect(), DtypeClass::WideInt),
        DecodingResult::F32(buf) => (buf.into_iter().map(f64::from).collect(), DtypeClass::Float),
        DecodingResult::F64(buf) => (buf, DtypeClass::Float),
        // Half floats and any future sample formats.
        #[allow(unreachable_patterns)]
        _ => return None,
    };
    Some(widened)
}

impl ImageLoader for TiffLoader {
    fn name(&self) -> &str {
        "tiff"
    }

    fn can_load(&self, path: &Path) -> bool {
        matches!(extension(path).as_deref(), Some("tif" | "tiff"))
    }

    fn try_load(&self, path: &Path) -> Result<Option<Image>> {
        let file = MappedFile::open(path)?;
        let decode_error = |reason: String| LoadError::Decode {
            path: path.to_path_buf(),
            reason,
        };

        // Large scientific scans exceed the default decoding limits.
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 1024 * 1024 * 1024;
        limits.intermediate_buffer_size = 1024 * 1024 * 1024;
        let mut decoder = Decoder::new(Cursor::new(file.as_bytes()))?.with_limits(limits);

        let (width, height) = decoder.dimensions()?;
        let color_type = decoder.colortype()?;
        let channels = channel_count(color_type)
            .ok_or_else(|| decode_error(format!("unsupported color type {color_type:?}")))?;
        let (samples, dtype) = widen(decoder.read_image()?)
            .ok_or_else(|| decode_error("unsupported sample format".into()))?;
        if decoder.more_images() {
            debug!("{}: only the first page is loaded", path.display());
        }

        let shape = ImageShape::new(height as usize, width as usize, channels);
        let buffer = PixelBuffer::from_samples(shape, samples, dtype)?;
        Ok(Some(Image::new(buffer)))
    }
}
