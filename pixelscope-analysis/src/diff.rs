//! Pixel-wise difference of two images.

use log::debug;

use pixelscope_core::{DtypeClass, Error, Image, PixelBuffer, Result};

/// Offset added to a difference so negative results stay visible.
pub const DEFAULT_DIFF_OFFSET: f64 = 256.0;

/// `(a − b) + offset` per sample, without clamping.
///
/// The result is `Float` when either input is floating point and `WideInt`
/// otherwise, since the values may leave the input type's range.
///
/// # Errors
///
/// [`Error::ShapeMismatch`] unless both buffers have identical height,
/// width and channel count.
pub fn compute_diff(a: &PixelBuffer, b: &PixelBuffer, offset: f64) -> Result<PixelBuffer> {
    if a.shape() != b.shape() {
        return Err(Error::ShapeMismatch {
            left: a.shape(),
            right: b.shape(),
        });
    }
    let dtype = if a.dtype() == DtypeClass::Float || b.dtype() == DtypeClass::Float {
        DtypeClass::Float
    } else {
        DtypeClass::WideInt
    };
    let data = (a.data() - b.data()).mapv_into(|v| v + offset);
    debug!("diff {} with offset {offset} -> {dtype}", a.shape());
    PixelBuffer::new(data, dtype)
}

/// Diff two loaded images, labelling the result after its inputs.
///
/// # Errors
///
/// See [`compute_diff`].
pub fn diff_images(a: &Image, b: &Image, offset: f64) -> Result<Image> {
    let buffer = compute_diff(&a.buffer, &b.buffer, offset)?;
    let label = format!(
        "diff:{}-{}",
        a.source.as_deref().unwrap_or("a"),
        b.source.as_deref().unwrap_or("b")
    );
    Ok(Image::new(buffer).with_source(label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixelscope_core::ImageShape;

    #[test]
    fn test_negative_values_kept() {
        let shape = ImageShape::new(1, 2, 1);
        let a = PixelBuffer::from_samples(shape, vec![10.0, 0.0], DtypeClass::Uint8).unwrap();
        let b = PixelBuffer::from_samples(shape, vec![0.0, 255.0], DtypeClass::Uint8).unwrap();
        let diff = compute_diff(&a, &b, 0.0).unwrap();
        assert_eq!(diff.get(0, 0, 0), Some(10.0));
        assert_eq!(diff.get(1, 0, 0), Some(-255.0));
        assert_eq!(diff.dtype(), DtypeClass::WideInt);
    }

    #[test]
    fn test_float_input_gives_float() {
        let shape = ImageShape::new(2, 2, 1);
        let a = PixelBuffer::filled(shape, 0.5, DtypeClass::Float).unwrap();
        let b = PixelBuffer::filled(shape, 3.0, DtypeClass::Uint16).unwrap();
        let diff = compute_diff(&a, &b, 0.0).unwrap();
        assert_eq!(diff.dtype(), DtypeClass::Float);
        assert_eq!(diff.get(1, 1, 0), Some(-2.5));
    }

    #[test]
    fn test_label() {
        let shape = ImageShape::new(1, 1, 1);
        let a = Image::new(PixelBuffer::filled(shape, 1.0, DtypeClass::Uint8).unwrap()).with_source("x.png");
        let b = Image::new(PixelBuffer::filled(shape, 1.0, DtypeClass::Uint8).unwrap());
        let diff = diff_images(&a, &b, DEFAULT_DIFF_OFFSET).unwrap();
        assert_eq!(diff.source.as_deref(), Some("diff:x.png-b"));
        assert_eq!(diff.buffer.get(0, 0, 0), Some(256.0));
    }
}
