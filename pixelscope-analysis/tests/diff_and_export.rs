#![allow(clippy::float_cmp)]
//! Diff arithmetic and table export over realistic buffers.

use pixelscope_analysis::{
    compute_diff, compute_histogram, compute_profile, DelimitedTable, HistogramConfig,
    ProfileConfig, StatsTable, DEFAULT_DIFF_OFFSET,
};
use pixelscope_core::{DtypeClass, Error, ImageRect, ImageShape, PixelBuffer};

#[test]
fn diff_matches_hand_computed_values() {
    let shape = ImageShape::new(4, 4, 3);
    let a = PixelBuffer::filled(shape, 300.0, DtypeClass::Uint16).unwrap();
    let b = PixelBuffer::filled(shape, 50.0, DtypeClass::Uint16).unwrap();

    let diff = compute_diff(&a, &b, DEFAULT_DIFF_OFFSET).unwrap();
    assert_eq!(diff.shape(), shape);
    assert!(diff.data().iter().all(|&v| v == 506.0));
}

#[test]
fn diff_is_elementwise() {
    let shape = ImageShape::new(4, 4, 3);
    let a_samples: Vec<f64> = (0u8..48).map(f64::from).collect();
    let b_samples: Vec<f64> = (0u8..48).map(|i| f64::from(i % 5) * 20.0).collect();
    let a = PixelBuffer::from_samples(shape, a_samples.clone(), DtypeClass::Uint8).unwrap();
    let b = PixelBuffer::from_samples(shape, b_samples.clone(), DtypeClass::Uint8).unwrap();

    let diff = compute_diff(&a, &b, 256.0).unwrap();
    let expected: Vec<f64> = a_samples
        .iter()
        .zip(&b_samples)
        .map(|(x, y)| x - y + 256.0)
        .collect();
    assert_eq!(diff.data().iter().copied().collect::<Vec<_>>(), expected);
}

#[test]
fn diff_rejects_mismatched_shapes() {
    let a = PixelBuffer::filled(ImageShape::new(4, 4, 3), 1.0, DtypeClass::Uint8).unwrap();
    let b = PixelBuffer::filled(ImageShape::new(4, 4, 1), 1.0, DtypeClass::Uint8).unwrap();
    let err = compute_diff(&a, &b, DEFAULT_DIFF_OFFSET).unwrap_err();
    assert_eq!(
        err,
        Error::ShapeMismatch {
            left: ImageShape::new(4, 4, 3),
            right: ImageShape::new(4, 4, 1),
        }
    );
}

#[test]
fn exported_columns_follow_channel_order() {
    let shape = ImageShape::new(3, 3, 3);
    let samples = (0u8..27).map(|i| f64::from(i % 3 * 100)).collect();
    let buffer = PixelBuffer::from_samples(shape, samples, DtypeClass::Uint8).unwrap();
    let roi = ImageRect::new(0, 0, 2, 2).unwrap();

    let hist = compute_histogram(&buffer, roi, &[2, 1, 0], &HistogramConfig::default());
    let text = hist.to_delimited(',');
    let first = text.lines().next().unwrap();
    assert_eq!(first, "x,C0,C1,C2");
    assert_eq!(text.lines().count(), 257);
    let row_100 = text.lines().nth(101).unwrap();
    assert_eq!(row_100, "100,0,4,0");

    let profile = compute_profile(&buffer, roi, ProfileConfig::default(), &[1]);
    assert_eq!(profile.to_delimited(';'), "x;C1\n0;100\n1;100");

    let stats = StatsTable::from(&profile).to_delimited(',');
    assert_eq!(stats, "ch,mean,std,median,min,max\n1,100,0,100,100,100");
}
