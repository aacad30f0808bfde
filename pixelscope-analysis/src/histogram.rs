//! Per-channel histograms over a region of interest.

use log::debug;
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use pixelscope_core::{DtypeClass, HistogramScale, ImageRect, PixelBuffer};

use crate::stats::SummaryStats;

/// Upper bound on the automatic bin count for integer data.
pub const MAX_INTEGER_BINS: usize = 65_536;
/// Automatic bin count for float data.
pub const FLOAT_BINS: usize = 256;

/// Histogram configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistogramConfig {
    /// Fixed bin count; `None` picks one from the dtype class.
    pub bins: Option<usize>,
}

impl HistogramConfig {
    #[must_use]
    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = Some(bins.max(1));
        self
    }
}

/// Counts and statistics for one channel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelHistogram {
    pub channel: usize,
    pub counts: Vec<u64>,
    /// Statistics of the raw ROI samples, not of the counts.
    pub stats: SummaryStats,
}

/// Shared bin layout plus one entry per visible channel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Histogram {
    /// Bin centres, shared by every channel.
    pub centers: Vec<f64>,
    pub bin_width: f64,
    /// Visible channels in ascending order.
    pub channels: Vec<ChannelHistogram>,
    /// Whether the source image had a single channel.
    pub grayscale: bool,
}

impl Histogram {
    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.centers.len()
    }

    /// Counts of one entry transformed for display.
    #[must_use]
    pub fn scaled_counts(&self, index: usize, scale: HistogramScale) -> Vec<f64> {
        self.channels
            .get(index)
            .map(|ch| ch.counts.iter().map(|&c| scale.apply(c)).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy)]
struct BinLayout {
    start: f64,
    end: f64,
    width: f64,
    bins: usize,
}

impl BinLayout {
    #[allow(clippy::cast_precision_loss)]
    fn new(dtype: DtypeClass, lo: f64, hi: f64, requested: Option<usize>) -> Self {
        if dtype.is_integer() {
            // One bin per integer value, centred on the value.
            let span = (hi - lo).max(0.0) + 1.0;
            let auto = span.min(MAX_INTEGER_BINS as f64);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let bins = requested.unwrap_or(auto as usize).max(1);
            let start = lo - 0.5;
            let end = hi + 0.5;
            Self {
                start,
                end,
                width: (end - start) / bins as f64,
                bins,
            }
        } else {
            let bins = requested.unwrap_or(FLOAT_BINS).max(1);
            let end = if hi > lo { hi } else { lo + 1.0 };
            Self {
                start: lo,
                end,
                width: (end - lo) / bins as f64,
                bins,
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn centers(&self) -> Vec<f64> {
        (0..self.bins)
            .map(|i| self.start + self.width * (i as f64 + 0.5))
            .collect()
    }

    /// Bin index for a sample; `None` outside `[start, end]`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn index(&self, value: f64) -> Option<usize> {
        if value.is_nan() || value < self.start || value > self.end {
            return None;
        }
        let idx = ((value - self.start) / self.width) as usize;
        Some(idx.min(self.bins - 1))
    }
}

/// The range binned for a dtype class: natural range for 8/16-bit data,
/// observed range otherwise.
fn value_range(buffer: &PixelBuffer, roi: ImageRect, channels: &[usize]) -> (f64, f64) {
    match buffer.dtype() {
        DtypeClass::Uint8 => (0.0, 255.0),
        DtypeClass::Uint16 => (0.0, 65_535.0),
        DtypeClass::Float | DtypeClass::WideInt => {
            let region = buffer.region(roi);
            let mut lo = f64::INFINITY;
            let mut hi = f64::NEG_INFINITY;
            for &c in channels {
                for &v in region.index_axis(ndarray::Axis(2), c) {
                    if v.is_finite() {
                        lo = lo.min(v);
                        hi = hi.max(v);
                    }
                }
            }
            if lo.is_finite() {
                (lo, hi)
            } else {
                (0.0, 0.0)
            }
        }
    }
}

/// Bin the samples of each visible channel inside `roi`.
///
/// Hidden channels and indices beyond the buffer's channel count are
/// omitted from the output. Samples outside the binned range are not counted.
#[must_use]
pub fn compute_histogram(
    buffer: &PixelBuffer,
    roi: ImageRect,
    visible: &[usize],
    config: &HistogramConfig,
) -> Histogram {
    let roi = roi.clipped_to(buffer.width(), buffer.height());
    let mut channels: Vec<usize> = visible
        .iter()
        .copied()
        .filter(|&c| c < buffer.channels())
        .collect();
    channels.sort_unstable();
    channels.dedup();

    let (lo, hi) = value_range(buffer, roi, &channels);
    let layout = BinLayout::new(buffer.dtype(), lo, hi, config.bins);
    debug!(
        "histogram over {roi}: {} bins in [{}, {}] for channels {channels:?}",
        layout.bins, layout.start, layout.end
    );

    let region = buffer.region(roi);
    let results = channels
        .par_iter()
        .map(|&c| {
            let samples = region.index_axis(ndarray::Axis(2), c);
            let mut counts = vec![0u64; layout.bins];
            for &v in samples {
                if let Some(idx) = layout.index(v) {
                    counts[idx] += 1;
                }
            }
            ChannelHistogram {
                channel: c,
                counts,
                stats: SummaryStats::from_samples(samples.iter().copied()),
            }
        })
        .collect();

    Histogram {
        centers: layout.centers(),
        bin_width: layout.width,
        channels: results,
        grayscale: buffer.shape().is_grayscale(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pixelscope_core::ImageShape;

    fn ramp(width: usize, dtype: DtypeClass) -> PixelBuffer {
        let samples = (0..width).map(|x| x as f64).collect();
        PixelBuffer::from_samples(ImageShape::new(1, width, 1), samples, dtype).unwrap()
    }

    #[test]
    fn test_uint8_uses_natural_range() {
        let buffer = ramp(10, DtypeClass::Uint8);
        let hist = compute_histogram(&buffer, buffer.bounds(), &[0], &HistogramConfig::default());
        assert_eq!(hist.bin_count(), 256);
        assert_relative_eq!(hist.centers[0], 0.0);
        assert_relative_eq!(hist.centers[255], 255.0);
        assert_eq!(hist.channels[0].counts[..10], [1; 10]);
        assert_eq!(hist.channels[0].counts[10..].iter().sum::<u64>(), 0);
        assert!(hist.grayscale);
    }

    #[test]
    fn test_float_bins_cover_data_range() {
        let samples = vec![0.0, 0.25, 0.5, 1.0];
        let buffer =
            PixelBuffer::from_samples(ImageShape::new(2, 2, 1), samples, DtypeClass::Float).unwrap();
        let hist = compute_histogram(
            &buffer,
            buffer.bounds(),
            &[0],
            &HistogramConfig::default().with_bins(4),
        );
        assert_eq!(hist.channels[0].counts, vec![1, 1, 1, 1]);
        assert_relative_eq!(hist.centers[0], 0.125);
        assert_relative_eq!(hist.bin_width, 0.25);
    }

    #[test]
    fn test_wide_int_span() {
        let buffer = ramp(5, DtypeClass::WideInt).map_samples(|v| v + 1000.0, DtypeClass::WideInt);
        let hist = compute_histogram(&buffer, buffer.bounds(), &[0], &HistogramConfig::default());
        assert_eq!(hist.bin_count(), 5);
        assert_relative_eq!(hist.centers[0], 1000.0);
        assert_relative_eq!(hist.centers[4], 1004.0);
    }

    #[test]
    fn test_hidden_channels_omitted() {
        let buffer =
            PixelBuffer::filled(ImageShape::new(3, 3, 4), 7.0, DtypeClass::Uint8).unwrap();
        let hist = compute_histogram(&buffer, buffer.bounds(), &[3, 0, 9], &HistogramConfig::default());
        let channels: Vec<usize> = hist.channels.iter().map(|c| c.channel).collect();
        assert_eq!(channels, vec![0, 3]);
        assert_eq!(hist.channels[1].counts[7], 9);
        assert_relative_eq!(hist.channels[1].stats.mean, 7.0);
    }

    #[test]
    fn test_roi_restricts_samples() {
        let buffer = ramp(10, DtypeClass::Uint8);
        let roi = ImageRect::new(2, 0, 5, 1).unwrap();
        let hist = compute_histogram(&buffer, roi, &[0], &HistogramConfig::default());
        assert_eq!(hist.channels[0].stats.count, 3);
        assert_relative_eq!(hist.channels[0].stats.mean, 3.0);
    }

    #[test]
    fn test_log_scaled_counts() {
        let buffer = PixelBuffer::filled(ImageShape::new(3, 3, 1), 0.0, DtypeClass::Uint8).unwrap();
        let hist = compute_histogram(&buffer, buffer.bounds(), &[0], &HistogramConfig::default());
        let scaled = hist.scaled_counts(0, HistogramScale::Log);
        assert_relative_eq!(scaled[0], 10f64.log10());
        assert_relative_eq!(scaled[1], 0.0);
    }
}
