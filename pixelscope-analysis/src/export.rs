//! Delimiter-separated text for clipboard and file export.
//!
//! One column per visible channel, in ascending channel index.

use ndarray::Axis;
use pixelscope_core::{HistogramScale, ImageRect, PixelBuffer};

use crate::histogram::Histogram;
use crate::profile::Profile;
use crate::stats::SummaryStats;

/// Column label for a channel: `I` for single-channel images, `C<n>` otherwise.
#[must_use]
pub fn channel_label(channel: usize, grayscale: bool) -> String {
    if grayscale {
        "I".to_string()
    } else {
        format!("C{channel}")
    }
}

/// A numeric table with a header row.
pub trait DelimitedTable {
    fn header(&self) -> Vec<String>;

    /// Pre-formatted cells, one inner vector per row.
    fn rows(&self) -> Vec<Vec<String>>;

    /// Header plus rows joined by `delimiter`, newline-separated, no
    /// trailing newline.
    fn to_delimited(&self, delimiter: char) -> String {
        let sep = delimiter.to_string();
        let mut out = self.header().join(&sep);
        for row in self.rows() {
            out.push('\n');
            out.push_str(&row.join(&sep));
        }
        out
    }
}

fn format_value(value: f64) -> String {
    value.to_string()
}

/// Integer-valued numbers without a fractional part.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn format_position(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format_value(value)
    }
}

impl DelimitedTable for Histogram {
    fn header(&self) -> Vec<String> {
        std::iter::once("x".to_string())
            .chain(self.channels.iter().map(|c| channel_label(c.channel, self.grayscale)))
            .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.centers
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                std::iter::once(format_position(x))
                    .chain(self.channels.iter().map(|c| c.counts[i].to_string()))
                    .collect()
            })
            .collect()
    }
}

/// A histogram with its counts transformed for display, e.g. `log10(c + 1)`.
///
/// Shares the `x` column formatting with the plain [`Histogram`] table.
#[derive(Debug, Clone, Copy)]
pub struct ScaledHistogram<'a> {
    pub histogram: &'a Histogram,
    pub scale: HistogramScale,
}

impl<'a> ScaledHistogram<'a> {
    #[must_use]
    pub fn new(histogram: &'a Histogram, scale: HistogramScale) -> Self {
        Self { histogram, scale }
    }
}

impl DelimitedTable for ScaledHistogram<'_> {
    fn header(&self) -> Vec<String> {
        self.histogram.header()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        let columns: Vec<Vec<f64>> = (0..self.histogram.channels.len())
            .map(|index| self.histogram.scaled_counts(index, self.scale))
            .collect();
        self.histogram
            .centers
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                std::iter::once(format_position(x))
                    .chain(columns.iter().map(|column| format_value(column[i])))
                    .collect()
            })
            .collect()
    }
}

impl DelimitedTable for Profile {
    fn header(&self) -> Vec<String> {
        std::iter::once("x".to_string())
            .chain(self.channels.iter().map(|c| channel_label(c.channel, self.grayscale)))
            .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                std::iter::once(format_position(x))
                    .chain(self.channels.iter().map(|c| format_value(c.values[i])))
                    .collect()
            })
            .collect()
    }
}

/// Per-channel statistics table (`ch,mean,std,median,min,max`).
#[derive(Debug, Clone, PartialEq)]
pub struct StatsTable {
    pub rows: Vec<(usize, SummaryStats)>,
}

impl StatsTable {
    /// Statistics of the raw samples of `channels` inside `roi`.
    ///
    /// Channels beyond the buffer are skipped; rows keep the given order.
    #[must_use]
    pub fn from_region(buffer: &PixelBuffer, roi: ImageRect, channels: &[usize]) -> Self {
        let region = buffer.region(roi);
        Self {
            rows: channels
                .iter()
                .filter(|&&c| c < buffer.channels())
                .map(|&c| {
                    let samples = region.index_axis(Axis(2), c);
                    (c, SummaryStats::from_samples(samples.iter().copied()))
                })
                .collect(),
        }
    }
}

impl From<&Histogram> for StatsTable {
    fn from(hist: &Histogram) -> Self {
        Self {
            rows: hist.channels.iter().map(|c| (c.channel, c.stats)).collect(),
        }
    }
}

impl From<&Profile> for StatsTable {
    fn from(profile: &Profile) -> Self {
        Self {
            rows: profile.channels.iter().map(|c| (c.channel, c.stats)).collect(),
        }
    }
}

impl DelimitedTable for StatsTable {
    fn header(&self) -> Vec<String> {
        ["ch", "mean", "std", "median", "min", "max"]
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|(channel, s)| {
                vec![
                    channel.to_string(),
                    format_value(s.mean),
                    format_value(s.std_dev),
                    format_value(s.median),
                    format_value(s.min),
                    format_value(s.max),
                ]
            })
            .collect()
    }
}
