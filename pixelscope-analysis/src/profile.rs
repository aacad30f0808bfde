//! Line profiles across a region of interest.

use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use ndarray::{ArrayView2, Axis};
use pixelscope_core::{AnalysisPreferences, CoordinateMode, ImageRect, PixelBuffer, ProfileOrientation};

use crate::stats::SummaryStats;

/// Orientation and position mode for a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileConfig {
    pub orientation: ProfileOrientation,
    pub mode: CoordinateMode,
}

impl ProfileConfig {
    #[must_use]
    pub fn with_orientation(mut self, orientation: ProfileOrientation) -> Self {
        self.orientation = orientation;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: CoordinateMode) -> Self {
        self.mode = mode;
        self
    }
}

impl From<AnalysisPreferences> for ProfileConfig {
    fn from(prefs: AnalysisPreferences) -> Self {
        Self {
            orientation: prefs.profile_orientation,
            mode: prefs.coordinate_mode,
        }
    }
}

/// Profile values and statistics for one channel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelProfile {
    pub channel: usize,
    pub values: Vec<f64>,
    pub stats: SummaryStats,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Profile {
    /// Position of each sample along the profile axis.
    pub positions: Vec<f64>,
    pub channels: Vec<ChannelProfile>,
    pub grayscale: bool,
}

impl Profile {
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// `(x, y)` sample points along the main diagonal, one per step of the
/// longer axis, nearest pixel.
fn diagonal_points(width: usize, height: usize) -> Vec<(usize, usize)> {
    let steps = width.max(height);
    if steps <= 1 {
        return vec![(0, 0)];
    }
    (0..steps)
        .map(|i| {
            (
                i * (width - 1) / (steps - 1),
                i * (height - 1) / (steps - 1),
            )
        })
        .collect()
}

fn profile_values(channel: ArrayView2<'_, f64>, orientation: ProfileOrientation) -> Vec<f64> {
    let (height, width) = channel.dim();
    match orientation {
        // Average down each column.
        ProfileOrientation::Horizontal => channel
            .mean_axis(Axis(0))
            .map(|a| a.to_vec())
            .unwrap_or_default(),
        // Average along each row.
        ProfileOrientation::Vertical => channel
            .mean_axis(Axis(1))
            .map(|a| a.to_vec())
            .unwrap_or_default(),
        ProfileOrientation::Diagonal => diagonal_points(width, height)
            .into_iter()
            .map(|(x, y)| channel[[y, x]])
            .collect(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn positions(roi: ImageRect, config: ProfileConfig, len: usize) -> Vec<f64> {
    let origin = match config.mode {
        CoordinateMode::Relative => 0,
        CoordinateMode::Absolute => match config.orientation {
            ProfileOrientation::Horizontal => roi.x0(),
            ProfileOrientation::Vertical => roi.y0(),
            ProfileOrientation::Diagonal if roi.width() >= roi.height() => roi.x0(),
            ProfileOrientation::Diagonal => roi.y0(),
        },
    };
    (0..len).map(|i| (origin + i) as f64).collect()
}

/// Sample a profile of every visible channel across `roi`.
#[must_use]
pub fn compute_profile(
    buffer: &PixelBuffer,
    roi: ImageRect,
    config: ProfileConfig,
    visible: &[usize],
) -> Profile {
    let roi = roi.clipped_to(buffer.width(), buffer.height());
    let mut channels: Vec<usize> = visible
        .iter()
        .copied()
        .filter(|&c| c < buffer.channels())
        .collect();
    channels.sort_unstable();
    channels.dedup();

    let region = buffer.region(roi);
    let results: Vec<ChannelProfile> = channels
        .par_iter()
        .map(|&c| {
            let values = profile_values(region.index_axis(Axis(2), c), config.orientation);
            let stats = SummaryStats::from_samples(values.iter().copied());
            ChannelProfile {
                channel: c,
                values,
                stats,
            }
        })
        .collect();

    let len = match config.orientation {
        ProfileOrientation::Horizontal => roi.width(),
        ProfileOrientation::Vertical => roi.height(),
        ProfileOrientation::Diagonal => roi.width().max(roi.height()),
    };

    Profile {
        positions: positions(roi, config, len),
        channels: results,
        grayscale: buffer.shape().is_grayscale(),
    }
}
