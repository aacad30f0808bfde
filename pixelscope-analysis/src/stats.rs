//! Summary statistics over a set of samples.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mean, population standard deviation, median and extrema.
///
/// NaN samples are skipped. An empty input yields all zeros.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SummaryStats {
    /// Number of samples that contributed.
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl SummaryStats {
    /// Compute statistics from any sample iterator.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_samples(samples: impl IntoIterator<Item = f64>) -> Self {
        let mut values: Vec<f64> = samples.into_iter().filter(|v| !v.is_nan()).collect();
        if values.is_empty() {
            return Self::default();
        }
        values.sort_unstable_by(f64::total_cmp);

        let count = values.len();
        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let median = if count % 2 == 1 {
            values[count / 2]
        } else {
            (values[count / 2 - 1] + values[count / 2]) / 2.0
        };

        Self {
            count,
            mean,
            std_dev: variance.sqrt(),
            median,
            min: values[0],
            max: values[count - 1],
        }
    }
}
