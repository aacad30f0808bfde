//! pixelscope-analysis: Numeric analysis of displayed pixel data.
//!
//! This crate provides the computations behind the analysis views:
//! - **Histogram** - per-channel binning over the dtype's natural range
//! - **Profile** - horizontal, vertical and diagonal line profiles
//! - **Diff** - offset pixel-wise difference of two images
//! - **Export** - delimiter-separated tables for the clipboard
//!
//! Every function is pure; per-channel work runs on the rayon pool.

mod diff;
mod engine;
pub mod export;
mod histogram;
mod profile;
mod stats;

pub use diff::{compute_diff, diff_images, DEFAULT_DIFF_OFFSET};
pub use engine::AnalysisEngine;
pub use export::{channel_label, format_position, DelimitedTable, ScaledHistogram, StatsTable};
pub use histogram::{
    compute_histogram, ChannelHistogram, Histogram, HistogramConfig, FLOAT_BINS, MAX_INTEGER_BINS,
};
pub use profile::{compute_profile, ChannelProfile, Profile, ProfileConfig};
pub use stats::SummaryStats;
