//! Display state: per-dtype brightness profiles, the transient bit-shift and
//! session-wide analysis preferences.
//!
//! Brightness maps a sample `v` to `gain · 2^shift · (v − offset) / saturation · 255`,
//! clipped to `[0, 255]`. The result is what the user sees and what analysis
//! runs on.

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::image::{DtypeClass, PixelBuffer};

/// Smallest stored gain (2⁻⁷).
pub const MIN_GAIN: f64 = 1.0 / 128.0;
/// Largest stored gain (2¹⁰).
pub const MAX_GAIN: f64 = 1024.0;

/// Default saturation ceiling for integer classes.
const INTEGER_SATURATION_CAP: f64 = 4095.0;

/// Offset, gain and saturation for one dtype class.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BrightnessProfile {
    pub offset: f64,
    pub gain: f64,
    pub saturation: f64,
}

impl BrightnessProfile {
    #[must_use]
    pub fn new(offset: f64, gain: f64, saturation: f64) -> Self {
        Self {
            offset,
            gain,
            saturation,
        }
    }

    /// The documented starting triple for a class.
    ///
    /// Float displays `[0, 1]`; integer classes saturate at their natural
    /// maximum, capped at 4095.
    #[must_use]
    pub fn default_for(dtype: DtypeClass) -> Self {
        let saturation = dtype
            .natural_max()
            .map_or(1.0, |max| max.min(INTEGER_SATURATION_CAP));
        Self::new(0.0, 1.0, saturation)
    }

    /// Validate and clamp into the ranges allowed for `dtype`.
    fn sanitized(self, dtype: DtypeClass) -> Result<Self> {
        if !self.offset.is_finite() {
            return Err(Error::InvalidParameter {
                field: "offset",
                value: self.offset,
            });
        }
        if !(self.gain.is_finite() && self.gain > 0.0) {
            return Err(Error::InvalidParameter {
                field: "gain",
                value: self.gain,
            });
        }
        if !(self.saturation.is_finite() && self.saturation > 0.0) {
            return Err(Error::InvalidParameter {
                field: "saturation",
                value: self.saturation,
            });
        }

        let (offset_min, offset_max) = offset_range(dtype);
        let (sat_min, sat_max) = saturation_range(dtype);
        Ok(Self {
            offset: self.offset.clamp(offset_min, offset_max),
            gain: self.gain.clamp(MIN_GAIN, MAX_GAIN),
            saturation: self.saturation.clamp(sat_min, sat_max),
        })
    }
}

fn offset_range(dtype: DtypeClass) -> (f64, f64) {
    match dtype {
        DtypeClass::Float => (-1.0, 1.0),
        DtypeClass::Uint8 => (-255.0, 255.0),
        DtypeClass::Uint16 => (-32_767.0, 32_767.0),
        DtypeClass::WideInt => (-2_147_483_648.0, 2_147_483_648.0),
    }
}

fn saturation_range(dtype: DtypeClass) -> (f64, f64) {
    match dtype {
        DtypeClass::Float => (0.001, 10.0),
        DtypeClass::Uint8 => (1.0, 255.0),
        DtypeClass::Uint16 => (1.0, 65_535.0),
        DtypeClass::WideInt => (1.0, 4_294_967_295.0),
    }
}

/// Transient ×2 / ÷2 brightness steps layered over the stored gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BitShift(i32);

impl BitShift {
    pub const MIN: i32 = -7;
    pub const MAX: i32 = 10;

    /// Create a shift; the step count is clamped to `[-7, 10]`.
    #[must_use]
    pub fn new(steps: i32) -> Self {
        Self(steps.clamp(Self::MIN, Self::MAX))
    }

    #[must_use]
    pub fn steps(self) -> i32 {
        self.0
    }

    /// One step brighter (×2).
    #[must_use]
    pub fn brighter(self) -> Self {
        Self::new(self.0.saturating_add(1))
    }

    /// One step darker (÷2).
    #[must_use]
    pub fn darker(self) -> Self {
        Self::new(self.0.saturating_sub(1))
    }

    /// Multiplier applied on top of the stored gain.
    #[must_use]
    pub fn factor(self) -> f64 {
        2f64.powi(self.0)
    }
}

impl fmt::Display for BitShift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 >= 0 {
            write!(f, "x{}", 1u32 << self.0.unsigned_abs())
        } else {
            write!(f, "/{}", 1u32 << self.0.unsigned_abs())
        }
    }
}

/// Axis along which a profile is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ProfileOrientation {
    #[default]
    Horizontal,
    Vertical,
    Diagonal,
}

/// How profile positions are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CoordinateMode {
    /// 0-based offsets from the ROI origin.
    #[default]
    Relative,
    /// Image-space coordinates.
    Absolute,
}

/// Histogram count axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HistogramScale {
    #[default]
    Linear,
    /// `log10(count + 1)`.
    Log,
}

impl HistogramScale {
    /// Transform a bin count for display.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn apply(self, count: u64) -> f64 {
        match self {
            Self::Linear => count as f64,
            Self::Log => (count as f64 + 1.0).log10(),
        }
    }
}

/// Analysis options shared by every image in one analysis session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalysisPreferences {
    pub profile_orientation: ProfileOrientation,
    pub coordinate_mode: CoordinateMode,
    pub histogram_scale: HistogramScale,
}

/// Partial update for [`AnalysisPreferences`]; `None` fields are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreferencesUpdate {
    pub profile_orientation: Option<ProfileOrientation>,
    pub coordinate_mode: Option<CoordinateMode>,
    pub histogram_scale: Option<HistogramScale>,
}

impl PreferencesUpdate {
    #[must_use]
    pub fn with_orientation(mut self, orientation: ProfileOrientation) -> Self {
        self.profile_orientation = Some(orientation);
        self
    }

    #[must_use]
    pub fn with_coordinate_mode(mut self, mode: CoordinateMode) -> Self {
        self.coordinate_mode = Some(mode);
        self
    }

    #[must_use]
    pub fn with_histogram_scale(mut self, scale: HistogramScale) -> Self {
        self.histogram_scale = Some(scale);
        self
    }
}

impl AnalysisPreferences {
    fn merge(&mut self, update: PreferencesUpdate) {
        if let Some(orientation) = update.profile_orientation {
            self.profile_orientation = orientation;
        }
        if let Some(mode) = update.coordinate_mode {
            self.coordinate_mode = mode;
        }
        if let Some(scale) = update.histogram_scale {
            self.histogram_scale = scale;
        }
    }
}

/// Brightness profiles keyed by dtype class, plus analysis preferences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayStateStore {
    profiles: BTreeMap<DtypeClass, BrightnessProfile>,
    preferences: AnalysisPreferences,
}

impl DisplayStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Profile for `dtype`, created from the class defaults on first access.
    pub fn brightness_profile(&mut self, dtype: DtypeClass) -> BrightnessProfile {
        *self.profiles.entry(dtype).or_insert_with(|| {
            debug!("initializing brightness profile for {dtype}");
            BrightnessProfile::default_for(dtype)
        })
    }

    /// Stored profile without creating one.
    #[must_use]
    pub fn stored_profile(&self, dtype: DtypeClass) -> Option<BrightnessProfile> {
        self.profiles.get(&dtype).copied()
    }

    /// Every stored profile, in class order.
    pub fn profiles(&self) -> impl Iterator<Item = (DtypeClass, BrightnessProfile)> + '_ {
        self.profiles.iter().map(|(&dtype, &profile)| (dtype, profile))
    }

    /// Validate, clamp and store a profile; returns what was stored.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] if gain or saturation is not positive or
    /// any field is not finite. The stored profile is left untouched.
    pub fn set_brightness_profile(
        &mut self,
        dtype: DtypeClass,
        values: BrightnessProfile,
    ) -> Result<BrightnessProfile> {
        let sanitized = values.sanitized(dtype).inspect_err(|e| {
            warn!("rejected brightness update for {dtype}: {e}");
        })?;
        if sanitized != values {
            warn!("brightness for {dtype} clamped from {values:?} to {sanitized:?}");
        }
        self.profiles.insert(dtype, sanitized);
        Ok(sanitized)
    }

    /// Restore one class to its defaults; other classes are unaffected.
    pub fn reset_to_defaults(&mut self, dtype: DtypeClass) -> BrightnessProfile {
        let profile = BrightnessProfile::default_for(dtype);
        self.profiles.insert(dtype, profile);
        profile
    }

    /// Forget every stored profile.
    pub fn reset_all(&mut self) {
        self.profiles.clear();
    }

    #[must_use]
    pub fn analysis_preferences(&self) -> AnalysisPreferences {
        self.preferences
    }

    /// Merge a partial update; returns the resulting preferences.
    pub fn set_analysis_preferences(&mut self, update: PreferencesUpdate) -> AnalysisPreferences {
        self.preferences.merge(update);
        self.preferences
    }

    pub fn reset_analysis_preferences(&mut self) {
        self.preferences = AnalysisPreferences::default();
    }
}

/// Brightness profile plus bit-shift, ready to render a buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTransform {
    pub profile: BrightnessProfile,
    pub shift: BitShift,
}

impl DisplayTransform {
    #[must_use]
    pub fn new(profile: BrightnessProfile, shift: BitShift) -> Self {
        Self { profile, shift }
    }

    /// Stored gain times the shift factor.
    #[must_use]
    pub fn effective_gain(&self) -> f64 {
        self.profile.gain * self.shift.factor()
    }

    /// Display value for one sample, in `[0, 255]`.
    #[must_use]
    pub fn map_value(&self, value: f64) -> f64 {
        let scaled =
            self.effective_gain() * (value - self.profile.offset) * 255.0 / self.profile.saturation;
        if scaled.is_nan() {
            0.0
        } else {
            scaled.clamp(0.0, 255.0).floor()
        }
    }

    /// Render a buffer to displayed 8-bit values.
    #[must_use]
    pub fn apply(&self, buffer: &PixelBuffer) -> PixelBuffer {
        buffer.map_samples(|v| self.map_value(v), DtypeClass::Uint8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageShape;

    #[test]
    fn test_defaults_per_class() {
        let mut store = DisplayStateStore::new();
        assert_eq!(
            store.brightness_profile(DtypeClass::Float),
            BrightnessProfile::new(0.0, 1.0, 1.0)
        );
        assert_eq!(
            store.brightness_profile(DtypeClass::Uint16),
            BrightnessProfile::new(0.0, 1.0, 4095.0)
        );
        assert_eq!(
            BrightnessProfile::default_for(DtypeClass::WideInt).saturation,
            4095.0
        );
    }

    #[test]
    fn test_invalid_values_leave_profile() {
        let mut store = DisplayStateStore::new();
        let before = store.brightness_profile(DtypeClass::Uint8);
        for (values, field) in [
            (BrightnessProfile::new(0.0, 0.0, 255.0), "gain"),
            (BrightnessProfile::new(0.0, -2.0, 255.0), "gain"),
            (BrightnessProfile::new(0.0, 1.0, 0.0), "saturation"),
            (BrightnessProfile::new(f64::NAN, 1.0, 10.0), "offset"),
        ] {
            let err = store
                .set_brightness_profile(DtypeClass::Uint8, values)
                .unwrap_err();
            assert!(matches!(err, Error::InvalidParameter { field: f, .. } if f == field));
        }
        assert_eq!(store.stored_profile(DtypeClass::Uint8), Some(before));
    }

    #[test]
    fn test_out_of_range_values_clamp() {
        let mut store = DisplayStateStore::new();
        let stored = store
            .set_brightness_profile(DtypeClass::Uint8, BrightnessProfile::new(-900.0, 5000.0, 1e6))
            .unwrap();
        assert_eq!(stored, BrightnessProfile::new(-255.0, MAX_GAIN, 255.0));
    }

    #[test]
    fn test_reset_only_touches_one_class() {
        let mut store = DisplayStateStore::new();
        store
            .set_brightness_profile(DtypeClass::Uint8, BrightnessProfile::new(10.0, 2.0, 100.0))
            .unwrap();
        store
            .set_brightness_profile(DtypeClass::Float, BrightnessProfile::new(0.1, 4.0, 0.5))
            .unwrap();
        store.reset_to_defaults(DtypeClass::Uint8);
        assert_eq!(
            store.stored_profile(DtypeClass::Uint8),
            Some(BrightnessProfile::default_for(DtypeClass::Uint8))
        );
        assert_eq!(
            store.stored_profile(DtypeClass::Float),
            Some(BrightnessProfile::new(0.1, 4.0, 0.5))
        );

        store.reset_all();
        assert_eq!(store.profiles().count(), 0);
        assert_eq!(
            store.brightness_profile(DtypeClass::Float),
            BrightnessProfile::default_for(DtypeClass::Float)
        );
    }

    #[test]
    fn test_preferences_partial_update() {
        let mut store = DisplayStateStore::new();
        let prefs = store.set_analysis_preferences(
            PreferencesUpdate::default().with_orientation(ProfileOrientation::Diagonal),
        );
        assert_eq!(prefs.profile_orientation, ProfileOrientation::Diagonal);
        assert_eq!(prefs.coordinate_mode, CoordinateMode::Relative);

        let prefs = store
            .set_analysis_preferences(PreferencesUpdate::default().with_histogram_scale(HistogramScale::Log));
        assert_eq!(prefs.profile_orientation, ProfileOrientation::Diagonal);
        assert_eq!(prefs.histogram_scale, HistogramScale::Log);
    }

    #[test]
    fn test_bit_shift_limits() {
        let mut shift = BitShift::default();
        for _ in 0..20 {
            shift = shift.brighter();
        }
        assert_eq!(shift.steps(), BitShift::MAX);
        assert_eq!(shift.darker().steps(), BitShift::MAX - 1);
        assert!((shift.factor() - 1024.0).abs() < f64::EPSILON);
        assert_eq!(BitShift::new(-100).steps(), BitShift::MIN);
        assert_eq!(BitShift::new(-2).to_string(), "/4");
        assert_eq!(BitShift::new(3).to_string(), "x8");
    }

    #[test]
    fn test_transform_maps_and_clips() {
        let transform = DisplayTransform::new(BrightnessProfile::new(10.0, 1.0, 100.0), BitShift::new(1));
        // 2 · (60 − 10) / 100 · 255 = 255
        assert!((transform.map_value(60.0) - 255.0).abs() < f64::EPSILON);
        assert!((transform.map_value(35.0) - 127.0).abs() < f64::EPSILON);
        assert!(transform.map_value(0.0).abs() < f64::EPSILON);
        assert!(transform.map_value(f64::NAN).abs() < f64::EPSILON);

        let buffer = PixelBuffer::filled(ImageShape::new(2, 2, 1), 1000.0, DtypeClass::Uint16).unwrap();
        let shown = transform.apply(&buffer);
        assert_eq!(shown.dtype(), DtypeClass::Uint8);
        assert_eq!(shown.get(1, 1, 0), Some(255.0));
    }

    #[test]
    fn test_log_scale() {
        assert!(HistogramScale::Log.apply(0).abs() < f64::EPSILON);
        assert!((HistogramScale::Log.apply(99) - 2.0).abs() < 1e-12);
        assert!((HistogramScale::Linear.apply(7) - 7.0).abs() < f64::EPSILON);
    }
}
