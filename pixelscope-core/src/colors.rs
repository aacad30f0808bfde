//! Per-channel display colours and the 1- and 2-channel display modes.
//!
//! Colours are remembered per channel count, so a 3-channel palette and a
//! 5-channel palette live side by side and each comes back when an image
//! with that many channels is shown again.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An opaque 8-bit RGB colour, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct ChannelColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ChannelColor {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const RED: Self = Self::new(255, 0, 0);
    pub const GREEN: Self = Self::new(0, 255, 0);
    pub const BLUE: Self = Self::new(0, 0, 255);
    pub const GRAY: Self = Self::new(127, 127, 127);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Colour from hue in degrees and saturation/value in `0..=255`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::many_single_char_names
    )]
    pub fn from_hsv(hue: u16, saturation: u8, value: u8) -> Self {
        let h = f64::from(hue % 360) / 60.0;
        let s = f64::from(saturation) / 255.0;
        let v = f64::from(value) / 255.0;
        let sector = h.floor();
        let f = h - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        let (r, g, b) = match sector as u8 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        let channel = |x: f64| (x * 255.0).round().clamp(0.0, 255.0) as u8;
        Self::new(channel(r), channel(g), channel(b))
    }
}

impl fmt::Display for ChannelColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for ChannelColor {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("colour '{s}' is not of the form #rrggbb"));
        }
        let part = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|e| format!("colour '{s}': {e}"))
        };
        Ok(Self::new(part(0..2)?, part(2..4)?, part(4..6)?))
    }
}

impl TryFrom<String> for ChannelColor {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChannelColor> for String {
    fn from(color: ChannelColor) -> Self {
        color.to_string()
    }
}

/// Default palette for `channel_count` channels.
///
/// White for one channel, red/green/blue for three, RGB plus gray for four,
/// otherwise hues spread evenly around the colour wheel.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn default_channel_colors(channel_count: usize) -> Vec<ChannelColor> {
    match channel_count {
        0 => Vec::new(),
        1 => vec![ChannelColor::WHITE],
        3 => vec![ChannelColor::RED, ChannelColor::GREEN, ChannelColor::BLUE],
        4 => vec![
            ChannelColor::RED,
            ChannelColor::GREEN,
            ChannelColor::BLUE,
            ChannelColor::GRAY,
        ],
        n => (0..n)
            .map(|i| ChannelColor::from_hsv((360 * i / n) as u16, 200, 255))
            .collect(),
    }
}

/// How single-channel images are coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MonoMode {
    #[default]
    Grayscale,
    /// Jet false-colour map.
    Jet,
}

/// How two-channel images are coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DualMode {
    /// Each channel tinted with its own colour and summed.
    Composite,
    /// The two channels read as a vector field: angle → hue, magnitude → value.
    #[default]
    FlowHsv,
}

/// Channel colours keyed by channel count, plus the 1-/2-channel modes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelColorStore {
    #[cfg_attr(feature = "serde", serde(default))]
    colors: BTreeMap<usize, Vec<ChannelColor>>,
    #[cfg_attr(feature = "serde", serde(default))]
    mono_mode: MonoMode,
    #[cfg_attr(feature = "serde", serde(default))]
    dual_mode: DualMode,
}

impl ChannelColorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Colours for images with `channel_count` channels, created from the
    /// defaults on first use. Always exactly `channel_count` long.
    pub fn colors(&mut self, channel_count: usize) -> &[ChannelColor] {
        if channel_count == 0 {
            return &[];
        }
        let entry = self
            .colors
            .entry(channel_count)
            .or_insert_with(|| default_channel_colors(channel_count));
        if entry.len() != channel_count {
            let defaults = default_channel_colors(channel_count);
            entry.truncate(channel_count);
            let have = entry.len();
            entry.extend_from_slice(&defaults[have..]);
        }
        entry
    }

    /// Stored colours without creating defaults.
    #[must_use]
    pub fn stored_colors(&self, channel_count: usize) -> Option<&[ChannelColor]> {
        self.colors.get(&channel_count).map(Vec::as_slice)
    }

    /// Every stored palette, by channel count.
    pub fn palettes(&self) -> impl Iterator<Item = (usize, &[ChannelColor])> + '_ {
        self.colors.iter().map(|(&n, colors)| (n, colors.as_slice()))
    }

    /// Replace the palette for `channel_count`; missing entries take the
    /// defaults and extra ones are dropped.
    pub fn set_colors(&mut self, channel_count: usize, colors: &[ChannelColor]) {
        if channel_count == 0 {
            return;
        }
        let defaults = default_channel_colors(channel_count);
        let fixed = (0..channel_count)
            .map(|i| colors.get(i).copied().unwrap_or(defaults[i]))
            .collect();
        self.colors.insert(channel_count, fixed);
    }

    /// Change one channel's colour in the `channel_count` palette.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] if `channel >= channel_count`.
    pub fn set_color(
        &mut self,
        channel_count: usize,
        channel: usize,
        color: ChannelColor,
    ) -> Result<()> {
        if channel >= channel_count {
            return Err(Error::OutOfBounds {
                index: channel,
                len: channel_count,
            });
        }
        self.colors(channel_count);
        if let Some(slot) = self
            .colors
            .get_mut(&channel_count)
            .and_then(|palette| palette.get_mut(channel))
        {
            *slot = color;
        }
        Ok(())
    }

    /// Make sure a palette exists for the new image's channel count.
    /// Palettes for other counts are left untouched.
    pub fn on_image_switch(&mut self, channel_count: usize) {
        if channel_count > 0 && !self.colors.contains_key(&channel_count) {
            debug!("default colours for {channel_count}-channel images");
        }
        self.colors(channel_count);
    }

    /// Forget the palette for one channel count.
    pub fn reset(&mut self, channel_count: usize) {
        self.colors.remove(&channel_count);
    }

    #[must_use]
    pub fn mono_mode(&self) -> MonoMode {
        self.mono_mode
    }

    pub fn set_mono_mode(&mut self, mode: MonoMode) {
        self.mono_mode = mode;
    }

    #[must_use]
    pub fn dual_mode(&self) -> DualMode {
        self.dual_mode
    }

    pub fn set_dual_mode(&mut self, mode: DualMode) {
        self.dual_mode = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_palettes() {
        assert_eq!(default_channel_colors(1), vec![ChannelColor::WHITE]);
        assert_eq!(default_channel_colors(3)[2], ChannelColor::BLUE);
        assert_eq!(default_channel_colors(4)[3], ChannelColor::GRAY);
        let wheel = default_channel_colors(6);
        assert_eq!(wheel.len(), 6);
        assert_eq!(wheel[0], ChannelColor::new(255, 55, 55));
        // 120° is green-dominant.
        assert_eq!(wheel[2], ChannelColor::new(55, 255, 55));
    }

    #[test]
    fn test_hex_round_trip() {
        let color: ChannelColor = "#1a2B3c".parse().unwrap();
        assert_eq!(color, ChannelColor::new(0x1a, 0x2b, 0x3c));
        assert_eq!(color.to_string(), "#1a2b3c");
        assert!("#12345".parse::<ChannelColor>().is_err());
        assert!("#12345g".parse::<ChannelColor>().is_err());
    }

    #[test]
    fn test_palettes_are_kept_per_count() {
        let mut store = ChannelColorStore::new();
        store.on_image_switch(3);
        store.set_color(3, 0, ChannelColor::WHITE).unwrap();

        store.on_image_switch(5);
        assert_eq!(store.stored_colors(5).map(<[_]>::len), Some(5));

        store.on_image_switch(3);
        assert_eq!(store.colors(3)[0], ChannelColor::WHITE);
        assert_eq!(store.colors(3)[1], ChannelColor::GREEN);
    }

    #[test]
    fn test_set_colors_fills_and_truncates() {
        let mut store = ChannelColorStore::new();
        store.set_colors(3, &[ChannelColor::GRAY]);
        assert_eq!(
            store.colors(3),
            &[ChannelColor::GRAY, ChannelColor::GREEN, ChannelColor::BLUE]
        );
        store.set_colors(1, &[ChannelColor::RED, ChannelColor::BLUE]);
        assert_eq!(store.colors(1), &[ChannelColor::RED]);
        store.set_colors(0, &[ChannelColor::RED]);
        assert_eq!(store.stored_colors(0), None);
    }

    #[test]
    fn test_set_color_out_of_range() {
        let mut store = ChannelColorStore::new();
        assert_eq!(
            store.set_color(2, 2, ChannelColor::RED),
            Err(Error::OutOfBounds { index: 2, len: 2 })
        );
    }

    #[test]
    fn test_modes_default_and_change() {
        let mut store = ChannelColorStore::new();
        assert_eq!(store.mono_mode(), MonoMode::Grayscale);
        assert_eq!(store.dual_mode(), DualMode::FlowHsv);
        store.set_mono_mode(MonoMode::Jet);
        store.set_dual_mode(DualMode::Composite);
        store.reset(3);
        assert_eq!(store.mono_mode(), MonoMode::Jet);
        assert_eq!(store.dual_mode(), DualMode::Composite);
    }
}
