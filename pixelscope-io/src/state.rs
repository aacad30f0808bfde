//! JSON persistence of process-lifetime display state.
//!
//! Channel visibility, channel colours and brightness profiles are stored;
//! the selection and analysis preferences are session-scoped and never
//! written.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, warn};
use pixelscope_core::{
    BrightnessProfile, ChannelColorStore, ChannelVisibilityStore, DisplayStateStore, DtypeClass,
};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Current on-disk layout version. Version 2 added channel colours.
pub const STATE_VERSION: u32 = 2;

/// Serialized display state, keyed by dtype-class name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub channel_visibility: Vec<bool>,
    #[serde(default)]
    pub brightness: BTreeMap<String, BrightnessProfile>,
    #[serde(default)]
    pub channel_colors: ChannelColorStore,
}

fn default_version() -> u32 {
    STATE_VERSION
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            channel_visibility: Vec::new(),
            brightness: BTreeMap::new(),
            channel_colors: ChannelColorStore::new(),
        }
    }
}

impl StateFile {
    /// Snapshot the process-lifetime stores.
    #[must_use]
    pub fn capture(
        channels: &ChannelVisibilityStore,
        colors: &ChannelColorStore,
        display: &DisplayStateStore,
    ) -> Self {
        Self {
            version: STATE_VERSION,
            channel_visibility: channels.flags().to_vec(),
            brightness: display
                .profiles()
                .map(|(dtype, profile)| (dtype.name().to_string(), profile))
                .collect(),
            channel_colors: colors.clone(),
        }
    }

    /// Rebuild the stores. Unknown classes and invalid profiles are skipped;
    /// palettes whose length does not match their channel count are padded
    /// with defaults or truncated.
    #[must_use]
    pub fn restore(&self) -> (ChannelVisibilityStore, ChannelColorStore, DisplayStateStore) {
        let channels = ChannelVisibilityStore::from_flags(self.channel_visibility.clone());
        let mut colors = ChannelColorStore::new();
        colors.set_mono_mode(self.channel_colors.mono_mode());
        colors.set_dual_mode(self.channel_colors.dual_mode());
        for (count, palette) in self.channel_colors.palettes() {
            if palette.len() != count {
                warn!("stored palette for {count} channels has {} colours", palette.len());
            }
            colors.set_colors(count, palette);
        }
        let mut display = DisplayStateStore::new();
        for (key, profile) in &self.brightness {
            let Ok(dtype) = key.parse::<DtypeClass>() else {
                warn!("ignoring brightness for unknown dtype class '{key}'");
                continue;
            };
            if let Err(e) = display.set_brightness_profile(dtype, *profile) {
                warn!("ignoring stored brightness for {dtype}: {e}");
            }
        }
        (channels, colors, display)
    }

    /// Read a state file.
    ///
    /// # Errors
    /// I/O failures or malformed JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let state: Self = serde_json::from_str(&text)?;
        if state.version > STATE_VERSION {
            warn!(
                "{} was written by a newer version ({}); reading what is understood",
                path.display(),
                state.version
            );
        }
        debug!("loaded display state from {}", path.display());
        Ok(state)
    }

    /// Read a state file, or start empty if it does not exist yet.
    ///
    /// # Errors
    /// As [`StateFile::load`], except for a missing file.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write as pretty-printed JSON.
    ///
    /// # Errors
    /// I/O or serialization failures.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        debug!("saved display state to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixelscope_core::{ChannelColor, DualMode, MonoMode};

    #[test]
    fn test_capture_restore() {
        let mut channels = ChannelVisibilityStore::new();
        channels.on_image_switch(3);
        channels.set_visible(2, false).unwrap();
        let mut display = DisplayStateStore::new();
        display
            .set_brightness_profile(DtypeClass::Uint16, BrightnessProfile::new(5.0, 2.0, 1000.0))
            .unwrap();

        let mut colors = ChannelColorStore::new();
        colors.set_color(3, 0, ChannelColor::GRAY).unwrap();
        colors.set_mono_mode(MonoMode::Jet);

        let state = StateFile::capture(&channels, &colors, &display);
        assert!(state.brightness.contains_key("uint16"));

        let (channels, colors, display) = state.restore();
        assert_eq!(colors.stored_colors(3).map(|c| c[0]), Some(ChannelColor::GRAY));
        assert_eq!(colors.mono_mode(), MonoMode::Jet);
        assert_eq!(channels.flags(), &[true, true, false]);
        assert_eq!(
            display.stored_profile(DtypeClass::Uint16),
            Some(BrightnessProfile::new(5.0, 2.0, 1000.0))
        );
    }

    #[test]
    fn test_restore_skips_bad_entries() {
        let json = r#"{
            "brightness": {
                "complex": {"offset": 0.0, "gain": 1.0, "saturation": 1.0},
                "uint8": {"offset": 0.0, "gain": -1.0, "saturation": 255.0},
                "float": {"offset": 0.0, "gain": 2.0, "saturation": 0.5}
            }
        }"#;
        let state: StateFile = serde_json::from_str(json).unwrap();
        assert_eq!(state.version, STATE_VERSION);
        let (channels, colors, display) = state.restore();
        assert!(channels.is_empty());
        assert_eq!(colors, ChannelColorStore::new());
        assert_eq!(display.stored_profile(DtypeClass::Uint8), None);
        assert_eq!(
            display.stored_profile(DtypeClass::Float),
            Some(BrightnessProfile::new(0.0, 2.0, 0.5))
        );
    }

    #[test]
    fn test_restore_normalizes_palettes() {
        let json = r##"{
            "version": 2,
            "channel_colors": {
                "colors": {"0": ["#ffffff"], "3": ["#010203"], "1": ["#00ff00", "#0000ff"]},
                "mono_mode": "jet",
                "dual_mode": "composite"
            }
        }"##;
        let state: StateFile = serde_json::from_str(json).unwrap();
        let (_, mut colors, _) = state.restore();
        assert_eq!(colors.stored_colors(0), None);
        assert_eq!(
            colors.colors(3),
            &[ChannelColor::new(1, 2, 3), ChannelColor::GREEN, ChannelColor::BLUE]
        );
        assert_eq!(colors.colors(1), &[ChannelColor::GREEN]);
        assert_eq!(colors.dual_mode(), DualMode::Composite);
    }

    #[test]
    fn test_bad_colour_is_rejected() {
        let json = r#"{"channel_colors": {"colors": {"1": ["red"]}}}"#;
        assert!(serde_json::from_str::<StateFile>(json).is_err());
    }
}
