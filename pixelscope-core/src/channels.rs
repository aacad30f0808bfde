//! Per-channel visibility that survives image switches.

use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Ordered visibility flags, index = channel number.
///
/// The list only ever grows. Switching to an image with fewer channels
/// leaves the surplus entries in place so they apply again when an image
/// with more channels comes back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ChannelVisibilityStore {
    visible: Vec<bool>,
}

impl ChannelVisibilityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a store from saved flags.
    #[must_use]
    pub fn from_flags(visible: Vec<bool>) -> Self {
        Self { visible }
    }

    /// Number of channels the store has been sized for.
    #[must_use]
    pub fn len(&self) -> usize {
        self.visible.len()
    }

    /// Returns true before any image has been seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// All stored flags, including entries beyond the current image.
    #[must_use]
    pub fn flags(&self) -> &[bool] {
        &self.visible
    }

    /// Extend with visible entries up to `channel_count`; never shrinks.
    pub fn on_image_switch(&mut self, channel_count: usize) {
        if channel_count > self.visible.len() {
            debug!(
                "channel visibility extended from {} to {channel_count}",
                self.visible.len()
            );
            self.visible.resize(channel_count, true);
        }
    }

    /// Stored flag, or `true` for a channel not seen yet.
    #[must_use]
    pub fn is_visible(&self, channel: usize) -> bool {
        self.visible.get(channel).copied().unwrap_or(true)
    }

    /// Set one flag. The store must already cover `channel`.
    pub fn set_visible(&mut self, channel: usize, visible: bool) -> Result<()> {
        let len = self.visible.len();
        debug_assert!(
            channel < len,
            "set_visible({channel}) before on_image_switch sized the store (len {len})"
        );
        let slot = self
            .visible
            .get_mut(channel)
            .ok_or(Error::OutOfBounds { index: channel, len })?;
        *slot = visible;
        Ok(())
    }

    /// Visible channel indices below `channel_count`, ascending.
    #[must_use]
    pub fn visible_channels(&self, channel_count: usize) -> Vec<usize> {
        (0..channel_count).filter(|&c| self.is_visible(c)).collect()
    }

    /// Mark every stored channel visible again.
    pub fn reset(&mut self) {
        self.visible.iter_mut().for_each(|v| *v = true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_image_initializes() {
        let mut store = ChannelVisibilityStore::new();
        assert!(store.is_empty());
        store.on_image_switch(3);
        assert_eq!(store.flags(), &[true, true, true]);
    }

    #[test]
    fn test_fewer_channels_keeps_entries() {
        let mut store = ChannelVisibilityStore::new();
        store.on_image_switch(4);
        store.set_visible(3, false).unwrap();
        store.on_image_switch(1);
        assert_eq!(store.len(), 4);
        assert_eq!(store.visible_channels(1), vec![0]);
        store.on_image_switch(4);
        assert!(!store.is_visible(3));
    }

    #[test]
    fn test_unknown_channel_is_visible() {
        let store = ChannelVisibilityStore::from_flags(vec![false]);
        assert!(!store.is_visible(0));
        assert!(store.is_visible(7));
        assert_eq!(store.visible_channels(3), vec![1, 2]);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_set_visible_out_of_range() {
        let mut store = ChannelVisibilityStore::new();
        store.on_image_switch(2);
        assert_eq!(
            store.set_visible(5, false),
            Err(Error::OutOfBounds { index: 5, len: 2 })
        );
    }

    #[test]
    #[should_panic(expected = "before on_image_switch")]
    #[cfg(debug_assertions)]
    fn test_set_visible_out_of_range_asserts() {
        let mut store = ChannelVisibilityStore::new();
        store.on_image_switch(2);
        let _ = store.set_visible(5, false);
    }

    #[test]
    fn test_reset() {
        let mut store = ChannelVisibilityStore::from_flags(vec![false, true, false]);
        store.reset();
        assert_eq!(store.flags(), &[true, true, true]);
    }
}
