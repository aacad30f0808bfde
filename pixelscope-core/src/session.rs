//! Viewer session: the state that must be reconciled on every image switch.
//!
//! Channel visibility, channel colours and brightness profiles live for the
//! whole process.
//! The selection and analysis preferences belong to one analysis session and
//! are dropped when it closes.

use log::debug;

use crate::channels::ChannelVisibilityStore;
use crate::colors::{ChannelColor, ChannelColorStore};
use crate::coords::{CoordinateMapper, ZoomState};
use crate::display::{AnalysisPreferences, BitShift, BrightnessProfile, DisplayStateStore, DisplayTransform};
use crate::geometry::{ImageRect, WidgetPoint};
use crate::image::{DtypeClass, Image, ImageShape, PixelBuffer};
use crate::selection::{DragHandle, SelectionConfig, SelectionModel};

/// Shape and class of the image currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveImage {
    pub shape: ImageShape,
    pub dtype: DtypeClass,
}

/// Snapshot handed to the analysis engine.
///
/// The buffer is the displayed (post-brightness, post-shift) data, copied so
/// later selection or display changes do not affect a running computation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisView {
    pub buffer: PixelBuffer,
    pub roi: ImageRect,
    /// Visible channel indices, ascending.
    pub visible: Vec<usize>,
    /// Display colour of every channel, indexed like the buffer.
    pub colors: Vec<ChannelColor>,
    pub preferences: AnalysisPreferences,
}

#[derive(Debug, Clone)]
pub struct ViewerSession {
    channels: ChannelVisibilityStore,
    colors: ChannelColorStore,
    display: DisplayStateStore,
    selection: SelectionModel,
    zoom: ZoomState,
    shift: BitShift,
    active: Option<ActiveImage>,
    analysis_open: bool,
}

impl Default for ViewerSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewerSession {
    #[must_use]
    pub fn new() -> Self {
        Self::with_selection_config(SelectionConfig::default())
    }

    #[must_use]
    pub fn with_selection_config(config: SelectionConfig) -> Self {
        Self {
            channels: ChannelVisibilityStore::new(),
            colors: ChannelColorStore::new(),
            display: DisplayStateStore::new(),
            selection: SelectionModel::with_config(1, 1, config),
            zoom: ZoomState::default(),
            shift: BitShift::default(),
            active: None,
            analysis_open: false,
        }
    }

    /// Start from previously saved process-lifetime stores.
    #[must_use]
    pub fn with_stores(mut self, channels: ChannelVisibilityStore, display: DisplayStateStore) -> Self {
        self.channels = channels;
        self.display = display;
        self
    }

    /// Start from a previously saved colour store.
    #[must_use]
    pub fn with_color_store(mut self, colors: ChannelColorStore) -> Self {
        self.colors = colors;
        self
    }

    /// Reconcile every store against a newly shown image.
    ///
    /// Channel flags are extended (never truncated), a colour palette for the
    /// channel count is looked up or created, the selection is clipped to the
    /// new bounds and the brightness profile for the image's class is looked
    /// up or created. Returns that profile.
    pub fn switch_image(&mut self, image: &Image) -> BrightnessProfile {
        let shape = image.shape();
        let dtype = image.dtype();
        debug!(
            "switching to {} ({shape}, {dtype})",
            image.source.as_deref().unwrap_or("<unnamed>")
        );
        self.channels.on_image_switch(shape.channels);
        self.colors.on_image_switch(shape.channels);
        self.selection.on_image_switch(shape.width, shape.height);
        self.active = Some(ActiveImage { shape, dtype });
        self.display.brightness_profile(dtype)
    }

    /// No image on screen; the selection goes with it.
    pub fn close_image(&mut self) {
        self.selection.clear();
        self.active = None;
    }

    pub fn open_analysis(&mut self) {
        self.analysis_open = true;
    }

    /// End the analysis session, discarding the selection and preferences.
    pub fn close_analysis(&mut self) {
        self.analysis_open = false;
        self.selection.clear();
        self.display.reset_analysis_preferences();
    }

    #[must_use]
    pub fn is_analysis_open(&self) -> bool {
        self.analysis_open
    }

    #[must_use]
    pub fn active_image(&self) -> Option<ActiveImage> {
        self.active
    }

    #[must_use]
    pub fn channels(&self) -> &ChannelVisibilityStore {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut ChannelVisibilityStore {
        &mut self.channels
    }

    #[must_use]
    pub fn colors(&self) -> &ChannelColorStore {
        &self.colors
    }

    pub fn colors_mut(&mut self) -> &mut ChannelColorStore {
        &mut self.colors
    }

    /// Colours of the active image's channels.
    #[must_use]
    pub fn active_colors(&self) -> Option<&[ChannelColor]> {
        let active = self.active?;
        self.colors.stored_colors(active.shape.channels)
    }

    #[must_use]
    pub fn display(&self) -> &DisplayStateStore {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut DisplayStateStore {
        &mut self.display
    }

    #[must_use]
    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionModel {
        &mut self.selection
    }

    #[must_use]
    pub fn zoom(&self) -> ZoomState {
        self.zoom
    }

    /// Zoom changes never touch the selection; only its projection moves.
    pub fn zoom_mut(&mut self) -> &mut ZoomState {
        &mut self.zoom
    }

    #[must_use]
    pub fn shift(&self) -> BitShift {
        self.shift
    }

    pub fn set_shift(&mut self, shift: BitShift) {
        self.shift = shift;
    }

    /// Mapper for the active image at the current zoom.
    #[must_use]
    pub fn mapper(&self) -> Option<CoordinateMapper> {
        self.active
            .map(|active| CoordinateMapper::new(self.zoom, active.shape.width, active.shape.height))
    }

    /// Pointer-down on the rendering surface. `None` without an image.
    pub fn pointer_down(&mut self, point: WidgetPoint) -> Option<DragHandle> {
        let mapper = self.mapper()?;
        Some(self.selection.begin_drag(point, &mapper))
    }

    pub fn pointer_move(&mut self, point: WidgetPoint) {
        if let Some(mapper) = self.mapper() {
            self.selection.update_drag(point, &mapper);
        }
    }

    pub fn pointer_up(&mut self) -> Option<ImageRect> {
        self.selection.end_drag()
    }

    /// Brightness and shift for images of class `dtype`.
    pub fn display_transform(&mut self, dtype: DtypeClass) -> DisplayTransform {
        DisplayTransform::new(self.display.brightness_profile(dtype), self.shift)
    }

    /// Render `image` the way it is shown on screen.
    pub fn displayed(&mut self, image: &Image) -> PixelBuffer {
        self.display_transform(image.dtype()).apply(&image.buffer)
    }

    /// Current ROI, or the whole active image when nothing is selected.
    #[must_use]
    pub fn roi(&self) -> Option<ImageRect> {
        let active = self.active?;
        Some(
            self.selection
                .rect()
                .unwrap_or_else(|| ImageRect::full(active.shape.width, active.shape.height)),
        )
    }

    /// Snapshot the displayed buffer, ROI and visible channels for `image`.
    ///
    /// Reconciles first if `image` is not the active one.
    pub fn analysis_view(&mut self, image: &Image) -> AnalysisView {
        let descriptor = ActiveImage {
            shape: image.shape(),
            dtype: image.dtype(),
        };
        if self.active != Some(descriptor) {
            self.switch_image(image);
        }
        let shape = descriptor.shape;
        let roi = self
            .selection
            .rect()
            .unwrap_or_else(|| ImageRect::full(shape.width, shape.height));
        AnalysisView {
            buffer: self.displayed(image),
            roi,
            visible: self.channels.visible_channels(shape.channels),
            colors: self.colors.colors(shape.channels).to_vec(),
            preferences: self.display.analysis_preferences(),
        }
    }
}
