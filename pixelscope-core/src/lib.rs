//! pixelscope-core: Core types for interactive image inspection.
//!
//! This crate provides the image model, widget/image coordinate mapping,
//! the ROI selection state machine and the display state that is carried
//! across image switches.
//!

pub mod channels;
pub mod colors;
pub mod coords;
pub mod display;
pub mod error;
pub mod geometry;
pub mod image;
pub mod selection;
pub mod session;

pub use channels::ChannelVisibilityStore;
pub use colors::{default_channel_colors, ChannelColor, ChannelColorStore, DualMode, MonoMode};
pub use coords::{CoordinateMapper, ZoomState, MAX_ZOOM_SCALE, MIN_ZOOM_SCALE};
pub use display::{
    AnalysisPreferences, BitShift, BrightnessProfile, CoordinateMode, DisplayStateStore,
    DisplayTransform, HistogramScale, PreferencesUpdate, ProfileOrientation,
};
pub use error::{Error, Result};
pub use geometry::{ImagePoint, ImageRect, WidgetPoint, WidgetRect};
pub use image::{DtypeClass, Image, ImageShape, PixelBuffer};
pub use selection::{
    DragHandle, NudgeStep, ResizeHandle, SelectionConfig, SelectionModel, SelectionState,
};
pub use session::{ActiveImage, AnalysisView, ViewerSession};
