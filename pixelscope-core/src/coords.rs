//! Conversion between widget pixels and image pixels.
//!
//! Selections are stored in image space, which does not change with zoom.
//! Only their projection onto the widget is recomputed when the scale or the
//! viewport origin moves.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::{ImagePoint, ImageRect, WidgetPoint, WidgetRect};

/// Smallest supported zoom factor (1/32x).
pub const MIN_ZOOM_SCALE: f64 = 1.0 / 32.0;
/// Largest supported zoom factor (128x).
pub const MAX_ZOOM_SCALE: f64 = 128.0;

/// Zoom factor plus the image-space position shown at the widget origin.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ZoomState {
    scale: f64,
    /// Image-space coordinate displayed at widget `(0, 0)`.
    pub origin_x: f64,
    pub origin_y: f64,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            origin_x: 0.0,
            origin_y: 0.0,
        }
    }
}

impl ZoomState {
    /// Create a zoom state; the scale is clamped to the supported range.
    #[must_use]
    pub fn new(scale: f64, origin_x: f64, origin_y: f64) -> Self {
        Self {
            scale: clamp_scale(scale),
            origin_x,
            origin_y,
        }
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Set the scale, leaving the origin alone.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = clamp_scale(scale);
    }

    /// Set the scale while keeping the image point under `anchor` fixed.
    pub fn set_scale_at(&mut self, scale: f64, anchor: WidgetPoint) {
        let image_x = anchor.x / self.scale + self.origin_x;
        let image_y = anchor.y / self.scale + self.origin_y;
        self.scale = clamp_scale(scale);
        self.origin_x = image_x - anchor.x / self.scale;
        self.origin_y = image_y - anchor.y / self.scale;
    }

    /// Double the scale around `anchor`.
    pub fn zoom_in_at(&mut self, anchor: WidgetPoint) {
        self.set_scale_at(self.scale * 2.0, anchor);
    }

    /// Halve the scale around `anchor`.
    pub fn zoom_out_at(&mut self, anchor: WidgetPoint) {
        self.set_scale_at(self.scale * 0.5, anchor);
    }

    /// Largest scale at which the whole image fits the viewport.
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(&mut self, viewport_width: f64, viewport_height: f64, width: usize, height: usize) {
        let image_w = width.max(1) as f64;
        let image_h = height.max(1) as f64;
        self.scale = clamp_scale((viewport_width / image_w).min(viewport_height / image_h));
        self.origin_x = 0.0;
        self.origin_y = 0.0;
    }

    /// Scroll by a widget-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.origin_x -= dx / self.scale;
        self.origin_y -= dy / self.scale;
    }
}

fn clamp_scale(scale: f64) -> f64 {
    if scale.is_finite() {
        scale.clamp(MIN_ZOOM_SCALE, MAX_ZOOM_SCALE)
    } else {
        1.0
    }
}

/// Maps points between the rendering surface and a `width × height` image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    zoom: ZoomState,
    width: usize,
    height: usize,
}

impl CoordinateMapper {
    #[must_use]
    pub fn new(zoom: ZoomState, width: usize, height: usize) -> Self {
        Self {
            zoom,
            width: width.max(1),
            height: height.max(1),
        }
    }

    #[must_use]
    pub fn zoom(&self) -> ZoomState {
        self.zoom
    }

    /// Image dimensions `(width, height)`.
    #[must_use]
    pub fn image_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Continuous image-space position, without snapping or clamping.
    #[must_use]
    pub fn to_image_continuous(&self, point: WidgetPoint) -> (f64, f64) {
        (
            point.x / self.zoom.scale + self.zoom.origin_x,
            point.y / self.zoom.scale + self.zoom.origin_y,
        )
    }

    /// The pixel under a widget position, clamped to the image.
    ///
    /// Snapping happens at the current zoom level: the continuous position
    /// is floored to the pixel grid.
    #[must_use]
    pub fn to_image_space(&self, point: WidgetPoint) -> ImagePoint {
        let (x, y) = self.to_image_continuous(point);
        ImagePoint::new(snap(x, self.width), snap(y, self.height))
    }

    /// Top-left corner of an image pixel on the widget.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_widget_space(&self, point: ImagePoint) -> WidgetPoint {
        self.edge_to_widget(point.x as f64, point.y as f64)
    }

    /// Widget rectangle covering the given pixels, for overlay drawing.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn rect_to_widget(&self, rect: ImageRect) -> WidgetRect {
        WidgetRect {
            min: self.edge_to_widget(rect.x0() as f64, rect.y0() as f64),
            max: self.edge_to_widget(rect.x1() as f64, rect.y1() as f64),
        }
    }

    fn edge_to_widget(&self, x: f64, y: f64) -> WidgetPoint {
        WidgetPoint::new(
            (x - self.zoom.origin_x) * self.zoom.scale,
            (y - self.zoom.origin_y) * self.zoom.scale,
        )
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn snap(value: f64, extent: usize) -> usize {
    // NaN and negatives land on 0; +inf saturates and is clamped below.
    let floored = value.floor().max(0.0) as usize;
    floored.min(extent - 1)
}
