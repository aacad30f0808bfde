//! Points and rectangles in image and widget space.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pixel coordinate in image space (column, row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImagePoint {
    /// X coordinate (column).
    pub x: usize,
    /// Y coordinate (row).
    pub y: usize,
}

impl ImagePoint {
    /// Creates a new image point.
    #[inline]
    #[must_use]
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Position on the rendering surface, in widget pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WidgetPoint {
    pub x: f64,
    pub y: f64,
}

impl WidgetPoint {
    /// Creates a new widget point.
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in widget space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WidgetRect {
    pub min: WidgetPoint,
    pub max: WidgetPoint,
}

impl WidgetRect {
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Whether the point lies inside or on the border.
    #[must_use]
    pub fn contains(&self, point: WidgetPoint) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

/// Half-open pixel rectangle `[x0, x1) × [y0, y1)` in image space.
///
/// A constructed rectangle always has `x0 < x1` and `y0 < y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImageRect {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
}

impl ImageRect {
    /// Create a rectangle from its corners; `None` if it has no area.
    #[must_use]
    pub fn new(x0: usize, y0: usize, x1: usize, y1: usize) -> Option<Self> {
        (x0 < x1 && y0 < y1).then_some(Self { x0, y0, x1, y1 })
    }

    /// Create a rectangle from an origin and a size; `None` if it has no area.
    #[must_use]
    pub fn from_origin_size(x: usize, y: usize, width: usize, height: usize) -> Option<Self> {
        Self::new(x, y, x.saturating_add(width), y.saturating_add(height))
    }

    /// The full extent of a `width × height` image (at least 1×1).
    #[must_use]
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width.max(1),
            y1: height.max(1),
        }
    }

    /// Smallest rectangle covering both pixels (inclusive).
    #[must_use]
    pub fn spanning(a: ImagePoint, b: ImagePoint) -> Self {
        Self {
            x0: a.x.min(b.x),
            y0: a.y.min(b.y),
            x1: a.x.max(b.x) + 1,
            y1: a.y.max(b.y) + 1,
        }
    }

    #[inline]
    #[must_use]
    pub fn x0(&self) -> usize {
        self.x0
    }

    #[inline]
    #[must_use]
    pub fn y0(&self) -> usize {
        self.y0
    }

    #[inline]
    #[must_use]
    pub fn x1(&self) -> usize {
        self.x1
    }

    #[inline]
    #[must_use]
    pub fn y1(&self) -> usize {
        self.y1
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.x1 - self.x0
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.y1 - self.y0
    }

    /// Number of pixels covered.
    #[must_use]
    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    /// Whether the pixel lies inside the rectangle.
    #[must_use]
    pub fn contains(&self, point: ImagePoint) -> bool {
        point.x >= self.x0 && point.x < self.x1 && point.y >= self.y0 && point.y < self.y1
    }

    /// Whether the rectangle lies entirely within a `width × height` image.
    #[must_use]
    pub fn fits_within(&self, width: usize, height: usize) -> bool {
        self.x1 <= width && self.y1 <= height
    }

    /// Clip to a `width × height` image.
    ///
    /// The result is never larger than `self` and never empty: a rectangle
    /// lying wholly outside the bounds collapses onto the nearest edge pixel.
    #[must_use]
    pub fn clipped_to(&self, width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let x0 = self.x0.min(width - 1);
        let y0 = self.y0.min(height - 1);
        Self {
            x0,
            y0,
            x1: self.x1.min(width).max(x0 + 1),
            y1: self.y1.min(height).max(y0 + 1),
        }
    }

    /// Translate by a signed offset, truncating at the image boundary.
    ///
    /// The size is preserved when it fits; otherwise the rectangle is clipped
    /// first.
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn translated_within(&self, dx: i64, dy: i64, width: usize, height: usize) -> Self {
        let base = self.clipped_to(width, height);
        let w = base.width();
        let h = base.height();
        let max_x0 = (width.max(1) - w) as i64;
        let max_y0 = (height.max(1) - h) as i64;
        let x0 = (base.x0 as i64 + dx).clamp(0, max_x0) as usize;
        let y0 = (base.y0 as i64 + dy).clamp(0, max_y0) as usize;
        Self {
            x0,
            y0,
            x1: x0 + w,
            y1: y0 + h,
        }
    }
}

impl std::fmt::Display for ImageRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}) {}x{}",
            self.x0,
            self.y0,
            self.width(),
            self.height()
        )
    }
}
