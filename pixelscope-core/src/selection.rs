//! Rectangular ROI selection: hit testing, drag state machine and nudging.
//!
//! The rectangle is kept in image space. Pointer input arrives in widget
//! space and is converted through a [`CoordinateMapper`]; grab zones are
//! measured in widget pixels so handles stay the same size at any zoom.

use log::debug;

use crate::coords::CoordinateMapper;
use crate::geometry::{ImagePoint, ImageRect, WidgetPoint};

/// One of the eight resize grab points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeHandle {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl ResizeHandle {
    /// Moves the left edge (`x0`).
    #[must_use]
    pub const fn moves_west(self) -> bool {
        matches!(self, Self::West | Self::NorthWest | Self::SouthWest)
    }

    /// Moves the right edge (`x1`).
    #[must_use]
    pub const fn moves_east(self) -> bool {
        matches!(self, Self::East | Self::NorthEast | Self::SouthEast)
    }

    /// Moves the top edge (`y0`).
    #[must_use]
    pub const fn moves_north(self) -> bool {
        matches!(self, Self::North | Self::NorthEast | Self::NorthWest)
    }

    /// Moves the bottom edge (`y1`).
    #[must_use]
    pub const fn moves_south(self) -> bool {
        matches!(self, Self::South | Self::SouthEast | Self::SouthWest)
    }
}

/// What a pointer-down grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragHandle {
    /// Outside the selection: draw a new rectangle.
    New,
    /// Inside the selection: translate it.
    Move,
    /// On a border grab zone: move the corresponding edge(s).
    Resize(ResizeHandle),
}

/// Observable state of the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Empty,
    Idle,
    Dragging(DragHandle),
}

/// Keyboard nudge granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NudgeStep {
    #[default]
    Fine,
    /// Modifier held.
    Coarse,
}

/// Tunables for selection interaction.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// Grab zone half-width around the border, in widget pixels.
    pub grab_margin: f64,
    /// Pixels per fine nudge.
    pub fine_step: usize,
    /// Pixels per coarse nudge.
    pub coarse_step: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            grab_margin: 8.0,
            fine_step: 1,
            coarse_step: 10,
        }
    }
}

impl SelectionConfig {
    /// Sets the grab margin in widget pixels.
    #[must_use]
    pub fn with_grab_margin(mut self, margin: f64) -> Self {
        self.grab_margin = margin;
        self
    }

    /// Sets the fine and coarse nudge steps.
    #[must_use]
    pub fn with_nudge_steps(mut self, fine: usize, coarse: usize) -> Self {
        self.fine_step = fine;
        self.coarse_step = coarse;
        self
    }
}

#[derive(Debug, Clone)]
struct DragSession {
    handle: DragHandle,
    start: ImagePoint,
    /// The rectangle as it was on pointer-down.
    original: Option<ImageRect>,
    moved: bool,
}

/// Owns the ROI rectangle for the current image.
#[derive(Debug, Clone)]
pub struct SelectionModel {
    config: SelectionConfig,
    width: usize,
    height: usize,
    rect: Option<ImageRect>,
    drag: Option<DragSession>,
}

impl SelectionModel {
    /// Empty selection over a `width × height` image.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_config(width, height, SelectionConfig::default())
    }

    #[must_use]
    pub fn with_config(width: usize, height: usize, config: SelectionConfig) -> Self {
        Self {
            config,
            width: width.max(1),
            height: height.max(1),
            rect: None,
            drag: None,
        }
    }

    /// Current rectangle, including an in-progress drag.
    #[must_use]
    pub fn rect(&self) -> Option<ImageRect> {
        self.rect
    }

    #[must_use]
    pub fn state(&self) -> SelectionState {
        match (&self.drag, self.rect) {
            (Some(drag), _) => SelectionState::Dragging(drag.handle),
            (None, Some(_)) => SelectionState::Idle,
            (None, None) => SelectionState::Empty,
        }
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Image dimensions `(width, height)` the selection is bounded by.
    #[must_use]
    pub fn image_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Classify a widget position against the current selection.
    #[must_use]
    pub fn hit_test(&self, point: WidgetPoint, mapper: &CoordinateMapper) -> DragHandle {
        let Some(rect) = self.rect else {
            return DragHandle::New;
        };
        let area = mapper.rect_to_widget(rect);

        // Keep an interior move zone on selections smaller than two margins.
        // The shrunken margin stays fractional so even a 1 px selection keeps
        // its middle third for moving.
        let mut margin = self.config.grab_margin;
        let min_dimension = area.width().min(area.height());
        if min_dimension < margin * 2.0 {
            margin = min_dimension / 3.0;
        }

        let near_left = (point.x - area.min.x).abs() <= margin;
        let near_right = (point.x - area.max.x).abs() <= margin;
        let near_top = (point.y - area.min.y).abs() <= margin;
        let near_bottom = (point.y - area.max.y).abs() <= margin;
        let within_x = point.x >= area.min.x && point.x <= area.max.x;
        let within_y = point.y >= area.min.y && point.y <= area.max.y;

        let handle = if near_left && near_top {
            Some(ResizeHandle::NorthWest)
        } else if near_right && near_top {
            Some(ResizeHandle::NorthEast)
        } else if near_left && near_bottom {
            Some(ResizeHandle::SouthWest)
        } else if near_right && near_bottom {
            Some(ResizeHandle::SouthEast)
        } else if near_left && within_y {
            Some(ResizeHandle::West)
        } else if near_right && within_y {
            Some(ResizeHandle::East)
        } else if near_top && within_x {
            Some(ResizeHandle::North)
        } else if near_bottom && within_x {
            Some(ResizeHandle::South)
        } else {
            None
        };

        match handle {
            Some(handle) => DragHandle::Resize(handle),
            None if area.contains(point) => DragHandle::Move,
            None => DragHandle::New,
        }
    }

    /// Pointer-down: pick a handle and enter the dragging state.
    pub fn begin_drag(&mut self, point: WidgetPoint, mapper: &CoordinateMapper) -> DragHandle {
        let handle = self.hit_test(point, mapper);
        let start = self.clamp_point(mapper.to_image_space(point));
        let original = self.rect;
        if handle == DragHandle::New {
            self.rect = Some(ImageRect::spanning(start, start));
        }
        self.drag = Some(DragSession {
            handle,
            start,
            original,
            moved: false,
        });
        handle
    }

    /// Pointer-move while dragging. Ignored when no drag is active.
    pub fn update_drag(&mut self, point: WidgetPoint, mapper: &CoordinateMapper) {
        let current = self.clamp_point(mapper.to_image_space(point));
        let (width, height) = (self.width, self.height);
        let Some(drag) = &mut self.drag else {
            return;
        };
        if current != drag.start {
            drag.moved = true;
        }

        // Deltas are measured from the drag start so sub-pixel motion
        // never accumulates rounding error.
        let next = match (drag.handle, drag.original) {
            (DragHandle::New, _) | (_, None) => Some(ImageRect::spanning(drag.start, current)),
            (DragHandle::Move, Some(original)) => {
                let dx = signed_delta(drag.start.x, current.x);
                let dy = signed_delta(drag.start.y, current.y);
                Some(original.translated_within(dx, dy, width, height))
            }
            (DragHandle::Resize(handle), Some(original)) => {
                Some(resize_edges(original, handle, current, width, height))
            }
        };
        self.rect = next;
    }

    /// Pointer-up: commit the rectangle.
    ///
    /// A new-rectangle drag that never left its anchor pixel clears the
    /// selection instead.
    pub fn end_drag(&mut self) -> Option<ImageRect> {
        let Some(drag) = self.drag.take() else {
            return self.rect;
        };
        if drag.handle == DragHandle::New && !drag.moved {
            debug!("degenerate drag at ({}, {}), clearing selection", drag.start.x, drag.start.y);
            self.rect = None;
        } else if let Some(rect) = self.rect {
            debug!("selection committed: {rect}");
        }
        self.rect
    }

    /// Abort a drag and restore the rectangle from before pointer-down.
    pub fn cancel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            self.rect = drag.original;
        }
    }

    /// Keyboard move by `(dx, dy)` steps, clamped like a drag-move.
    pub fn nudge(&mut self, dx: i32, dy: i32, step: NudgeStep) -> Option<ImageRect> {
        let rect = self.rect?;
        if self.drag.is_some() {
            return Some(rect);
        }
        let pixels = match step {
            NudgeStep::Fine => self.config.fine_step,
            NudgeStep::Coarse => self.config.coarse_step,
        };
        let pixels = i64::try_from(pixels).unwrap_or(i64::MAX);
        let moved = rect.translated_within(
            i64::from(dx).saturating_mul(pixels),
            i64::from(dy).saturating_mul(pixels),
            self.width,
            self.height,
        );
        self.rect = Some(moved);
        self.rect
    }

    /// Select the whole image.
    pub fn select_all(&mut self) -> ImageRect {
        self.drag = None;
        let rect = ImageRect::full(self.width, self.height);
        self.rect = Some(rect);
        rect
    }

    /// Set the rectangle directly (e.g. from numeric entry); clipped to bounds.
    pub fn set_rect(&mut self, rect: ImageRect) -> ImageRect {
        self.drag = None;
        let clipped = rect.clipped_to(self.width, self.height);
        self.rect = Some(clipped);
        clipped
    }

    /// Deselect.
    pub fn clear(&mut self) {
        self.drag = None;
        self.rect = None;
    }

    /// Rebind to a new image size, clipping (never expanding) the rectangle.
    pub fn on_image_switch(&mut self, width: usize, height: usize) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.drag = None;
        if let Some(rect) = self.rect {
            let clipped = rect.clipped_to(self.width, self.height);
            if clipped != rect {
                debug!("selection {rect} clipped to {clipped} for {width}x{height} image");
            }
            self.rect = Some(clipped);
        }
    }

    fn clamp_point(&self, point: ImagePoint) -> ImagePoint {
        ImagePoint::new(point.x.min(self.width - 1), point.y.min(self.height - 1))
    }
}

#[allow(clippy::cast_possible_wrap)]
fn signed_delta(from: usize, to: usize) -> i64 {
    to as i64 - from as i64
}

/// Move only the grabbed edges; each stops one pixel short of its opposite.
fn resize_edges(
    original: ImageRect,
    handle: ResizeHandle,
    current: ImagePoint,
    width: usize,
    height: usize,
) -> ImageRect {
    let mut x0 = original.x0();
    let mut y0 = original.y0();
    let mut x1 = original.x1();
    let mut y1 = original.y1();

    if handle.moves_west() {
        x0 = current.x.min(original.x1() - 1);
    } else if handle.moves_east() {
        x1 = (current.x + 1).clamp(original.x0() + 1, width.max(original.x0() + 1));
    }
    if handle.moves_north() {
        y0 = current.y.min(original.y1() - 1);
    } else if handle.moves_south() {
        y1 = (current.y + 1).clamp(original.y0() + 1, height.max(original.y0() + 1));
    }

    ImageRect::new(x0, y0, x1, y1).unwrap_or(original)
}
