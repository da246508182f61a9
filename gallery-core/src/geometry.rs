//! Rectangle and similarity-transform primitives used by the zoom engine.
//!
//! Everything here is a pure function over value types. Degenerate input
//! (empty rectangles, non-positive aspect ratios) is absorbed by clamping
//! instead of being reported.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(&self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Width over height, or `None` when either side is not a positive finite number.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let ratio = self.width / self.height;
        ratio.is_finite().then_some(ratio)
    }
}

/// Axis-aligned rectangle with `right >= left` and `bottom >= top`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    /// Builds a rectangle, swapping reversed edges so the invariant holds.
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn from_center(center: Point, width: f64, height: f64) -> Self {
        let half_w = width.abs() / 2.0;
        let half_h = height.abs() / 2.0;
        Self::new(
            center.x - half_w,
            center.y - half_h,
            center.x + half_w,
            center.y + half_h,
        )
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    pub fn center_x(&self) -> f64 {
        (self.left + self.right) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.center_x(), self.center_y())
    }

    pub fn is_empty(&self) -> bool {
        self.size().is_empty()
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Rect {
        Rect {
            left: self.left + dx,
            top: self.top + dy,
            right: self.right + dx,
            bottom: self.bottom + dy,
        }
    }

    /// Edge-wise linear interpolation, `fraction` 0 yields `self` and 1 yields `to`.
    pub fn lerp(&self, to: &Rect, fraction: f64) -> Rect {
        let mix = |a: f64, b: f64| a + (b - a) * fraction;
        Rect::new(
            mix(self.left, to.left),
            mix(self.top, to.top),
            mix(self.right, to.right),
            mix(self.bottom, to.bottom),
        )
    }

    pub fn approx_eq(&self, other: &Rect, epsilon: f64) -> bool {
        (self.left - other.left).abs() <= epsilon
            && (self.top - other.top).abs() <= epsilon
            && (self.right - other.right).abs() <= epsilon
            && (self.bottom - other.bottom).abs() <= epsilon
    }
}

/// Uniform scale plus translation, optionally anchored at a pivot.
///
/// Without a pivot the scale is applied about the centre of the rectangle
/// being transformed and the translation is expressed in pre-scale units,
/// which is how the live item transform is stored. With a pivot the scale is
/// applied about that point and the translation is in screen pixels; that
/// form is used for one-off incremental steps such as a pinch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pivot: Option<Point>,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        scale: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
        pivot: None,
    };

    pub fn new(scale: f64, translate_x: f64, translate_y: f64) -> Self {
        Self {
            scale,
            translate_x,
            translate_y,
            pivot: None,
        }
    }

    pub fn with_pivot(mut self, pivot: Point) -> Self {
        self.pivot = Some(pivot);
        self
    }

    pub fn is_identity(&self) -> bool {
        self.pivot.is_none()
            && self.scale == 1.0
            && self.translate_x == 0.0
            && self.translate_y == 0.0
    }

    pub fn approx_eq(&self, other: &Transform, epsilon: f64) -> bool {
        (self.scale - other.scale).abs() <= epsilon
            && (self.translate_x - other.translate_x).abs() <= epsilon
            && (self.translate_y - other.translate_y).abs() <= epsilon
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Non-negative distance each content edge sticks out past the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TranslateSpace {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

/// Largest rectangle of `aspect_ratio` centred inside `viewport`.
///
/// A non-positive or non-finite ratio means "no letterboxing" and returns the
/// viewport unchanged.
pub fn fit_center_rect(aspect_ratio: f64, viewport: Rect) -> Rect {
    if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) || viewport.is_empty() {
        return viewport;
    }
    let mut width = viewport.width();
    let mut height = viewport.height();
    if aspect_ratio > width / height {
        height = width / aspect_ratio;
    } else {
        width = height * aspect_ratio;
    }
    Rect::from_center(viewport.center(), width, height)
}

pub fn transformed_rect(rect: Rect, transform: &Transform) -> Rect {
    let scale = transform.scale;
    match transform.pivot {
        None => {
            let width = rect.width() * scale;
            let height = rect.height() * scale;
            let center = Point::new(
                rect.center_x() + transform.translate_x * scale,
                rect.center_y() + transform.translate_y * scale,
            );
            Rect::from_center(center, width, height)
        }
        Some(pivot) => {
            let left = pivot.x + (rect.left - pivot.x) * scale;
            let right = pivot.x + (rect.right - pivot.x) * scale;
            let top = pivot.y + (rect.top - pivot.y) * scale;
            let bottom = pivot.y + (rect.bottom - pivot.y) * scale;
            Rect::new(left, top, right, bottom).offset(transform.translate_x, transform.translate_y)
        }
    }
}

/// Solves for the pivot-less transform that maps `from` onto `to`.
///
/// The scale is taken from the widths (heights when `from` has no width); an
/// empty `from` yields a pure translation of the centres.
pub fn get_transform(from: Rect, to: Rect) -> Transform {
    let scale = if from.width() > 0.0 {
        to.width() / from.width()
    } else if from.height() > 0.0 {
        to.height() / from.height()
    } else {
        1.0
    };
    let scale = if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    };
    Transform::new(
        scale,
        (to.center_x() - from.center_x()) / scale,
        (to.center_y() - from.center_y()) / scale,
    )
}

/// Moves `rect` so that, per axis, it covers the viewport when it is larger
/// and is centred when it is smaller.
pub fn aligned_rect(rect: Rect, viewport: Rect) -> Rect {
    let dx = align_axis(rect.left, rect.right, viewport.left, viewport.right);
    let dy = align_axis(rect.top, rect.bottom, viewport.top, viewport.bottom);
    rect.offset(dx, dy)
}

fn align_axis(start: f64, end: f64, view_start: f64, view_end: f64) -> f64 {
    if end - start > view_end - view_start {
        if start > view_start {
            view_start - start
        } else if end < view_end {
            view_end - end
        } else {
            0.0
        }
    } else {
        (view_start + view_end) / 2.0 - (start + end) / 2.0
    }
}

pub fn available_translate_space(content: Rect, viewport: Rect) -> TranslateSpace {
    TranslateSpace {
        left: (viewport.left - content.left).max(0.0),
        right: (content.right - viewport.right).max(0.0),
        top: (viewport.top - content.top).max(0.0),
        bottom: (content.bottom - viewport.bottom).max(0.0),
    }
}
