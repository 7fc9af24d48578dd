//! Layout-space geometry primitives
//!
//! Every rectangle in this module lives in layout space: origin at the
//! bottom-left of the primary display, y growing upwards. Conversion to the
//! top-left-origin coordinates used by the Accessibility API happens only in
//! [`crate::macos::coordinates`].

use serde::{Deserialize, Serialize};

/// Two-dimensional point used for cursor and window positions
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Window or screen size in display points
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn min_x(&self) -> f64 {
        self.origin.x
    }

    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.width
    }

    pub fn min_y(&self) -> f64 {
        self.origin.y
    }

    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.height
    }

    pub fn width(&self) -> f64 {
        self.size.width
    }

    pub fn height(&self) -> f64 {
        self.size.height
    }

    pub fn area(&self) -> f64 {
        self.size.area()
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.size.width <= 0.0 || self.size.height <= 0.0
    }

    /// Half-open containment: the max edges are excluded so adjacent screens
    /// never both claim a point on their shared border.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x()
            && point.x < self.max_x()
            && point.y >= self.min_y()
            && point.y < self.max_y()
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.min_x().max(other.min_x());
        let y0 = self.min_y().max(other.min_y());
        let x1 = self.max_x().min(other.max_x());
        let y1 = self.max_y().min(other.max_y());

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
    }

    pub fn overlap_area(&self, other: &Rect) -> f64 {
        self.intersection(other).map_or(0.0, |r| r.area())
    }

    /// Every edge of `self` lies within `tolerance` of the matching edge of `other`
    pub fn approx_eq(&self, other: &Rect, tolerance: f64) -> bool {
        (self.min_x() - other.min_x()).abs() <= tolerance
            && (self.max_x() - other.max_x()).abs() <= tolerance
            && (self.min_y() - other.min_y()).abs() <= tolerance
            && (self.max_y() - other.max_y()).abs() <= tolerance
    }

    /// Largest per-edge deviation between two rectangles
    pub fn max_edge_delta(&self, other: &Rect) -> f64 {
        [
            (self.min_x() - other.min_x()).abs(),
            (self.max_x() - other.max_x()).abs(),
            (self.min_y() - other.min_y()).abs(),
            (self.max_y() - other.max_y()).abs(),
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.origin.x + dx, self.origin.y + dy, self.size.width, self.size.height)
    }

    pub fn rounded(&self) -> Rect {
        Rect::new(
            self.origin.x.round(),
            self.origin.y.round(),
            self.size.width.round(),
            self.size.height.round(),
        )
    }
}
