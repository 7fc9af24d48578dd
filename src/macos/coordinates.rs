//! Conversion between OS-native and layout coordinates
//!
//! The Accessibility API and Core Graphics event locations use a top-left
//! origin anchored to the primary display's top edge. Layout space puts the
//! origin at the primary display's bottom-left with y growing upwards. The
//! flip is always keyed to the primary display height, whichever screen the
//! window is on. Nothing outside the OS boundary may perform this flip.

use crate::models::geometry::{Point, Rect};

/// Flip a rectangle from OS-native space into layout space
pub fn native_to_layout(rect: Rect, primary_height: f64) -> Rect {
    Rect::new(
        rect.origin.x,
        primary_height - (rect.origin.y + rect.size.height),
        rect.size.width,
        rect.size.height,
    )
}

/// Flip a rectangle from layout space into OS-native space
pub fn layout_to_native(rect: Rect, primary_height: f64) -> Rect {
    // The flip is its own inverse.
    native_to_layout(rect, primary_height)
}

/// Flip a point (e.g. an event location) from OS-native space into layout space
pub fn native_point_to_layout(point: Point, primary_height: f64) -> Point {
    Point::new(point.x, primary_height - point.y)
}
