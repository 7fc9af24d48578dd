use crate::models::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A connected display in layout space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    /// Display identifier reported by the OS; not stable across restarts
    pub id: u32,
    /// Full display bounds
    pub frame: Rect,
    /// Bounds excluding the menu bar and dock
    pub visible_frame: Rect,
    pub is_primary: bool,
}

impl Screen {
    pub fn new(id: u32, frame: Rect, visible_frame: Rect, is_primary: bool) -> Self {
        Self {
            id,
            frame,
            visible_frame,
            is_primary,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        self.frame.contains(point)
    }
}

/// Cycling order: left-to-right, then top-to-bottom for screens sharing an x origin.
pub fn cycling_order(a: &Screen, b: &Screen) -> Ordering {
    a.frame
        .min_x()
        .total_cmp(&b.frame.min_x())
        .then_with(|| b.frame.max_y().total_cmp(&a.frame.max_y()))
}

pub fn sort_for_cycling(screens: &mut [Screen]) {
    screens.sort_by(cycling_order);
}

/// The primary screen, falling back to the first one listed
pub fn primary_screen(screens: &[Screen]) -> Option<&Screen> {
    screens.iter().find(|s| s.is_primary).or_else(|| screens.first())
}

/// Screen containing a point, if any
pub fn screen_at(screens: &[Screen], point: Point) -> Option<&Screen> {
    screens.iter().find(|s| s.contains(point))
}

/// Screen owning a rectangle: the one containing its centre, otherwise the one
/// with the largest overlap.
pub fn screen_for_rect<'a>(screens: &'a [Screen], rect: &Rect) -> Option<&'a Screen> {
    if let Some(screen) = screen_at(screens, rect.center()) {
        return Some(screen);
    }

    screens
        .iter()
        .map(|s| (s, s.frame.overlap_area(rect)))
        .filter(|(_, overlap)| *overlap > 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(s, _)| s)
}

/// Canonical positional order used to line saved screens up against live
/// ones: rows from top to bottom (tops within `row_tolerance` share a row),
/// then left to right inside each row. Returns indices into `frames`.
pub fn canonical_order(frames: &[Rect], row_tolerance: f64) -> Vec<usize> {
    let mut by_top: Vec<usize> = (0..frames.len()).collect();
    by_top.sort_by(|&a, &b| frames[b].max_y().total_cmp(&frames[a].max_y()));

    let mut rows: Vec<Vec<usize>> = Vec::new();
    let mut row_top = f64::NAN;
    for index in by_top {
        let top = frames[index].max_y();
        match rows.last_mut() {
            Some(row) if (row_top - top).abs() <= row_tolerance => row.push(index),
            _ => {
                rows.push(vec![index]);
                row_top = top;
            }
        }
    }

    rows.into_iter()
        .flat_map(|mut row| {
            row.sort_by(|&a, &b| frames[a].min_x().total_cmp(&frames[b].min_x()));
            row
        })
        .collect()
}
