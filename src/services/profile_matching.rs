//! Pure heuristics behind profile capture and restore
//!
//! Nothing here talks to the OS. Capture filters operate on a window list
//! that is already in layout space; restore matching operates on the
//! candidate windows of one application.

use crate::config::ProfileSettings;
use crate::macos::accessibility::{AXWindow, WindowListEntry};
use crate::models::geometry::{Rect, Size};
use crate::models::screen::{canonical_order, Screen};
use crate::models::window_profile::{MonitorSetup, PercentRect, ScreenInfo, WindowInfo};
use crate::services::window_resolver::WindowResolver;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchingConfig {
    pub min_window_size: f64,
    pub occlusion_threshold: f64,
    pub duplicate_overlap: f64,
    pub size_match_tolerance: f64,
    pub row_tolerance: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self::from(&ProfileSettings::default())
    }
}

impl From<&ProfileSettings> for MatchingConfig {
    fn from(settings: &ProfileSettings) -> Self {
        Self {
            min_window_size: settings.min_window_size,
            occlusion_threshold: settings.occlusion_threshold,
            duplicate_overlap: settings.duplicate_overlap,
            size_match_tolerance: settings.size_match_tolerance,
            row_tolerance: settings.row_tolerance,
        }
    }
}

/// Same-owner windows overlapping each other by more than `threshold` of
/// both areas; the OS sometimes reports one window twice
pub fn is_near_duplicate(a: &WindowListEntry, b: &WindowListEntry, threshold: f64) -> bool {
    if a.owner_pid != b.owner_pid {
        return false;
    }
    let overlap = a.bounds.overlap_area(&b.bounds);
    let smaller = a.bounds.area().min(b.bounds.area());
    smaller > 0.0 && overlap / a.bounds.area() > threshold && overlap / b.bounds.area() > threshold
}

/// Fraction of `windows[index]` covered by windows in front of it or on a
/// higher layer. `windows` is front to back.
pub fn occluded_fraction(
    windows: &[WindowListEntry],
    index: usize,
    resolver: &WindowResolver,
    config: &MatchingConfig,
) -> f64 {
    let candidate = &windows[index];
    let area = candidate.bounds.area();
    if area <= 0.0 {
        return 1.0;
    }

    let covered: f64 = windows
        .iter()
        .enumerate()
        .filter(|&(other_index, other)| {
            other_index != index
                && other.window_id != candidate.window_id
                && !resolver.is_system_owner(&other.owner_name)
                && !is_near_duplicate(candidate, other, config.duplicate_overlap)
                && (other_index < index || other.layer > candidate.layer)
        })
        .map(|(_, other)| candidate.bounds.overlap_area(&other.bounds))
        .sum();

    (covered / area).min(1.0)
}

/// Windows worth saving: manageable, large enough, not mostly hidden, and
/// only the largest one per application. Result stays front to back.
pub fn select_capture_windows<'a>(
    windows: &'a [WindowListEntry],
    resolver: &WindowResolver,
    config: &MatchingConfig,
) -> Vec<&'a WindowListEntry> {
    let survivors: Vec<&WindowListEntry> = windows
        .iter()
        .enumerate()
        .filter(|(_, w)| resolver.is_manageable(w))
        .filter(|(_, w)| w.bounds.width() >= config.min_window_size && w.bounds.height() >= config.min_window_size)
        .filter(|&(index, _)| occluded_fraction(windows, index, resolver, config) <= config.occlusion_threshold)
        .map(|(_, w)| w)
        .collect();

    let mut largest: HashMap<i32, &WindowListEntry> = HashMap::new();
    for window in &survivors {
        largest
            .entry(window.owner_pid)
            .and_modify(|best| {
                if window.bounds.area() > best.bounds.area() {
                    *best = window;
                }
            })
            .or_insert(window);
    }

    survivors
        .into_iter()
        .filter(|w| largest.get(&w.owner_pid).is_some_and(|best| best.window_id == w.window_id))
        .collect()
}

fn bounding_box(frames: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    frames.into_iter().reduce(|acc, frame| {
        let min_x = acc.min_x().min(frame.min_x());
        let min_y = acc.min_y().min(frame.min_y());
        let max_x = acc.max_x().max(frame.max_x());
        let max_y = acc.max_y().max(frame.max_y());
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    })
}

fn relative_position(frame: &Rect, desktop: &Rect) -> &'static str {
    let third = desktop.width() / 3.0;
    let center = frame.center().x;
    if center < desktop.min_x() + third {
        "left"
    } else if center > desktop.max_x() - third {
        "right"
    } else {
        "center"
    }
}

/// Snapshot of the live screens. Snapshot ids reuse the live display ids.
pub fn monitor_setup(screens: &[Screen]) -> MonitorSetup {
    let Some(desktop) = bounding_box(screens.iter().map(|s| s.frame)) else {
        return MonitorSetup::default();
    };

    let screens = screens
        .iter()
        .map(|screen| ScreenInfo {
            id: screen.id,
            frame: screen.frame,
            desktop_fraction: PercentRect::from_absolute(&screen.frame, &desktop),
            relative_position: if screens.len() == 1 {
                "center".to_string()
            } else {
                relative_position(&screen.frame, &desktop).to_string()
            },
            aspect_ratio: screen.frame.width() / screen.frame.height().max(1.0),
            is_primary: screen.is_primary,
        })
        .collect();
    MonitorSetup { screens }
}

/// Saved-screen id to index into `live`, by canonical position. When fewer
/// screens are live than were saved, the extra slots land on the last one.
pub fn map_screens(saved: &MonitorSetup, live: &[Screen], row_tolerance: f64) -> HashMap<u32, usize> {
    if live.is_empty() {
        return HashMap::new();
    }

    let saved_frames: Vec<Rect> = saved.screens.iter().map(|s| s.frame).collect();
    let live_frames: Vec<Rect> = live.iter().map(|s| s.frame).collect();
    let live_order = canonical_order(&live_frames, row_tolerance);

    canonical_order(&saved_frames, row_tolerance)
        .into_iter()
        .enumerate()
        .map(|(slot, saved_index)| {
            let live_index = live_order[slot.min(live_order.len() - 1)];
            (saved.screens[saved_index].id, live_index)
        })
        .collect()
}

/// How a live window was chosen for a saved entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReason {
    Title,
    Size,
    OnlyWindow,
    Largest,
}

fn within(actual: f64, expected: f64, tolerance: f64) -> bool {
    expected > 0.0 && ((actual - expected) / expected).abs() <= tolerance
}

/// Pick the live window best matching `saved`, whose absolute size on the
/// target screen would be `expected`. Returns an index into `candidates`.
pub fn match_window(
    saved: &WindowInfo,
    expected: Size,
    candidates: &[AXWindow],
    size_tolerance: f64,
) -> Option<(usize, MatchReason)> {
    if let Some(title) = saved.title.as_deref().filter(|t| !t.is_empty()) {
        if let Some(index) = candidates.iter().position(|w| w.title.as_deref() == Some(title)) {
            return Some((index, MatchReason::Title));
        }
    }

    let normal: Vec<usize> = (0..candidates.len()).filter(|&i| !candidates[i].is_minimized).collect();

    let size_match = normal
        .iter()
        .copied()
        .filter(|&i| {
            let frame = &candidates[i].frame;
            within(frame.width(), expected.width, size_tolerance)
                && within(frame.height(), expected.height, size_tolerance)
        })
        .min_by(|&a, &b| {
            let da = size_distance(&candidates[a].frame, expected);
            let db = size_distance(&candidates[b].frame, expected);
            da.total_cmp(&db)
        });
    if let Some(index) = size_match {
        return Some((index, MatchReason::Size));
    }

    if let [only] = normal.as_slice() {
        return Some((*only, MatchReason::OnlyWindow));
    }

    normal
        .into_iter()
        .max_by(|&a, &b| candidates[a].frame.area().total_cmp(&candidates[b].frame.area()))
        .map(|index| (index, MatchReason::Largest))
}

fn size_distance(frame: &Rect, expected: Size) -> f64 {
    (frame.width() - expected.width).abs() + (frame.height() - expected.height).abs()
}
