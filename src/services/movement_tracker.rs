//! Keeps tiled windows tiled across display changes
//!
//! Every successful placement is recorded with its direction. When the screen
//! topology changes (display added or removed, Dock or menu bar shown or
//! hidden) each tracked window is re-snapped to where its direction now puts
//! it, unless it has drifted so far that the user evidently moved it.

use crate::macos::accessibility::WindowId;
use crate::models::direction::Direction;
use crate::models::geometry::Rect;
use crate::models::screen::screen_for_rect;
use crate::services::animation::AnimationEngine;
use crate::services::frame_accessor::WindowFrameAccessor;
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementEntry {
    pub direction: Direction,
    /// Last frame we placed the window at, layout space
    pub frame: Rect,
}

/// Outcome of reconciling tracked windows after a topology change
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TrackerReport {
    pub resnapped: Vec<WindowId>,
    /// Windows dropped because they closed or were moved by hand
    pub forgotten: Vec<WindowId>,
}

#[derive(Debug)]
pub struct MovementTracker {
    tolerance: f64,
    entries: HashMap<WindowId, MovementEntry>,
}

impl MovementTracker {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            entries: HashMap::new(),
        }
    }

    /// Record `direction` for `window_id` using its live frame
    pub fn record(&mut self, accessor: &WindowFrameAccessor, window_id: WindowId, direction: Direction) {
        if let Some(frame) = accessor.frame_of(window_id) {
            self.record_frame(window_id, direction, frame);
        }
    }

    /// Record `direction` with a known frame, e.g. the target of an
    /// animation still in flight
    pub fn record_frame(&mut self, window_id: WindowId, direction: Direction, frame: Rect) {
        debug!(window_id, %direction, "Tracking placement");
        self.entries.insert(window_id, MovementEntry { direction, frame });
    }

    pub fn entry(&self, window_id: WindowId) -> Option<&MovementEntry> {
        self.entries.get(&window_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-snap every tracked window to its direction's rectangle on the
    /// screen that now holds it. Windows still animating are judged by where
    /// they are headed and have their animation re-targeted.
    pub fn screen_parameters_changed(
        &mut self,
        accessor: &WindowFrameAccessor,
        animation: &mut AnimationEngine,
    ) -> TrackerReport {
        let screens = accessor.screens();
        let mut report = TrackerReport::default();

        let mut ids: Vec<WindowId> = self.entries.keys().copied().collect();
        ids.sort_unstable();

        for window_id in ids {
            let Some(entry) = self.entries.get(&window_id).copied() else {
                continue;
            };

            let Some(live) = accessor.frame_of(window_id) else {
                debug!(window_id, "Tracked window is gone");
                animation.cancel(window_id);
                self.entries.remove(&window_id);
                report.forgotten.push(window_id);
                continue;
            };
            let in_flight = animation.pending_target(window_id);
            let current = in_flight.unwrap_or(live);

            let Some(screen) = screen_for_rect(&screens, &current) else {
                self.entries.remove(&window_id);
                report.forgotten.push(window_id);
                continue;
            };

            let target = entry.direction.target_rect(&screen.visible_frame);
            if !current.approx_eq(&target, self.tolerance) {
                debug!(
                    window_id,
                    drift = current.max_edge_delta(&target),
                    "Window moved by hand, no longer tracking"
                );
                self.entries.remove(&window_id);
                report.forgotten.push(window_id);
                continue;
            }

            let placed = if in_flight.is_some() {
                animation.retarget(window_id, target)
            } else {
                accessor.set_frame(window_id, target)
            };
            if placed {
                self.entries.insert(
                    window_id,
                    MovementEntry {
                        direction: entry.direction,
                        frame: target,
                    },
                );
                report.resnapped.push(window_id);
            } else {
                self.entries.remove(&window_id);
                report.forgotten.push(window_id);
            }
        }

        if !report.resnapped.is_empty() || !report.forgotten.is_empty() {
            info!(
                resnapped = report.resnapped.len(),
                forgotten = report.forgotten.len(),
                "Reconciled tracked windows after display change"
            );
        }
        report
    }
}
