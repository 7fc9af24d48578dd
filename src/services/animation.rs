//! Animated frame transitions
//!
//! The engine holds at most one task per window and is advanced explicitly
//! through [`AnimationEngine::tick`], so tests can drive it with synthetic
//! instants instead of wall-clock timers.

use crate::config::AnimationSettings;
use crate::macos::accessibility::WindowId;
use crate::models::geometry::{Point, Rect};
use crate::services::frame_accessor::WindowFrameAccessor;
use crate::ui::overlay::HighlightOverlay;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Height of the late overshoot added to placement easing
const BOUNCE_AMPLITUDE: f64 = 0.04;
/// Progress after which the overshoot starts
const BOUNCE_START: f64 = 0.7;
/// Perpendicular bow as a fraction of the travelled distance
const BOW_FACTOR: f64 = 0.08;

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationConfig {
    pub enabled: bool,
    pub duration: Duration,
    pub bounce: bool,
    pub curved_path: bool,
    pub tolerance: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self::from(&AnimationSettings::default())
    }
}

impl From<&AnimationSettings> for AnimationConfig {
    fn from(settings: &AnimationSettings) -> Self {
        Self {
            enabled: settings.enabled,
            duration: settings.duration(),
            bounce: settings.bounce,
            curved_path: settings.curved_path,
            tolerance: settings.tolerance,
        }
    }
}

/// How a transition should look
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStyle {
    /// Tile placement: optional bounce and curved path, pulse on completion
    Placement,
    /// Straight ease-out
    Plain,
}

/// Result of an [`AnimationEngine::animate`] request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimateOutcome {
    /// Written immediately (animations off or the change was negligible)
    Applied,
    /// A task was scheduled
    Started,
    /// The window could not be read or written
    Failed,
}

pub fn ease_out_cubic(t: f64) -> f64 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

/// Ease-out with a small decaying overshoot near the end. Returns exactly 1.0
/// at `t == 1.0`.
pub fn ease_out_bounce(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    let base = ease_out_cubic(t);
    if t <= BOUNCE_START {
        return base;
    }
    let late = (t - BOUNCE_START) / (1.0 - BOUNCE_START);
    base + BOUNCE_AMPLITUDE * (late * PI).sin() * (1.0 - late)
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

#[derive(Debug, Clone)]
struct AnimationTask {
    from: Rect,
    to: Rect,
    started_at: Instant,
    duration: Duration,
    style: AnimationStyle,
}

impl AnimationTask {
    fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    fn frame_at(&self, progress: f64, config: &AnimationConfig) -> Rect {
        let placement = self.style == AnimationStyle::Placement;
        let eased = if placement && config.bounce {
            ease_out_bounce(progress)
        } else {
            ease_out_cubic(progress)
        };

        let mut origin = Point::new(
            lerp(self.from.origin.x, self.to.origin.x, eased),
            lerp(self.from.origin.y, self.to.origin.y, eased),
        );

        if placement && config.curved_path {
            let dx = self.to.origin.x - self.from.origin.x;
            let dy = self.to.origin.y - self.from.origin.y;
            let distance = dx.hypot(dy);
            if distance > 0.0 {
                let bow = distance * BOW_FACTOR * (PI * progress).sin();
                origin.x += -dy / distance * bow;
                origin.y += dx / distance * bow;
            }
        }

        Rect::new(
            origin.x,
            origin.y,
            lerp(self.from.width(), self.to.width(), eased).max(0.0),
            lerp(self.from.height(), self.to.height(), eased).max(0.0),
        )
    }
}

#[derive(Debug)]
pub struct AnimationEngine {
    config: AnimationConfig,
    tasks: HashMap<WindowId, AnimationTask>,
}

impl AnimationEngine {
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config,
            tasks: HashMap::new(),
        }
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Move `window_id` towards `to`, starting from its live frame. Any task
    /// already running for the window is replaced.
    pub fn animate(
        &mut self,
        accessor: &WindowFrameAccessor,
        window_id: WindowId,
        to: Rect,
        style: AnimationStyle,
        now: Instant,
    ) -> AnimateOutcome {
        self.tasks.remove(&window_id);

        let Some(from) = accessor.frame_of(window_id) else {
            return AnimateOutcome::Failed;
        };

        if !self.config.enabled || from.approx_eq(&to, self.config.tolerance) {
            return if accessor.set_frame(window_id, to) {
                AnimateOutcome::Applied
            } else {
                AnimateOutcome::Failed
            };
        }

        debug!(window_id, ?from, ?to, ?style, "Animation started");
        self.tasks.insert(
            window_id,
            AnimationTask {
                from,
                to,
                started_at: now,
                duration: self.config.duration,
                style,
            },
        );
        AnimateOutcome::Started
    }

    /// Advance every task to `now`, writing one frame per window. Finished
    /// tasks snap to their target and are removed. Returns the windows that
    /// finished during this tick.
    pub fn tick(
        &mut self,
        accessor: &WindowFrameAccessor,
        overlay: &dyn HighlightOverlay,
        now: Instant,
    ) -> Vec<WindowId> {
        let mut finished = Vec::new();
        let mut dropped = Vec::new();

        for (&window_id, task) in &self.tasks {
            let progress = task.progress(now);
            if progress >= 1.0 {
                if accessor.set_frame(window_id, task.to) {
                    if task.style == AnimationStyle::Placement {
                        overlay.pulse(task.to);
                    }
                    finished.push(window_id);
                } else {
                    dropped.push(window_id);
                }
                continue;
            }

            let frame = task.frame_at(progress, &self.config);
            trace!(window_id, progress, ?frame, "Animation frame");
            if !accessor.set_frame(window_id, frame) {
                dropped.push(window_id);
            }
        }

        for window_id in finished.iter().chain(dropped.iter()) {
            self.tasks.remove(window_id);
        }
        if !dropped.is_empty() {
            debug!(?dropped, "Animations dropped after failed writes");
        }
        finished
    }

    /// Point a running task at a new target, keeping its progress. Returns
    /// false when nothing is animating for `window_id`.
    pub fn retarget(&mut self, window_id: WindowId, to: Rect) -> bool {
        match self.tasks.get_mut(&window_id) {
            Some(task) => {
                task.to = to;
                true
            }
            None => false,
        }
    }

    pub fn cancel(&mut self, window_id: WindowId) {
        self.tasks.remove(&window_id);
    }

    /// Target of the task in flight for `window_id`
    pub fn pending_target(&self, window_id: WindowId) -> Option<Rect> {
        self.tasks.get(&window_id).map(|task| task.to)
    }

    pub fn is_animating(&self, window_id: WindowId) -> bool {
        self.tasks.contains_key(&window_id)
    }

    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }
}
