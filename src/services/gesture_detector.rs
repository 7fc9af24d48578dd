//! Mouse flick recognition
//!
//! The detector is armed at a cursor position and then fed every mouse-move
//! sample. It commits to a compass direction exactly once per gesture.

use crate::config::GestureSettings;
use crate::models::direction::Direction;
use crate::models::geometry::Point;
use crate::models::screen::{screen_at, Screen};
use std::time::{Duration, Instant};
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    pub dead_zone_radius: f64,
    pub edge_threshold: f64,
    pub time_limit: Duration,
    pub min_distance: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self::from(&GestureSettings::default())
    }
}

impl From<&GestureSettings> for GestureConfig {
    fn from(settings: &GestureSettings) -> Self {
        Self {
            dead_zone_radius: settings.dead_zone_radius,
            edge_threshold: settings.edge_threshold,
            time_limit: settings.time_limit(),
            min_distance: settings.min_distance,
        }
    }
}

/// Why a gesture committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureTrigger {
    DeadZone,
    ScreenEdge,
    SlowNudge,
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    origin: Point,
    started_at: Instant,
}

#[derive(Debug)]
pub struct GestureDetector {
    config: GestureConfig,
    armed: Option<Armed>,
}

impl GestureDetector {
    pub fn new(config: GestureConfig) -> Self {
        Self { config, armed: None }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Start a new gesture at `origin`
    pub fn reset(&mut self, origin: Point, now: Instant) {
        self.armed = Some(Armed {
            origin,
            started_at: now,
        });
    }

    pub fn disarm(&mut self) {
        self.armed = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Feed one cursor sample. Returns a direction at most once per gesture;
    /// the detector disarms itself when it does.
    pub fn update(&mut self, point: Point, screens: &[Screen], now: Instant) -> Option<Direction> {
        let (direction, trigger) = self.classify(point, screens, now)?;
        trace!(%direction, ?trigger, "Gesture committed");
        self.armed = None;
        Some(direction)
    }

    /// Evaluate a sample without consuming the gesture
    pub fn classify(
        &self,
        point: Point,
        screens: &[Screen],
        now: Instant,
    ) -> Option<(Direction, GestureTrigger)> {
        let armed = self.armed?;
        let distance = armed.origin.distance_to(point);
        if distance == 0.0 {
            return None;
        }

        let trigger = if distance >= self.config.dead_zone_radius {
            GestureTrigger::DeadZone
        } else if self.near_screen_edge(point, screens) {
            GestureTrigger::ScreenEdge
        } else if now.saturating_duration_since(armed.started_at) >= self.config.time_limit
            && distance >= self.config.min_distance
        {
            GestureTrigger::SlowNudge
        } else {
            return None;
        };

        Some((Direction::from_delta(point.x - armed.origin.x, point.y - armed.origin.y), trigger))
    }

    fn near_screen_edge(&self, point: Point, screens: &[Screen]) -> bool {
        let Some(screen) = screen_at(screens, point) else {
            return false;
        };
        let frame = &screen.frame;
        let threshold = self.config.edge_threshold;
        point.x - frame.min_x() <= threshold
            || frame.max_x() - point.x <= threshold
            || point.y - frame.min_y() <= threshold
            || frame.max_y() - point.y <= threshold
    }
}
