//! Saved window layouts
//!
//! A [`WindowProfile`] captures one window per application as a fraction of
//! its owning screen, together with a snapshot of the monitor arrangement it
//! was taken on. Screen identifiers inside a profile are local to the
//! snapshot and never assumed to exist when the profile is restored.

use crate::models::geometry::Rect;
use crate::models::input::Chord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rectangle expressed as fractions (0.0..=1.0) of a reference rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PercentRect {
    /// Express `rect` relative to `reference`
    pub fn from_absolute(rect: &Rect, reference: &Rect) -> Self {
        let ref_w = reference.width().max(1.0);
        let ref_h = reference.height().max(1.0);
        Self {
            x: (rect.min_x() - reference.min_x()) / ref_w,
            y: (rect.min_y() - reference.min_y()) / ref_h,
            width: rect.width() / ref_w,
            height: rect.height() / ref_h,
        }
    }

    /// Scale back into absolute coordinates inside `reference`
    pub fn to_absolute(&self, reference: &Rect) -> Rect {
        Rect::new(
            reference.min_x() + self.x * reference.width(),
            reference.min_y() + self.y * reference.height(),
            self.width * reference.width(),
            self.height * reference.height(),
        )
        .rounded()
    }
}

/// One display as it looked when a profile was captured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenInfo {
    /// Snapshot-local identifier, referenced by [`WindowInfo::screen_id`]
    pub id: u32,
    /// Absolute frame at capture time, used for positional ordering
    pub frame: Rect,
    /// Frame as a fraction of the bounding box of all screens
    pub desktop_fraction: PercentRect,
    /// Relative position label such as "left", "center" or "right"
    pub relative_position: String,
    pub aspect_ratio: f64,
    pub is_primary: bool,
}

/// Monitor arrangement captured alongside a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MonitorSetup {
    pub screens: Vec<ScreenInfo>,
}

impl MonitorSetup {
    pub fn screen_count(&self) -> usize {
        self.screens.len()
    }

    pub fn screen(&self, id: u32) -> Option<&ScreenInfo> {
        self.screens.iter().find(|s| s.id == id)
    }
}

/// One saved application window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub bundle_id: String,
    #[serde(default)]
    pub app_name: String,
    /// Frame as a fraction of the owning screen's bounds
    pub frame: PercentRect,
    /// Identifier of a [`ScreenInfo`] in the same profile
    pub screen_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A saved layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowProfile {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<Chord>,
    pub created_at: DateTime<Utc>,
    pub monitor_setup: MonitorSetup,
    #[serde(default)]
    pub windows: Vec<WindowInfo>,
}

impl WindowProfile {
    pub fn new(name: impl Into<String>, monitor_setup: MonitorSetup, windows: Vec<WindowInfo>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            hotkey: None,
            created_at: Utc::now(),
            monitor_setup,
            windows,
        }
    }
}
