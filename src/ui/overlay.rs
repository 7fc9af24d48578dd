//! Highlight overlay outlining the window being manipulated
//!
//! Drawing is left to whatever front end hosts the controller. The core only
//! talks to the [`HighlightOverlay`] trait; frames are in layout space.

use crate::models::geometry::Rect;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Cursor shape requested while a session is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStyle {
    Default,
    /// Pure move session
    OpenHand,
    ResizeLeftRight,
    ResizeUpDown,
    /// Corner resize
    Crosshair,
}

pub trait HighlightOverlay: Send + Sync {
    fn show(&self, frame: Rect);
    fn move_to(&self, frame: Rect);
    fn hide(&self);
    /// Brief confirmation that a placement finished
    fn pulse(&self, frame: Rect);
    fn set_cursor(&self, cursor: CursorStyle);
}

/// Overlay that only logs, used by the headless daemon
#[derive(Debug, Default)]
pub struct TracingOverlay;

impl HighlightOverlay for TracingOverlay {
    fn show(&self, frame: Rect) {
        debug!(?frame, "Overlay shown");
    }

    fn move_to(&self, frame: Rect) {
        debug!(?frame, "Overlay moved");
    }

    fn hide(&self) {
        debug!("Overlay hidden");
    }

    fn pulse(&self, frame: Rect) {
        debug!(?frame, "Placement confirmed");
    }

    fn set_cursor(&self, cursor: CursorStyle) {
        debug!(?cursor, "Cursor changed");
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayCall {
    Show(Rect),
    MoveTo(Rect),
    Hide,
    Pulse(Rect),
    SetCursor(CursorStyle),
}

/// Overlay that records every call, for tests
#[derive(Debug, Default)]
pub struct RecordingOverlay {
    calls: Mutex<Vec<OverlayCall>>,
}

impl RecordingOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<OverlayCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Frame of the most recent show or move
    pub fn last_frame(&self) -> Option<Rect> {
        self.calls().into_iter().rev().find_map(|call| match call {
            OverlayCall::Show(frame) | OverlayCall::MoveTo(frame) => Some(frame),
            _ => None,
        })
    }

    pub fn is_visible(&self) -> bool {
        self.calls()
            .into_iter()
            .rev()
            .find_map(|call| match call {
                OverlayCall::Show(_) => Some(true),
                OverlayCall::Hide => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn record(&self, call: OverlayCall) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }
}

impl HighlightOverlay for RecordingOverlay {
    fn show(&self, frame: Rect) {
        self.record(OverlayCall::Show(frame));
    }

    fn move_to(&self, frame: Rect) {
        self.record(OverlayCall::MoveTo(frame));
    }

    fn hide(&self) {
        self.record(OverlayCall::Hide);
    }

    fn pulse(&self, frame: Rect) {
        self.record(OverlayCall::Pulse(frame));
    }

    fn set_cursor(&self, cursor: CursorStyle) {
        self.record(OverlayCall::SetCursor(cursor));
    }
}
