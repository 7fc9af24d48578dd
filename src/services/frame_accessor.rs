//! Window frame reads and writes in layout space
//!
//! This is the only component that converts between OS-native and layout
//! coordinates. Every frame it returns or accepts is in layout space, flipped
//! around the primary display's height regardless of which display the
//! window sits on. Nothing here retries; callers decide whether to.

use crate::macos::accessibility::{AXWindow, AccessibilityProvider, WindowId, WindowListEntry};
use crate::macos::coordinates::{layout_to_native, native_to_layout};
use crate::macos::core_graphics::DisplayProvider;
use crate::models::geometry::{Rect, Size};
use crate::models::screen::Screen;
use crate::Result;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, trace, warn};

/// Counters for accessor traffic
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FrameAccessorMetrics {
    pub reads: u64,
    pub writes: u64,
    pub failed_writes: u64,
}

/// Service wrapping the accessibility and display providers
pub struct WindowFrameAccessor {
    accessibility: Arc<dyn AccessibilityProvider>,
    displays: Arc<dyn DisplayProvider>,
    metrics: RwLock<FrameAccessorMetrics>,
}

impl WindowFrameAccessor {
    pub fn new(
        accessibility: Arc<dyn AccessibilityProvider>,
        displays: Arc<dyn DisplayProvider>,
    ) -> Self {
        Self {
            accessibility,
            displays,
            metrics: RwLock::new(FrameAccessorMetrics::default()),
        }
    }

    pub fn accessibility(&self) -> &Arc<dyn AccessibilityProvider> {
        &self.accessibility
    }

    pub fn ensure_permissions(&self) -> Result<()> {
        self.accessibility.ensure_permissions()
    }

    /// Attached screens in layout space, primary first; empty if the OS
    /// query fails
    pub fn screens(&self) -> Vec<Screen> {
        match self.displays.list_screens() {
            Ok(screens) => screens,
            Err(error) => {
                warn!(%error, "Unable to enumerate screens");
                Vec::new()
            }
        }
    }

    fn primary_height(&self) -> Option<f64> {
        match self.displays.primary_height() {
            Ok(height) => Some(height),
            Err(error) => {
                debug!(%error, "No primary display");
                None
            }
        }
    }

    /// Current frame of `window_id`, or `None` when the window is gone or
    /// access is denied
    pub fn frame_of(&self, window_id: WindowId) -> Option<Rect> {
        let primary_height = self.primary_height()?;
        self.bump(|m| m.reads += 1);
        match self.accessibility.window_frame(window_id) {
            Ok(native) => Some(native_to_layout(native, primary_height)),
            Err(error) => {
                trace!(window_id, %error, "Frame read failed");
                None
            }
        }
    }

    /// Write position and size; false if either write is rejected
    pub fn set_frame(&self, window_id: WindowId, frame: Rect) -> bool {
        let Some(primary_height) = self.primary_height() else {
            return false;
        };
        let native = layout_to_native(frame, primary_height);

        let result = self
            .accessibility
            .set_window_position(window_id, native.origin)
            .and_then(|_| self.accessibility.set_window_size(window_id, native.size));

        match result {
            Ok(()) => {
                self.bump(|m| m.writes += 1);
                true
            }
            Err(error) => {
                self.bump(|m| m.failed_writes += 1);
                debug!(window_id, %error, "Frame write rejected");
                false
            }
        }
    }

    /// Minimum size advertised by the window, if any
    pub fn minimum_size(&self, window_id: WindowId) -> Option<Size> {
        self.accessibility.minimum_size(window_id).ok().flatten()
    }

    pub fn raise(&self, window_id: WindowId) -> bool {
        match self.accessibility.raise_window(window_id) {
            Ok(()) => true,
            Err(error) => {
                debug!(window_id, %error, "Raise failed");
                false
            }
        }
    }

    /// On-screen windows front to back, bounds converted to layout space
    pub fn on_screen_windows(&self) -> Result<Vec<WindowListEntry>> {
        let primary_height = self.displays.primary_height()?;
        Ok(self
            .accessibility
            .window_list()?
            .into_iter()
            .map(|entry| WindowListEntry {
                bounds: native_to_layout(entry.bounds, primary_height),
                ..entry
            })
            .collect())
    }

    /// Windows of one application with frames converted to layout space
    pub fn application_windows(&self, pid: i32) -> Result<Vec<AXWindow>> {
        let primary_height = self.displays.primary_height()?;
        Ok(self
            .accessibility
            .application_windows(pid)?
            .into_iter()
            .map(|window| AXWindow {
                frame: native_to_layout(window.frame, primary_height),
                ..window
            })
            .collect())
    }

    pub fn metrics(&self) -> FrameAccessorMetrics {
        self.metrics.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn bump(&self, f: impl FnOnce(&mut FrameAccessorMetrics)) {
        f(&mut self.metrics.write().unwrap_or_else(PoisonError::into_inner));
    }
}
