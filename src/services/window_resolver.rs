//! Finding the window under the cursor

use crate::macos::accessibility::{WindowId, WindowListEntry};
use crate::models::geometry::{Point, Rect};
use crate::services::frame_accessor::WindowFrameAccessor;
use tracing::{debug, trace};

/// Window picked as the target of a session, frame in layout space
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedWindow {
    pub window_id: WindowId,
    pub owner_pid: i32,
    pub owner_name: String,
    pub frame: Rect,
}

impl From<&WindowListEntry> for ResolvedWindow {
    fn from(entry: &WindowListEntry) -> Self {
        Self {
            window_id: entry.window_id,
            owner_pid: entry.owner_pid,
            owner_name: entry.owner_name.clone(),
            frame: entry.bounds,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WindowResolver {
    excluded_owners: Vec<String>,
    own_pid: i32,
}

impl WindowResolver {
    pub fn new(excluded_owners: Vec<String>, own_pid: i32) -> Self {
        Self {
            excluded_owners,
            own_pid,
        }
    }

    /// Ordinary application window that is neither ours nor a system surface
    pub fn is_manageable(&self, entry: &WindowListEntry) -> bool {
        entry.layer == 0
            && entry.owner_pid != self.own_pid
            && !entry.bounds.is_empty()
            && !self.is_system_owner(&entry.owner_name)
    }

    pub fn is_system_owner(&self, owner_name: &str) -> bool {
        self.excluded_owners.iter().any(|o| o == owner_name)
    }

    /// Topmost manageable window containing `point`; `windows` is front to back
    pub fn window_at<'a>(&self, windows: &'a [WindowListEntry], point: Point) -> Option<&'a WindowListEntry> {
        windows
            .iter()
            .filter(|w| self.is_manageable(w))
            .find(|w| w.bounds.contains(point))
    }

    /// Query the window list up to `attempts` times until a window is found
    /// under `point`
    pub fn resolve(&self, accessor: &WindowFrameAccessor, point: Point, attempts: u32) -> Option<ResolvedWindow> {
        for attempt in 1..=attempts.max(1) {
            match accessor.on_screen_windows() {
                Ok(windows) => {
                    if let Some(entry) = self.window_at(&windows, point) {
                        trace!(window_id = entry.window_id, owner = %entry.owner_name, attempt, "Resolved target window");
                        return Some(entry.into());
                    }
                }
                Err(error) => debug!(attempt, %error, "Window list unavailable"),
            }
        }
        debug!(?point, "No window under cursor");
        None
    }
}
