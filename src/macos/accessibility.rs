use crate::models::geometry::{Point, Rect, Size};
use crate::{FlickTileError, Result};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Core Graphics window number
pub type WindowId = u32;

/// Row of the on-screen window list, front to back, frame in OS-native space
#[derive(Debug, Clone, PartialEq)]
pub struct WindowListEntry {
    pub window_id: WindowId,
    pub owner_pid: i32,
    pub owner_name: String,
    pub title: Option<String>,
    /// Window-server layer; 0 for ordinary application windows
    pub layer: i32,
    pub bounds: Rect,
}

/// Drop cached per-window state for windows missing from a fresh listing
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
pub(crate) fn retain_listed<T>(cache: &mut HashMap<WindowId, T>, listed: &[WindowListEntry]) {
    cache.retain(|id, _| listed.iter().any(|entry| entry.window_id == *id));
}

/// Accessibility-derived window of a specific application, frame in OS-native space
#[derive(Debug, Clone, PartialEq)]
pub struct AXWindow {
    pub window_id: WindowId,
    pub pid: i32,
    pub title: Option<String>,
    pub frame: Rect,
    pub is_minimized: bool,
}

/// Tracks accessibility permission state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Unknown,
    Granted,
    Denied,
}

/// Abstraction over the macOS window list and Accessibility API.
///
/// All frames crossing this trait are in OS-native (top-left origin)
/// coordinates. Implementations perform no retries.
#[cfg_attr(test, mockall::automock)]
pub trait AccessibilityProvider: Send + Sync {
    /// Retrieve permission status without prompting the user
    fn permission_status(&self) -> PermissionStatus;

    /// Ensure accessibility permissions are granted
    fn ensure_permissions(&self) -> Result<()> {
        match self.permission_status() {
            PermissionStatus::Granted => Ok(()),
            PermissionStatus::Unknown | PermissionStatus::Denied => Err(
                FlickTileError::PermissionDenied(
                    "Accessibility permission is required for window management".into(),
                )
                .into(),
            ),
        }
    }

    /// On-screen windows ordered front to back
    fn window_list(&self) -> Result<Vec<WindowListEntry>>;

    /// Current frame of a window
    fn window_frame(&self, window_id: WindowId) -> Result<Rect>;

    /// Write the window's position attribute
    fn set_window_position(&self, window_id: WindowId, origin: Point) -> Result<()>;

    /// Write the window's size attribute
    fn set_window_size(&self, window_id: WindowId, size: Size) -> Result<()>;

    /// Minimum size advertised by the window, if any
    fn minimum_size(&self, window_id: WindowId) -> Result<Option<Size>>;

    /// Bring the window (and its application) to the front
    fn raise_window(&self, window_id: WindowId) -> Result<()>;

    /// Every window the application exposes, including minimized ones
    fn application_windows(&self, pid: i32) -> Result<Vec<AXWindow>>;
}

/// Window held by [`InMemoryAccessibilityProvider`]
#[derive(Debug, Clone, PartialEq)]
pub struct FakeWindow {
    pub window_id: WindowId,
    pub pid: i32,
    pub owner_name: String,
    pub title: Option<String>,
    pub layer: i32,
    /// OS-native frame
    pub frame: Rect,
    pub is_minimized: bool,
    /// Size floor enforced on writes, like an app refusing to shrink
    pub enforced_min_size: Option<Size>,
    /// Value reported through the minimum-size attribute
    pub advertised_min_size: Option<Size>,
}

impl FakeWindow {
    pub fn new(window_id: WindowId, pid: i32, owner_name: impl Into<String>, frame: Rect) -> Self {
        Self {
            window_id,
            pid,
            owner_name: owner_name.into(),
            title: None,
            layer: 0,
            frame,
            is_minimized: false,
            enforced_min_size: None,
            advertised_min_size: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    pub fn minimized(mut self) -> Self {
        self.is_minimized = true;
        self
    }

    pub fn with_enforced_min_size(mut self, size: Size) -> Self {
        self.enforced_min_size = Some(size);
        self
    }

    pub fn with_advertised_min_size(mut self, size: Size) -> Self {
        self.advertised_min_size = Some(size);
        self
    }
}

/// Simple in-memory provider used for testing the higher level services.
///
/// Windows are kept front to back. Raising moves a window to the front.
#[derive(Debug)]
pub struct InMemoryAccessibilityProvider {
    windows: RwLock<Vec<FakeWindow>>,
    status: RwLock<PermissionStatus>,
    writes: RwLock<usize>,
}

impl InMemoryAccessibilityProvider {
    pub fn new_with(windows: Vec<FakeWindow>) -> Self {
        Self {
            windows: RwLock::new(windows),
            status: RwLock::new(PermissionStatus::Granted),
            writes: RwLock::new(0),
        }
    }

    pub fn set_permission_status(&self, status: PermissionStatus) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }

    pub fn remove_window(&self, window_id: WindowId) {
        self.windows.write().unwrap_or_else(PoisonError::into_inner).retain(|w| w.window_id != window_id);
    }

    /// Move a window without going through the accessibility write path
    pub fn move_externally(&self, window_id: WindowId, frame: Rect) {
        self.find_mut(window_id, |w| w.frame = frame);
    }

    pub fn native_frame(&self, window_id: WindowId) -> Option<Rect> {
        self.windows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|w| w.window_id == window_id)
            .map(|w| w.frame)
    }

    /// Window ids front to back
    pub fn stacking_order(&self) -> Vec<WindowId> {
        self.windows.read().unwrap_or_else(PoisonError::into_inner).iter().map(|w| w.window_id).collect()
    }

    /// Number of position/size writes accepted so far
    pub fn write_count(&self) -> usize {
        *self.writes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn find_mut<R>(&self, window_id: WindowId, f: impl FnOnce(&mut FakeWindow) -> R) -> Option<R> {
        let mut windows = self.windows.write().unwrap_or_else(PoisonError::into_inner);
        windows.iter_mut().find(|w| w.window_id == window_id).map(f)
    }

    fn granted(&self) -> Result<()> {
        self.ensure_permissions()
    }
}

impl Default for InMemoryAccessibilityProvider {
    fn default() -> Self {
        Self {
            windows: RwLock::new(Vec::new()),
            status: RwLock::new(PermissionStatus::Unknown),
            writes: RwLock::new(0),
        }
    }
}

impl AccessibilityProvider for InMemoryAccessibilityProvider {
    fn permission_status(&self) -> PermissionStatus {
        *self.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn window_list(&self) -> Result<Vec<WindowListEntry>> {
        let windows = self.windows.read().unwrap_or_else(PoisonError::into_inner);
        Ok(windows
            .iter()
            .filter(|w| !w.is_minimized)
            .map(|w| WindowListEntry {
                window_id: w.window_id,
                owner_pid: w.pid,
                owner_name: w.owner_name.clone(),
                title: w.title.clone(),
                layer: w.layer,
                bounds: w.frame,
            })
            .collect())
    }

    fn window_frame(&self, window_id: WindowId) -> Result<Rect> {
        self.granted()?;
        self.native_frame(window_id)
            .ok_or_else(|| FlickTileError::WindowNotFound(window_id).into())
    }

    fn set_window_position(&self, window_id: WindowId, origin: Point) -> Result<()> {
        self.granted()?;
        self.find_mut(window_id, |w| w.frame.origin = origin)
            .ok_or(FlickTileError::WindowNotFound(window_id))?;
        *self.writes.write().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }

    fn set_window_size(&self, window_id: WindowId, size: Size) -> Result<()> {
        self.granted()?;
        self.find_mut(window_id, |w| {
            let floor = w.enforced_min_size.unwrap_or_default();
            w.frame.size = Size::new(size.width.max(floor.width), size.height.max(floor.height));
        })
        .ok_or(FlickTileError::WindowNotFound(window_id))?;
        *self.writes.write().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }

    fn minimum_size(&self, window_id: WindowId) -> Result<Option<Size>> {
        self.granted()?;
        self.find_mut(window_id, |w| w.advertised_min_size)
            .ok_or_else(|| FlickTileError::WindowNotFound(window_id).into())
    }

    fn raise_window(&self, window_id: WindowId) -> Result<()> {
        self.granted()?;
        let mut windows = self.windows.write().unwrap_or_else(PoisonError::into_inner);
        let index = windows
            .iter()
            .position(|w| w.window_id == window_id)
            .ok_or(FlickTileError::WindowNotFound(window_id))?;
        let window = windows.remove(index);
        windows.insert(0, window);
        Ok(())
    }

    fn application_windows(&self, pid: i32) -> Result<Vec<AXWindow>> {
        self.granted()?;
        Ok(self
            .windows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|w| w.pid == pid && w.layer == 0)
            .map(|w| AXWindow {
                window_id: w.window_id,
                pid: w.pid,
                title: w.title.clone(),
                frame: w.frame,
                is_minimized: w.is_minimized,
            })
            .collect())
    }
}

/// Placeholder used on platforms without the Accessibility API
#[cfg(not(target_os = "macos"))]
#[derive(Debug, Default)]
pub struct SystemAccessibilityProvider;

#[cfg(not(target_os = "macos"))]
impl SystemAccessibilityProvider {
    pub fn new() -> Self {
        Self
    }

    fn unsupported<T>() -> Result<T> {
        Err(FlickTileError::MacOSAPIError(
            "SystemAccessibilityProvider is not available on this platform".into(),
        )
        .into())
    }
}

#[cfg(not(target_os = "macos"))]
impl AccessibilityProvider for SystemAccessibilityProvider {
    fn permission_status(&self) -> PermissionStatus {
        PermissionStatus::Denied
    }

    fn window_list(&self) -> Result<Vec<WindowListEntry>> {
        Self::unsupported()
    }

    fn window_frame(&self, _window_id: WindowId) -> Result<Rect> {
        Self::unsupported()
    }

    fn set_window_position(&self, _window_id: WindowId, _origin: Point) -> Result<()> {
        Self::unsupported()
    }

    fn set_window_size(&self, _window_id: WindowId, _size: Size) -> Result<()> {
        Self::unsupported()
    }

    fn minimum_size(&self, _window_id: WindowId) -> Result<Option<Size>> {
        Self::unsupported()
    }

    fn raise_window(&self, _window_id: WindowId) -> Result<()> {
        Self::unsupported()
    }

    fn application_windows(&self, _pid: i32) -> Result<Vec<AXWindow>> {
        Self::unsupported()
    }
}
