//! Display enumeration
//!
//! Screens are always reported in layout space (bottom-left origin at the
//! primary display, y up), ordered with the primary display first.

use crate::models::geometry::Rect;
use crate::models::screen::Screen;
use crate::Result;
use std::sync::RwLock;

/// Abstraction over Core Graphics / AppKit display enumeration
pub trait DisplayProvider: Send + Sync {
    /// Snapshot all screens currently attached
    fn list_screens(&self) -> Result<Vec<Screen>>;

    /// Height of the primary display, the anchor of the coordinate flip
    fn primary_height(&self) -> Result<f64> {
        let screens = self.list_screens()?;
        screens
            .iter()
            .find(|s| s.is_primary)
            .or_else(|| screens.first())
            .map(|s| s.frame.height())
            .ok_or_else(|| crate::FlickTileError::ScreenNotFound.into())
    }
}

/// In-memory display provider for tests and dry runs
#[derive(Debug, Default)]
pub struct InMemoryDisplayProvider {
    screens: RwLock<Vec<Screen>>,
}

impl InMemoryDisplayProvider {
    pub fn new_with(screens: Vec<Screen>) -> Self {
        Self {
            screens: RwLock::new(screens),
        }
    }

    /// Single 1920x1080 display with a 25pt menu bar
    pub fn single_display() -> Self {
        Self::new_with(vec![Screen::new(
            1,
            Rect::new(0.0, 0.0, 1920.0, 1080.0),
            Rect::new(0.0, 0.0, 1920.0, 1055.0),
            true,
        )])
    }

    /// Swap the attached displays, as if the user plugged or unplugged one
    pub fn replace(&self, screens: Vec<Screen>) {
        if let Ok(mut guard) = self.screens.write() {
            *guard = screens;
        }
    }
}

impl DisplayProvider for InMemoryDisplayProvider {
    fn list_screens(&self) -> Result<Vec<Screen>> {
        let mut screens = self
            .screens
            .read()
            .map_err(|_| crate::FlickTileError::MacOSAPIError("display list poisoned".into()))?
            .clone();
        screens.sort_by_key(|s| !s.is_primary);
        Ok(screens)
    }
}

#[cfg(target_os = "macos")]
pub use platform::SystemDisplayProvider;

#[cfg(target_os = "macos")]
mod platform {
    use super::DisplayProvider;
    use crate::macos::coordinates::native_to_layout;
    use crate::models::geometry::Rect;
    use crate::models::screen::Screen;
    use crate::{FlickTileError, Result};
    use cocoa::appkit::NSScreen;
    use cocoa::base::{id, nil};
    use cocoa::foundation::{NSArray, NSAutoreleasePool, NSDictionary, NSRect, NSString};
    use core_graphics::display::CGDisplay;
    use objc::{msg_send, sel, sel_impl};
    use std::collections::HashMap;

    /// Reads display bounds from Core Graphics and the usable area (minus
    /// menu bar and Dock) from `NSScreen`.
    #[derive(Debug, Default)]
    pub struct SystemDisplayProvider;

    impl SystemDisplayProvider {
        pub fn new() -> Self {
            Self
        }

        fn visible_frames() -> HashMap<u32, Rect> {
            let mut frames = HashMap::new();
            unsafe {
                let pool = NSAutoreleasePool::new(nil);
                let screens: id = NSScreen::screens(nil);
                let key = NSString::alloc(nil).init_str("NSScreenNumber");
                for i in 0..screens.count() {
                    let screen: id = screens.objectAtIndex(i);
                    let number: id = screen.deviceDescription().objectForKey_(key);
                    if number == nil {
                        continue;
                    }
                    let display_id: u32 = msg_send![number, unsignedIntValue];
                    let visible: NSRect = screen.visibleFrame();
                    // AppKit frames are already bottom-left anchored at the primary.
                    frames.insert(
                        display_id,
                        Rect::new(
                            visible.origin.x,
                            visible.origin.y,
                            visible.size.width,
                            visible.size.height,
                        ),
                    );
                }
                let _: () = msg_send![key, release];
                pool.drain();
            }
            frames
        }
    }

    impl DisplayProvider for SystemDisplayProvider {
        fn list_screens(&self) -> Result<Vec<Screen>> {
            let ids = CGDisplay::active_displays().map_err(|err| {
                FlickTileError::MacOSAPIError(format!("CGGetActiveDisplayList failed: {err}"))
            })?;
            let primary_height = CGDisplay::main().bounds().size.height;
            let visible = Self::visible_frames();

            let mut screens: Vec<Screen> = ids
                .into_iter()
                .map(|display_id| {
                    let display = CGDisplay::new(display_id);
                    let bounds = display.bounds();
                    let frame = native_to_layout(
                        Rect::new(
                            bounds.origin.x,
                            bounds.origin.y,
                            bounds.size.width,
                            bounds.size.height,
                        ),
                        primary_height,
                    );
                    let visible_frame = visible.get(&display_id).copied().unwrap_or(frame);
                    Screen::new(display_id, frame, visible_frame, display.is_main())
                })
                .collect();

            if screens.is_empty() {
                return Err(FlickTileError::ScreenNotFound.into());
            }
            screens.sort_by_key(|s| !s.is_primary);
            Ok(screens)
        }
    }
}

/// Placeholder used off macOS; the daemon refuses to start without displays
#[cfg(not(target_os = "macos"))]
#[derive(Debug, Default)]
pub struct SystemDisplayProvider;

#[cfg(not(target_os = "macos"))]
impl SystemDisplayProvider {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(target_os = "macos"))]
impl DisplayProvider for SystemDisplayProvider {
    fn list_screens(&self) -> Result<Vec<Screen>> {
        Err(crate::FlickTileError::MacOSAPIError(
            "SystemDisplayProvider is not available on this platform".into(),
        )
        .into())
    }
}
