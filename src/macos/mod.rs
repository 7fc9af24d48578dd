//! macOS integration layer for FlickTile
//!
//! These modules wrap the Accessibility, Core Graphics and AppKit APIs behind
//! small provider traits. Everything above this layer works in layout
//! coordinates and can be driven by the in-memory providers in tests.

pub mod accessibility;
#[cfg(target_os = "macos")]
mod ax_system;
pub mod coordinates;
pub mod core_graphics;
pub mod event_tap;
pub mod permissions;
pub mod workspace;

pub use accessibility::*;
#[cfg(target_os = "macos")]
pub use ax_system::SystemAccessibilityProvider;
pub use coordinates::*;
pub use core_graphics::*;
pub use event_tap::spawn_event_tap;
pub use permissions::*;
pub use workspace::*;
