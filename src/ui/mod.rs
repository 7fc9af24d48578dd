//! User-facing feedback for FlickTile
//!
//! Only the highlight overlay lives here; settings screens and the menu bar
//! item are left to a separate front end.

pub mod overlay;

pub use overlay::*;
