//! Data models for FlickTile

pub mod direction;
pub mod geometry;
pub mod input;
pub mod screen;
pub mod window_profile;

pub use direction::*;
pub use geometry::*;
pub use input::*;
pub use screen::*;
pub use window_profile::*;
