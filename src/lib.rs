//! FlickTile - gesture-driven window snapping for macOS
//!
//! Hold a modifier chord and flick the mouse (or press arrow keys) to snap the
//! window under the cursor to a half or quarter of its screen, or hold the
//! resize chord to drag its nearest edges. Saved layouts can be captured and
//! restored across changing monitor arrangements.

pub mod app;
pub mod cli;
pub mod config;
pub mod logging;
pub mod macos;
pub mod models;
pub mod services;
pub mod ui;

pub use models::*;
pub use services::*;

/// Result type alias for FlickTile operations
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to FlickTile operations
#[derive(thiserror::Error, Debug)]
pub enum FlickTileError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Window not found: {0}")]
    WindowNotFound(u32),

    #[error("No screen contains the requested point or window")]
    ScreenNotFound,

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("macOS API error: {0}")]
    MacOSAPIError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}
