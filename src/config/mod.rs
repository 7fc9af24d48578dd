//! Configuration management for FlickTile

pub mod profile_store;
pub mod settings;

pub use profile_store::{ProfileStore, ProfileStoreError};
pub use settings::{
    config_dir, AnimationSettings, ChordConfig, ChordSettings, GestureSettings, ProfileSettings,
    ResizeSettings, Settings, TilingSettings, TrackerSettings,
};
