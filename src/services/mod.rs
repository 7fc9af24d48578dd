//! Core services for FlickTile

pub mod animation;
pub mod frame_accessor;
pub mod gesture_detector;
pub mod movement_tracker;
pub mod profile_manager;
pub mod profile_matching;
pub mod retry;
pub mod tiling_controller;
pub mod window_resolver;

pub use animation::{AnimateOutcome, AnimationConfig, AnimationEngine, AnimationStyle};
pub use frame_accessor::{FrameAccessorMetrics, WindowFrameAccessor};
pub use gesture_detector::{GestureConfig, GestureDetector, GestureTrigger};
pub use movement_tracker::{MovementEntry, MovementTracker, TrackerReport};
pub use profile_manager::{ProfileError, ProfileManager, RestoreReport};
pub use profile_matching::{MatchReason, MatchingConfig};
pub use retry::{poll_with_backoff, BackoffPolicy};
pub use tiling_controller::{ControllerConfig, ResizeEdges, SessionMode, TilingController};
pub use window_resolver::{ResolvedWindow, WindowResolver};
