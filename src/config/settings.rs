//! User settings loaded from `config.toml`

use crate::models::input::{Chord, KeyCode, ModifierFlags};
use crate::{FlickTileError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Directory holding `config.toml` and `profiles.toml`
pub fn config_dir() -> PathBuf {
    let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home_dir.join(".config").join("flicktile")
}

/// Chord as written in the settings file: modifier names plus an optional key code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordConfig {
    pub modifiers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<u16>,
}

impl ChordConfig {
    fn from_names(names: &[&str]) -> Self {
        Self {
            modifiers: names.iter().map(|n| n.to_string()).collect(),
            key: None,
        }
    }

    pub fn to_chord(&self) -> std::result::Result<Chord, String> {
        let mut modifiers = ModifierFlags::empty();
        for name in &self.modifiers {
            modifiers |= ModifierFlags::parse_name(name)
                .ok_or_else(|| format!("unknown modifier '{name}'"))?;
        }
        if modifiers.is_empty() {
            return Err("a chord needs at least one modifier".into());
        }
        Ok(match self.key {
            Some(code) => Chord::with_key(modifiers, KeyCode(code)),
            None => Chord::new(modifiers),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChordSettings {
    pub tile: ChordConfig,
    pub resize: ChordConfig,
}

impl Default for ChordSettings {
    fn default() -> Self {
        Self {
            tile: ChordConfig::from_names(&["control", "option"]),
            resize: ChordConfig::from_names(&["control", "option", "shift"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    pub dead_zone_radius: f64,
    pub edge_threshold: f64,
    pub time_limit_ms: u64,
    pub min_distance: f64,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            dead_zone_radius: 200.0,
            edge_threshold: 20.0,
            time_limit_ms: 500,
            min_distance: 50.0,
        }
    }
}

impl GestureSettings {
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub enabled: bool,
    pub duration_ms: u64,
    pub fps: u32,
    pub bounce: bool,
    pub curved_path: bool,
    /// Frame changes smaller than this on every edge are written directly
    pub tolerance: f64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_ms: 250,
            fps: 60,
            bounce: true,
            curved_path: true,
            tolerance: 1.0,
        }
    }
}

impl AnimationSettings {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilingSettings {
    /// Per-edge tolerance for "already placed here"
    pub placement_tolerance: f64,
    /// Window during which arrow presses are merged into a diagonal
    pub arrow_debounce_ms: u64,
    /// Attempts at resolving the window under the cursor on mode entry
    pub lookup_attempts: u32,
    /// Window owners that are never managed
    pub excluded_owners: Vec<String>,
}

impl Default for TilingSettings {
    fn default() -> Self {
        Self {
            placement_tolerance: 2.0,
            arrow_debounce_ms: 60,
            lookup_attempts: 3,
            excluded_owners: [
                "Dock",
                "WindowManager",
                "System Settings",
                "Window Server",
                "Control Center",
                "Notification Center",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl TilingSettings {
    pub fn arrow_debounce(&self) -> Duration {
        Duration::from_millis(self.arrow_debounce_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeSettings {
    pub arrow_step: f64,
    pub zone_low: f64,
    pub zone_high: f64,
}

impl Default for ResizeSettings {
    fn default() -> Self {
        Self {
            arrow_step: 10.0,
            zone_low: 0.33,
            zone_high: 0.66,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    pub tolerance: f64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self { tolerance: 50.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    pub min_window_size: f64,
    pub occlusion_threshold: f64,
    pub duplicate_overlap: f64,
    pub size_match_tolerance: f64,
    pub row_tolerance: f64,
    pub launch_timeout_ms: u64,
    pub launch_poll_initial_ms: u64,
    pub launch_poll_max_ms: u64,
    pub window_lookup_attempts: u32,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            min_window_size: 100.0,
            occlusion_threshold: 0.6,
            duplicate_overlap: 0.9,
            size_match_tolerance: 0.2,
            row_tolerance: 100.0,
            launch_timeout_ms: 5000,
            launch_poll_initial_ms: 100,
            launch_poll_max_ms: 1000,
            window_lookup_attempts: 5,
        }
    }
}

/// Complete settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub chords: ChordSettings,
    pub gesture: GestureSettings,
    pub animation: AnimationSettings,
    pub tiling: TilingSettings,
    pub resize: ResizeSettings,
    pub tracker: TrackerSettings,
    pub profiles: ProfileSettings,
}

impl Settings {
    pub fn default_path() -> PathBuf {
        config_dir().join("config.toml")
    }

    /// Load settings from `path`, or the default location. A missing file
    /// yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)
            .map_err(|e| FlickTileError::ConfigurationError(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would make the controller misbehave, naming every
    /// offending key at once.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        for (key, chord) in [("chords.tile", &self.chords.tile), ("chords.resize", &self.chords.resize)] {
            if let Err(message) = chord.to_chord() {
                problems.push(format!("{key}: {message}"));
            }
        }
        if self.chords.tile == self.chords.resize {
            problems.push("chords.resize: must differ from chords.tile".into());
        }

        let positive = [
            ("gesture.dead_zone_radius", self.gesture.dead_zone_radius),
            ("gesture.edge_threshold", self.gesture.edge_threshold),
            ("gesture.min_distance", self.gesture.min_distance),
            ("animation.tolerance", self.animation.tolerance),
            ("tiling.placement_tolerance", self.tiling.placement_tolerance),
            ("resize.arrow_step", self.resize.arrow_step),
            ("tracker.tolerance", self.tracker.tolerance),
            ("profiles.min_window_size", self.profiles.min_window_size),
            ("profiles.row_tolerance", self.profiles.row_tolerance),
        ];
        for (key, value) in positive {
            if value.is_nan() || value <= 0.0 {
                problems.push(format!("{key}: must be positive"));
            }
        }

        let durations = [
            ("gesture.time_limit_ms", self.gesture.time_limit_ms),
            ("animation.duration_ms", self.animation.duration_ms),
            ("profiles.launch_timeout_ms", self.profiles.launch_timeout_ms),
            ("profiles.launch_poll_initial_ms", self.profiles.launch_poll_initial_ms),
        ];
        for (key, value) in durations {
            if value == 0 {
                problems.push(format!("{key}: must be positive"));
            }
        }
        if self.profiles.launch_poll_max_ms < self.profiles.launch_poll_initial_ms {
            problems.push("profiles.launch_poll_max_ms: must be at least launch_poll_initial_ms".into());
        }

        if !(1..=240).contains(&self.animation.fps) {
            problems.push("animation.fps: must be between 1 and 240".into());
        }

        let fractions = [
            ("profiles.occlusion_threshold", self.profiles.occlusion_threshold),
            ("profiles.duplicate_overlap", self.profiles.duplicate_overlap),
            ("profiles.size_match_tolerance", self.profiles.size_match_tolerance),
            ("resize.zone_low", self.resize.zone_low),
            ("resize.zone_high", self.resize.zone_high),
        ];
        for (key, value) in fractions {
            if !(value > 0.0 && value <= 1.0) {
                problems.push(format!("{key}: must be in (0, 1]"));
            }
        }
        if self.resize.zone_low >= self.resize.zone_high {
            problems.push("resize.zone_low: must be below resize.zone_high".into());
        }

        if self.tiling.lookup_attempts == 0 {
            problems.push("tiling.lookup_attempts: must be at least 1".into());
        }
        if self.profiles.window_lookup_attempts == 0 {
            problems.push("profiles.window_lookup_attempts: must be at least 1".into());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(FlickTileError::ConfigurationError(problems.join("; ")).into())
        }
    }

    pub fn tile_chord(&self) -> Result<Chord> {
        self.chords
            .tile
            .to_chord()
            .map_err(|e| FlickTileError::ConfigurationError(format!("chords.tile: {e}")).into())
    }

    pub fn resize_chord(&self) -> Result<Chord> {
        self.chords
            .resize
            .to_chord()
            .map_err(|e| FlickTileError::ConfigurationError(format!("chords.resize: {e}")).into())
    }
}
