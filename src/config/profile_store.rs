use crate::config::settings::config_dir;
use crate::models::input::Chord;
use crate::models::window_profile::WindowProfile;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ProfileStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),
    #[error("Profile not found: {0}")]
    NotFound(String),
    #[error("Invalid profile: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    profiles: Vec<WindowProfile>,
}

fn bundle_id_regex() -> &'static Regex {
    static BUNDLE_ID: OnceLock<Regex> = OnceLock::new();
    BUNDLE_ID.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9]+([\.-][a-zA-Z0-9]+)*$").unwrap_or_else(|_| unreachable!())
    })
}

/// Durable, ordered collection of saved layouts
#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    profiles: Vec<WindowProfile>,
}

impl ProfileStore {
    pub fn default_path() -> PathBuf {
        config_dir().join("profiles.toml")
    }

    /// Open the store at `path`. Unreadable or unparsable contents are
    /// discarded and the store starts empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let profiles = match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<ProfileFile>(&content) {
                Ok(file) => file.profiles,
                Err(error) => {
                    warn!(path = %path.display(), %error, "Discarding unreadable profile data");
                    Vec::new()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(error) => {
                warn!(path = %path.display(), %error, "Unable to read profile data");
                Vec::new()
            }
        };
        debug!(path = %path.display(), count = profiles.len(), "Loaded profiles");
        Self { path, profiles }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> &[WindowProfile] {
        &self.profiles
    }

    pub fn get(&self, id: Uuid) -> Option<&WindowProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&WindowProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Insert a profile, replacing any existing one with the same id
    pub fn save(&mut self, profile: WindowProfile) -> Result<(), ProfileStoreError> {
        Self::validate(&profile)?;
        let mut profiles = self.profiles.clone();
        match profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => *existing = profile,
            None => profiles.push(profile),
        }
        self.commit(profiles)
    }

    pub fn delete(&mut self, id: Uuid) -> Result<WindowProfile, ProfileStoreError> {
        let index = self
            .profiles
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| ProfileStoreError::NotFound(id.to_string()))?;
        let mut profiles = self.profiles.clone();
        let removed = profiles.remove(index);
        self.commit(profiles)?;
        Ok(removed)
    }

    pub fn rename(&mut self, id: Uuid, name: impl Into<String>) -> Result<(), ProfileStoreError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProfileStoreError::Invalid("profile name cannot be empty".into()));
        }
        self.update(id, |profile| profile.name = name)
    }

    pub fn set_hotkey(&mut self, id: Uuid, hotkey: Option<Chord>) -> Result<(), ProfileStoreError> {
        self.update(id, |profile| profile.hotkey = hotkey)
    }

    fn update(&mut self, id: Uuid, change: impl FnOnce(&mut WindowProfile)) -> Result<(), ProfileStoreError> {
        let mut profiles = self.profiles.clone();
        let profile = profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ProfileStoreError::NotFound(id.to_string()))?;
        change(profile);
        self.commit(profiles)
    }

    fn validate(profile: &WindowProfile) -> Result<(), ProfileStoreError> {
        if profile.name.trim().is_empty() {
            return Err(ProfileStoreError::Invalid("profile name cannot be empty".into()));
        }
        if let Some(window) = profile
            .windows
            .iter()
            .find(|w| !bundle_id_regex().is_match(&w.bundle_id))
        {
            return Err(ProfileStoreError::Invalid(format!(
                "invalid bundle identifier '{}'",
                window.bundle_id
            )));
        }
        if let Some(window) = profile
            .windows
            .iter()
            .find(|w| profile.monitor_setup.screen(w.screen_id).is_none())
        {
            return Err(ProfileStoreError::Invalid(format!(
                "window of {} references unknown screen {}",
                window.bundle_id, window.screen_id
            )));
        }
        Ok(())
    }

    /// Write `profiles` to disk and adopt them only once the write succeeded
    fn commit(&mut self, profiles: Vec<WindowProfile>) -> Result<(), ProfileStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = ProfileFile { profiles };
        let content = toml::to_string_pretty(&file)?;

        // Atomic write
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content)?;
        fs::rename(temp_path, &self.path)?;
        self.profiles = file.profiles;
        Ok(())
    }
}
