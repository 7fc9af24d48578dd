//! Capturing and restoring saved layouts

use crate::config::{ProfileSettings, ProfileStore, ProfileStoreError};
use crate::macos::accessibility::{AXWindow, WindowId};
use crate::macos::workspace::ApplicationProvider;
use crate::models::input::Chord;
use crate::models::screen::{screen_for_rect, Screen};
use crate::models::window_profile::{PercentRect, WindowInfo, WindowProfile};
use crate::services::frame_accessor::WindowFrameAccessor;
use crate::services::profile_matching::{map_screens, match_window, monitor_setup, select_capture_windows, MatchingConfig};
use crate::services::retry::{poll_with_backoff, BackoffPolicy};
use crate::services::window_resolver::WindowResolver;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("No window of {app} could be found")]
    WindowNotFound { app: String },
    #[error("Profile was saved with {expected} screen(s) but {actual} are connected")]
    MonitorMismatch { expected: usize, actual: usize },
    #[error("Accessibility permission has not been granted")]
    AccessibilityDenied,
    #[error("Window of {app} rejected its new frame")]
    InvalidWindowState { app: String },
    #[error("Application {bundle_id} could not be found or launched")]
    ApplicationNotFound { bundle_id: String },
    #[error("Profile storage error: {0}")]
    Storage(#[from] ProfileStoreError),
}

impl ProfileError {
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::WindowNotFound { .. } => "Open a window in the application and try again.",
            Self::MonitorMismatch { .. } => {
                "Connect the same number of displays the profile was saved with, or save a new profile."
            }
            Self::AccessibilityDenied => {
                "Grant Accessibility access in System Settings > Privacy & Security > Accessibility."
            }
            Self::InvalidWindowState { .. } => {
                "Un-minimize the window or leave full screen, then apply the profile again."
            }
            Self::ApplicationNotFound { .. } => "Install the application or remove it from the profile.",
            Self::Storage(_) => "Check that the configuration directory is writable.",
        }
    }
}

/// Outcome of a successful [`ProfileManager::apply_profile`]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RestoreReport {
    pub placed: Vec<WindowId>,
    /// One message per saved window that could not be restored
    pub warnings: Vec<String>,
}

pub struct ProfileManager {
    accessor: Arc<WindowFrameAccessor>,
    applications: Arc<dyn ApplicationProvider>,
    store: RwLock<ProfileStore>,
    resolver: WindowResolver,
    matching: MatchingConfig,
    launch_policy: BackoffPolicy,
    lookup_policy: BackoffPolicy,
}

impl ProfileManager {
    pub fn new(
        accessor: Arc<WindowFrameAccessor>,
        applications: Arc<dyn ApplicationProvider>,
        store: ProfileStore,
        excluded_owners: Vec<String>,
        settings: &ProfileSettings,
    ) -> Self {
        let launch_policy = BackoffPolicy::new(
            Duration::from_millis(settings.launch_poll_initial_ms),
            Duration::from_millis(settings.launch_poll_max_ms),
            Duration::from_millis(settings.launch_timeout_ms),
        );
        let lookup_policy = launch_policy.with_max_attempts(settings.window_lookup_attempts);
        let resolver = WindowResolver::new(excluded_owners, applications.own_pid());

        Self {
            accessor,
            applications,
            store: RwLock::new(store),
            resolver,
            matching: MatchingConfig::from(settings),
            launch_policy,
            lookup_policy,
        }
    }

    /// Snapshot the visible windows into a new, unsaved profile
    #[instrument(skip(self))]
    pub async fn capture_current_layout(&self, name: &str) -> Result<WindowProfile, ProfileError> {
        self.require_permission()?;

        let screens = self.accessor.screens();
        let setup = monitor_setup(&screens);
        let windows = self
            .accessor
            .on_screen_windows()
            .map_err(|_| ProfileError::AccessibilityDenied)?;

        let mut saved = Vec::new();
        for entry in select_capture_windows(&windows, &self.resolver, &self.matching) {
            let Some(bundle_id) = self.applications.bundle_id_for_pid(entry.owner_pid) else {
                debug!(owner = %entry.owner_name, "Skipping window without a bundle identifier");
                continue;
            };
            let Some(screen) = screen_for_rect(&screens, &entry.bounds) else {
                continue;
            };
            saved.push(WindowInfo {
                bundle_id,
                app_name: entry.owner_name.clone(),
                frame: PercentRect::from_absolute(&entry.bounds, &screen.frame),
                screen_id: screen.id,
                title: entry.title.clone(),
            });
        }

        info!(windows = saved.len(), screens = setup.screen_count(), "Captured layout");
        Ok(WindowProfile::new(name, setup, saved))
    }

    #[instrument(skip(self, profile), fields(name = %profile.name))]
    pub async fn save_profile(&self, profile: WindowProfile) -> Result<(), ProfileError> {
        self.store.write().await.save(profile)?;
        info!("Profile saved");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_profile(&self, id: Uuid) -> Result<WindowProfile, ProfileError> {
        let removed = self.store.write().await.delete(id)?;
        info!(name = %removed.name, "Profile deleted");
        Ok(removed)
    }

    #[instrument(skip(self))]
    pub async fn rename_profile(&self, id: Uuid, name: &str) -> Result<(), ProfileError> {
        self.store.write().await.rename(id, name)?;
        info!("Profile renamed");
        Ok(())
    }

    /// Bind or clear the chord that applies this profile from the run loop
    #[instrument(skip(self))]
    pub async fn set_profile_hotkey(&self, id: Uuid, hotkey: Option<Chord>) -> Result<(), ProfileError> {
        self.store.write().await.set_hotkey(id, hotkey)?;
        Ok(())
    }

    pub async fn list_profiles(&self) -> Vec<WindowProfile> {
        self.store.read().await.list().to_vec()
    }

    pub async fn find_profile(&self, name: &str) -> Option<WindowProfile> {
        self.store.read().await.find_by_name(name).cloned()
    }

    /// Put every saved window back in place. Per-window failures become
    /// warnings; the call fails only when nothing could be placed.
    #[instrument(skip(self, profile), fields(name = %profile.name))]
    pub async fn apply_profile(&self, profile: &WindowProfile) -> Result<RestoreReport, ProfileError> {
        self.require_permission()?;

        let screens = self.accessor.screens();
        let expected = profile.monitor_setup.screen_count();
        if expected != screens.len() {
            return Err(ProfileError::MonitorMismatch {
                expected,
                actual: screens.len(),
            });
        }

        let mapping = map_screens(&profile.monitor_setup, &screens, self.matching.row_tolerance);
        let mut report = RestoreReport::default();
        let mut first_error = None;

        for saved in &profile.windows {
            let screen = mapping.get(&saved.screen_id).and_then(|&index| screens.get(index));
            match self.restore_window(saved, screen).await {
                Ok(window_id) => report.placed.push(window_id),
                Err(error) => {
                    warn!(bundle_id = %saved.bundle_id, %error, "Window not restored");
                    report.warnings.push(format!("{}: {}", display_name(saved), error));
                    first_error.get_or_insert(error);
                }
            }
        }

        if report.placed.is_empty() {
            if let Some(error) = first_error {
                return Err(error);
            }
        }

        info!(placed = report.placed.len(), warnings = report.warnings.len(), "Profile applied");
        Ok(report)
    }

    async fn restore_window(&self, saved: &WindowInfo, screen: Option<&Screen>) -> Result<WindowId, ProfileError> {
        let screen = screen.ok_or_else(|| ProfileError::InvalidWindowState {
            app: display_name(saved).to_string(),
        })?;
        let pid = self.ensure_running(&saved.bundle_id).await?;

        let candidates = poll_with_backoff(self.lookup_policy, || async move {
            self.accessor
                .application_windows(pid)
                .ok()
                .filter(|windows| !windows.is_empty())
        })
        .await
        .ok_or_else(|| ProfileError::WindowNotFound {
            app: display_name(saved).to_string(),
        })?;

        let target = saved.frame.to_absolute(&screen.frame);
        let (index, reason) = match_window(saved, target.size, &candidates, self.matching.size_match_tolerance)
            .ok_or_else(|| ProfileError::WindowNotFound {
                app: display_name(saved).to_string(),
            })?;
        let window: &AXWindow = &candidates[index];
        debug!(window_id = window.window_id, ?reason, ?target, "Restoring window");

        if !self.accessor.set_frame(window.window_id, target) {
            return Err(ProfileError::InvalidWindowState {
                app: display_name(saved).to_string(),
            });
        }
        Ok(window.window_id)
    }

    async fn ensure_running(&self, bundle_id: &str) -> Result<i32, ProfileError> {
        if let Some(pid) = self.applications.running_pid(bundle_id) {
            return Ok(pid);
        }

        info!(bundle_id, "Launching application");
        self.applications
            .launch(bundle_id)
            .map_err(|_| ProfileError::ApplicationNotFound {
                bundle_id: bundle_id.to_string(),
            })?;

        poll_with_backoff(self.launch_policy, || async move { self.applications.running_pid(bundle_id) })
            .await
            .ok_or_else(|| ProfileError::ApplicationNotFound {
                bundle_id: bundle_id.to_string(),
            })
    }

    fn require_permission(&self) -> Result<(), ProfileError> {
        self.accessor
            .ensure_permissions()
            .map_err(|_| ProfileError::AccessibilityDenied)
    }
}

fn display_name(saved: &WindowInfo) -> &str {
    if saved.app_name.is_empty() {
        &saved.bundle_id
    } else {
        &saved.app_name
    }
}
