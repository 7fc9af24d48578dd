//! Composition root and main event loop

use crate::config::{ProfileStore, Settings};
use crate::macos::accessibility::AccessibilityProvider;
use crate::macos::core_graphics::DisplayProvider;
use crate::macos::event_tap::spawn_event_tap;
use crate::macos::permissions::PermissionReport;
use crate::macos::workspace::ApplicationProvider;
use crate::models::input::{Chord, InputEvent};
use crate::models::screen::Screen;
use crate::services::frame_accessor::WindowFrameAccessor;
use crate::services::profile_manager::ProfileManager;
use crate::services::tiling_controller::{ControllerConfig, TilingController};
use crate::ui::overlay::{HighlightOverlay, TracingOverlay};
use crate::{FlickTileError, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

const TOPOLOGY_POLL: Duration = Duration::from_secs(1);

/// Every OS-facing dependency, injectable for tests
pub struct Providers {
    pub accessibility: Arc<dyn AccessibilityProvider>,
    pub displays: Arc<dyn DisplayProvider>,
    pub applications: Arc<dyn ApplicationProvider>,
    pub overlay: Arc<dyn HighlightOverlay>,
}

impl Providers {
    pub fn system() -> Self {
        Self {
            accessibility: Arc::new(crate::macos::SystemAccessibilityProvider::new()),
            displays: Arc::new(crate::macos::SystemDisplayProvider::new()),
            applications: Arc::new(crate::macos::SystemApplicationProvider::new()),
            overlay: Arc::new(TracingOverlay),
        }
    }
}

pub struct FlickTile {
    settings: Settings,
    accessor: Arc<WindowFrameAccessor>,
    profiles: ProfileManager,
    controller: TilingController,
}

impl FlickTile {
    #[instrument(skip_all)]
    pub fn new(settings: Settings, providers: Providers, store: ProfileStore) -> Result<Self> {
        settings.validate()?;

        let accessor = Arc::new(WindowFrameAccessor::new(providers.accessibility, providers.displays));
        let own_pid = providers.applications.own_pid();
        let controller = TilingController::new(
            ControllerConfig::from_settings(&settings)?,
            Arc::clone(&accessor),
            providers.overlay,
            own_pid,
        );
        let profiles = ProfileManager::new(
            Arc::clone(&accessor),
            providers.applications,
            store,
            settings.tiling.excluded_owners.clone(),
            &settings.profiles,
        );

        debug!(store = %ProfileStore::default_path().display(), "Services constructed");
        Ok(Self {
            settings,
            accessor,
            profiles,
            controller,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn accessor(&self) -> &Arc<WindowFrameAccessor> {
        &self.accessor
    }

    pub fn profiles(&self) -> &ProfileManager {
        &self.profiles
    }

    pub fn controller(&self) -> &TilingController {
        &self.controller
    }

    /// Listen for input until Ctrl-C or SIGTERM
    #[instrument(skip_all)]
    pub async fn run(&mut self) -> Result<()> {
        let report = PermissionReport::current()?;
        if !report.all_granted() {
            for pane in report.missing() {
                error!(?pane, "Permission missing");
            }
            return Err(FlickTileError::PermissionDenied(
                "Accessibility and Input Monitoring access are required; run `flicktile permissions --open`".into(),
            )
            .into());
        }

        let (sender, mut events) = mpsc::unbounded_channel();
        let _tap = spawn_event_tap(sender)?;

        let mut ticker = interval(self.settings.animation.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut topology = interval(TOPOLOGY_POLL);
        topology.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_screens = self.accessor.screens();
        let mut hotkeys = self.profile_hotkeys().await;

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        info!(screens = last_screens.len(), profiles = hotkeys.len(), "FlickTile is running");

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        let key_down = matches!(event, InputEvent::KeyDown { .. });
                        self.controller.handle_event(event, Instant::now());
                        if key_down {
                            self.apply_hotkey_profile(&hotkeys).await;
                        }
                    }
                    None => {
                        warn!("Event tap stopped");
                        break;
                    }
                },
                _ = ticker.tick() => self.controller.tick(Instant::now()),
                _ = topology.tick() => {
                    let screens = self.accessor.screens();
                    if screens_changed(&last_screens, &screens) {
                        debug!(count = screens.len(), "Screen parameters changed");
                        last_screens = screens;
                        self.controller.screen_parameters_changed();
                        hotkeys = self.profile_hotkeys().await;
                    }
                }
                _ = &mut shutdown => break,
            }
        }

        self.controller.exit_active_mode();
        info!(metrics = ?self.accessor.metrics(), "FlickTile stopped");
        Ok(())
    }

    async fn profile_hotkeys(&self) -> Vec<(Chord, Uuid)> {
        self.profiles
            .list_profiles()
            .await
            .into_iter()
            .filter_map(|p| p.hotkey.filter(|chord| chord.key.is_some()).map(|chord| (chord, p.id)))
            .collect()
    }

    async fn apply_hotkey_profile(&self, hotkeys: &[(Chord, Uuid)]) {
        let (modifiers, keys) = self.controller.held_input();
        let Some(id) = hotkeys
            .iter()
            .find(|(chord, _)| chord.is_satisfied(modifiers, keys))
            .map(|(_, id)| *id)
        else {
            return;
        };

        let Some(profile) = self.profiles.list_profiles().await.into_iter().find(|p| p.id == id) else {
            return;
        };
        match self.profiles.apply_profile(&profile).await {
            Ok(report) => {
                for warning in &report.warnings {
                    warn!(profile = %profile.name, "{warning}");
                }
            }
            Err(error) => warn!(profile = %profile.name, %error, hint = error.recovery_suggestion(), "Profile not applied"),
        }
    }
}

fn screens_changed(before: &[Screen], after: &[Screen]) -> bool {
    before != after
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    res = signal::ctrl_c() => {
                        if let Err(e) = res {
                            warn!("Failed to listen for Ctrl+C: {}", e);
                        }
                        info!("Received SIGINT (Ctrl+C)");
                    }
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                let _ = signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        match signal::ctrl_c().await {
            Ok(_) => info!("Received Ctrl+C"),
            Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
        }
    }
}
