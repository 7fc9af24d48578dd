//! Command-line interface for FlickTile
//!
//! `flicktile` with no subcommand runs the gesture listener. The remaining
//! commands manage saved layouts and permissions without starting it.

use crate::app::FlickTile;
use crate::macos::permissions::{PermissionReport, PrivacyPane};
use crate::models::window_profile::WindowProfile;
use crate::config::ChordConfig;
use crate::services::profile_manager::{ProfileError, ProfileManager};
use crate::{FlickTileError, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

/// FlickTile command-line interface
#[derive(Parser, Debug)]
#[command(name = "flicktile")]
#[command(about = "Gesture-driven window snapping and resizing for macOS")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct FlickTileCli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Listen for chords and gestures (default)
    Run,

    /// Saved layout management
    Profile(ProfileCommands),

    /// Show permission status
    Permissions {
        /// Prompt for and open the settings panes of missing permissions
        #[arg(long)]
        open: bool,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, PartialEq)]
pub struct ProfileCommands {
    #[command(subcommand)]
    pub action: ProfileActions,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ProfileActions {
    /// List saved profiles
    List {
        #[arg(long)]
        json: bool,
    },

    /// Capture the current layout under a name, replacing any profile with that name
    Save { name: String },

    /// Restore a saved profile
    Apply { name: String },

    /// Delete a saved profile
    Delete { name: String },

    /// Give a saved profile a new name
    Rename { name: String, new_name: String },

    /// Bind a chord that restores the profile while FlickTile is running
    Hotkey {
        name: String,

        /// Modifier names, e.g. `control,option`
        #[arg(long, value_delimiter = ',', required_unless_present = "clear")]
        modifiers: Vec<String>,

        /// Virtual key code that completes the chord
        #[arg(long, required_unless_present = "clear")]
        key: Option<u16>,

        /// Remove the binding instead
        #[arg(long, conflicts_with_all = ["modifiers", "key"])]
        clear: bool,
    },
}

/// Runs parsed commands against a constructed application
pub struct CliExecutor {
    app: FlickTile,
}

impl CliExecutor {
    pub fn new(app: FlickTile) -> Self {
        Self { app }
    }

    pub async fn execute(&mut self, command: Option<Commands>) -> Result<()> {
        match command.unwrap_or(Commands::Run) {
            Commands::Run => self.app.run().await,
            Commands::Profile(profile) => self.execute_profile_command(profile.action).await,
            Commands::Permissions { open, json } => execute_permission_command(open, json),
        }
    }

    async fn execute_profile_command(&self, action: ProfileActions) -> Result<()> {
        let profiles = self.app.profiles();
        match action {
            ProfileActions::List { json } => {
                let list = profiles.list_profiles().await;
                if json {
                    println!("{}", serde_json::to_string_pretty(&list)?);
                } else if list.is_empty() {
                    println!("No profiles saved.");
                } else {
                    println!("Profiles:");
                    for profile in &list {
                        println!("  {}", describe(profile));
                    }
                }
            }
            ProfileActions::Save { name } => {
                let mut profile = profiles.capture_current_layout(&name).await.map_err(report)?;
                if let Some(existing) = profiles.find_profile(&name).await {
                    profile.id = existing.id;
                    profile.hotkey = existing.hotkey;
                }
                let summary = describe(&profile);
                profiles.save_profile(profile).await.map_err(report)?;
                info!(%name, "Profile saved from CLI");
                println!("Saved {summary}");
            }
            ProfileActions::Apply { name } => {
                let profile = find_named(profiles, &name).await?;
                let result = profiles.apply_profile(&profile).await.map_err(report)?;
                println!("Restored {} window(s) from '{}'", result.placed.len(), name);
                for warning in &result.warnings {
                    println!("  warning: {warning}");
                }
            }
            ProfileActions::Delete { name } => {
                let profile = find_named(profiles, &name).await?;
                profiles.delete_profile(profile.id).await.map_err(report)?;
                println!("Deleted '{name}'");
            }
            ProfileActions::Rename { name, new_name } => {
                if profiles.find_profile(&new_name).await.is_some() {
                    return Err(FlickTileError::ValidationError(format!("a profile named '{new_name}' already exists")).into());
                }
                let profile = find_named(profiles, &name).await?;
                profiles.rename_profile(profile.id, &new_name).await.map_err(report)?;
                println!("Renamed '{name}' to '{new_name}'");
            }
            ProfileActions::Hotkey {
                name,
                modifiers,
                key,
                clear,
            } => {
                let profile = find_named(profiles, &name).await?;
                let hotkey = if clear {
                    None
                } else {
                    let chord = ChordConfig { modifiers, key }
                        .to_chord()
                        .map_err(FlickTileError::ValidationError)?;
                    Some(chord)
                };
                let label = hotkey.as_ref().map(ToString::to_string);
                profiles.set_profile_hotkey(profile.id, hotkey).await.map_err(report)?;
                match label {
                    Some(chord) => println!("'{name}' is now bound to {chord}"),
                    None => println!("Cleared the hotkey of '{name}'"),
                }
            }
        }
        Ok(())
    }
}

async fn find_named(profiles: &ProfileManager, name: &str) -> Result<WindowProfile> {
    profiles
        .find_profile(name)
        .await
        .ok_or_else(|| FlickTileError::ValidationError(format!("no profile named '{name}'")).into())
}

fn execute_permission_command(open: bool, json: bool) -> Result<()> {
    let status = PermissionReport::current()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("Permission Status:");
        for pane in PrivacyPane::ALL {
            println!("  {}: {}", pane, granted_label(status.granted(pane)));
        }
    }

    if open {
        for pane in status.missing() {
            if let Err(error) = pane.request() {
                warn!(%pane, %error, "Permission prompt failed");
            }
            pane.open_settings()?;
        }
    }
    Ok(())
}

fn granted_label(granted: bool) -> &'static str {
    if granted {
        "granted"
    } else {
        "missing"
    }
}

fn describe(profile: &WindowProfile) -> String {
    let hotkey = profile
        .hotkey
        .as_ref()
        .map(|chord| format!(" [{chord}]"))
        .unwrap_or_default();
    format!(
        "{} ({} window(s), {} screen(s), {}){}",
        profile.name,
        profile.windows.len(),
        profile.monitor_setup.screen_count(),
        profile.created_at.format("%Y-%m-%d %H:%M"),
        hotkey
    )
}

fn report(error: ProfileError) -> anyhow::Error {
    eprintln!("{error}\n  {}", error.recovery_suggestion());
    error.into()
}
