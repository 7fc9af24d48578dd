//! Settings files and the profile store on disk

use crate::common::*;
use flicktile::config::{ProfileStore, Settings};
use flicktile::models::{Chord, InputEvent, KeyCode, ModifierFlags, MonitorSetup, Point, Rect, WindowProfile};
use flicktile::services::{ControllerConfig, SessionMode};
use std::time::Instant;
use tempfile::TempDir;

#[test]
fn settings_file_is_read_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        [animation]
        enabled = false
        fps = 30

        [resize]
        arrow_step = 25.0

        [tiling]
        excluded_owners = ["Dock"]
        "#,
    )
    .unwrap();

    let settings = Settings::load(Some(&path)).unwrap();
    assert!(!settings.animation.enabled);
    assert_eq!(settings.animation.fps, 30);
    assert_eq!(settings.resize.arrow_step, 25.0);
    assert_eq!(settings.tiling.excluded_owners, vec!["Dock".to_string()]);
    assert_eq!(settings.gesture, Settings::default().gesture);
}

#[test]
fn malformed_file_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[gesture\ndead_zone_radius = ").unwrap();

    let error = Settings::load(Some(&path)).unwrap_err();
    assert!(error.to_string().contains("Configuration error"));
}

#[test]
fn identical_chords_are_rejected() {
    let error = Settings::from_toml(
        r#"
        [chords.tile]
        modifiers = ["ctrl", "alt"]

        [chords.resize]
        modifiers = ["ctrl", "alt"]
        "#,
    )
    .unwrap_err();
    assert!(error.to_string().contains("must differ"));
}

#[test]
fn chord_with_a_key_needs_the_key_held() {
    let settings = Settings::from_toml(
        r#"
        [animation]
        enabled = false

        [chords.tile]
        modifiers = ["command"]
        key = 49
        "#,
    )
    .unwrap();
    let config = ControllerConfig::from_settings(&settings).unwrap();
    assert_eq!(config.tile_chord, Chord::with_key(ModifierFlags::COMMAND, KeyCode(49)));

    let desktop = Desktop::new(
        vec![primary()],
        vec![window(10, 42, "Editor", Rect::new(200.0, 200.0, 800.0, 500.0))],
    );
    let mut controller = desktop.controller(config);
    let cursor = Point::new(600.0, 450.0);
    let now = Instant::now();

    controller.handle_event(modifiers(ModifierFlags::COMMAND, cursor), now);
    assert_eq!(controller.mode(), SessionMode::Idle);

    controller.handle_event(InputEvent::KeyDown { key: KeyCode(49), cursor }, now);
    assert_eq!(controller.mode(), SessionMode::Tile);

    controller.handle_event(InputEvent::KeyUp { key: KeyCode(49) }, now);
    assert_eq!(controller.mode(), SessionMode::Idle);
}

#[test]
fn profile_hotkeys_survive_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("profiles.toml");
    let profile = WindowProfile::new("coding", MonitorSetup::default(), Vec::new());
    let id = profile.id;
    let hotkey = Chord::with_key(ModifierFlags::CONTROL | ModifierFlags::OPTION, KeyCode(18));

    let mut store = ProfileStore::load(&path);
    store.save(profile).unwrap();
    store.set_hotkey(id, Some(hotkey.clone())).unwrap();

    let reloaded = ProfileStore::load(&path);
    assert_eq!(reloaded.get(id).and_then(|p| p.hotkey.clone()), Some(hotkey));
    assert_eq!(reloaded.find_by_name("coding").map(|p| p.id), Some(id));

    let mut store = reloaded;
    store.set_hotkey(id, None).unwrap();
    assert_eq!(ProfileStore::load(&path).get(id).and_then(|p| p.hotkey.clone()), None);
}
