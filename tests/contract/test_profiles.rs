//! Capturing layouts to disk and restoring them

use crate::common::*;
use flicktile::config::{ProfileSettings, ProfileStore, Settings};
use flicktile::macos::{FakeWindow, InMemoryApplicationProvider};
use flicktile::models::{PercentRect, Rect, WindowInfo, WindowProfile};
use flicktile::services::profile_matching::monitor_setup;
use flicktile::services::{ProfileError, ProfileManager};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn manager(desktop: &Desktop, applications: InMemoryApplicationProvider, path: &Path) -> ProfileManager {
    ProfileManager::new(
        desktop.accessor.clone(),
        Arc::new(applications),
        ProfileStore::load(path),
        Settings::default().tiling.excluded_owners,
        &ProfileSettings::default(),
    )
}

fn apps() -> InMemoryApplicationProvider {
    InMemoryApplicationProvider::new()
        .with_running("com.example.editor", 10)
        .with_running("com.example.browser", 20)
        .with_running("com.example.palette", 30)
        .with_running("com.example.notes", 40)
        .with_running("com.example.terminal", 50)
}

fn assert_close(actual: Rect, expected: Rect, reference: &Rect) {
    let tolerance_x = reference.width() * 0.01;
    let tolerance_y = reference.height() * 0.01;
    assert!((actual.min_x() - expected.min_x()).abs() <= tolerance_x, "{actual:?} vs {expected:?}");
    assert!((actual.min_y() - expected.min_y()).abs() <= tolerance_y, "{actual:?} vs {expected:?}");
    assert!((actual.width() - expected.width()).abs() <= tolerance_x, "{actual:?} vs {expected:?}");
    assert!((actual.height() - expected.height()).abs() <= tolerance_y, "{actual:?} vs {expected:?}");
}

#[tokio::test(start_paused = true)]
async fn layout_survives_a_trip_through_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("profiles.toml");
    let editor = Rect::new(0.0, 0.0, 960.0, 1055.0);
    let browser = Rect::new(2000.0, 100.0, 1200.0, 900.0);
    let desktop = Desktop::new(
        vec![primary(), secondary()],
        vec![
            window(1, 10, "Editor", editor).with_title("main.rs"),
            window(2, 20, "Browser", browser),
        ],
    );

    let writer = manager(&desktop, apps(), &path);
    let profile = writer.capture_current_layout("desk").await.unwrap();
    assert_eq!(profile.monitor_setup.screen_count(), 2);
    assert_eq!(profile.windows.len(), 2);
    writer.save_profile(profile).await.unwrap();
    drop(writer);

    desktop
        .provider
        .move_externally(1, flicktile::macos::layout_to_native(Rect::new(500.0, 500.0, 300.0, 300.0), PRIMARY_HEIGHT));
    desktop
        .provider
        .move_externally(2, flicktile::macos::layout_to_native(Rect::new(100.0, 100.0, 400.0, 400.0), PRIMARY_HEIGHT));

    let reader = manager(&desktop, apps(), &path);
    let saved = reader.find_profile("desk").await.expect("profile persisted");
    let report = reader.apply_profile(&saved).await.unwrap();

    assert_eq!(report.placed.len(), 2);
    assert!(report.warnings.is_empty());
    assert_close(desktop.frame(1), editor, &primary().frame);
    assert_close(desktop.frame(2), browser, &secondary().frame);
}

#[tokio::test]
async fn capture_skips_hidden_windows() {
    let dir = TempDir::new().unwrap();
    let desktop = Desktop::new(
        vec![primary()],
        vec![
            window(4, 50, "Terminal", Rect::new(1000.0, 100.0, 300.0, 400.0)),
            window(3, 40, "Notes", Rect::new(1000.0, 100.0, 600.0, 400.0)),
            window(1, 10, "Editor", Rect::new(100.0, 100.0, 800.0, 600.0)),
            // Floating panel listed behind the editor but drawn above it
            window(2, 30, "Palette", Rect::new(50.0, 50.0, 900.0, 700.0)).with_layer(3),
            window(5, 60, "Dock", Rect::new(0.0, 0.0, 1920.0, 80.0)),
        ],
    );

    let profile = manager(&desktop, apps(), &dir.path().join("p.toml"))
        .capture_current_layout("focus")
        .await
        .unwrap();

    let names: Vec<&str> = profile.windows.iter().map(|w| w.app_name.as_str()).collect();
    assert_eq!(names, vec!["Terminal", "Notes"]);
    assert_eq!(profile.windows[1].bundle_id, "com.example.notes");
}

#[tokio::test(start_paused = true)]
async fn restoring_launches_missing_application() {
    let dir = TempDir::new().unwrap();
    let desktop = Desktop::new(
        vec![primary()],
        vec![window(7, 70, "Mail", Rect::new(300.0, 300.0, 500.0, 400.0))],
    );
    let applications = Arc::new(InMemoryApplicationProvider::new().with_installed("com.example.mail", 70));
    let profiles = ProfileManager::new(
        desktop.accessor.clone(),
        applications.clone(),
        ProfileStore::load(dir.path().join("p.toml")),
        Vec::new(),
        &ProfileSettings::default(),
    );

    let profile = WindowProfile::new(
        "mail",
        monitor_setup(&[primary()]),
        vec![WindowInfo {
            bundle_id: "com.example.mail".into(),
            app_name: "Mail".into(),
            frame: PercentRect {
                x: 0.5,
                y: 0.0,
                width: 0.5,
                height: 0.5,
            },
            screen_id: 1,
            title: None,
        }],
    );

    let report = profiles.apply_profile(&profile).await.unwrap();
    assert_eq!(report.placed, vec![7]);
    assert_eq!(applications.launched(), vec!["com.example.mail".to_string()]);
    assert_eq!(desktop.frame(7), Rect::new(960.0, 0.0, 960.0, 540.0));
}

#[tokio::test(start_paused = true)]
async fn uninstalled_application_is_reported() {
    let dir = TempDir::new().unwrap();
    let desktop = Desktop::new(vec![primary()], Vec::<FakeWindow>::new());
    let profiles = manager(&desktop, InMemoryApplicationProvider::new(), &dir.path().join("p.toml"));

    let profile = WindowProfile::new(
        "gone",
        monitor_setup(&[primary()]),
        vec![WindowInfo {
            bundle_id: "com.example.gone".into(),
            app_name: "Gone".into(),
            frame: PercentRect {
                x: 0.0,
                y: 0.0,
                width: 1.0,
                height: 1.0,
            },
            screen_id: 1,
            title: None,
        }],
    );

    let error = profiles.apply_profile(&profile).await.unwrap_err();
    assert!(matches!(error, ProfileError::ApplicationNotFound { ref bundle_id } if bundle_id == "com.example.gone"));
}

#[tokio::test]
async fn monitor_count_must_match() {
    let dir = TempDir::new().unwrap();
    let desktop = Desktop::new(
        vec![primary(), secondary()],
        vec![window(1, 10, "Editor", Rect::new(0.0, 0.0, 960.0, 1055.0))],
    );
    let profiles = manager(&desktop, apps(), &dir.path().join("p.toml"));
    let profile = profiles.capture_current_layout("dual").await.unwrap();

    desktop.displays.replace(vec![primary()]);
    let error = profiles.apply_profile(&profile).await.unwrap_err();

    assert!(matches!(error, ProfileError::MonitorMismatch { expected: 2, actual: 1 }));
    assert!(error.recovery_suggestion().contains("displays"));
    assert_eq!(desktop.frame(1), Rect::new(0.0, 0.0, 960.0, 1055.0));
}
