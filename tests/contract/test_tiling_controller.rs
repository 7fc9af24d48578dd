//! Tile and resize sessions driven through the input event stream

use crate::common::*;
use flicktile::macos::PermissionStatus;
use flicktile::models::{Direction, InputEvent, KeyCode, ModifierFlags, Point, Rect, Size};
use flicktile::services::{ResizeEdges, SessionMode};
use flicktile::ui::OverlayCall;
use std::time::{Duration, Instant};

fn key_down(key: KeyCode, cursor: Point) -> InputEvent {
    InputEvent::KeyDown { key, cursor }
}

fn key_up(key: KeyCode) -> InputEvent {
    InputEvent::KeyUp { key }
}

#[test]
fn placed_window_stays_put_on_single_screen() {
    for direction in Direction::ALL {
        let target = direction.target_rect(&primary().visible_frame);
        let desktop = Desktop::new(vec![primary()], vec![window(10, 42, "Editor", target)]);
        let mut controller = desktop.controller(instant_config());
        let now = Instant::now();

        controller.handle_event(modifiers(tile_chord(), target.center()), now);
        assert_eq!(controller.mode(), SessionMode::Tile, "{direction}");

        assert!(controller.apply_direction(direction, now));
        assert_eq!(desktop.frame(10), target, "{direction}");
        assert_eq!(desktop.provider.write_count(), 0, "{direction}");
    }
}

#[test]
fn repeated_direction_cycles_to_adjacent_screen() {
    let desktop = Desktop::new(
        vec![primary(), secondary()],
        vec![window(10, 42, "Editor", Rect::new(100.0, 100.0, 600.0, 400.0))],
    );
    let mut controller = desktop.controller(instant_config());
    let now = Instant::now();

    controller.handle_event(modifiers(tile_chord(), Point::new(300.0, 300.0)), now);
    assert!(controller.apply_direction(Direction::East, now));
    assert_eq!(desktop.frame(10), Direction::East.target_rect(&primary().visible_frame));

    assert!(controller.apply_direction(Direction::East, now));
    assert_eq!(desktop.frame(10), Direction::East.target_rect(&secondary().visible_frame));

    // Already on the rightmost screen: nothing further to the east.
    assert!(controller.apply_direction(Direction::East, now));
    assert_eq!(desktop.frame(10), Direction::East.target_rect(&secondary().visible_frame));

    assert!(controller.apply_direction(Direction::West, now));
    assert_eq!(desktop.frame(10), Direction::West.target_rect(&secondary().visible_frame));
    assert!(controller.apply_direction(Direction::West, now));
    assert_eq!(desktop.frame(10), Direction::West.target_rect(&primary().visible_frame));
}

#[test]
fn north_cycles_around_all_screens() {
    let desktop = Desktop::new(
        vec![primary(), secondary()],
        vec![window(10, 42, "Editor", Rect::new(2200.0, 100.0, 600.0, 400.0))],
    );
    let mut controller = desktop.controller(instant_config());
    let now = Instant::now();

    controller.handle_event(modifiers(tile_chord(), Point::new(2300.0, 300.0)), now);
    controller.apply_direction(Direction::North, now);
    assert_eq!(desktop.frame(10), Direction::North.target_rect(&secondary().visible_frame));
    controller.apply_direction(Direction::North, now);
    assert_eq!(desktop.frame(10), Direction::North.target_rect(&primary().visible_frame));
}

#[test]
fn flick_places_window_and_ends_session() {
    let desktop = Desktop::new(
        vec![primary()],
        vec![window(10, 42, "Editor", Rect::new(200.0, 200.0, 800.0, 500.0))],
    );
    let mut controller = desktop.controller(instant_config());
    let now = Instant::now();

    controller.handle_event(modifiers(tile_chord(), Point::new(600.0, 450.0)), now);
    assert_eq!(controller.locked_window(), Some(10));
    assert!(desktop.overlay.is_visible());

    controller.handle_event(mouse(600.0, 560.0), now);
    assert_eq!(desktop.frame(10), Rect::new(200.0, 200.0, 800.0, 500.0));

    controller.handle_event(mouse(600.0, 700.0), now + Duration::from_millis(40));
    let north = Direction::North.target_rect(&primary().visible_frame);
    assert_eq!(desktop.frame(10), north);
    assert_eq!(controller.mode(), SessionMode::Idle);
    assert!(!desktop.overlay.is_visible());
    assert!(desktop.overlay.calls().contains(&OverlayCall::Pulse(north)));

    // Still holding the chord: no second placement until it is pressed again.
    controller.handle_event(mouse(100.0, 700.0), now + Duration::from_millis(80));
    assert_eq!(controller.mode(), SessionMode::Idle);
    assert_eq!(desktop.frame(10), north);

    controller.handle_event(modifiers(ModifierFlags::empty(), Point::new(100.0, 700.0)), now);
    controller.handle_event(modifiers(tile_chord(), Point::new(100.0, 700.0)), now);
    assert_eq!(controller.mode(), SessionMode::Tile);
}

#[test]
fn arrow_pair_within_debounce_places_diagonally() {
    let desktop = Desktop::new(
        vec![primary()],
        vec![window(10, 42, "Editor", Rect::new(200.0, 200.0, 800.0, 500.0))],
    );
    let mut controller = desktop.controller(instant_config());
    let cursor = Point::new(600.0, 450.0);
    let now = Instant::now();

    controller.handle_event(modifiers(tile_chord(), cursor), now);
    controller.handle_event(key_down(KeyCode::UP_ARROW, cursor), now);
    controller.handle_event(key_down(KeyCode::RIGHT_ARROW, cursor), now + Duration::from_millis(20));

    controller.tick(now + Duration::from_millis(30));
    assert_eq!(controller.mode(), SessionMode::Tile);

    controller.tick(now + Duration::from_millis(61));
    assert_eq!(desktop.frame(10), Direction::NorthEast.target_rect(&primary().visible_frame));
    assert_eq!(controller.mode(), SessionMode::Idle);
}

#[test]
fn other_keys_end_tile_mode() {
    let desktop = Desktop::new(
        vec![primary()],
        vec![window(10, 42, "Editor", Rect::new(200.0, 200.0, 800.0, 500.0))],
    );
    let mut controller = desktop.controller(instant_config());
    let cursor = Point::new(600.0, 450.0);
    let now = Instant::now();

    controller.handle_event(modifiers(tile_chord(), cursor), now);
    controller.handle_event(key_down(KeyCode(0), cursor), now);
    assert_eq!(controller.mode(), SessionMode::Idle);
    assert_eq!(desktop.provider.write_count(), 0);
}

#[test]
fn missing_permission_blocks_sessions() {
    let desktop = Desktop::new(
        vec![primary()],
        vec![window(10, 42, "Editor", Rect::new(200.0, 200.0, 800.0, 500.0))],
    );
    desktop.provider.set_permission_status(PermissionStatus::Denied);
    let mut controller = desktop.controller(instant_config());

    controller.handle_event(modifiers(tile_chord(), Point::new(600.0, 450.0)), Instant::now());
    assert_eq!(controller.mode(), SessionMode::Idle);
    assert!(!desktop.overlay.is_visible());
}

#[test]
fn empty_desktop_area_does_nothing() {
    let desktop = Desktop::new(
        vec![primary()],
        vec![window(10, 42, "Editor", Rect::new(200.0, 200.0, 800.0, 500.0))],
    );
    let mut controller = desktop.controller(instant_config());

    controller.handle_event(modifiers(tile_chord(), Point::new(1500.0, 900.0)), Instant::now());
    assert_eq!(controller.mode(), SessionMode::Idle);
}

#[test]
fn stationary_cursor_keeps_last_window() {
    let desktop = Desktop::new(
        vec![primary()],
        vec![window(10, 42, "Editor", primary().visible_frame)],
    );
    let mut controller = desktop.controller(instant_config());
    let cursor = Point::new(1500.0, 300.0);
    let now = Instant::now();

    controller.handle_event(modifiers(tile_chord(), cursor), now);
    controller.handle_event(key_down(KeyCode::LEFT_ARROW, cursor), now);
    controller.tick(now + Duration::from_millis(100));
    assert_eq!(desktop.frame(10), Direction::West.target_rect(&primary().visible_frame));
    assert!(!desktop.frame(10).contains(cursor));

    controller.handle_event(key_up(KeyCode::LEFT_ARROW), now);
    controller.handle_event(modifiers(ModifierFlags::empty(), cursor), now);
    controller.handle_event(modifiers(tile_chord(), cursor), now);
    assert_eq!(controller.mode(), SessionMode::Tile);
    assert_eq!(controller.locked_window(), Some(10));
}

#[test]
fn left_edge_resize_keeps_right_edge_through_minimum() {
    let initial = Rect::new(400.0, 300.0, 800.0, 500.0);
    let desktop = Desktop::new(
        vec![primary()],
        vec![window(10, 42, "Editor", initial).with_enforced_min_size(Size::new(300.0, 200.0))],
    );
    let mut controller = desktop.controller(instant_config());
    let now = Instant::now();

    controller.handle_event(modifiers(resize_chord(), Point::new(450.0, 550.0)), now);
    assert_eq!(controller.mode(), SessionMode::Resize);
    assert_eq!(controller.resize_edges(), Some(ResizeEdges::LEFT));

    for x in [550.0, 850.0, 1150.0, 1350.0, 1000.0, 250.0] {
        controller.handle_event(mouse(x, 560.0), now);
        let frame = desktop.frame(10);
        assert!((frame.max_x() - initial.max_x()).abs() <= 1.0, "cursor x {x}: {frame:?}");
        assert_eq!(frame.height(), initial.height());
        assert!(frame.width() >= 300.0);
    }

    assert_eq!(controller.learned_minimum().map(|s| s.width), Some(300.0));
    assert_eq!(desktop.frame(10), Rect::new(200.0, 300.0, 1000.0, 500.0));
}

#[test]
fn advertised_minimum_is_respected_without_learning() {
    let initial = Rect::new(400.0, 300.0, 800.0, 500.0);
    let desktop = Desktop::new(
        vec![primary()],
        vec![window(10, 42, "Editor", initial).with_advertised_min_size(Size::new(500.0, 200.0))],
    );
    let mut controller = desktop.controller(instant_config());
    let now = Instant::now();

    controller.handle_event(modifiers(resize_chord(), Point::new(450.0, 550.0)), now);
    controller.handle_event(mouse(1150.0, 550.0), now);
    assert_eq!(desktop.frame(10), Rect::new(700.0, 300.0, 500.0, 500.0));
    assert_eq!(controller.learned_minimum(), Some(Size::default()));
}

#[test]
fn top_right_corner_drag_grows_towards_cursor() {
    let desktop = Desktop::new(
        vec![primary()],
        vec![window(10, 42, "Editor", Rect::new(400.0, 300.0, 600.0, 300.0))],
    );
    let mut controller = desktop.controller(instant_config());
    let now = Instant::now();

    controller.handle_event(modifiers(resize_chord(), Point::new(980.0, 590.0)), now);
    assert_eq!(controller.resize_edges(), Some(ResizeEdges::RIGHT | ResizeEdges::TOP));

    controller.handle_event(mouse(1080.0, 640.0), now);
    assert_eq!(desktop.frame(10), Rect::new(400.0, 300.0, 700.0, 350.0));
}

#[test]
fn resize_is_clamped_to_visible_frame() {
    let desktop = Desktop::new(
        vec![primary()],
        vec![window(10, 42, "Editor", Rect::new(400.0, 300.0, 600.0, 300.0))],
    );
    let mut controller = desktop.controller(instant_config());
    let now = Instant::now();

    controller.handle_event(modifiers(resize_chord(), Point::new(980.0, 450.0)), now);
    controller.handle_event(mouse(3000.0, 450.0), now);
    assert_eq!(desktop.frame(10).max_x(), 1920.0);
}

#[test]
fn arrow_nudges_compose_with_the_drag() {
    let desktop = Desktop::new(
        vec![primary()],
        vec![window(10, 42, "Editor", Rect::new(400.0, 300.0, 800.0, 500.0))],
    );
    let mut controller = desktop.controller(instant_config());
    let cursor = Point::new(1150.0, 550.0);
    let now = Instant::now();

    controller.handle_event(modifiers(resize_chord(), cursor), now);
    assert_eq!(controller.resize_edges(), Some(ResizeEdges::RIGHT));

    controller.handle_event(key_down(KeyCode::RIGHT_ARROW, cursor), now);
    assert_eq!(desktop.frame(10).width(), 810.0);
    controller.handle_event(key_up(KeyCode::RIGHT_ARROW), now);
    controller.handle_event(key_down(KeyCode::RIGHT_ARROW, cursor), now);
    assert_eq!(desktop.frame(10).width(), 820.0);

    controller.handle_event(mouse(1200.0, 550.0), now);
    assert_eq!(desktop.frame(10).width(), 870.0);
    assert_eq!(controller.mode(), SessionMode::Resize);
}

#[test]
fn centre_zone_moves_the_window() {
    let desktop = Desktop::new(
        vec![primary()],
        vec![window(10, 42, "Editor", Rect::new(400.0, 300.0, 600.0, 300.0))],
    );
    let mut controller = desktop.controller(instant_config());
    let now = Instant::now();

    controller.handle_event(modifiers(resize_chord(), Point::new(700.0, 450.0)), now);
    assert_eq!(controller.resize_edges(), Some(ResizeEdges::empty()));
    controller.handle_event(mouse(650.0, 500.0), now);
    assert_eq!(desktop.frame(10), Rect::new(350.0, 350.0, 600.0, 300.0));
}

#[test]
fn escape_and_release_end_resize() {
    let desktop = Desktop::new(
        vec![primary()],
        vec![window(10, 42, "Editor", Rect::new(400.0, 300.0, 800.0, 500.0))],
    );
    let mut controller = desktop.controller(instant_config());
    let cursor = Point::new(1150.0, 550.0);
    let now = Instant::now();

    controller.handle_event(modifiers(resize_chord(), cursor), now);
    controller.handle_event(key_down(KeyCode::ESCAPE, cursor), now);
    assert_eq!(controller.mode(), SessionMode::Idle);
    controller.handle_event(mouse(1300.0, 550.0), now);
    assert_eq!(desktop.frame(10).width(), 800.0);

    controller.handle_event(modifiers(ModifierFlags::empty(), cursor), now);
    controller.handle_event(modifiers(resize_chord(), cursor), now);
    assert_eq!(controller.mode(), SessionMode::Resize);
    controller.handle_event(modifiers(ModifierFlags::empty(), cursor), now);
    assert_eq!(controller.mode(), SessionMode::Idle);
}

#[test]
fn adding_shift_switches_tile_to_resize() {
    let desktop = Desktop::new(
        vec![primary()],
        vec![window(10, 42, "Editor", Rect::new(400.0, 300.0, 800.0, 500.0))],
    );
    let mut controller = desktop.controller(instant_config());
    let cursor = Point::new(450.0, 550.0);
    let now = Instant::now();

    controller.handle_event(modifiers(tile_chord(), cursor), now);
    assert_eq!(controller.mode(), SessionMode::Tile);
    controller.handle_event(modifiers(resize_chord(), cursor), now);
    assert_eq!(controller.mode(), SessionMode::Resize);
    controller.handle_event(modifiers(tile_chord(), cursor), now);
    assert_eq!(controller.mode(), SessionMode::Tile);
}

#[test]
fn animated_placement_finishes_on_tick() {
    let desktop = Desktop::new(
        vec![primary()],
        vec![window(10, 42, "Editor", Rect::new(200.0, 200.0, 800.0, 500.0))],
    );
    let mut controller = desktop.controller(animated_config());
    let now = Instant::now();

    controller.handle_event(modifiers(tile_chord(), Point::new(600.0, 450.0)), now);
    controller.handle_event(mouse(900.0, 450.0), now);
    assert_eq!(controller.mode(), SessionMode::Idle);
    assert!(controller.animation().is_animating(10));

    controller.tick(now + Duration::from_millis(100));
    let east = Direction::East.target_rect(&primary().visible_frame);
    assert_ne!(desktop.frame(10), east);

    controller.tick(now + Duration::from_millis(260));
    assert_eq!(desktop.frame(10), east);
    assert!(!controller.animation().is_animating(10));
    assert!(desktop.overlay.calls().contains(&OverlayCall::Pulse(east)));
}

#[test]
fn repeat_during_animation_cycles_screens() {
    let desktop = Desktop::new(
        vec![primary(), secondary()],
        vec![window(10, 42, "Editor", Rect::new(100.0, 100.0, 600.0, 400.0))],
    );
    let mut controller = desktop.controller(animated_config());
    let now = Instant::now();

    controller.handle_event(modifiers(tile_chord(), Point::new(300.0, 300.0)), now);
    controller.apply_direction(Direction::East, now);
    assert_eq!(
        controller.animation().pending_target(10),
        Some(Direction::East.target_rect(&primary().visible_frame))
    );

    controller.apply_direction(Direction::East, now + Duration::from_millis(16));
    assert_eq!(
        controller.animation().pending_target(10),
        Some(Direction::East.target_rect(&secondary().visible_frame))
    );
}

#[test]
fn released_arrow_is_replaced_by_the_one_still_held() {
    let desktop = Desktop::new(
        vec![primary()],
        vec![window(10, 42, "Editor", Rect::new(200.0, 200.0, 800.0, 500.0))],
    );
    let mut controller = desktop.controller(instant_config());
    let cursor = Point::new(600.0, 450.0);
    let now = Instant::now();

    controller.handle_event(modifiers(tile_chord(), cursor), now);
    controller.handle_event(key_down(KeyCode::LEFT_ARROW, cursor), now);
    controller.handle_event(key_up(KeyCode::LEFT_ARROW), now + Duration::from_millis(10));
    controller.handle_event(key_down(KeyCode::RIGHT_ARROW, cursor), now + Duration::from_millis(20));

    controller.tick(now + Duration::from_millis(100));
    assert_eq!(desktop.frame(10), Rect::new(960.0, 0.0, 960.0, 1055.0));
    assert_eq!(controller.mode(), SessionMode::Idle);
}

#[test]
fn quick_arrow_tap_still_places() {
    let desktop = Desktop::new(
        vec![primary()],
        vec![window(10, 42, "Editor", Rect::new(200.0, 200.0, 800.0, 500.0))],
    );
    let mut controller = desktop.controller(instant_config());
    let cursor = Point::new(600.0, 450.0);
    let now = Instant::now();

    controller.handle_event(modifiers(tile_chord(), cursor), now);
    controller.handle_event(key_down(KeyCode::UP_ARROW, cursor), now);
    controller.handle_event(key_up(KeyCode::UP_ARROW), now + Duration::from_millis(10));

    controller.tick(now + Duration::from_millis(61));
    assert_eq!(desktop.frame(10), Direction::North.target_rect(&primary().visible_frame));
}

#[test]
fn three_arrows_end_tile_mode_without_moving() {
    let initial = Rect::new(200.0, 200.0, 800.0, 500.0);
    let desktop = Desktop::new(vec![primary()], vec![window(10, 42, "Editor", initial)]);
    let mut controller = desktop.controller(instant_config());
    let cursor = Point::new(600.0, 450.0);
    let now = Instant::now();

    controller.handle_event(modifiers(tile_chord(), cursor), now);
    controller.handle_event(key_down(KeyCode::UP_ARROW, cursor), now);
    controller.handle_event(key_down(KeyCode::LEFT_ARROW, cursor), now);
    assert_eq!(controller.mode(), SessionMode::Tile);
    controller.handle_event(key_down(KeyCode::RIGHT_ARROW, cursor), now);
    assert_eq!(controller.mode(), SessionMode::Idle);

    controller.tick(now + Duration::from_millis(100));
    assert_eq!(desktop.frame(10), initial);
    assert_eq!(desktop.provider.write_count(), 0);
}

#[test]
fn opposing_arrows_end_tile_mode_without_moving() {
    let initial = Rect::new(200.0, 200.0, 800.0, 500.0);
    let desktop = Desktop::new(vec![primary()], vec![window(10, 42, "Editor", initial)]);
    let mut controller = desktop.controller(instant_config());
    let cursor = Point::new(600.0, 450.0);
    let now = Instant::now();

    controller.handle_event(modifiers(tile_chord(), cursor), now);
    controller.handle_event(key_down(KeyCode::LEFT_ARROW, cursor), now);
    controller.handle_event(key_down(KeyCode::RIGHT_ARROW, cursor), now + Duration::from_millis(10));
    controller.tick(now + Duration::from_millis(61));

    assert_eq!(controller.mode(), SessionMode::Idle);
    assert_eq!(desktop.frame(10), initial);
    assert_eq!(desktop.provider.write_count(), 0);
}

#[test]
fn closed_window_makes_placement_a_no_op() {
    let desktop = Desktop::new(
        vec![primary()],
        vec![window(10, 42, "Editor", Rect::new(200.0, 200.0, 800.0, 500.0))],
    );
    let mut controller = desktop.controller(instant_config());
    let cursor = Point::new(600.0, 450.0);
    let now = Instant::now();

    controller.handle_event(modifiers(tile_chord(), cursor), now);
    desktop.provider.remove_window(10);

    assert!(!controller.apply_direction(Direction::East, now));
    assert_eq!(controller.mode(), SessionMode::Tile);

    controller.handle_event(mouse(600.0, 700.0), now + Duration::from_millis(40));
    controller.handle_event(key_down(KeyCode::LEFT_ARROW, cursor), now);
    controller.tick(now + Duration::from_millis(100));
    assert_eq!(controller.mode(), SessionMode::Tile);
    assert_eq!(controller.locked_window(), Some(10));
    assert_eq!(desktop.provider.write_count(), 0);
}

#[test]
fn closed_window_makes_resize_a_no_op() {
    let desktop = Desktop::new(
        vec![primary()],
        vec![window(10, 42, "Editor", Rect::new(400.0, 300.0, 800.0, 500.0))],
    );
    let mut controller = desktop.controller(instant_config());
    let cursor = Point::new(1150.0, 550.0);
    let now = Instant::now();

    controller.handle_event(modifiers(resize_chord(), cursor), now);
    assert_eq!(controller.mode(), SessionMode::Resize);
    desktop.provider.remove_window(10);

    controller.handle_event(mouse(1300.0, 550.0), now);
    controller.handle_event(key_down(KeyCode::RIGHT_ARROW, cursor), now);
    assert_eq!(controller.mode(), SessionMode::Resize);
    assert_eq!(desktop.provider.write_count(), 0);
}
