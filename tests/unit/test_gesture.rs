//! Flick thresholds at their boundaries

use flicktile::models::{Direction, Point, Rect, Screen};
use flicktile::services::{GestureConfig, GestureDetector, GestureTrigger};
use std::time::{Duration, Instant};

fn screens() -> Vec<Screen> {
    vec![Screen::new(
        1,
        Rect::new(0.0, 0.0, 1920.0, 1080.0),
        Rect::new(0.0, 0.0, 1920.0, 1055.0),
        true,
    )]
}

fn armed(origin: Point, now: Instant) -> GestureDetector {
    let mut detector = GestureDetector::new(GestureConfig::default());
    detector.reset(origin, now);
    detector
}

#[test]
fn dead_zone_boundary() {
    let now = Instant::now();
    let origin = Point::new(960.0, 500.0);
    let radius = GestureConfig::default().dead_zone_radius;

    let detector = armed(origin, now);
    assert_eq!(detector.classify(Point::new(960.0, 500.0 + radius - 1.0), &screens(), now), None);
    assert_eq!(
        detector.classify(Point::new(960.0, 500.0 + radius + 1.0), &screens(), now),
        Some((Direction::North, GestureTrigger::DeadZone))
    );
    assert_eq!(
        detector.classify(Point::new(960.0 - radius - 1.0, 500.0), &screens(), now),
        Some((Direction::West, GestureTrigger::DeadZone))
    );
}

#[test]
fn every_compass_direction_is_reachable() {
    let now = Instant::now();
    let origin = Point::new(960.0, 540.0);
    for direction in Direction::ALL {
        let angle = match direction {
            Direction::East => 0.0_f64,
            Direction::NorthEast => 45.0,
            Direction::North => 90.0,
            Direction::NorthWest => 135.0,
            Direction::West => 180.0,
            Direction::SouthWest => 225.0,
            Direction::South => 270.0,
            Direction::SouthEast => 315.0,
        };
        let (sin, cos) = angle.to_radians().sin_cos();
        let point = Point::new(origin.x + 250.0 * cos, origin.y + 250.0 * sin);
        let mut detector = armed(origin, now);
        assert_eq!(detector.update(point, &screens(), now), Some(direction));
    }
}

#[test]
fn short_stroke_into_screen_edge_commits() {
    let now = Instant::now();
    let mut detector = armed(Point::new(960.0, 1000.0), now);

    assert_eq!(detector.update(Point::new(960.0, 1050.0), &screens(), now), None);
    assert_eq!(detector.update(Point::new(960.0, 1061.0), &screens(), now), Some(Direction::North));
    assert!(!detector.is_armed());
}

#[test]
fn resting_on_the_edge_is_not_a_gesture() {
    let now = Instant::now();
    let origin = Point::new(5.0, 540.0);
    let detector = armed(origin, now);
    assert_eq!(detector.classify(origin, &screens(), now + Duration::from_secs(2)), None);
}

#[test]
fn slow_nudge_needs_time_and_distance() {
    let now = Instant::now();
    let origin = Point::new(960.0, 540.0);
    let config = GestureConfig::default();
    let detector = armed(origin, now);
    let nudge = Point::new(960.0 + config.min_distance + 1.0, 540.0);

    assert_eq!(detector.classify(nudge, &screens(), now + config.time_limit / 2), None);
    assert_eq!(
        detector.classify(nudge, &screens(), now + config.time_limit),
        Some((Direction::East, GestureTrigger::SlowNudge))
    );
    assert_eq!(
        detector.classify(Point::new(960.0 + config.min_distance - 1.0, 540.0), &screens(), now + config.time_limit),
        None
    );
}

#[test]
fn commits_once_per_arming() {
    let now = Instant::now();
    let origin = Point::new(960.0, 540.0);
    let mut detector = armed(origin, now);

    assert_eq!(detector.update(Point::new(1300.0, 540.0), &screens(), now), Some(Direction::East));
    assert_eq!(detector.update(Point::new(1600.0, 540.0), &screens(), now), None);

    detector.reset(Point::new(1600.0, 540.0), now);
    assert_eq!(detector.update(Point::new(1600.0, 200.0), &screens(), now), Some(Direction::South));
}
