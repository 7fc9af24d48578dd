//! Placement rectangles, compass buckets and coordinate flips

use flicktile::macos::{layout_to_native, native_to_layout};
use flicktile::models::{canonical_order, CycleStep, Direction, Rect};

fn visible() -> Rect {
    Rect::new(0.0, 0.0, 1920.0, 1055.0)
}

#[test]
fn every_target_lies_inside_the_visible_frame() {
    let frames = [visible(), Rect::new(1920.0, -360.0, 2560.0, 1415.0), Rect::new(-1280.0, 0.0, 1281.0, 799.0)];
    for frame in frames {
        for direction in Direction::ALL {
            let target = direction.target_rect(&frame);
            assert!(target.min_x() >= frame.min_x() && target.max_x() <= frame.max_x(), "{direction}");
            assert!(target.min_y() >= frame.min_y() && target.max_y() <= frame.max_y(), "{direction}");
        }
    }
}

#[test]
fn halves_and_quarters_tile_the_screen() {
    let frame = Rect::new(-1280.0, 0.0, 1281.0, 799.0);
    let area = |d: Direction| d.target_rect(&frame).area();

    assert!((area(Direction::North) + area(Direction::South) - frame.area()).abs() < 1e-6);
    assert!((area(Direction::East) + area(Direction::West) - frame.area()).abs() < 1e-6);

    let quarters = [
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];
    let total: f64 = quarters.iter().map(|&d| area(d)).sum();
    assert!((total - frame.area()).abs() < 1e-6);
    for (i, a) in quarters.iter().enumerate() {
        for b in &quarters[i + 1..] {
            assert_eq!(a.target_rect(&frame).overlap_area(&b.target_rect(&frame)), 0.0, "{a} / {b}");
        }
    }
}

#[test]
fn north_is_the_upper_half() {
    assert_eq!(
        Direction::North.target_rect(&visible()),
        Rect::new(0.0, 527.5, 1920.0, 527.5)
    );
    assert_eq!(
        Direction::SouthEast.target_rect(&visible()),
        Rect::new(960.0, 0.0, 960.0, 527.5)
    );
}

#[test]
fn displacement_buckets_into_compass_sectors() {
    assert_eq!(Direction::from_delta(10.0, 0.0), Direction::East);
    assert_eq!(Direction::from_delta(0.0, 10.0), Direction::North);
    assert_eq!(Direction::from_delta(-10.0, -10.0), Direction::SouthWest);
    assert_eq!(Direction::from_delta(0.0, -3.0), Direction::South);
    assert_eq!(Direction::from_angle(22.4), Direction::East);
    assert_eq!(Direction::from_angle(22.6), Direction::NorthEast);
    assert_eq!(Direction::from_angle(-22.4), Direction::East);
    assert_eq!(Direction::from_angle(337.4), Direction::SouthEast);
    assert_eq!(Direction::from_angle(180.0), Direction::West);
}

#[test]
fn cycle_steps_follow_the_horizontal_component() {
    for direction in Direction::ALL {
        let expected = match direction {
            Direction::North | Direction::South => CycleStep::Cyclic,
            Direction::East | Direction::NorthEast | Direction::SouthEast => CycleStep::Next,
            _ => CycleStep::Previous,
        };
        assert_eq!(direction.cycle_step(), expected, "{direction}");
    }
}

#[test]
fn coordinate_flip_is_an_involution() {
    let rects = [
        Rect::new(0.0, 0.0, 1920.0, 1055.0),
        Rect::new(100.0, 455.0, 800.0, 600.0),
        Rect::new(1920.0, 720.0, 2560.0, 720.0),
        Rect::new(-1280.0, -200.0, 1280.0, 800.0),
    ];
    for rect in rects {
        let native = layout_to_native(rect, 1080.0);
        assert_eq!(native_to_layout(native, 1080.0), rect);
    }
}

#[test]
fn menu_bar_sits_at_native_top() {
    // The top 25pt of a 1080pt primary in layout space
    let menu_bar = Rect::new(0.0, 1055.0, 1920.0, 25.0);
    assert_eq!(layout_to_native(menu_bar, 1080.0), Rect::new(0.0, 0.0, 1920.0, 25.0));

    // A display stacked above the primary has negative native y
    let above = Rect::new(0.0, 1080.0, 1920.0, 1080.0);
    assert_eq!(layout_to_native(above, 1080.0).min_y(), -1080.0);
}

#[test]
fn canonical_order_reads_rows_top_down() {
    let frames = [
        Rect::new(0.0, 0.0, 1920.0, 1080.0),
        Rect::new(1920.0, 30.0, 1920.0, 1080.0),
        Rect::new(-1920.0, 0.0, 1920.0, 1080.0),
        Rect::new(0.0, 1080.0, 1920.0, 1080.0),
    ];
    assert_eq!(canonical_order(&frames, 100.0), vec![3, 2, 0, 1]);
    assert_eq!(canonical_order(&frames, 10.0), vec![3, 1, 2, 0]);
    assert!(canonical_order(&[], 100.0).is_empty());
}
