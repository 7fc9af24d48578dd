use crate::models::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compass direction used both as a gesture result and as a layout key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

/// Which way screen cycling moves for a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStep {
    /// Next screen to the right, no wrap-around
    Next,
    /// Previous screen to the left, no wrap-around
    Previous,
    /// Next screen in order, wrapping at the end
    Cyclic,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Bucket an angle in degrees (counter-clockwise from east, y up) into one
    /// of eight 45° sectors centred on the compass directions.
    pub fn from_angle(degrees: f64) -> Direction {
        let normalized = degrees.rem_euclid(360.0);
        let sector = (((normalized + 22.5) / 45.0).floor() as usize) % 8;
        match sector {
            0 => Direction::East,
            1 => Direction::NorthEast,
            2 => Direction::North,
            3 => Direction::NorthWest,
            4 => Direction::West,
            5 => Direction::SouthWest,
            6 => Direction::South,
            _ => Direction::SouthEast,
        }
    }

    /// Direction of a displacement vector in layout space
    pub fn from_delta(dx: f64, dy: f64) -> Direction {
        Direction::from_angle(dy.atan2(dx).to_degrees())
    }

    pub fn cycle_step(self) -> CycleStep {
        match self {
            Direction::East | Direction::NorthEast | Direction::SouthEast => CycleStep::Next,
            Direction::West | Direction::NorthWest | Direction::SouthWest => CycleStep::Previous,
            Direction::North | Direction::South => CycleStep::Cyclic,
        }
    }

    /// Layout rule: cardinal directions take the matching half of the visible
    /// area, diagonals take the matching quarter.
    pub fn target_rect(self, visible: &Rect) -> Rect {
        let x = visible.min_x();
        let y = visible.min_y();
        let w = visible.width();
        let h = visible.height();
        let half_w = w / 2.0;
        let half_h = h / 2.0;

        match self {
            Direction::North => Rect::new(x, y + half_h, w, h - half_h),
            Direction::South => Rect::new(x, y, w, half_h),
            Direction::East => Rect::new(x + half_w, y, w - half_w, h),
            Direction::West => Rect::new(x, y, half_w, h),
            Direction::NorthEast => Rect::new(x + half_w, y + half_h, w - half_w, h - half_h),
            Direction::NorthWest => Rect::new(x, y + half_h, half_w, h - half_h),
            Direction::SouthEast => Rect::new(x + half_w, y, w - half_w, half_h),
            Direction::SouthWest => Rect::new(x, y, half_w, half_h),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::North => "north",
            Direction::NorthEast => "north-east",
            Direction::East => "east",
            Direction::SouthEast => "south-east",
            Direction::South => "south",
            Direction::SouthWest => "south-west",
            Direction::West => "west",
            Direction::NorthWest => "north-west",
        };
        f.write_str(name)
    }
}
