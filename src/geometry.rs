use std::fmt::Display;
use std::ops::{Add, Sub};

use egui::{Pos2, Vec2, pos2, vec2};

/// A point on the schematic in world units. Everything that ends up in the scene sits on
/// integer coordinates; the pointer and the smoothed ghost live in `egui::Pos2` until they
/// are rounded into one of these.
#[derive(
    serde::Deserialize, serde::Serialize, Copy, Debug, Clone, Default, PartialEq, Eq, Hash,
)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Self = Self::new(0, 0);

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_pos2(self) -> Pos2 {
        pos2(self.x as f32, self.y as f32)
    }

    pub fn to_vec2(self) -> Vec2 {
        vec2(self.x as f32, self.y as f32)
    }

    /// Nearest integer point.
    pub fn from_pos2(pos: Pos2) -> Self {
        Self::new(pos.x.round() as i32, pos.y.round() as i32)
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Snap a world position to the nearest grid intersection.
pub fn snap_to_grid(pos: Pos2, grid_size: i32) -> Point {
    let g = grid_size as f32;
    Point::new(
        ((pos.x / g).round() * g) as i32,
        ((pos.y / g).round() * g) as i32,
    )
}

#[derive(serde::Deserialize, serde::Serialize, Copy, Debug, Clone, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// Coordinate along the axis.
    pub fn along(self, p: Point) -> i32 {
        match self {
            Self::Horizontal => p.x,
            Self::Vertical => p.y,
        }
    }

    /// Coordinate across the axis.
    pub fn across(self, p: Point) -> i32 {
        match self {
            Self::Horizontal => p.y,
            Self::Vertical => p.x,
        }
    }

    /// `p` moved onto the line through `origin` that runs along this axis.
    pub fn project(self, origin: Point, p: Point) -> Point {
        match self {
            Self::Horizontal => Point::new(p.x, origin.y),
            Self::Vertical => Point::new(origin.x, p.y),
        }
    }

    /// Port facings seen while travelling along the axis, as `[behind, ahead]`.
    pub fn facings(self, positive: bool) -> [Direction; 2] {
        match (self, positive) {
            (Self::Horizontal, true) => [Direction::West, Direction::East],
            (Self::Horizontal, false) => [Direction::East, Direction::West],
            (Self::Vertical, true) => [Direction::North, Direction::South],
            (Self::Vertical, false) => [Direction::South, Direction::North],
        }
    }
}

impl Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Horizontal => f.write_str("horizontal"),
            Self::Vertical => f.write_str("vertical"),
        }
    }
}

#[derive(serde::Deserialize, serde::Serialize, Copy, Debug, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Next rotation in the cycle west -> north -> east -> south -> west.
    pub fn next(self) -> Self {
        match self {
            Self::West => Self::North,
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Self::West | Self::East => Axis::Horizontal,
            Self::North | Self::South => Axis::Vertical,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::North => f.write_str("north"),
            Self::East => f.write_str("east"),
            Self::South => f.write_str("south"),
            Self::West => f.write_str("west"),
        }
    }
}
