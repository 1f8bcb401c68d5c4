// =============================================================================
// GEOMETRY.RS — Axis-aligned boxes and travel directions
//
// World space is pixels with Y pointing down.  Boxes are stored by center and
// full size; edges are half-open (a box from 40 to 60 covers 40..60 and only
// touches a neighbour starting at 60).
// =============================================================================

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// ── Axis / Direction ─────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn perpendicular(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

/// Direction of travel for an edge query.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Top,
    Right,
    Bottom,
}

impl Direction {
    /// The axis this direction moves along.
    pub fn axis(self) -> Axis {
        match self {
            Direction::Left | Direction::Right => Axis::X,
            Direction::Top | Direction::Bottom => Axis::Y,
        }
    }

    /// True for `Right` and `Bottom` (increasing coordinates).
    pub fn is_positive(self) -> bool {
        matches!(self, Direction::Right | Direction::Bottom)
    }

    /// `+1.0` or `-1.0` along [`Direction::axis`].
    pub fn sign(self) -> f64 {
        if self.is_positive() { 1.0 } else { -1.0 }
    }

    /// The direction a signed delta along `axis` travels in.  `None` for zero.
    pub fn from_delta(axis: Axis, delta: f64) -> Option<Direction> {
        if delta == 0.0 {
            return None;
        }
        Some(match (axis, delta > 0.0) {
            (Axis::X, true) => Direction::Right,
            (Axis::X, false) => Direction::Left,
            (Axis::Y, true) => Direction::Bottom,
            (Axis::Y, false) => Direction::Top,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Top => "top",
            Direction::Right => "right",
            Direction::Bottom => "bottom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a direction (expected left, top, right or bottom)")]
pub struct InvalidDirection(pub String);

impl FromStr for Direction {
    type Err = InvalidDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Direction::Left),
            "top" => Ok(Direction::Top),
            "right" => Ok(Direction::Right),
            "bottom" => Ok(Direction::Bottom),
            other => Err(InvalidDirection(other.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Aabb ─────────────────────────────────────────────────────────────────────

/// Axis-aligned bounding box stored by center and full size.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Aabb {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn left(&self) -> f64 {
        self.x - self.width / 2.0
    }

    pub fn right(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn top(&self) -> f64 {
        self.y - self.height / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn center(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Full size along `axis`.
    pub fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.width,
            Axis::Y => self.height,
        }
    }

    /// `(min, max)` edges along `axis`.
    pub fn span(&self, axis: Axis) -> (f64, f64) {
        match axis {
            Axis::X => (self.left(), self.right()),
            Axis::Y => (self.top(), self.bottom()),
        }
    }

    /// The edge that leads when travelling in `dir`.
    pub fn leading_edge(&self, dir: Direction) -> f64 {
        match dir {
            Direction::Left => self.left(),
            Direction::Right => self.right(),
            Direction::Top => self.top(),
            Direction::Bottom => self.bottom(),
        }
    }

    /// Half-open containment test.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left() && x < self.right() && y >= self.top() && y < self.bottom()
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }
}
