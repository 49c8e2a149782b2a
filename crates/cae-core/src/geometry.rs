//! Integer grid geometry: points, neighbor directions, and the rotation and
//! mirror math used by selection transforms.
//!
//! Screen convention: x grows East, y grows South.
//!
//! Cells live within [`COORD_LIMIT`] of the origin on both axes. Offsets
//! from a stored cell therefore never leave `i32`, and arithmetic on points
//! outside the limit saturates instead of overflowing.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

/// Largest absolute coordinate a cell, port or link may occupy.
pub const COORD_LIMIT: i32 = 1 << 30;

/// A cell position on the grid. The sole grid key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighboring position in the given direction.
    pub fn offset(self, dir: Direction) -> Self {
        let (dx, dy) = dir.offset();
        self.shifted(dx, dy)
    }

    /// This position translated by `(dx, dy)`, saturating at the `i32`
    /// range.
    pub fn shifted(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Whether both coordinates are within [`COORD_LIMIT`].
    pub const fn in_bounds(self) -> bool {
        self.x.unsigned_abs() <= COORD_LIMIT as u32 && self.y.unsigned_abs() <= COORD_LIMIT as u32
    }
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<Point> for [i32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Neighbor lookup directions: cardinal, diagonal, and double-distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
    NN,
    SS,
    EE,
    WW,
}

impl Direction {
    /// The 8 cells surrounding a position.
    pub const MOORE: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    /// The East/West pair of a one-dimensional row.
    pub const ROW: [Direction; 2] = [Direction::E, Direction::W];

    /// Offset for this direction.
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::N => (0, -1),
            Direction::S => (0, 1),
            Direction::E => (1, 0),
            Direction::W => (-1, 0),
            Direction::NE => (1, -1),
            Direction::NW => (-1, -1),
            Direction::SE => (1, 1),
            Direction::SW => (-1, 1),
            Direction::NN => (0, -2),
            Direction::SS => (0, 2),
            Direction::EE => (2, 0),
            Direction::WW => (-2, 0),
        }
    }
}

// ---------------------------------------------------------------------------
// Rotation
// ---------------------------------------------------------------------------

/// Quarter-turn rotation applied to a selection and its entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    /// No rotation.
    #[default]
    None,
    /// 90 degrees clockwise.
    Cw90,
    /// 180 degrees.
    Cw180,
    /// 270 degrees clockwise (90 degrees counter-clockwise).
    Cw270,
}

impl Rotation {
    /// Map a degree value onto a quarter turn. Any multiple of 90 is
    /// accepted, including negative values; everything else is `None`.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::None),
            90 => Some(Rotation::Cw90),
            180 => Some(Rotation::Cw180),
            270 => Some(Rotation::Cw270),
            _ => None,
        }
    }

    /// Number of clockwise quarter turns.
    pub const fn quarter_turns(self) -> u8 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 1,
            Rotation::Cw180 => 2,
            Rotation::Cw270 => 3,
        }
    }

    /// Rotate an offset `(dx, dy)` around the origin.
    pub const fn apply(self, dx: i64, dy: i64) -> (i64, i64) {
        match self {
            Rotation::None => (dx, dy),
            Rotation::Cw90 => (-dy, dx),
            Rotation::Cw180 => (-dx, -dy),
            Rotation::Cw270 => (dy, -dx),
        }
    }
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Inclusive axis-aligned bounding box of a point set.
///
/// Transforms pivot around the box centre. The centre may sit on a half
/// cell, so the math runs on doubled coordinates and rounds half cells
/// toward positive infinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Bounding box of the given points, or `None` if there are none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for p in iter {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
        }
        Some(bounds)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Rotate a point around the centre of the box. Results past the `i32`
    /// range saturate.
    pub fn rotate_point(&self, p: Point, rotation: Rotation) -> Point {
        let cx2 = i64::from(self.min.x) + i64::from(self.max.x);
        let cy2 = i64::from(self.min.y) + i64::from(self.max.y);
        let (dx, dy) = rotation.apply(2 * i64::from(p.x) - cx2, 2 * i64::from(p.y) - cy2);
        Point::new(halve_up(cx2 + dx), halve_up(cy2 + dy))
    }

    /// Mirror a point across the vertical centre line.
    pub fn mirror_x(&self, p: Point) -> Point {
        let x = i64::from(self.min.x) + i64::from(self.max.x) - i64::from(p.x);
        Point::new(saturate(x), p.y)
    }

    /// Mirror a point across the horizontal centre line.
    pub fn mirror_y(&self, p: Point) -> Point {
        let y = i64::from(self.min.y) + i64::from(self.max.y) - i64::from(p.y);
        Point::new(p.x, saturate(y))
    }
}

fn halve_up(doubled: i64) -> i32 {
    saturate((doubled + 1).div_euclid(2))
}

fn saturate(v: i64) -> i32 {
    i32::try_from(v).unwrap_or(if v < 0 { i32::MIN } else { i32::MAX })
}
