//! Core types for the packing grid

use std::fmt;
use std::ops::{Add, Neg, Sub};

/// An integer 2D grid coordinate.
///
/// Cells are used both as absolute container coordinates and as
/// anchor-relative footprint offsets. The y axis points up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const ZERO: Cell = Cell { x: 0, y: 0 };
    pub const UP: Cell = Cell { x: 0, y: 1 };
    pub const DOWN: Cell = Cell { x: 0, y: -1 };
    pub const LEFT: Cell = Cell { x: -1, y: 0 };
    pub const RIGHT: Cell = Cell { x: 1, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The four edge-sharing neighbours of this cell.
    pub fn neighbors(self) -> [Cell; 4] {
        [
            self + Cell::UP,
            self + Cell::DOWN,
            self + Cell::LEFT,
            self + Cell::RIGHT,
        ]
    }

    /// Rotate this offset 90° clockwise around the origin: (x, y) -> (y, -x).
    pub fn rotated_cw(self) -> Cell {
        Cell::new(self.y, -self.x)
    }

    /// Rotate this offset 90° counter-clockwise around the origin: (x, y) -> (-y, x).
    pub fn rotated_ccw(self) -> Cell {
        Cell::new(-self.y, self.x)
    }
}

impl Add for Cell {
    type Output = Cell;

    fn add(self, rhs: Cell) -> Cell {
        Cell::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Cell {
    type Output = Cell;

    fn sub(self, rhs: Cell) -> Cell {
        Cell::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Cell {
    type Output = Cell;

    fn neg(self) -> Cell {
        Cell::new(-self.x, -self.y)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A 2D point in world space (grid pitch applied).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Handle for an item owned by a [`Board`](crate::grid::Board).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// Handle for a container owned by a [`Board`](crate::grid::Board).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub u32);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container#{}", self.0)
    }
}

/// One of the four footprint orientations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Up,
    Right,
    Down,
    Left,
}

impl Orientation {
    /// Orientation as clockwise degrees from Up.
    pub fn degrees(self) -> f64 {
        match self {
            Orientation::Up => 0.0,
            Orientation::Right => 90.0,
            Orientation::Down => 180.0,
            Orientation::Left => 270.0,
        }
    }

    /// The orientation after applying one 90° rotation step.
    pub fn rotated(self, rotation: Rotation) -> Orientation {
        let index = match self {
            Orientation::Up => 0,
            Orientation::Right => 1,
            Orientation::Down => 2,
            Orientation::Left => 3,
        };
        // ClockWise = +1, CounterClockWise = +3 (i.e. -1 mod 4)
        let step = match rotation {
            Rotation::Clockwise => 1,
            Rotation::CounterClockwise => 3,
        };
        match (index + step) % 4 {
            0 => Orientation::Up,
            1 => Orientation::Right,
            2 => Orientation::Down,
            _ => Orientation::Left,
        }
    }
}

/// Direction of a 90° rotation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

/// Result of a non-mutating trial placement check.
///
/// `collisions` lists the items occupying cells the trial needs, excluding
/// cells already owned by the moving item itself. An anchor-invalid trial
/// short-circuits with `can_move == false` and an empty collision set.
/// A nonempty collision set leaves `can_move` true when every
/// movement-validator property on the item accepts it; `can_move` is false
/// only for an invalid anchor or a rejected collision set.
#[derive(Debug, Clone, Default)]
pub struct MovementResult {
    pub can_move: bool,
    pub collisions: Vec<ItemId>,
}
