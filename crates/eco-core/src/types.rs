//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State held by a single cell.
///
/// `Predator` is never produced by a rule. It only enters a grid through
/// manual painting and stays frozen once there.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum CellState {
    #[default]
    Empty,
    Vegetation,
    Herbivore,
    Predator,
    Decayed,
}

impl CellState {
    /// Every state, in declaration order.
    pub const ALL: [CellState; 5] = [
        CellState::Empty,
        CellState::Vegetation,
        CellState::Herbivore,
        CellState::Predator,
        CellState::Decayed,
    ];

    /// Next state in the manual edit cycle
    /// `Empty -> Vegetation -> Herbivore -> Predator -> Decayed -> Empty`.
    pub fn toggle(self) -> Self {
        match self {
            CellState::Empty => CellState::Vegetation,
            CellState::Vegetation => CellState::Herbivore,
            CellState::Herbivore => CellState::Predator,
            CellState::Predator => CellState::Decayed,
            CellState::Decayed => CellState::Empty,
        }
    }

    /// Single character used by the plain-text grid format.
    pub fn symbol(self) -> char {
        match self {
            CellState::Empty => '.',
            CellState::Vegetation => 'v',
            CellState::Herbivore => 'h',
            CellState::Predator => 'p',
            CellState::Decayed => 'x',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        CellState::ALL.into_iter().find(|state| state.symbol() == symbol)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CellState::Empty => "empty",
            CellState::Vegetation => "vegetation",
            CellState::Herbivore => "herbivore",
            CellState::Predator => "predator",
            CellState::Decayed => "decayed",
        };
        f.write_str(name)
    }
}

/// Grid coordinate. Valid cells are `1..=height` by `1..=width`; values
/// outside that range only appear transiently while computing neighborhoods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub row: i32,
    pub col: i32,
}

impl Coordinate {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn offset(&self, direction: Direction) -> Self {
        let (dr, dc) = direction.to_delta();
        Self {
            row: self.row + dr,
            col: self.col + dc,
        }
    }

    /// Whether the coordinate lies inside a `height` x `width` grid.
    pub fn in_bounds(&self, height: u32, width: u32) -> bool {
        self.row >= 1
            && self.col >= 1
            && i64::from(self.row) <= i64::from(height)
            && i64::from(self.col) <= i64::from(width)
    }

    /// Apply toroidal wrapping for the given grid dimensions
    pub fn wrap(&self, height: u32, width: u32) -> Self {
        let h = height as i32;
        let w = width as i32;
        Self {
            row: (self.row - 1).rem_euclid(h) + 1,
            col: (self.col - 1).rem_euclid(w) + 1,
        }
    }

    /// The cell itself followed by its eight Moore neighbors in the order
    /// left, right, up, down, top-left, top-right, bottom-left, bottom-right.
    ///
    /// No range handling is applied; see [`Topology::neighborhood`].
    pub fn neighbors(&self) -> [Coordinate; 9] {
        let mut out = [*self; 9];
        for (slot, direction) in out[1..].iter_mut().zip(Direction::all()) {
            *slot = self.offset(direction);
        }
        out
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Direction to one of the eight Moore neighbors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Direction {
    /// `(row, col)` delta. Rows grow downwards.
    pub fn to_delta(&self) -> (i32, i32) {
        match self {
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::TopLeft => (-1, -1),
            Direction::TopRight => (-1, 1),
            Direction::BottomLeft => (1, -1),
            Direction::BottomRight => (1, 1),
        }
    }

    pub fn all() -> [Direction; 8] {
        [
            Direction::Left,
            Direction::Right,
            Direction::Up,
            Direction::Down,
            Direction::TopLeft,
            Direction::TopRight,
            Direction::BottomLeft,
            Direction::BottomRight,
        ]
    }

    pub fn diagonals() -> [Direction; 4] {
        [
            Direction::TopLeft,
            Direction::TopRight,
            Direction::BottomLeft,
            Direction::BottomRight,
        ]
    }
}

/// What happens to neighbor coordinates that fall off the grid edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Out-of-range neighbors are discarded.
    #[default]
    Bounded,
    /// Out-of-range neighbors wrap to the opposite edge.
    Toroidal,
}

impl Topology {
    /// Map a raw coordinate onto the grid, or `None` if it has no cell.
    pub fn resolve(&self, coordinate: Coordinate, height: u32, width: u32) -> Option<Coordinate> {
        match self {
            Topology::Bounded => coordinate.in_bounds(height, width).then_some(coordinate),
            Topology::Toroidal => Some(coordinate.wrap(height, width)),
        }
    }

    /// Self plus Moore neighbors of `center`, order preserved, with
    /// off-grid entries dropped or wrapped.
    pub fn neighborhood(&self, center: Coordinate, height: u32, width: u32) -> Vec<Coordinate> {
        center
            .neighbors()
            .into_iter()
            .filter_map(|c| self.resolve(c, height, width))
            .collect()
    }

    /// Moore neighbors of `center` without the center itself.
    pub fn strict_neighbors(&self, center: Coordinate, height: u32, width: u32) -> Vec<Coordinate> {
        Direction::all()
            .into_iter()
            .filter_map(|d| self.resolve(center.offset(d), height, width))
            .collect()
    }

    pub fn diagonal_neighbors(&self, center: Coordinate, height: u32, width: u32) -> Vec<Coordinate> {
        Direction::diagonals()
            .into_iter()
            .filter_map(|d| self.resolve(center.offset(d), height, width))
            .collect()
    }
}
