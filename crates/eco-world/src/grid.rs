//! 2D grid of cell states.

use eco_core::{CellState, Census, Coordinate, Error, GridConfig, Result, SeedConfig};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A fixed-size grid addressed by 1-based `(row, col)` coordinates.
///
/// A grid computed for a tick is never edited afterwards; the engine always
/// builds the next one as a fresh value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct Grid {
    height: u32,
    width: u32,
    cells: Vec<CellState>,
}

#[derive(Deserialize)]
struct RawGrid {
    height: u32,
    width: u32,
    cells: Vec<CellState>,
}

impl TryFrom<RawGrid> for Grid {
    type Error = Error;

    fn try_from(raw: RawGrid) -> Result<Self> {
        if raw.cells.len() != raw.height as usize * raw.width as usize {
            return Err(Error::Serialization(format!(
                "{}x{} grid needs {} cells, got {}",
                raw.height,
                raw.width,
                raw.height as usize * raw.width as usize,
                raw.cells.len()
            )));
        }
        Ok(Self {
            height: raw.height,
            width: raw.width,
            cells: raw.cells,
        })
    }
}

impl Grid {
    /// An all-empty grid.
    pub fn new(height: u32, width: u32) -> Self {
        let size = height as usize * width as usize;
        Self {
            height,
            width,
            cells: vec![CellState::Empty; size],
        }
    }

    pub fn from_config(config: &GridConfig) -> Self {
        Self::new(config.height, config.width)
    }

    /// Randomly populate a grid from seed densities
    pub fn random(config: &GridConfig, seed: &SeedConfig, rng: &mut ChaCha8Rng) -> Self {
        let mut grid = Self::from_config(config);

        for cell in &mut grid.cells {
            let roll = rng.gen::<f32>();

            if roll < seed.vegetation_density {
                *cell = CellState::Vegetation;
            } else if roll < seed.vegetation_density + seed.herbivore_density {
                *cell = CellState::Herbivore;
            } else if roll < seed.vegetation_density + seed.herbivore_density + seed.decayed_density
            {
                *cell = CellState::Decayed;
            }
        }

        grid
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn contains(&self, coordinate: Coordinate) -> bool {
        coordinate.in_bounds(self.height, self.width)
    }

    /// State at `coordinate`, rejecting anything off the grid.
    pub fn get(&self, coordinate: Coordinate) -> Result<CellState> {
        let index = self.index_of(coordinate)?;
        Ok(self.cells[index])
    }

    /// Overwrite the state at `coordinate`, rejecting anything off the grid.
    pub fn set(&mut self, coordinate: Coordinate, state: CellState) -> Result<()> {
        let index = self.index_of(coordinate)?;
        self.cells[index] = state;
        Ok(())
    }

    /// Fail unless this grid has exactly the given dimensions.
    pub fn ensure_dimensions(&self, height: u32, width: u32) -> Result<()> {
        if self.height != height || self.width != width {
            return Err(Error::DimensionMismatch {
                expected_height: height,
                expected_width: width,
                height: self.height,
                width: self.width,
            });
        }
        Ok(())
    }

    /// Population counts by scanning every cell.
    pub fn census(&self) -> Census {
        Census::from_states(self.cells.iter().copied())
    }

    fn index_of(&self, coordinate: Coordinate) -> Result<usize> {
        if !self.contains(coordinate) {
            return Err(Error::InvalidCoordinate {
                coordinate,
                height: self.height,
                width: self.width,
            });
        }
        let row = (coordinate.row - 1) as usize;
        let col = (coordinate.col - 1) as usize;
        Ok(row * self.width as usize + col)
    }

    /// Get coordinate from index
    fn index_to_coordinate(&self, index: usize) -> Coordinate {
        let row = index / self.width as usize + 1;
        let col = index % self.width as usize + 1;
        Coordinate::new(row as i32, col as i32)
    }

    /// Iterator over all coordinates in row-major order
    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> + '_ {
        (0..self.cells.len()).map(move |i| self.index_to_coordinate(i))
    }

    /// Iterator over all cells with coordinates, row-major
    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, CellState)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, state)| (self.index_to_coordinate(i), *state))
    }
}

/// One line per row, one symbol per cell (see [`CellState::symbol`]).
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.width.max(1) as usize) {
            let line: String = row.iter().map(|s| s.symbol()).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

impl FromStr for Grid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let rows: Vec<&str> = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let width = rows.first().map_or(0, |r| r.chars().count());
        if width == 0 {
            return Err(Error::Parse("grid text has no cells".to_string()));
        }

        let mut cells = Vec::with_capacity(rows.len() * width);
        for (r, line) in rows.iter().enumerate() {
            if line.chars().count() != width {
                return Err(Error::Parse(format!(
                    "row {} has {} cells, expected {}",
                    r + 1,
                    line.chars().count(),
                    width
                )));
            }
            for (c, symbol) in line.chars().enumerate() {
                let state = CellState::from_symbol(symbol).ok_or_else(|| {
                    Error::Parse(format!(
                        "unknown symbol {:?} at row {}, column {}",
                        symbol,
                        r + 1,
                        c + 1
                    ))
                })?;
                cells.push(state);
            }
        }

        Ok(Self {
            height: rows.len() as u32,
            width: width as u32,
            cells,
        })
    }
}
