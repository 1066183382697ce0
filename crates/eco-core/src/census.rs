//! Population counts per cell state.

use crate::types::CellState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-state population counts, always obtained by scanning a grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Census {
    counts: [usize; 5],
}

impl Census {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_states<I>(states: I) -> Self
    where
        I: IntoIterator<Item = CellState>,
    {
        let mut census = Self::new();
        for state in states {
            census.record(state);
        }
        census
    }

    pub fn record(&mut self, state: CellState) {
        self.counts[state.index()] += 1;
    }

    pub fn count(&self, state: CellState) -> usize {
        self.counts[state.index()]
    }

    pub fn vegetation(&self) -> usize {
        self.count(CellState::Vegetation)
    }

    pub fn herbivores(&self) -> usize {
        self.count(CellState::Herbivore)
    }

    pub fn decayed(&self) -> usize {
        self.count(CellState::Decayed)
    }

    /// Number of cells counted.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Cells in any state other than `Empty`.
    pub fn occupied(&self) -> usize {
        self.total() - self.count(CellState::Empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellState, usize)> + '_ {
        CellState::ALL.into_iter().map(move |s| (s, self.count(s)))
    }
}

impl fmt::Display for Census {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (state, count) in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", state, count)?;
            first = false;
        }
        Ok(())
    }
}
