//! Write intents and same-tick conflict resolution.
//!
//! Every rule evaluation proposes writes instead of touching the grid. Once
//! all cells have been evaluated, [`resolve`] keeps a single winner per
//! target coordinate and [`Resolution::commit`] applies the winners to a copy
//! of the current grid.
//!
//! Winners are chosen by [`IntentKind`] first, highest wins:
//!
//! | rank | kind       | written state            |
//! |------|------------|--------------------------|
//! | 6    | `Decay`    | `Decayed` (starvation)   |
//! | 5    | `Occupy`   | `Herbivore` (movement)   |
//! | 4    | `Spawn`    | `Herbivore` (spawn, repopulation) |
//! | 3    | `Growth`   | `Vegetation`             |
//! | 2    | `Regrowth` | `Vegetation` or `Empty` from a decayed cell |
//! | 1    | `Clear`    | `Empty` (grazing, vacating) |
//!
//! Ties within a kind fall back to the written state's declaration order, so
//! the outcome never depends on the order intents were produced in.
//!
//! `Predator` cells are frozen: a winner targeting one is discarded.

use crate::grid::Grid;
use eco_core::{CellState, Coordinate, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

/// Intent category, ordered lowest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IntentKind {
    Clear,
    Regrowth,
    Growth,
    Spawn,
    Occupy,
    Decay,
}

impl IntentKind {
    pub const ALL: [IntentKind; 6] = [
        IntentKind::Clear,
        IntentKind::Regrowth,
        IntentKind::Growth,
        IntentKind::Spawn,
        IntentKind::Occupy,
        IntentKind::Decay,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// A proposed write produced by one cell's rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub target: Coordinate,
    pub state: CellState,
    pub kind: IntentKind,
}

impl Intent {
    pub fn new(target: Coordinate, state: CellState, kind: IntentKind) -> Self {
        Self {
            target,
            state,
            kind,
        }
    }

    pub fn decay(target: Coordinate) -> Self {
        Self::new(target, CellState::Decayed, IntentKind::Decay)
    }

    pub fn occupy(target: Coordinate) -> Self {
        Self::new(target, CellState::Herbivore, IntentKind::Occupy)
    }

    pub fn spawn(target: Coordinate) -> Self {
        Self::new(target, CellState::Herbivore, IntentKind::Spawn)
    }

    pub fn grow(target: Coordinate) -> Self {
        Self::new(target, CellState::Vegetation, IntentKind::Growth)
    }

    pub fn regrow(target: Coordinate, state: CellState) -> Self {
        Self::new(target, state, IntentKind::Regrowth)
    }

    pub fn clear(target: Coordinate) -> Self {
        Self::new(target, CellState::Empty, IntentKind::Clear)
    }

    fn priority(&self) -> (IntentKind, CellState) {
        (self.kind, self.state)
    }
}

/// Bookkeeping for one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReport {
    /// Intents produced by all rules this tick
    pub proposed: usize,
    /// Winning intents written into the next grid (one per target)
    pub applied: usize,
    /// Intents that lost a conflict, fell off the grid or hit a predator
    pub discarded: usize,
    proposed_by_kind: [usize; 6],
}

impl CommitReport {
    pub fn proposed_of(&self, kind: IntentKind) -> usize {
        self.proposed_by_kind[kind.index()]
    }
}

/// Winning intent per target coordinate.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    winners: BTreeMap<Coordinate, Intent>,
    report: CommitReport,
}

/// Keep the highest-priority intent for each target.
pub fn resolve<I>(intents: I) -> Resolution
where
    I: IntoIterator<Item = Intent>,
{
    let mut resolution = Resolution::default();
    for intent in intents {
        resolution.report.proposed += 1;
        resolution.report.proposed_by_kind[intent.kind.index()] += 1;
        resolution
            .winners
            .entry(intent.target)
            .and_modify(|current| {
                if intent.priority() > current.priority() {
                    *current = intent;
                }
            })
            .or_insert(intent);
    }
    resolution
}

impl Resolution {
    pub fn winner(&self, target: Coordinate) -> Option<&Intent> {
        self.winners.get(&target)
    }

    /// Apply the winners to a copy of `grid`. Cells without an intent keep
    /// their state; targets outside the grid or holding a predator are dropped.
    pub fn commit(&self, grid: &Grid) -> Result<(Grid, CommitReport)> {
        let mut next = grid.clone();
        let mut report = self.report;

        for intent in self.winners.values() {
            if !grid.contains(intent.target) {
                trace!(target_cell = %intent.target, kind = ?intent.kind, "Dropping off-grid intent");
                continue;
            }
            if grid.get(intent.target)? == CellState::Predator {
                continue;
            }
            next.set(intent.target, intent.state)?;
            report.applied += 1;
        }
        report.discarded = report.proposed - report.applied;

        Ok((next, report))
    }
}
