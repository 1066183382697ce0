//! Per-state transition rules.
//!
//! Each rule reads the pre-step grid and appends write intents; none of them
//! mutate anything. Which rules fire is gated by the tick phase.

use crate::grid::Grid;
use crate::intent::Intent;
use eco_core::{
    draw_distinct, CellState, Census, Coordinate, RandomSource, Result, RuleConfig, Topology,
};
use tracing::trace;

/// Facts about the tick being evaluated, shared by every cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickContext {
    pub tick: u64,
    /// Census of the grid before this tick's writes
    pub census: Census,
    /// Whether decayed cells may still turn back into vegetation
    pub regrowth_enabled: bool,
}

impl TickContext {
    /// Build the context for `grid` at `tick`, checking the regrowth cap
    /// against this grid only.
    pub fn observe(grid: &Grid, tick: u64, config: &RuleConfig) -> Self {
        let census = grid.census();
        Self {
            tick,
            census,
            regrowth_enabled: !regrowth_cap_exceeded(config, &census),
        }
    }
}

pub fn regrowth_cap_exceeded(config: &RuleConfig, census: &Census) -> bool {
    config
        .regrowth_cap
        .is_some_and(|cap| census.vegetation() > cap)
}

/// Rule set bound to one grid snapshot and tick.
pub struct CellRules<'a> {
    config: &'a RuleConfig,
    topology: Topology,
    grid: &'a Grid,
    context: &'a TickContext,
}

impl<'a> CellRules<'a> {
    pub fn new(
        config: &'a RuleConfig,
        topology: Topology,
        grid: &'a Grid,
        context: &'a TickContext,
    ) -> Self {
        Self {
            config,
            topology,
            grid,
            context,
        }
    }

    /// Append the intents of the cell at `at`.
    pub fn evaluate<R: RandomSource>(
        &self,
        at: Coordinate,
        rng: &mut R,
        out: &mut Vec<Intent>,
    ) -> Result<()> {
        match self.grid.get(at)? {
            CellState::Empty | CellState::Predator => Ok(()),
            CellState::Vegetation => self.vegetation(at, rng, out),
            CellState::Herbivore => self.herbivore(at, rng, out),
            CellState::Decayed => self.decayed(at, rng, out),
        }
    }

    fn vegetation<R: RandomSource>(
        &self,
        at: Coordinate,
        rng: &mut R,
        out: &mut Vec<Intent>,
    ) -> Result<()> {
        if self.is_growth_tick() {
            // Includes the cell itself.
            out.extend(self.neighborhood(at).into_iter().map(Intent::grow));
        }

        if self.is_spawn_tick() && self.spawn_allowed() {
            let roll = rng.uniform_int(0, self.config.spawn_roll_sides - 1);
            if roll > self.config.spawn_roll_threshold {
                let count = rng.uniform_int(self.config.spawn_min, self.config.spawn_max);
                let candidates = self.strict_neighbors(at);
                let targets = draw_distinct(rng, &candidates, draws(count))?;
                trace!(cell = %at, spawned = targets.len(), "Vegetation spawned herbivores");
                out.extend(targets.into_iter().map(Intent::spawn));
            }
        }

        Ok(())
    }

    fn herbivore<R: RandomSource>(
        &self,
        at: Coordinate,
        rng: &mut R,
        out: &mut Vec<Intent>,
    ) -> Result<()> {
        if self.is_repop_tick() {
            let corners = self.topology.diagonal_neighbors(at, self.grid.height(), self.grid.width());
            out.extend(corners.into_iter().map(Intent::spawn));
            return Ok(());
        }

        let candidates = self.strict_neighbors(at);

        let bites = rng.uniform_int(self.config.eat_min, self.config.eat_max);
        let mut failed = 0;
        for target in draw_distinct(rng, &candidates, draws(bites))? {
            if self.grid.get(target)? == CellState::Vegetation {
                out.push(Intent::clear(target));
            } else {
                failed += 1;
            }
        }

        if failed > self.config.starvation_threshold {
            trace!(cell = %at, failed, "Herbivore starved");
            out.push(Intent::decay(at));
        } else {
            let destination = rng.pick_one(&candidates)?;
            out.push(Intent::occupy(destination));
            out.push(Intent::clear(at));
        }

        Ok(())
    }

    fn decayed<R: RandomSource>(
        &self,
        at: Coordinate,
        rng: &mut R,
        out: &mut Vec<Intent>,
    ) -> Result<()> {
        if !self.is_decay_tick() || !self.context.regrowth_enabled {
            return Ok(());
        }

        let state = if rng.coin_flip() {
            CellState::Vegetation
        } else {
            CellState::Empty
        };
        out.push(Intent::regrow(at, state));
        Ok(())
    }

    fn is_growth_tick(&self) -> bool {
        self.context.tick % self.config.growth_period == 0
    }

    fn is_spawn_tick(&self) -> bool {
        self.context.tick % self.config.spawn_period < self.config.spawn_window
    }

    fn is_repop_tick(&self) -> bool {
        self.context.tick % self.config.repop_period == 0
    }

    fn is_decay_tick(&self) -> bool {
        let dormant = self
            .config
            .decay_dormant_period
            .is_some_and(|period| self.context.tick % period == 0);
        !dormant && self.context.tick % self.config.decay_period == 0
    }

    /// Herbivores may spawn while scarce, or while vegetation is plentiful
    /// and they stay under the configured share of it.
    fn spawn_allowed(&self) -> bool {
        let herbivores = self.context.census.herbivores();
        if herbivores < self.config.herbivore_floor {
            return true;
        }
        let vegetation = self.context.census.vegetation();
        vegetation > self.config.vegetation_surplus
            && (herbivores as f64) < self.config.max_herbivore_ratio * vegetation as f64
    }

    fn neighborhood(&self, at: Coordinate) -> Vec<Coordinate> {
        self.topology
            .neighborhood(at, self.grid.height(), self.grid.width())
    }

    fn strict_neighbors(&self, at: Coordinate) -> Vec<Coordinate> {
        self.topology
            .strict_neighbors(at, self.grid.height(), self.grid.width())
    }
}

fn draws(count: i64) -> usize {
    usize::try_from(count).unwrap_or(0)
}
