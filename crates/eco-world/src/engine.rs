//! One tick of the automaton: evaluate every cell, resolve, commit.

use crate::grid::Grid;
use crate::intent::{resolve, CommitReport, Intent};
use crate::rules::{CellRules, TickContext};
use eco_core::{RandomSource, Result, RuleConfig, SimulationConfig, Topology};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: RuleConfig,
    topology: Topology,
}

/// Result of advancing a grid by one tick.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub grid: Grid,
    pub report: CommitReport,
}

impl RuleEngine {
    pub fn new(rules: RuleConfig, topology: Topology) -> Self {
        Self { rules, topology }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.rules.clone(), config.grid.topology)
    }

    pub fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    /// Compute the grid that follows `grid` at `tick`.
    ///
    /// Identical inputs and identical random draws always give the same grid.
    pub fn compute_next<R: RandomSource>(&self, grid: &Grid, tick: u64, rng: &mut R) -> Result<Grid> {
        let context = TickContext::observe(grid, tick, &self.rules);
        Ok(self.advance(grid, &context, rng)?.grid)
    }

    /// Every write intent for this tick, cells scanned row-major.
    pub fn propose<R: RandomSource>(
        &self,
        grid: &Grid,
        context: &TickContext,
        rng: &mut R,
    ) -> Result<Vec<Intent>> {
        let rules = CellRules::new(&self.rules, self.topology, grid, context);
        let mut intents = Vec::new();
        for coordinate in grid.coordinates() {
            rules.evaluate(coordinate, rng, &mut intents)?;
        }
        Ok(intents)
    }

    pub fn advance<R: RandomSource>(
        &self,
        grid: &Grid,
        context: &TickContext,
        rng: &mut R,
    ) -> Result<StepOutcome> {
        let intents = self.propose(grid, context, rng)?;
        let (next, report) = resolve(intents).commit(grid)?;

        debug!(
            tick = context.tick,
            proposed = report.proposed,
            applied = report.applied,
            discarded = report.discarded,
            "Tick evaluated"
        );

        Ok(StepOutcome { grid: next, report })
    }
}
