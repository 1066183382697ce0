//! Simulation loop: owns the grid, the tick counter and the run state.
//!
//! The loop knows nothing about clocks or displays. A driver calls
//! [`Simulation::step`] at whatever pace it likes while the loop reports
//! [`RunState::Running`], and a presentation layer reads
//! [`Simulation::snapshot`] or the returned [`StepSummary`] afterwards.
//!
//! Snapshots are shared, read-only handles. A snapshot taken before a step
//! keeps showing the grid it was taken from; the step installs a new grid
//! instead of editing the old one.

use crate::engine::RuleEngine;
use crate::grid::Grid;
use crate::intent::CommitReport;
use crate::rules::TickContext;
use eco_core::{
    CellState, Census, Coordinate, Error, RandomSource, ResetPolicy, Result, SeededRandom,
    SimulationConfig,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    Running,
}

/// What a presentation layer needs after each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    /// Tick counter after the step
    pub tick: u64,
    /// Census of the committed grid
    pub census: Census,
    pub report: CommitReport,
    /// Run state after the step; `Idle` once the tick limit is hit
    pub state: RunState,
}

pub struct Simulation<R: RandomSource = SeededRandom> {
    config: SimulationConfig,
    engine: RuleEngine,
    rng: R,
    grid: Arc<Grid>,
    /// Grid as it was when the run started from tick 0
    initial: Grid,
    tick: u64,
    state: RunState,
    regrowth_locked: bool,
}

impl Simulation<SeededRandom> {
    /// A simulation seeded from `config.seed`.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let rng = SeededRandom::new(config.seed);
        Self::with_rng(config, rng)
    }
}

impl<R: RandomSource> Simulation<R> {
    pub fn with_rng(config: SimulationConfig, rng: R) -> Result<Self> {
        config.validate()?;

        let grid = Grid::from_config(&config.grid);
        let engine = RuleEngine::from_config(&config);

        Ok(Self {
            initial: grid.clone(),
            grid: Arc::new(grid),
            config,
            engine,
            rng,
            tick: 0,
            state: RunState::Idle,
            regrowth_locked: false,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Whether decayed cells have been barred from regrowing for this run.
    pub fn regrowth_locked(&self) -> bool {
        self.regrowth_locked
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Shared read-only handle to the current grid.
    pub fn snapshot(&self) -> Arc<Grid> {
        Arc::clone(&self.grid)
    }

    pub fn census(&self) -> Census {
        self.grid.census()
    }

    /// Set one cell of the starting configuration.
    pub fn paint(&mut self, coordinate: Coordinate, state: CellState) -> Result<()> {
        self.ensure_idle("paint")?;
        Arc::make_mut(&mut self.grid).set(coordinate, state)
    }

    /// Advance one cell through the manual edit cycle and return its new state.
    pub fn toggle(&mut self, coordinate: Coordinate) -> Result<CellState> {
        self.ensure_idle("toggle")?;
        let next = self.grid.get(coordinate)?.toggle();
        Arc::make_mut(&mut self.grid).set(coordinate, next)?;
        Ok(next)
    }

    /// Replace the whole starting configuration.
    pub fn load(&mut self, grid: Grid) -> Result<()> {
        self.ensure_idle("load")?;
        grid.ensure_dimensions(self.config.grid.height, self.config.grid.width)?;
        self.grid = Arc::new(grid);
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(Error::InvalidState("simulation is already running".to_string()));
        }
        if self.limit_reached() {
            return Err(Error::InvalidState(format!(
                "tick limit {} reached, reset first",
                self.tick
            )));
        }

        // Resuming after stop() keeps the configuration from tick 0.
        if self.tick == 0 {
            self.initial = Grid::clone(&self.grid);
        }
        self.state = RunState::Running;

        info!(
            event = "simulation_started",
            tick = self.tick,
            tick_limit = ?self.config.tick_limit,
            census = %self.grid.census(),
            "Simulation started"
        );
        Ok(())
    }

    /// Pause; grid and tick are kept.
    pub fn stop(&mut self) {
        if self.is_running() {
            info!(event = "simulation_stopped", tick = self.tick, "Simulation stopped");
        }
        self.state = RunState::Idle;
    }

    /// Back to `Idle` at tick 0 with the grid chosen by the reset policy.
    pub fn reset(&mut self) {
        let grid = match self.config.reset_policy {
            ResetPolicy::Blank => Grid::from_config(&self.config.grid),
            ResetPolicy::InitialConfiguration => self.initial.clone(),
        };
        self.install_reset(grid);
    }

    /// Back to `Idle` at tick 0 with an explicitly supplied grid.
    pub fn reset_with(&mut self, grid: Grid) -> Result<()> {
        grid.ensure_dimensions(self.config.grid.height, self.config.grid.width)?;
        self.initial = grid.clone();
        self.install_reset(grid);
        Ok(())
    }

    /// Evaluate one tick and install the resulting grid.
    pub fn step(&mut self) -> Result<StepSummary> {
        if !self.is_running() {
            return Err(Error::InvalidState("simulation is not running".to_string()));
        }

        let mut context = TickContext::observe(&self.grid, self.tick, self.engine.rules());
        if !context.regrowth_enabled && !self.regrowth_locked {
            self.regrowth_locked = true;
            warn!(
                event = "regrowth_locked",
                tick = self.tick,
                vegetation = context.census.vegetation(),
                cap = ?self.engine.rules().regrowth_cap,
                "Vegetation cap exceeded, decayed cells will no longer regrow"
            );
        }
        context.regrowth_enabled = !self.regrowth_locked;

        let outcome = self.engine.advance(&self.grid, &context, &mut self.rng)?;
        self.grid = Arc::new(outcome.grid);
        self.tick += 1;

        if self.limit_reached() {
            self.state = RunState::Idle;
            info!(event = "tick_limit_reached", tick = self.tick, "Tick limit reached");
        }

        Ok(StepSummary {
            tick: self.tick,
            census: self.grid.census(),
            report: outcome.report,
            state: self.state,
        })
    }

    /// Start if needed and step until the tick limit stops the run.
    #[instrument(skip(self), fields(tick_limit = ?self.config.tick_limit))]
    pub fn run(&mut self) -> Result<Census> {
        if self.config.tick_limit.is_none() {
            return Err(Error::InvalidConfig(
                "run() needs a tick limit; drive step() instead".to_string(),
            ));
        }
        if !self.is_running() {
            self.start()?;
        }

        while self.is_running() {
            self.step()?;
        }

        let census = self.grid.census();
        info!(
            event = "run_summary",
            final_tick = self.tick,
            vegetation = census.vegetation(),
            herbivores = census.herbivores(),
            decayed = census.decayed(),
            regrowth_locked = self.regrowth_locked,
            "Run complete"
        );
        Ok(census)
    }

    fn limit_reached(&self) -> bool {
        self.config.tick_limit.is_some_and(|limit| self.tick >= limit)
    }

    fn ensure_idle(&self, action: &str) -> Result<()> {
        if self.is_running() {
            return Err(Error::InvalidState(format!(
                "cannot {action} while the simulation is running"
            )));
        }
        Ok(())
    }

    fn install_reset(&mut self, grid: Grid) {
        self.grid = Arc::new(grid);
        self.tick = 0;
        self.state = RunState::Idle;
        self.regrowth_locked = false;
        info!(event = "simulation_reset", policy = ?self.config.reset_policy, "Simulation reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eco_core::{GridConfig, RuleConfig, ScriptedRandom};

    fn c(row: i32, col: i32) -> Coordinate {
        Coordinate::new(row, col)
    }

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            grid: GridConfig {
                height: 8,
                width: 8,
                ..Default::default()
            },
            seed: 42,
            ..Default::default()
        }
    }

    #[test]
    fn test_simulation_creation() {
        let sim = Simulation::new(SimulationConfig::default()).unwrap();
        assert_eq!(sim.state(), RunState::Idle);
        assert_eq!(sim.tick(), 0);
        assert_eq!(sim.census().total(), 900);
        assert_eq!(sim.census().occupied(), 0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SimulationConfig {
            rules: RuleConfig {
                repop_period: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(Simulation::new(config), Err(Error::InvalidConfig(_))));

        let config = SimulationConfig {
            tick_limit: Some(0),
            ..small_config()
        };
        assert!(matches!(Simulation::new(config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_step_requires_running() {
        let mut sim = Simulation::new(small_config()).unwrap();
        assert!(matches!(sim.step(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_paint_and_toggle() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.paint(c(2, 2), CellState::Herbivore).unwrap();
        assert_eq!(sim.grid().get(c(2, 2)).unwrap(), CellState::Herbivore);

        let cycle: Vec<_> = (0..5).map(|_| sim.toggle(c(4, 4)).unwrap()).collect();
        assert_eq!(
            cycle,
            vec![
                CellState::Vegetation,
                CellState::Herbivore,
                CellState::Predator,
                CellState::Decayed,
                CellState::Empty,
            ]
        );

        assert!(matches!(
            sim.paint(c(0, 4), CellState::Vegetation),
            Err(Error::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            sim.toggle(c(9, 9)),
            Err(Error::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_edits_rejected_while_running() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.start().unwrap();
        assert!(matches!(
            sim.paint(c(1, 1), CellState::Vegetation),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(sim.toggle(c(1, 1)), Err(Error::InvalidState(_))));
        assert!(matches!(sim.load(Grid::new(8, 8)), Err(Error::InvalidState(_))));
        assert!(matches!(sim.start(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_load_checks_dimensions() {
        let mut sim = Simulation::new(small_config()).unwrap();
        assert!(matches!(
            sim.load(Grid::new(4, 8)),
            Err(Error::DimensionMismatch { .. })
        ));
        let mut grid = Grid::new(8, 8);
        grid.set(c(8, 8), CellState::Decayed).unwrap();
        sim.load(grid.clone()).unwrap();
        assert_eq!(sim.grid(), &grid);
    }

    #[test]
    fn test_step_advances_tick() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.paint(c(4, 4), CellState::Vegetation).unwrap();
        sim.start().unwrap();

        let summary = sim.step().unwrap();
        assert_eq!(summary.tick, 1);
        assert_eq!(sim.tick(), 1);
        assert_eq!(summary.state, RunState::Running);
        assert_eq!(summary.census, sim.census());
        // Tick 0 grows one ring; spawned herbivores may take some of it.
        assert_eq!(summary.census.vegetation() + summary.census.herbivores(), 9);
    }

    #[test]
    fn test_empty_grid_is_stable() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.start().unwrap();
        for _ in 0..10 {
            let summary = sim.step().unwrap();
            assert_eq!(summary.census.occupied(), 0);
            assert_eq!(summary.report.proposed, 0);
        }
    }

    #[test]
    fn test_tick_limit_returns_to_idle() {
        let config = SimulationConfig {
            tick_limit: Some(3),
            ..small_config()
        };
        let mut sim = Simulation::new(config).unwrap();
        sim.start().unwrap();

        assert_eq!(sim.step().unwrap().state, RunState::Running);
        assert_eq!(sim.step().unwrap().state, RunState::Running);
        assert_eq!(sim.step().unwrap().state, RunState::Idle);
        assert_eq!(sim.tick(), 3);
        assert!(matches!(sim.step(), Err(Error::InvalidState(_))));
        assert!(matches!(sim.start(), Err(Error::InvalidState(_))));

        sim.reset();
        assert_eq!(sim.tick(), 0);
        sim.start().unwrap();
    }

    #[test]
    fn test_stop_keeps_grid_and_tick() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.paint(c(4, 4), CellState::Vegetation).unwrap();
        sim.start().unwrap();
        sim.step().unwrap();
        let grid = sim.snapshot();

        sim.stop();
        assert_eq!(sim.state(), RunState::Idle);
        assert_eq!(sim.tick(), 1);
        assert_eq!(sim.grid(), grid.as_ref());

        sim.start().unwrap();
        assert_eq!(sim.step().unwrap().tick, 2);
    }

    #[test]
    fn test_reset_blank() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.paint(c(4, 4), CellState::Vegetation).unwrap();
        sim.start().unwrap();
        sim.step().unwrap();

        sim.reset();
        assert_eq!(sim.state(), RunState::Idle);
        assert_eq!(sim.tick(), 0);
        assert_eq!(sim.census().occupied(), 0);
    }

    #[test]
    fn test_reset_to_initial_configuration() {
        let config = SimulationConfig {
            reset_policy: ResetPolicy::InitialConfiguration,
            ..small_config()
        };
        let mut sim = Simulation::new(config).unwrap();
        sim.paint(c(4, 4), CellState::Vegetation).unwrap();
        sim.paint(c(7, 7), CellState::Predator).unwrap();
        let painted = sim.grid().clone();

        sim.start().unwrap();
        sim.step().unwrap();
        sim.stop();
        sim.start().unwrap();
        sim.step().unwrap();
        assert_ne!(sim.grid(), &painted);

        sim.reset();
        assert_eq!(sim.grid(), &painted);
        assert_eq!(sim.tick(), 0);
    }

    #[test]
    fn test_reset_with_supplied_grid() {
        let mut sim = Simulation::new(small_config()).unwrap();
        let mut grid = Grid::new(8, 8);
        grid.set(c(1, 8), CellState::Herbivore).unwrap();

        sim.reset_with(grid.clone()).unwrap();
        assert_eq!(sim.grid(), &grid);
        assert!(sim.reset_with(Grid::new(3, 3)).is_err());
    }

    #[test]
    fn test_snapshot_is_not_mutated_by_step() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.paint(c(4, 4), CellState::Vegetation).unwrap();
        let before_start = sim.snapshot();
        sim.start().unwrap();
        sim.step().unwrap();

        assert_eq!(before_start.census().vegetation(), 1);
        assert!(!Arc::ptr_eq(&before_start, &sim.snapshot()));
    }

    #[test]
    fn test_paint_does_not_leak_into_snapshot() {
        let mut sim = Simulation::new(small_config()).unwrap();
        let snapshot = sim.snapshot();
        sim.paint(c(1, 1), CellState::Vegetation).unwrap();
        assert_eq!(snapshot.get(c(1, 1)).unwrap(), CellState::Empty);
    }

    #[test]
    fn test_regrowth_lock_is_latched() {
        let config = SimulationConfig {
            grid: GridConfig {
                height: 5,
                width: 5,
                ..Default::default()
            },
            rules: RuleConfig {
                growth_period: 1000,
                decay_period: 1,
                decay_dormant_period: None,
                regrowth_cap: Some(2),
                ..Default::default()
            },
            ..Default::default()
        };
        let rng = ScriptedRandom::new().with_coins([true; 8]);
        let mut sim = Simulation::with_rng(config, rng).unwrap();
        for col in 1..=3 {
            sim.paint(c(1, col), CellState::Vegetation).unwrap();
        }
        sim.paint(c(5, 5), CellState::Decayed).unwrap();

        sim.start().unwrap();
        sim.step().unwrap();
        assert!(sim.regrowth_locked());
        assert_eq!(sim.grid().get(c(5, 5)).unwrap(), CellState::Decayed);

        // Clear the vegetation; the lock still holds for this run.
        sim.stop();
        let coordinates: Vec<_> = sim.grid().coordinates().collect();
        for coordinate in coordinates {
            if sim.grid().get(coordinate).unwrap() == CellState::Vegetation {
                sim.paint(coordinate, CellState::Empty).unwrap();
            }
        }
        sim.start().unwrap();
        sim.step().unwrap();
        assert!(sim.regrowth_locked());
        assert_eq!(sim.grid().get(c(5, 5)).unwrap(), CellState::Decayed);

        sim.reset();
        assert!(!sim.regrowth_locked());
    }

    #[test]
    fn test_run_to_limit() {
        let config = SimulationConfig {
            tick_limit: Some(50),
            ..small_config()
        };
        let mut sim = Simulation::new(config).unwrap();
        sim.paint(c(4, 4), CellState::Vegetation).unwrap();
        sim.paint(c(2, 6), CellState::Herbivore).unwrap();

        let census = sim.run().unwrap();
        assert_eq!(sim.tick(), 50);
        assert_eq!(sim.state(), RunState::Idle);
        assert_eq!(census.total(), 64);
    }

    #[test]
    fn test_run_needs_limit() {
        let mut sim = Simulation::new(small_config()).unwrap();
        assert!(matches!(sim.run(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_same_seed_same_history() {
        let mut a = Simulation::new(small_config()).unwrap();
        let mut b = Simulation::new(small_config()).unwrap();
        for sim in [&mut a, &mut b] {
            sim.paint(c(3, 3), CellState::Vegetation).unwrap();
            sim.paint(c(6, 6), CellState::Herbivore).unwrap();
            sim.paint(c(1, 8), CellState::Decayed).unwrap();
            sim.start().unwrap();
        }
        for _ in 0..20 {
            assert_eq!(a.step().unwrap(), b.step().unwrap());
            assert_eq!(a.grid(), b.grid());
        }
    }
}
