//! Grazing-ecology cellular automaton engine.
//!
//! A fixed grid of cells (empty, vegetation, herbivore, predator, decayed)
//! advanced tick by tick. Each tick every cell proposes write intents from the
//! same snapshot, conflicts are settled by a fixed priority order, and the
//! winners are committed into a fresh grid.

pub mod grid;
pub mod intent;
pub mod rules;
pub mod engine;
pub mod simulation;

pub use grid::Grid;
pub use intent::{CommitReport, Intent, IntentKind};
pub use rules::TickContext;
pub use engine::{RuleEngine, StepOutcome};
pub use simulation::{RunState, Simulation, StepSummary};
