//! Core types and utilities for the grazing-ecology cellular automaton.

pub mod types;
pub mod config;
pub mod census;
pub mod error;
pub mod random;

pub use error::{Error, Result};
pub use types::*;
pub use config::*;
pub use census::Census;
pub use random::{draw_distinct, RandomSource, ScriptedRandom, SeededRandom};
