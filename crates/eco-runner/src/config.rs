//! Runner configuration: simulation settings plus pacing and output.

use anyhow::{Context, Result};
use eco_core::{SeedConfig, SimulationConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub simulation: SimulationConfig,
    /// Densities for the random starting grid when no pattern is given
    pub seeding: SeedConfig,
    /// Pause between steps (milliseconds)
    pub interval_ms: u64,
    /// Print the grid after every step
    pub render: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            seeding: SeedConfig::default(),
            interval_ms: 1000,
            render: false,
        }
    }
}

impl RunnerConfig {
    /// Read a JSON config file, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        self.seeding.validate()?;
        anyhow::ensure!(self.interval_ms > 0, "interval_ms must be positive");
        Ok(())
    }
}
