// vim: tw=80
//! Run-time configuration
//!
//! Everything has a default, so a configuration file need only mention the
//! values that differ.

use serde_derive::{Deserialize, Serialize};
use crate::types::*;

/// Parameters of the stochastic timing model
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fraction of each disk's time spent servicing I/O.  Used to derive
    /// per-disk IOPS for performance sizing.
    pub utilization: f64,
    /// Samples are drawn uniformly from `mean * (1 ± jitter)`.
    pub jitter: f64,
    /// Number of synthetic operations to model when the workload has no
    /// files.
    pub default_samples: usize,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.utilization > 0.0 && self.utilization <= 1.0) {
            return Err(Error::input(format!(
                "utilization must lie in (0, 1], not {}", self.utilization)));
        }
        if !(self.jitter >= 0.0 && self.jitter < 1.0) {
            return Err(Error::input(format!(
                "jitter must lie in [0, 1), not {}", self.jitter)));
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            utilization: 0.7,
            jitter: 0.1,
            default_samples: 100,
        }
    }
}

/// Top-level configuration, as read from a YAML file
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    pub disk: DiskSpec,
    pub simulation: SimulationConfig,
}

impl Config {
    /// Parse and validate a YAML configuration document.
    pub fn from_yaml(s: &str) -> Result<Self> {
        let config: Config = serde_yaml_ng::from_str(s)
            .map_err(|e| Error::input(format!("Malformed configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml_ng::to_string(self)
            .map_err(|e| Error::input(format!("Can't serialize configuration: \
                {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        self.disk.validate()?;
        self.simulation.validate()
    }
}
