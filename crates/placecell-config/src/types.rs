// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section of `placecell_configuration.toml`. Missing
//! sections and keys fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaceCellConfig {
    pub simulation: SimulationConfig,
    pub arena: ArenaConfig,
    pub place_cells: PlaceCellsConfig,
    pub trajectory: TrajectoryConfig,
    pub logging: LoggingConfig,
}

/// Simulation clock and parallelism
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Step size (ms)
    pub resolution_ms: f64,
    /// Total simulated time (ms)
    pub duration_ms: f64,
    /// Number of execution units (independent random streams)
    pub execution_units: usize,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            resolution_ms: 0.1,
            duration_ms: 10_000.0,
            execution_units: 1,
            seed: 12345,
        }
    }
}

/// Square arena tiled by place fields
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Side length (cm)
    pub size_cm: f64,
    /// Place fields per side; the population holds `fields_per_side²` cells
    pub fields_per_side: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            size_cm: 180.0,
            fields_per_side: 30,
        }
    }
}

/// Parameters shared by every place cell of the grid
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaceCellsConfig {
    /// Peak rate at the field center (Hz)
    pub rate_hz: f64,
    /// Gaussian standard deviation of the field (cm)
    pub field_size_cm: f64,
    pub origin_ms: f64,
    pub start_ms: f64,
    /// Absent means the window never closes
    pub stop_ms: Option<f64>,
}

impl Default for PlaceCellsConfig {
    fn default() -> Self {
        Self {
            rate_hz: 20.0,
            field_size_cm: 20.0,
            origin_ms: 0.0,
            start_ms: 0.0,
            stop_ms: None,
        }
    }
}

/// Recorded animal trajectory
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    /// Sampling interval (ms)
    pub dt_ms: f64,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            dt_ms: 20.0,
            x: vec![0.0],
            y: vec![0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Run folders are created here when file logging is enabled
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
        }
    }
}
