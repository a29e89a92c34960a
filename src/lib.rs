// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # placecell - spatially tuned spike generators
//!
//! A place cell fires as a Poisson process whose rate is a Gaussian of the
//! animal's distance to the cell's field center. The animal's position comes
//! from a recorded trajectory sampled on its own clock, which is resampled
//! onto the simulation clock.
//!
//! This crate re-exports the workspace members and wires a configuration file
//! into a ready-to-run population.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use placecell::prelude::*;
//!
//! let config = load_config(None, None)?;
//! let (mut population, _ids) = build_population(&config)?;
//! let spikes = population.run(config.simulation.duration_ms)?;
//! println!("{} spikes", spikes.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Crates
//! - **`generator`**: parameters, trajectory, field model, Poisson stepping
//! - **`runtime`**: execution units, populations, spike recording
//! - **`config`**: TOML configuration with environment and CLI overrides
//! - **`observability`**: logging setup and per-crate debug flags

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use placecell_config as config;
pub use placecell_generator as generator;
pub use placecell_observability as observability;
pub use placecell_runtime as runtime;

pub mod setup;
pub mod summary;

pub use setup::{build_population, SetupError};
pub use summary::RunSummary;

/// Common imports
pub mod prelude {
    pub use placecell_config::{load_config, validate_config, PlaceCellConfig};
    pub use placecell_generator::{
        names, ActivationWindow, ExecutionUnitId, GeneratorController, GeneratorError,
        GeneratorId, Parameters, Position, SpikeSink, SpikeTimestamp, StatusCodec, StatusDict,
        StatusValue, StreamSeeder, Trajectory, TrajectoryStore,
    };
    pub use placecell_runtime::{
        PlaceCellPopulation, PlaceFieldGrid, PopulationSettings, RuntimeError, SpikeEvent,
        SpikeRecorder,
    };

    pub use crate::setup::{build_population, SetupError};
    pub use crate::summary::RunSummary;
}
