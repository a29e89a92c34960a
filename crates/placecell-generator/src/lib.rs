// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Place Cell Generator
//!
//! Spatially tuned spike generation in one place:
//! - **Parameters**: validated, all-or-nothing parameter set and status dictionary
//! - **Trajectory**: shared recording plus a cursor driven by the simulation clock
//! - **Field**: Gaussian place-field rate model
//! - **Poisson**: per-step event counts from per-execution-unit random streams
//! - **Controller**: activation window, calibration and the per-step loop
//!
//! The generator never touches wall-clock time, never blocks and does no I/O.
//! The host supplies the resolution at calibration, the step range at update,
//! the caller's random stream, and a sink for the decided spikes.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Core type definitions
pub mod types;

pub mod controller;
pub mod field;
pub mod parameters;
pub mod poisson;
pub mod trajectory;

// Re-export types
pub use types::{
    ConfigurationError, Error, ExecutionUnitId, GeneratorError, GeneratorId, Position, Result,
    SimStep,
};

pub use controller::{
    ActivationWindowProvider, GeneratorController, GeneratorState, SpikeSink, SpikeTimestamp,
    StatusCodec, StepWindow,
};
pub use field::FieldRateModel;
pub use parameters::{
    names, ActivationWindow, Candidate, ParameterSet, Parameters, StatusDict, StatusValue,
};
pub use poisson::{PoissonStepper, RandomStream, StreamSeeder};
pub use trajectory::{Trajectory, TrajectoryIndex, TrajectoryStore};
