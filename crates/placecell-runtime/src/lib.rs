// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Place Cell Runtime
//!
//! Host side of the place cell generator:
//! - **Population**: simulation clock, shared trajectory, generator registry
//! - **Execution units**: fixed generator partitions, each with its own random stream
//! - **Grid**: square tiling of place-field centers over the arena
//! - **Recorder**: spikes tagged with their generator and step
//!
//! Units are stepped in parallel with Rayon. Output depends only on the seed
//! and the unit count, never on the size of the thread pool.

pub mod error;
pub mod grid;
pub mod population;
pub mod recorder;
pub mod unit;

pub use error::{Result, RuntimeError};
pub use grid::PlaceFieldGrid;
pub use population::{PlaceCellPopulation, PopulationSettings};
pub use recorder::{GeneratorSink, SpikeEvent, SpikeRecorder};
pub use unit::ExecutionUnit;
