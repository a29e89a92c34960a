// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Generator Types Module
//!
//! Core type definitions shared by every stage of the generator.

pub mod error;
pub mod ids;
pub mod spatial;

// Re-export commonly used types
pub use error::{ConfigurationError, Error, GeneratorError, Result};
pub use ids::{ExecutionUnitId, GeneratorId, SimStep};
pub use spatial::Position;
