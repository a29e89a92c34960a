// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for place-cell generator operations

/// Invalid parameter combination.
///
/// Always raised synchronously from a validate step, before anything is
/// committed, so the caller can recover by correcting the request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Bad property '{property}': {reason}")]
    BadProperty {
        property: &'static str,
        reason: String,
    },

    #[error("Trajectory length mismatch: rat_pos_x has {x_len} samples, rat_pos_y has {y_len}")]
    TrajectoryLengthMismatch { x_len: usize, y_len: usize },

    #[error("Trajectory must contain at least one sample")]
    EmptyTrajectory,

    #[error("Activation window is inverted: start ({start} ms) > stop ({stop} ms)")]
    InvertedWindow { start: f64, stop: f64 },

    #[error(
        "Trajectory sampled every {pos_dt_ms} ms is finer than the simulation resolution of {sim_dt_ms} ms"
    )]
    ResolutionMismatch { pos_dt_ms: f64, sim_dt_ms: f64 },
}

impl ConfigurationError {
    pub(crate) fn bad_property(property: &'static str, reason: impl Into<String>) -> Self {
        ConfigurationError::BadProperty {
            property,
            reason: reason.into(),
        }
    }
}

/// Error types for generator operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeneratorError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A host-owned validator rejected an update after the core accepted it.
    #[error("Host validation rejected update: {0}")]
    HostRejected(String),

    #[error("Generator stepped before calibration")]
    NotCalibrated,
}

pub type Result<T> = core::result::Result<T, GeneratorError>;
pub type Error = GeneratorError;
