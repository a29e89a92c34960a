// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks that values are within range and consistent with each other before
//! anything is built from them. All problems are collected and reported
//! together.

use crate::{ConfigError, ConfigResult, PlaceCellConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    NotPositive { field: String, value: f64 },
    Negative { field: String, value: f64 },
    NotFinite { field: String },
    LengthMismatch { x_len: usize, y_len: usize },
    EmptyTrajectory,
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotPositive { field, value } => {
                write!(f, "{} = {} must be positive", field, value)
            }
            Self::Negative { field, value } => {
                write!(f, "{} = {} must not be negative", field, value)
            }
            Self::NotFinite { field } => write!(f, "{} must be finite", field),
            Self::LengthMismatch { x_len, y_len } => write!(
                f,
                "trajectory.x has {} samples but trajectory.y has {}",
                x_len, y_len
            ),
            Self::EmptyTrajectory => write!(f, "trajectory must contain at least one sample"),
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Positive, finite clock settings and at least one execution unit
/// - A trajectory no finer than the simulation resolution, with matching axes
/// - Non-negative rate, positive field size and an ordered activation window
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` with details if validation fails
pub fn validate_config(config: &PlaceCellConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);
    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");
    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

/// Every problem with `config`, in section order
pub fn collect_errors(config: &PlaceCellConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_simulation(config, &mut errors);
    validate_arena(config, &mut errors);
    validate_place_cells(config, &mut errors);
    validate_trajectory(config, &mut errors);
    errors
}

fn positive(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if !value.is_finite() {
        errors.push(ConfigValidationError::NotFinite {
            field: field.to_string(),
        });
    } else if value <= 0.0 {
        errors.push(ConfigValidationError::NotPositive {
            field: field.to_string(),
            value,
        });
    }
}

fn non_negative(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if !value.is_finite() {
        errors.push(ConfigValidationError::NotFinite {
            field: field.to_string(),
        });
    } else if value < 0.0 {
        errors.push(ConfigValidationError::Negative {
            field: field.to_string(),
            value,
        });
    }
}

fn validate_simulation(config: &PlaceCellConfig, errors: &mut Vec<ConfigValidationError>) {
    let sim = &config.simulation;
    positive("simulation.resolution_ms", sim.resolution_ms, errors);
    non_negative("simulation.duration_ms", sim.duration_ms, errors);
    if sim.execution_units == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "simulation.execution_units".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
}

fn validate_arena(config: &PlaceCellConfig, errors: &mut Vec<ConfigValidationError>) {
    positive("arena.size_cm", config.arena.size_cm, errors);
    if config.arena.fields_per_side == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "arena.fields_per_side".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
}

fn validate_place_cells(config: &PlaceCellConfig, errors: &mut Vec<ConfigValidationError>) {
    let pc = &config.place_cells;
    non_negative("place_cells.rate_hz", pc.rate_hz, errors);
    positive("place_cells.field_size_cm", pc.field_size_cm, errors);
    if !pc.origin_ms.is_finite() {
        errors.push(ConfigValidationError::NotFinite {
            field: "place_cells.origin_ms".to_string(),
        });
    }
    if !pc.start_ms.is_finite() {
        errors.push(ConfigValidationError::NotFinite {
            field: "place_cells.start_ms".to_string(),
        });
    }
    if let Some(stop) = pc.stop_ms {
        if stop.is_nan() {
            errors.push(ConfigValidationError::NotFinite {
                field: "place_cells.stop_ms".to_string(),
            });
        } else if stop < pc.start_ms {
            errors.push(ConfigValidationError::InvalidValue {
                field: "place_cells.stop_ms".to_string(),
                reason: format!("{} is before start_ms = {}", stop, pc.start_ms),
            });
        }
    }
}

fn validate_trajectory(config: &PlaceCellConfig, errors: &mut Vec<ConfigValidationError>) {
    let traj = &config.trajectory;
    positive("trajectory.dt_ms", traj.dt_ms, errors);
    if traj.dt_ms.is_finite() && traj.dt_ms < config.simulation.resolution_ms {
        errors.push(ConfigValidationError::InvalidValue {
            field: "trajectory.dt_ms".to_string(),
            reason: format!(
                "must not be finer than simulation.resolution_ms = {}",
                config.simulation.resolution_ms
            ),
        });
    }
    if traj.x.len() != traj.y.len() {
        errors.push(ConfigValidationError::LengthMismatch {
            x_len: traj.x.len(),
            y_len: traj.y.len(),
        });
    } else if traj.x.is_empty() {
        errors.push(ConfigValidationError::EmptyTrajectory);
    }
    if traj.x.iter().chain(traj.y.iter()).any(|v| !v.is_finite()) {
        errors.push(ConfigValidationError::NotFinite {
            field: "trajectory".to_string(),
        });
    }
}
