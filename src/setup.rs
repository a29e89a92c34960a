// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Building a population from a loaded configuration.

use placecell_config::{
    validate_config, ConfigError, LoggingConfig, PlaceCellConfig, PlaceCellsConfig,
    SimulationConfig, TrajectoryConfig,
};
use placecell_generator::{
    ActivationWindow, ConfigurationError, GeneratorId, Parameters, Trajectory,
};
use placecell_observability::LoggingOptions;
use placecell_runtime::{PlaceCellPopulation, PlaceFieldGrid, PopulationSettings, RuntimeError};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid place cell settings: {0}")]
    Generator(#[from] ConfigurationError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

pub fn trajectory_from_config(config: &TrajectoryConfig) -> Result<Trajectory, ConfigurationError> {
    Trajectory::new(config.x.clone(), config.y.clone(), config.dt_ms)
}

/// Parameters shared by every cell; the center is filled in per grid point
pub fn parameters_from_config(config: &PlaceCellsConfig) -> Parameters {
    Parameters {
        rate: config.rate_hz,
        field_size: config.field_size_cm,
        window: ActivationWindow::new(
            config.origin_ms,
            config.start_ms,
            config.stop_ms.unwrap_or(f64::INFINITY),
        ),
        ..Parameters::default()
    }
}

pub fn population_settings(config: &SimulationConfig) -> PopulationSettings {
    PopulationSettings {
        resolution_ms: config.resolution_ms,
        execution_units: config.execution_units,
        seed: config.seed,
    }
}

pub fn logging_options(config: &LoggingConfig) -> LoggingOptions {
    LoggingOptions::default()
        .with_level(config.level.clone())
        .with_log_dir(config.log_dir.clone())
}

/// Validate `config` and build a population with one cell per grid center.
///
/// Returns the population and the generator ids in grid order.
pub fn build_population(
    config: &PlaceCellConfig,
) -> Result<(PlaceCellPopulation, Vec<GeneratorId>), SetupError> {
    validate_config(config)?;

    let trajectory = trajectory_from_config(&config.trajectory)?;
    let grid = PlaceFieldGrid::new(config.arena.size_cm, config.arena.fields_per_side)?;
    let mut population =
        PlaceCellPopulation::new(population_settings(&config.simulation), trajectory)?;
    let ids = population.add_grid(&grid, parameters_from_config(&config.place_cells))?;

    info!(
        place_cells = ids.len(),
        arena_cm = config.arena.size_cm,
        rate_hz = config.place_cells.rate_hz,
        field_size_cm = config.place_cells.field_size_cm,
        "Built place cell population"
    );
    Ok((population, ids))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_builds_full_grid() {
        let mut config = PlaceCellConfig::default();
        config.arena.fields_per_side = 4;
        let (population, ids) = build_population(&config).unwrap();
        assert_eq!(ids.len(), 16);
        assert_eq!(population.len(), 16);
    }

    #[test]
    fn test_open_ended_window() {
        let params = parameters_from_config(&PlaceCellsConfig::default());
        assert_eq!(params.window.stop, f64::INFINITY);
    }

    #[test]
    fn test_invalid_config_rejected_before_building() {
        let mut config = PlaceCellConfig::default();
        config.simulation.execution_units = 0;
        assert!(matches!(
            build_population(&config),
            Err(SetupError::Config(ConfigError::ValidationError(_)))
        ));
    }
}
