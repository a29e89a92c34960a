// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, PlaceCellConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_FILE_NAME: &str = "placecell_configuration.toml";

/// Environment variable to configuration key
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("PLACECELL_RESOLUTION_MS", "simulation.resolution_ms"),
    ("PLACECELL_DURATION_MS", "simulation.duration_ms"),
    ("PLACECELL_EXECUTION_UNITS", "simulation.execution_units"),
    ("PLACECELL_SEED", "simulation.seed"),
    ("PLACECELL_ARENA_SIZE_CM", "arena.size_cm"),
    ("PLACECELL_FIELDS_PER_SIDE", "arena.fields_per_side"),
    ("PLACECELL_RATE_HZ", "place_cells.rate_hz"),
    ("PLACECELL_FIELD_SIZE_CM", "place_cells.field_size_cm"),
    ("PLACECELL_ORIGIN_MS", "place_cells.origin_ms"),
    ("PLACECELL_START_MS", "place_cells.start_ms"),
    ("PLACECELL_STOP_MS", "place_cells.stop_ms"),
    ("PLACECELL_TRAJECTORY_DT_MS", "trajectory.dt_ms"),
    ("PLACECELL_LOG_LEVEL", "logging.level"),
    ("PLACECELL_LOG_DIR", "logging.log_dir"),
];

/// Find the configuration file
///
/// Search order:
/// 1. `PLACECELL_CONFIG_PATH` environment variable
/// 2. Current working directory: `./placecell_configuration.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("PLACECELL_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by PLACECELL_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(path) = search_paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "Configuration file '{}' not found in any of these locations:\n{}\n\nSet PLACECELL_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides, keyed by `section.field`
///
/// # Errors
///
/// Returns error if the config file is not found, contains invalid TOML, or an
/// override cannot be parsed. Validation is a separate step, see
/// [`validate_config`](crate::validate_config).
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<PlaceCellConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: PlaceCellConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config)?;
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `PLACECELL_RESOLUTION_MS` -> `simulation.resolution_ms`
/// - `PLACECELL_DURATION_MS` -> `simulation.duration_ms`
/// - `PLACECELL_EXECUTION_UNITS` -> `simulation.execution_units`
/// - `PLACECELL_SEED` -> `simulation.seed`
/// - `PLACECELL_ARENA_SIZE_CM` -> `arena.size_cm`
/// - `PLACECELL_FIELDS_PER_SIDE` -> `arena.fields_per_side`
/// - `PLACECELL_RATE_HZ` -> `place_cells.rate_hz`
/// - `PLACECELL_FIELD_SIZE_CM` -> `place_cells.field_size_cm`
/// - `PLACECELL_ORIGIN_MS` / `_START_MS` / `_STOP_MS` -> `place_cells.*`
/// - `PLACECELL_TRAJECTORY_DT_MS` -> `trajectory.dt_ms`
/// - `PLACECELL_LOG_LEVEL` -> `logging.level`
/// - `PLACECELL_LOG_DIR` -> `logging.log_dir`
pub fn apply_environment_overrides(config: &mut PlaceCellConfig) -> ConfigResult<()> {
    for (var, key) in ENV_OVERRIDES {
        if let Ok(value) = env::var(var) {
            set_key(config, key, &value)?;
        }
    }
    Ok(())
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - Map of `section.field` to value (e.g., `{"simulation.seed": "7"}`)
pub fn apply_cli_overrides(
    config: &mut PlaceCellConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    // Sorted so a bad override is always reported the same way
    let mut keys: Vec<_> = cli_args.keys().collect();
    keys.sort();
    for key in keys {
        set_key(config, key, &cli_args[key])?;
    }
    Ok(())
}

fn parse<T>(key: &str, value: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidOverride {
            key: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn set_key(config: &mut PlaceCellConfig, key: &str, value: &str) -> ConfigResult<()> {
    match key {
        "simulation.resolution_ms" => config.simulation.resolution_ms = parse(key, value)?,
        "simulation.duration_ms" => config.simulation.duration_ms = parse(key, value)?,
        "simulation.execution_units" => config.simulation.execution_units = parse(key, value)?,
        "simulation.seed" => config.simulation.seed = parse(key, value)?,
        "arena.size_cm" => config.arena.size_cm = parse(key, value)?,
        "arena.fields_per_side" => config.arena.fields_per_side = parse(key, value)?,
        "place_cells.rate_hz" => config.place_cells.rate_hz = parse(key, value)?,
        "place_cells.field_size_cm" => config.place_cells.field_size_cm = parse(key, value)?,
        "place_cells.origin_ms" => config.place_cells.origin_ms = parse(key, value)?,
        "place_cells.start_ms" => config.place_cells.start_ms = parse(key, value)?,
        "place_cells.stop_ms" => {
            config.place_cells.stop_ms = match value.trim() {
                "" | "none" | "inf" => None,
                other => Some(parse(key, other)?),
            }
        }
        "trajectory.dt_ms" => config.trajectory.dt_ms = parse(key, value)?,
        "logging.level" => config.logging.level = value.to_string(),
        "logging.log_dir" => config.logging.log_dir = PathBuf::from(value),
        _ => {
            return Err(ConfigError::InvalidOverride {
                key: key.to_string(),
                value: value.to_string(),
                reason: "unknown configuration key".to_string(),
            })
        }
    }
    Ok(())
}
