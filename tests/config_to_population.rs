// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file through to a population run.

use std::fs;

use placecell::prelude::*;
use tempfile::tempdir;

const CONFIG: &str = r#"
[simulation]
resolution_ms = 0.5
duration_ms = 400.0
execution_units = 3
seed = 2024

[arena]
size_cm = 60.0
fields_per_side = 3

[place_cells]
rate_hz = 60.0
field_size_cm = 15.0
start_ms = 50.0
stop_ms = 350.0

[trajectory]
dt_ms = 20.0
x = [-20.0, -10.0, 0.0, 10.0, 20.0]
y = [0.0, 0.0, 0.0, 0.0, 0.0]
"#;

fn load() -> PlaceCellConfig {
    let dir = tempdir().unwrap();
    let path = dir.path().join("placecell_configuration.toml");
    fs::write(&path, CONFIG).unwrap();
    load_config(Some(&path), None).unwrap()
}

fn run_once(config: &PlaceCellConfig) -> Vec<SpikeEvent> {
    let (mut population, ids) = build_population(config).unwrap();
    assert_eq!(ids.len(), 9);
    population
        .run(config.simulation.duration_ms)
        .unwrap()
        .events()
        .to_vec()
}

#[test]
fn test_config_run_is_reproducible() {
    let config = load();
    let first = run_once(&config);
    assert!(!first.is_empty());
    assert_eq!(first, run_once(&config));
}

#[test]
fn test_config_window_is_respected() {
    let config = load();
    let events = run_once(&config);
    // [50, 350) ms at 0.5 ms
    assert!(events.iter().all(|e| (100..700).contains(&e.step)));
}

#[test]
fn test_summary_of_config_run() {
    let config = load();
    let (mut population, ids) = build_population(&config).unwrap();
    let recorder = population.run(config.simulation.duration_ms).unwrap();
    let summary = RunSummary::new(&recorder, &ids, config.simulation.duration_ms);

    assert_eq!(summary.counts.iter().sum::<u64>() as usize, summary.spikes);
    // The animal walks along y = 0, so the middle row fires most
    let middle_row: u64 = summary.counts[3..6].iter().sum();
    let outer_rows: u64 = summary.counts[..3].iter().chain(&summary.counts[6..]).sum();
    assert!(middle_row > outer_rows / 2, "{:?}", summary.counts);
}
