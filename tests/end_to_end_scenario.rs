// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end behaviour of a single generator against the simulation clock.

use placecell::prelude::*;

fn still_animal() -> TrajectoryStore {
    TrajectoryStore::new(Trajectory::new(vec![0.0; 3], vec![0.0; 3], 10.0).unwrap())
}

fn centered_generator(store: &TrajectoryStore) -> GeneratorController {
    let params = Parameters {
        rate: 100.0,
        field_size: 5.0,
        window: ActivationWindow::new(0.0, 0.0, 30.0),
        ..Parameters::default()
    };
    let mut generator = GeneratorController::with_parameters(params, store.clone()).unwrap();
    generator.calibrate(1.0).unwrap();
    generator
}

#[test]
fn test_mean_spike_count_over_window() {
    const TRIALS: u64 = 2_000;
    let store = still_animal();
    let mut total = 0u64;

    for seed in 0..TRIALS {
        let mut generator = centered_generator(&store);
        let mut stream = StreamSeeder::new(seed).stream_for(ExecutionUnitId(0));
        let mut spikes: Vec<SpikeTimestamp> = Vec::new();
        total += generator.update(0..40, &mut stream, &mut spikes).unwrap();

        assert!(spikes.iter().all(|s| s.step < 30));
        // One draw per active step, none after the window closes
        assert_eq!(stream.draws(), 30);
    }

    // 100 Hz for 30 ms
    let mean = total as f64 / TRIALS as f64;
    assert!((mean - 3.0).abs() < 0.2, "mean spike count {}", mean);
}

#[test]
fn test_trajectory_exhaustion_holds_last_position() {
    // Three samples at 10 ms cover 30 ms; the animal then stays at x = 20
    let store = TrajectoryStore::new(
        Trajectory::new(vec![0.0, 10.0, 20.0], vec![0.0; 3], 10.0).unwrap(),
    );
    let params = Parameters {
        rate: 1_000.0,
        ctr_x: 20.0,
        field_size: 1.0,
        ..Parameters::default()
    };
    let mut generator = GeneratorController::with_parameters(params, store).unwrap();
    generator.calibrate(1.0).unwrap();

    let mut stream = StreamSeeder::new(3).stream_for(ExecutionUnitId(0));
    let mut spikes: Vec<SpikeTimestamp> = Vec::new();
    generator.update(0..200, &mut stream, &mut spikes).unwrap();

    assert_eq!(generator.cursor(), 2);
    // Sitting on the field center at 1 spike/ms after the recording ends
    let late = spikes.iter().filter(|s| s.step >= 100).count();
    assert!(late > 50, "only {} spikes while holding the last sample", late);
}

#[test]
fn test_status_update_shares_trajectory_across_population() {
    let mut population = PlaceCellPopulation::new(
        PopulationSettings {
            resolution_ms: 1.0,
            execution_units: 2,
            seed: 1,
        },
        Trajectory::default(),
    )
    .unwrap();
    let a = population.add_generator(Parameters::default()).unwrap();
    let b = population.add_generator(Parameters::default()).unwrap();

    let mut update = StatusDict::new();
    update.insert(names::RAT_POS_X.to_string(), StatusValue::Reals(vec![1.0, 2.0]));
    update.insert(names::RAT_POS_Y.to_string(), StatusValue::Reals(vec![3.0, 4.0]));
    update.insert(names::RAT_POS_DT.to_string(), StatusValue::Real(5.0));
    population.set_status(a, &update).unwrap();

    let seen_by_b = population.get_status(b).unwrap();
    assert_eq!(
        seen_by_b[names::RAT_POS_X],
        StatusValue::Reals(vec![1.0, 2.0])
    );
    assert_eq!(seen_by_b[names::RAT_POS_DT], StatusValue::Real(5.0));
}

#[test]
fn test_rejected_update_changes_nothing() {
    let store = still_animal();
    let mut generator = centered_generator(&store);
    let mut before = StatusDict::new();
    generator.get_status(&mut before);

    let mut update = StatusDict::new();
    update.insert(names::RATE.to_string(), StatusValue::Real(50.0));
    update.insert(names::FIELD_SIZE.to_string(), StatusValue::Real(-1.0));
    assert!(generator.set_status(&update).is_err());

    let mut after = StatusDict::new();
    generator.get_status(&mut after);
    assert_eq!(before, after);
    assert!(generator.is_calibrated());
}
