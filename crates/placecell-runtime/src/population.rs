// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Place cell population.
//!
//! Owns the simulation clock, the shared trajectory and the execution units.
//! Generators are assigned to units round-robin by creation order, so the
//! spike output is a function of the seed and the unit count only.

use ahash::AHashMap;
use placecell_generator::{
    Candidate, ExecutionUnitId, GeneratorController, GeneratorId, Parameters, SimStep,
    StatusCodec, StatusDict, StreamSeeder, Trajectory, TrajectoryStore,
};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{Result, RuntimeError};
use crate::grid::PlaceFieldGrid;
use crate::recorder::SpikeRecorder;
use crate::unit::ExecutionUnit;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationSettings {
    /// Simulation step (ms)
    pub resolution_ms: f64,
    pub execution_units: usize,
    pub seed: u64,
}

impl PopulationSettings {
    fn validate(&self) -> Result<()> {
        if !(self.resolution_ms.is_finite() && self.resolution_ms > 0.0) {
            return Err(RuntimeError::InvalidSetting {
                setting: "simulation.resolution_ms",
                reason: format!("must be positive and finite, got {}", self.resolution_ms),
            });
        }
        if self.execution_units == 0 {
            return Err(RuntimeError::InvalidSetting {
                setting: "simulation.execution_units",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Where a generator lives
#[derive(Debug, Clone, Copy)]
struct Slot {
    unit: usize,
    index: usize,
}

#[derive(Debug)]
pub struct PlaceCellPopulation {
    settings: PopulationSettings,
    seeder: StreamSeeder,
    trajectory: TrajectoryStore,
    units: Vec<ExecutionUnit>,
    slots: AHashMap<GeneratorId, Slot>,
    next_id: u32,
    /// First step of the next run
    clock: SimStep,
}

impl PlaceCellPopulation {
    pub fn new(settings: PopulationSettings, trajectory: Trajectory) -> Result<Self> {
        settings.validate()?;
        let units = (0..settings.execution_units)
            .map(|u| ExecutionUnit::new(ExecutionUnitId(u as u32)))
            .collect();
        info!(
            resolution_ms = settings.resolution_ms,
            execution_units = settings.execution_units,
            seed = settings.seed,
            samples = trajectory.len(),
            "Created place cell population"
        );
        Ok(Self {
            seeder: StreamSeeder::new(settings.seed),
            trajectory: TrajectoryStore::new(trajectory),
            units,
            slots: AHashMap::new(),
            next_id: 0,
            clock: 0,
            settings,
        })
    }

    pub fn settings(&self) -> PopulationSettings {
        self.settings
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Handle to the recording shared by every generator
    pub fn trajectory(&self) -> &TrajectoryStore {
        &self.trajectory
    }

    /// Step at which the next run starts
    pub fn current_step(&self) -> SimStep {
        self.clock
    }

    pub fn current_time_ms(&self) -> f64 {
        self.clock as f64 * self.settings.resolution_ms
    }

    /// Execution unit a generator is assigned to
    pub fn unit_of(&self, id: GeneratorId) -> Option<ExecutionUnitId> {
        self.slots.get(&id).map(|slot| self.units[slot.unit].id())
    }

    /// Add one generator with the given parameters
    pub fn add_generator(&mut self, params: Parameters) -> Result<GeneratorId> {
        let generator = GeneratorController::with_parameters(params, self.trajectory.clone())?;
        let id = GeneratorId(self.next_id);
        let unit = self.next_id as usize % self.units.len();
        let index = self.units[unit].push(id, generator);
        self.slots.insert(id, Slot { unit, index });
        self.next_id += 1;
        Ok(id)
    }

    /// One generator per grid center, sharing everything else with `template`
    pub fn add_grid(
        &mut self,
        grid: &PlaceFieldGrid,
        template: Parameters,
    ) -> Result<Vec<GeneratorId>> {
        let ids = grid
            .centers()
            .into_iter()
            .map(|center| {
                self.add_generator(Parameters {
                    ctr_x: center.x,
                    ctr_y: center.y,
                    ..template
                })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(
            generators = ids.len(),
            spacing_cm = grid.spacing_cm(),
            "Added place field grid"
        );
        Ok(ids)
    }

    pub fn generator(&self, id: GeneratorId) -> Option<&GeneratorController> {
        let slot = self.slots.get(&id)?;
        self.units[slot.unit].generator(slot.index)
    }

    fn generator_mut(&mut self, id: GeneratorId) -> Result<&mut GeneratorController> {
        let slot = *self.slots.get(&id).ok_or(RuntimeError::UnknownGenerator(id))?;
        self.units[slot.unit]
            .generator_mut(slot.index)
            .ok_or(RuntimeError::UnknownGenerator(id))
    }

    pub fn get_status(&self, id: GeneratorId) -> Result<StatusDict> {
        let generator = self.generator(id).ok_or(RuntimeError::UnknownGenerator(id))?;
        let mut dict = StatusDict::new();
        generator.get_status(&mut dict);
        Ok(dict)
    }

    /// All-or-nothing status update of one generator.
    ///
    /// On top of the generator's own checks, a replacement recording must be
    /// sampled no finer than the population's resolution.
    pub fn set_status(&mut self, id: GeneratorId, dict: &StatusDict) -> Result<()> {
        let resolution_ms = self.settings.resolution_ms;
        let generator = self.generator_mut(id)?;
        let result = generator.set_status_with(dict, |candidate, _| {
            check_resolution(candidate, resolution_ms)
        });
        if let Err(err) = &result {
            warn!(generator = %id, error = %err, "Rejected status update");
        }
        result.map_err(RuntimeError::from)
    }

    /// Swap the shared recording for every generator.
    ///
    /// Takes effect at the next run.
    pub fn replace_trajectory(&mut self, trajectory: Trajectory) -> Result<()> {
        if trajectory.dt_ms() < self.settings.resolution_ms {
            return Err(RuntimeError::InvalidSetting {
                setting: "trajectory.dt_ms",
                reason: format!(
                    "sampled every {} ms, finer than the {} ms resolution",
                    trajectory.dt_ms(),
                    self.settings.resolution_ms
                ),
            });
        }
        info!(
            samples = trajectory.len(),
            dt_ms = trajectory.dt_ms(),
            "Replacing shared trajectory"
        );
        self.trajectory.replace(trajectory);
        Ok(())
    }

    /// Generators whose trajectory cursor sits past the end of the recording
    pub fn holding_count(&self) -> usize {
        self.units
            .iter()
            .flat_map(|unit| (0..unit.len()).filter_map(move |slot| unit.generator(slot)))
            .filter(|g| g.trajectory_index().is_holding())
            .count()
    }

    /// Calibrate the generators whose parameters or recording changed since
    /// their last calibration.
    ///
    /// Calibrated generators are left alone so their sample countdown carries
    /// over between runs. Returns how many were calibrated.
    pub fn calibrate(&mut self) -> Result<usize> {
        let resolution_ms = self.settings.resolution_ms;
        let mut calibrated = 0;
        for unit in self.units.iter_mut() {
            for generator in unit.generators_mut() {
                if generator.needs_calibration() {
                    generator.calibrate(resolution_ms)?;
                    calibrated += 1;
                }
            }
        }
        if calibrated > 0 {
            debug!(generators = calibrated, "Calibrated generators");
        }
        Ok(calibrated)
    }

    /// Advance the clock by `duration_ms` and collect the spikes.
    ///
    /// Generators touched by a status update or a trajectory replacement are
    /// recalibrated first, so those changes take effect here.
    pub fn run(&mut self, duration_ms: f64) -> Result<SpikeRecorder> {
        if !(duration_ms.is_finite() && duration_ms >= 0.0) {
            return Err(RuntimeError::InvalidSetting {
                setting: "simulation.duration_ms",
                reason: format!("must be non-negative and finite, got {}", duration_ms),
            });
        }
        let steps = (duration_ms / self.settings.resolution_ms).round() as SimStep;
        self.calibrate()?;

        let range = self.clock..self.clock + steps;
        let seeder = self.seeder;
        let recorders = self
            .units
            .par_iter_mut()
            .map(|unit| unit.update(range.clone(), &seeder))
            .collect::<placecell_generator::Result<Vec<_>>>()?;

        let mut recorder = SpikeRecorder::new();
        for partial in recorders {
            recorder.absorb(partial);
        }
        recorder.sort();
        self.clock += steps;

        let holding = self.holding_count();
        if holding > 0 {
            warn!(
                generators = holding,
                samples = self.trajectory.snapshot().len(),
                "Trajectory exhausted, holding last recorded position"
            );
        }

        info!(
            first_step = range.start,
            steps,
            generators = self.len(),
            spikes = recorder.len(),
            mean_rate_hz = recorder.mean_rate_hz(self.len(), duration_ms),
            "Population run complete"
        );
        Ok(recorder)
    }
}

fn check_resolution(candidate: &Candidate, resolution_ms: f64) -> core::result::Result<(), String> {
    match candidate.trajectory() {
        Some(t) if t.dt_ms() < resolution_ms => Err(format!(
            "trajectory sampled every {} ms is finer than the {} ms resolution",
            t.dt_ms(),
            resolution_ms
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placecell_generator::{names, GeneratorError, StatusValue};

    fn settings(units: usize) -> PopulationSettings {
        PopulationSettings {
            resolution_ms: 1.0,
            execution_units: units,
            seed: 42,
        }
    }

    fn firing() -> Parameters {
        Parameters {
            rate: 200.0,
            field_size: 10.0,
            ..Parameters::default()
        }
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(PlaceCellPopulation::new(settings(0), Trajectory::default()).is_err());
        let bad_res = PopulationSettings {
            resolution_ms: 0.0,
            ..settings(1)
        };
        assert!(PlaceCellPopulation::new(bad_res, Trajectory::default()).is_err());
    }

    #[test]
    fn test_round_robin_assignment() {
        let mut pop = PlaceCellPopulation::new(settings(3), Trajectory::default()).unwrap();
        let ids: Vec<_> = (0..7).map(|_| pop.add_generator(firing()).unwrap()).collect();
        let units: Vec<_> = ids.iter().map(|id| pop.unit_of(*id).unwrap().0).collect();
        assert_eq!(units, vec![0, 1, 2, 0, 1, 2, 0]);
        assert_eq!(pop.len(), 7);
    }

    #[test]
    fn test_grid_generators_take_centers() {
        let mut pop = PlaceCellPopulation::new(settings(2), Trajectory::default()).unwrap();
        let grid = PlaceFieldGrid::new(100.0, 2).unwrap();
        let ids = pop.add_grid(&grid, firing()).unwrap();
        assert_eq!(ids.len(), 4);
        let p = pop.generator(ids[3]).unwrap().parameters();
        assert_eq!((p.ctr_x, p.ctr_y), (25.0, 25.0));
        assert_eq!(p.rate, 200.0);
    }

    #[test]
    fn test_clock_advances_across_runs() {
        let mut pop = PlaceCellPopulation::new(settings(1), Trajectory::default()).unwrap();
        let id = pop.add_generator(firing()).unwrap();
        let first = pop.run(50.0).unwrap();
        let second = pop.run(50.0).unwrap();
        assert_eq!(pop.current_step(), 100);
        assert!(first.events().iter().all(|e| e.step < 50));
        assert!(second.events().iter().all(|e| (50..100).contains(&e.step)));
        assert!(second.events().iter().all(|e| e.generator == id));
    }

    #[test]
    fn test_unknown_generator() {
        let mut pop = PlaceCellPopulation::new(settings(1), Trajectory::default()).unwrap();
        let missing = GeneratorId(12);
        assert_eq!(
            pop.get_status(missing).unwrap_err(),
            RuntimeError::UnknownGenerator(missing)
        );
        assert!(pop.set_status(missing, &StatusDict::new()).is_err());
    }

    #[test]
    fn test_set_status_rejects_fine_trajectory() {
        let mut pop = PlaceCellPopulation::new(
            PopulationSettings {
                resolution_ms: 5.0,
                ..settings(1)
            },
            Trajectory::default(),
        )
        .unwrap();
        let id = pop.add_generator(firing()).unwrap();
        let before = pop.get_status(id).unwrap();

        let mut dict = StatusDict::new();
        dict.insert(names::RATE.to_string(), StatusValue::Real(1.0));
        dict.insert(names::RAT_POS_X.to_string(), StatusValue::Reals(vec![0.0, 1.0]));
        dict.insert(names::RAT_POS_Y.to_string(), StatusValue::Reals(vec![0.0, 1.0]));
        dict.insert(names::RAT_POS_DT.to_string(), StatusValue::Real(1.0));

        let err = pop.set_status(id, &dict).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Generator(GeneratorError::HostRejected(_))
        ));
        assert_eq!(pop.get_status(id).unwrap(), before);
        assert_eq!(pop.trajectory().snapshot().len(), 1);
    }

    #[test]
    fn test_replace_trajectory_checks_resolution() {
        let mut pop = PlaceCellPopulation::new(settings(1), Trajectory::default()).unwrap();
        let fine = Trajectory::new(vec![0.0], vec![0.0], 0.5).unwrap();
        assert!(pop.replace_trajectory(fine).is_err());

        let coarse = Trajectory::new(vec![0.0, 1.0], vec![0.0, 1.0], 10.0).unwrap();
        pop.replace_trajectory(coarse).unwrap();
        assert_eq!(pop.trajectory().snapshot().len(), 2);
    }

    #[test]
    fn test_holding_after_recording_ends() {
        let mut pop = PlaceCellPopulation::new(settings(2), Trajectory::default()).unwrap();
        pop.add_generator(firing()).unwrap();
        pop.add_generator(firing()).unwrap();
        pop.run(10.0).unwrap();
        assert_eq!(pop.holding_count(), 0);
        // One 20 ms sample is exhausted after 20 steps
        pop.run(30.0).unwrap();
        assert_eq!(pop.holding_count(), 2);
    }

    #[test]
    fn test_only_changed_generators_recalibrate() {
        let mut pop = PlaceCellPopulation::new(settings(2), Trajectory::default()).unwrap();
        let first = pop.add_generator(firing()).unwrap();
        pop.add_generator(firing()).unwrap();
        assert_eq!(pop.calibrate().unwrap(), 2);
        assert_eq!(pop.calibrate().unwrap(), 0);

        let mut dict = StatusDict::new();
        dict.insert(names::RATE.to_string(), StatusValue::Real(50.0));
        pop.set_status(first, &dict).unwrap();
        assert_eq!(pop.calibrate().unwrap(), 1);

        pop.replace_trajectory(Trajectory::new(vec![1.0], vec![1.0], 20.0).unwrap())
            .unwrap();
        assert_eq!(pop.calibrate().unwrap(), 2);
    }

    #[test]
    fn test_negative_duration_rejected() {
        let mut pop = PlaceCellPopulation::new(settings(1), Trajectory::default()).unwrap();
        assert!(pop.run(-1.0).is_err());
        assert!(pop.run(f64::NAN).is_err());
        assert_eq!(pop.current_step(), 0);
    }
}
