// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Execution units.
//!
//! An execution unit owns a fixed slice of the population and the random
//! stream used by every generator in that slice. Units are the scheduling
//! granularity: any OS thread may run any unit, but a unit's generators are
//! always stepped in slot order against the unit's own stream, so results do
//! not depend on which thread ran it.

use std::ops::Range;

use placecell_generator::{
    ExecutionUnitId, GeneratorController, GeneratorId, RandomStream, SimStep, StreamSeeder,
};
use tracing::trace;

use crate::recorder::SpikeRecorder;

#[derive(Debug)]
pub struct ExecutionUnit {
    id: ExecutionUnitId,
    generators: Vec<(GeneratorId, GeneratorController)>,
    /// Created on first use from the population seed
    stream: Option<RandomStream>,
}

impl ExecutionUnit {
    pub fn new(id: ExecutionUnitId) -> Self {
        Self {
            id,
            generators: Vec::new(),
            stream: None,
        }
    }

    pub fn id(&self) -> ExecutionUnitId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Append a generator, returning its slot
    pub fn push(&mut self, id: GeneratorId, generator: GeneratorController) -> usize {
        self.generators.push((id, generator));
        self.generators.len() - 1
    }

    pub fn generator(&self, slot: usize) -> Option<&GeneratorController> {
        self.generators.get(slot).map(|(_, g)| g)
    }

    pub fn generator_mut(&mut self, slot: usize) -> Option<&mut GeneratorController> {
        self.generators.get_mut(slot).map(|(_, g)| g)
    }

    pub fn generators_mut(&mut self) -> impl Iterator<Item = &mut GeneratorController> {
        self.generators.iter_mut().map(|(_, g)| g)
    }

    /// Random draws taken so far (0 before the stream exists)
    pub fn draws(&self) -> u64 {
        self.stream.as_ref().map_or(0, RandomStream::draws)
    }

    /// Step every generator in slot order through `steps`.
    ///
    /// Generators must already be calibrated.
    pub fn update(
        &mut self,
        steps: Range<SimStep>,
        seeder: &StreamSeeder,
    ) -> placecell_generator::Result<SpikeRecorder> {
        let id = self.id;
        let stream = self.stream.get_or_insert_with(|| seeder.stream_for(id));
        let mut recorder = SpikeRecorder::new();

        for (generator_id, generator) in self.generators.iter_mut() {
            let mut sink = recorder.sink_for(*generator_id);
            generator.update(steps.clone(), stream, &mut sink)?;
        }

        trace!(
            unit = %id,
            generators = self.generators.len(),
            spikes = recorder.len(),
            draws = stream.draws(),
            "Execution unit stepped"
        );
        Ok(recorder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placecell_generator::{GeneratorError, Parameters, TrajectoryStore};

    fn active_generator(store: &TrajectoryStore) -> GeneratorController {
        let params = Parameters {
            rate: 500.0,
            field_size: 10.0,
            ..Parameters::default()
        };
        GeneratorController::with_parameters(params, store.clone()).unwrap()
    }

    #[test]
    fn test_stream_created_lazily() {
        let store = TrajectoryStore::default();
        let mut unit = ExecutionUnit::new(ExecutionUnitId(2));
        let slot = unit.push(GeneratorId(0), active_generator(&store));
        assert_eq!(slot, 0);
        assert_eq!(unit.draws(), 0);

        unit.generator_mut(0).unwrap().calibrate(1.0).unwrap();
        unit.update(0..10, &StreamSeeder::new(5)).unwrap();
        assert_eq!(unit.draws(), 10);
    }

    #[test]
    fn test_uncalibrated_generator_fails_update() {
        let store = TrajectoryStore::default();
        let mut unit = ExecutionUnit::new(ExecutionUnitId(0));
        unit.push(GeneratorId(0), active_generator(&store));

        let err = unit.update(0..1, &StreamSeeder::new(1)).unwrap_err();
        assert_eq!(err, GeneratorError::NotCalibrated);
    }

    #[test]
    fn test_same_seed_same_spikes() {
        let run = || {
            let store = TrajectoryStore::default();
            let mut unit = ExecutionUnit::new(ExecutionUnitId(1));
            for i in 0..3 {
                unit.push(GeneratorId(i), active_generator(&store));
            }
            for g in unit.generators_mut() {
                g.calibrate(0.5).unwrap();
            }
            unit.update(0..200, &StreamSeeder::new(99)).unwrap()
        };
        let (a, b) = (run(), run());
        assert!(!a.is_empty());
        assert_eq!(a.events(), b.events());
    }
}
