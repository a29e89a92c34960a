// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Host-side spike recording.

use std::collections::BTreeMap;

use placecell_generator::{GeneratorId, SimStep, SpikeSink, SpikeTimestamp};

/// One recorded spike
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeEvent {
    pub generator: GeneratorId,
    pub step: SimStep,
    pub time_ms: f64,
}

/// Spikes collected during a run
#[derive(Debug, Clone, Default)]
pub struct SpikeRecorder {
    events: Vec<SpikeEvent>,
}

impl SpikeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that tags delivered spikes with `generator`
    pub fn sink_for(&mut self, generator: GeneratorId) -> GeneratorSink<'_> {
        GeneratorSink {
            generator,
            recorder: self,
        }
    }

    pub fn record(&mut self, event: SpikeEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[SpikeEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Append another recorder's events
    pub fn absorb(&mut self, other: SpikeRecorder) {
        self.events.extend(other.events);
    }

    /// Order events by step, then generator
    pub fn sort(&mut self) {
        self.events
            .sort_by(|a, b| a.step.cmp(&b.step).then(a.generator.cmp(&b.generator)));
    }

    /// Spike count per generator (generators without spikes are absent)
    pub fn counts(&self) -> BTreeMap<GeneratorId, u64> {
        let mut counts = BTreeMap::new();
        for event in &self.events {
            *counts.entry(event.generator).or_insert(0) += 1;
        }
        counts
    }

    pub fn count_for(&self, generator: GeneratorId) -> u64 {
        self.events
            .iter()
            .filter(|e| e.generator == generator)
            .count() as u64
    }

    /// Mean firing rate (Hz) across `generators` over `duration_ms`
    pub fn mean_rate_hz(&self, generators: usize, duration_ms: f64) -> f64 {
        if generators == 0 || duration_ms <= 0.0 {
            return 0.0;
        }
        self.events.len() as f64 / generators as f64 / (duration_ms * 1e-3)
    }
}

/// [`SpikeSink`] view of a recorder for a single generator
pub struct GeneratorSink<'a> {
    generator: GeneratorId,
    recorder: &'a mut SpikeRecorder,
}

impl SpikeSink for GeneratorSink<'_> {
    fn deliver(&mut self, spike: SpikeTimestamp) {
        self.recorder.record(SpikeEvent {
            generator: self.generator,
            step: spike.step,
            time_ms: spike.time_ms,
        });
    }
}
