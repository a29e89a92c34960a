// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Run summaries for reports and JSON output.

use placecell_generator::GeneratorId;
use placecell_runtime::SpikeRecorder;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub generators: usize,
    pub duration_ms: f64,
    pub spikes: usize,
    pub mean_rate_hz: f64,
    /// Spike count per generator, in the order the ids were given
    pub counts: Vec<u64>,
    /// Generator with the most spikes (lowest id on ties)
    pub most_active: Option<u32>,
}

impl RunSummary {
    pub fn new(recorder: &SpikeRecorder, generators: &[GeneratorId], duration_ms: f64) -> Self {
        let by_generator = recorder.counts();
        let counts: Vec<u64> = generators
            .iter()
            .map(|id| by_generator.get(id).copied().unwrap_or(0))
            .collect();
        let most_active = by_generator
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(id, _)| id.0);

        Self {
            generators: generators.len(),
            duration_ms,
            spikes: recorder.len(),
            mean_rate_hz: recorder.mean_rate_hz(generators.len(), duration_ms),
            counts,
            most_active,
        }
    }
}
