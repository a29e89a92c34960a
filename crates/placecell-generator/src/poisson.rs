// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Inhomogeneous Poisson Stepping
//!
//! Each execution unit owns exactly one [`RandomStream`]. The stream is passed
//! into the stepper explicitly, so a generator can never pick up another
//! unit's stream by accident and results depend only on the seed and the
//! generator-to-unit assignment, not on OS scheduling.
//!
//! ```text
//! mean events per step  μ = rate_hz × dt_ms / 1000
//! μ == 0  →  0 events, no draw
//! μ  > 0  →  k ~ Poisson(μ)
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Poisson};

use crate::types::ExecutionUnitId;

/// Independent random sequence owned by one execution unit
///
/// Not `Clone`: a stream is never duplicated or shared.
#[derive(Debug)]
pub struct RandomStream {
    unit: ExecutionUnitId,
    seed: u64,
    rng: StdRng,
    draws: u64,
}

impl RandomStream {
    pub fn seeded(unit: ExecutionUnitId, seed: u64) -> Self {
        Self {
            unit,
            seed,
            rng: StdRng::seed_from_u64(seed),
            draws: 0,
        }
    }

    /// Draw a Poisson deviate with mean `mean` (> 0)
    #[inline]
    pub fn poisson(&mut self, mean: f64) -> u64 {
        match Poisson::new(mean) {
            Ok(dist) => {
                self.draws += 1;
                dist.sample(&mut self.rng) as u64
            }
            // Non-positive or non-finite means never reach here from a validated generator
            Err(_) => 0,
        }
    }

    pub fn unit(&self) -> ExecutionUnitId {
        self.unit
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of deviates drawn so far
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

/// Derives one stream seed per execution unit from a base seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSeeder {
    base_seed: u64,
}

impl StreamSeeder {
    pub fn new(base_seed: u64) -> Self {
        Self { base_seed }
    }

    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Seed for `unit` (deterministic, distinct per unit)
    pub fn seed_for(&self, unit: ExecutionUnitId) -> u64 {
        let mixed = (unit.0 as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        self.base_seed ^ mixed
    }

    /// Fresh stream for `unit`
    pub fn stream_for(&self, unit: ExecutionUnitId) -> RandomStream {
        RandomStream::seeded(unit, self.seed_for(unit))
    }
}

/// Decides the event count of one simulation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoissonStepper {
    dt_ms: f64,
}

impl PoissonStepper {
    /// Stepper for a fixed simulation step of `dt_ms` (> 0)
    pub fn new(dt_ms: f64) -> Self {
        Self { dt_ms }
    }

    pub fn dt_ms(&self) -> f64 {
        self.dt_ms
    }

    /// Expected number of events in one step at `rate_hz`
    #[inline]
    pub fn mean_events(&self, rate_hz: f64) -> f64 {
        rate_hz * self.dt_ms * 1e-3
    }

    /// Number of events to emit this step, drawn from the caller's stream
    #[inline]
    pub fn events(&self, rate_hz: f64, stream: &mut RandomStream) -> u64 {
        let mean = self.mean_events(rate_hz);
        if mean <= 0.0 {
            return 0;
        }
        stream.poisson(mean)
    }
}
