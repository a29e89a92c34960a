// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Recorded Trajectory and Sample Cursor
//!
//! A trajectory is one recorded session of the animal's position, sampled
//! every `dt_ms`. It is shared read-only by every generator built against the
//! same [`TrajectoryStore`].
//!
//! ## Dual-clock resampling
//!
//! ```text
//! step_ratio = pos_dt / sim_dt            (must be >= 1)
//!
//! every simulation step:
//!     countdown -= 1
//!     if countdown == 0:
//!         cursor += 1                     (held at N-1 once exhausted)
//!         ideal     = step_ratio + carry
//!         countdown = floor(ideal + 0.5)  (round half up)
//!         carry     = ideal - countdown
//! ```
//!
//! Carrying the rounding remainder keeps the cursor within one sample of
//! `steps / step_ratio` for fractional ratios over arbitrarily long runs.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::types::{ConfigurationError, Position};

/// Sampling period of the default one-sample trajectory (ms)
pub const DEFAULT_POSITION_DT_MS: f64 = 20.0;

/// One recorded session of positions, sampled at a fixed period
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    x: Vec<f64>,
    y: Vec<f64>,
    dt_ms: f64,
}

impl Trajectory {
    /// Build a trajectory, validating shape and sampling period
    pub fn new(x: Vec<f64>, y: Vec<f64>, dt_ms: f64) -> Result<Self, ConfigurationError> {
        if x.len() != y.len() {
            return Err(ConfigurationError::TrajectoryLengthMismatch {
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        if x.is_empty() {
            return Err(ConfigurationError::EmptyTrajectory);
        }
        if !(dt_ms.is_finite() && dt_ms > 0.0) {
            return Err(ConfigurationError::bad_property(
                "rat_pos_dt",
                format!("sampling period must be positive and finite, got {}", dt_ms),
            ));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(ConfigurationError::bad_property(
                "rat_pos_x",
                "positions must be finite",
            ));
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(ConfigurationError::bad_property(
                "rat_pos_y",
                "positions must be finite",
            ));
        }
        Ok(Self { x, y, dt_ms })
    }

    /// Number of samples (always > 0)
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Always false; kept for API symmetry with collections
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Sampling period (ms)
    pub fn dt_ms(&self) -> f64 {
        self.dt_ms
    }

    /// Recorded duration covered by the samples (ms)
    pub fn duration_ms(&self) -> f64 {
        self.len() as f64 * self.dt_ms
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Position at `index`, clamped to the last sample
    #[inline]
    pub fn position(&self, index: usize) -> Position {
        let i = index.min(self.len() - 1);
        Position::new(self.x[i], self.y[i])
    }
}

impl Default for Trajectory {
    fn default() -> Self {
        Self {
            x: vec![0.0],
            y: vec![0.0],
            dt_ms: DEFAULT_POSITION_DT_MS,
        }
    }
}

/// Shared, replaceable handle to the recorded trajectory
///
/// Cloning the store shares the recording: a replacement through any clone is
/// seen by every generator at its next calibration. Generators take an
/// `Arc<Trajectory>` snapshot when calibrating, so a replacement never tears a
/// running simulation.
///
/// Holders keep stepping on their old snapshot until recalibrated. Each
/// replacement bumps [`generation`](Self::generation), which hosts compare
/// against the generation a generator was calibrated with.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryStore {
    current: Arc<RwLock<Shared>>,
}

#[derive(Debug, Default)]
struct Shared {
    trajectory: Arc<Trajectory>,
    generation: u64,
}

impl TrajectoryStore {
    pub fn new(trajectory: Trajectory) -> Self {
        Self {
            current: Arc::new(RwLock::new(Shared {
                trajectory: Arc::new(trajectory),
                generation: 0,
            })),
        }
    }

    /// Current recording
    pub fn snapshot(&self) -> Arc<Trajectory> {
        Arc::clone(&self.current.read().trajectory)
    }

    /// Current recording with the generation it belongs to
    pub fn versioned_snapshot(&self) -> (Arc<Trajectory>, u64) {
        let shared = self.current.read();
        (Arc::clone(&shared.trajectory), shared.generation)
    }

    /// Number of replacements so far
    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    /// Replace the recording for every holder of this store
    pub fn replace(&self, trajectory: Trajectory) {
        let mut shared = self.current.write();
        shared.trajectory = Arc::new(trajectory);
        shared.generation += 1;
        debug!(
            samples = shared.trajectory.len(),
            dt_ms = shared.trajectory.dt_ms(),
            generation = shared.generation,
            "Replacing shared trajectory"
        );
    }

    /// Whether two stores hand out the same recording
    pub fn shares_with(&self, other: &TrajectoryStore) -> bool {
        Arc::ptr_eq(&self.current, &other.current)
    }
}

#[inline]
fn round_half_up(value: f64) -> u64 {
    (value + 0.5).floor() as u64
}

/// Cursor over trajectory samples, advanced in lockstep with the simulation clock
#[derive(Debug, Clone, Default)]
pub struct TrajectoryIndex {
    step_ratio: f64,
    /// Simulation steps left before the next sample becomes current
    countdown: u64,
    /// Rounding remainder carried into the next sample period
    carry: f64,
    cursor: usize,
    last_index: usize,
    holding: bool,
    calibrated: bool,
}

impl TrajectoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the step ratio and reset the countdown.
    ///
    /// The cursor is preserved across calibrations; it is only clamped when
    /// the recording got shorter.
    pub fn calibrate(
        &mut self,
        sim_dt_ms: f64,
        pos_dt_ms: f64,
        samples: usize,
    ) -> Result<(), ConfigurationError> {
        if !(sim_dt_ms.is_finite() && sim_dt_ms > 0.0) {
            return Err(ConfigurationError::bad_property(
                "resolution",
                format!("simulation step must be positive and finite, got {}", sim_dt_ms),
            ));
        }
        if pos_dt_ms < sim_dt_ms {
            return Err(ConfigurationError::ResolutionMismatch {
                pos_dt_ms,
                sim_dt_ms,
            });
        }
        if samples == 0 {
            return Err(ConfigurationError::EmptyTrajectory);
        }

        self.step_ratio = pos_dt_ms / sim_dt_ms;
        let period = round_half_up(self.step_ratio).max(1);
        self.countdown = period;
        self.carry = self.step_ratio - period as f64;
        self.last_index = samples - 1;
        self.cursor = self.cursor.min(self.last_index);
        self.holding = false;
        self.calibrated = true;
        Ok(())
    }

    /// Index of the current sample
    #[inline]
    pub fn current(&self) -> usize {
        self.cursor
    }

    /// Simulation steps per trajectory sample
    pub fn step_ratio(&self) -> f64 {
        self.step_ratio
    }

    /// Steps remaining until the cursor next moves
    pub fn steps_until_advance(&self) -> u64 {
        self.countdown
    }

    /// Whether the recording ran out and the last position is being held
    pub fn is_holding(&self) -> bool {
        self.holding
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    /// Account for one elapsed simulation step.
    ///
    /// Returns `true` if the cursor moved to the next sample.
    #[inline]
    pub fn step(&mut self) -> bool {
        if !self.calibrated {
            return false;
        }

        self.countdown -= 1;
        if self.countdown > 0 {
            return false;
        }

        let ideal = self.step_ratio + self.carry;
        let period = round_half_up(ideal).max(1);
        self.carry = ideal - period as f64;
        self.countdown = period;

        if self.cursor < self.last_index {
            self.cursor += 1;
            true
        } else {
            if !self.holding {
                debug!(
                    sample = self.cursor,
                    "Trajectory exhausted, holding last recorded position"
                );
                self.holding = true;
            }
            false
        }
    }
}
