// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Generator Controller
//!
//! Drives one place-cell generator across its activation window, one decision
//! per simulation step:
//!
//! ```text
//! INACTIVE ──(t >= origin + start)──▶ ACTIVE ──(t >= origin + stop)──▶ INACTIVE
//!
//! while ACTIVE, per step:
//!     position = trajectory[cursor]
//!     rate     = field.rate(position)
//!     k        = poisson(rate × dt)       (caller's stream)
//!     deliver k spikes stamped with this step
//!     cursor.step()
//! ```
//!
//! While inactive nothing advances and nothing is drawn, so a later window
//! resumes the trajectory where the previous one left it.
//!
//! The host framework is reached only through the capability traits below
//! ([`ActivationWindowProvider`], [`SpikeSink`], [`StatusCodec`]).

use std::ops::Range;
use std::sync::Arc;

use tracing::debug;

use crate::field::FieldRateModel;
use crate::parameters::{ActivationWindow, Candidate, ParameterSet, Parameters, StatusDict};
use crate::poisson::{PoissonStepper, RandomStream};
use crate::trajectory::{Trajectory, TrajectoryIndex, TrajectoryStore};
use crate::types::{GeneratorError, Result, SimStep};

/// Decides whether a device may emit during a given simulation step
pub trait ActivationWindowProvider {
    fn is_active(&self, step: SimStep) -> bool;
}

/// Receives the spikes decided by a generator
///
/// Routing and delivery are the host's business.
pub trait SpikeSink {
    fn deliver(&mut self, spike: SpikeTimestamp);
}

/// Flat status dictionary I/O with the host
pub trait StatusCodec {
    fn get_status(&self, dict: &mut StatusDict);
    fn set_status(&mut self, dict: &StatusDict) -> Result<()>;
}

/// One emitted spike
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeTimestamp {
    pub step: SimStep,
    pub time_ms: f64,
}

impl SpikeSink for Vec<SpikeTimestamp> {
    fn deliver(&mut self, spike: SpikeTimestamp) {
        self.push(spike);
    }
}

/// Activation window resolved onto the simulation step grid: `[first, stop)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepWindow {
    pub first: SimStep,
    pub stop: SimStep,
}

/// First step whose time `step × resolution` is at or after `ms`
#[inline]
fn ms_to_step(ms: f64, resolution_ms: f64) -> SimStep {
    // Saturating cast: +inf maps to SimStep::MAX, negatives to 0
    let step = (ms / resolution_ms).ceil().max(0.0) as SimStep;
    if step == 0 || step == SimStep::MAX {
        return step;
    }
    // Correct for the quotient landing a hair off an exact multiple
    if (step - 1) as f64 * resolution_ms >= ms {
        step - 1
    } else if (step as f64 * resolution_ms) < ms {
        step.saturating_add(1)
    } else {
        step
    }
}

impl StepWindow {
    pub fn resolve(window: &ActivationWindow, resolution_ms: f64) -> Self {
        Self {
            first: ms_to_step(window.opens_at(), resolution_ms),
            stop: ms_to_step(window.closes_at(), resolution_ms),
        }
    }
}

impl ActivationWindowProvider for StepWindow {
    #[inline]
    fn is_active(&self, step: SimStep) -> bool {
        self.first <= step && step < self.stop
    }
}

/// Activation state of a generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Inactive,
    Active,
}

/// Everything derived at calibration time
#[derive(Debug, Clone)]
struct Calibration {
    resolution_ms: f64,
    trajectory: Arc<Trajectory>,
    /// Store generation `trajectory` was taken from
    generation: u64,
    field: FieldRateModel,
    stepper: PoissonStepper,
    window: StepWindow,
}

/// Place-cell spike generator
#[derive(Debug, Clone)]
pub struct GeneratorController {
    params: ParameterSet,
    index: TrajectoryIndex,
    calibration: Option<Calibration>,
    state: GeneratorState,
}

impl GeneratorController {
    /// Generator with default parameters against a shared recording
    pub fn new(trajectory: TrajectoryStore) -> Self {
        Self::from_parameter_set(ParameterSet::new(trajectory))
    }

    pub fn with_parameters(params: Parameters, trajectory: TrajectoryStore) -> Result<Self> {
        Ok(Self::from_parameter_set(ParameterSet::with_parameters(
            params, trajectory,
        )?))
    }

    fn from_parameter_set(params: ParameterSet) -> Self {
        Self {
            params,
            index: TrajectoryIndex::new(),
            calibration: None,
            state: GeneratorState::Inactive,
        }
    }

    pub fn parameters(&self) -> Parameters {
        self.params.get()
    }

    pub fn parameter_set(&self) -> &ParameterSet {
        &self.params
    }

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    /// Index of the current trajectory sample
    pub fn cursor(&self) -> usize {
        self.index.current()
    }

    pub fn trajectory_index(&self) -> &TrajectoryIndex {
        &self.index
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    /// Not calibrated, or the shared recording was replaced since the last
    /// calibration
    pub fn needs_calibration(&self) -> bool {
        match &self.calibration {
            Some(cal) => cal.generation != self.params.store().generation(),
            None => true,
        }
    }

    /// Resolved activation window of the last calibration
    pub fn step_window(&self) -> Option<StepWindow> {
        self.calibration.as_ref().map(|c| c.window)
    }

    /// Derive all per-run state from the simulation resolution.
    ///
    /// Must be re-entered whenever the resolution or the parameters change.
    /// The trajectory cursor survives; the sample countdown does not.
    pub fn calibrate(&mut self, resolution_ms: f64) -> Result<()> {
        let params = self.params.get();
        let (trajectory, generation) = self.params.store().versioned_snapshot();

        if let Err(err) = self
            .index
            .calibrate(resolution_ms, trajectory.dt_ms(), trajectory.len())
        {
            self.calibration = None;
            return Err(err.into());
        }

        let calibration = Calibration {
            resolution_ms,
            field: FieldRateModel::from_parameters(&params),
            stepper: PoissonStepper::new(resolution_ms),
            window: StepWindow::resolve(&params.window, resolution_ms),
            trajectory,
            generation,
        };
        debug!(
            resolution_ms,
            step_ratio = self.index.step_ratio(),
            samples = calibration.trajectory.len(),
            cursor = self.index.current(),
            first_step = calibration.window.first,
            stop_step = calibration.window.stop,
            "Calibrated place cell generator"
        );
        self.calibration = Some(calibration);
        Ok(())
    }

    /// Step through `steps` using the generator's own activation window.
    ///
    /// Returns the number of spikes delivered.
    pub fn update<S>(
        &mut self,
        steps: Range<SimStep>,
        stream: &mut RandomStream,
        sink: &mut S,
    ) -> Result<u64>
    where
        S: SpikeSink + ?Sized,
    {
        let window = self
            .calibration
            .as_ref()
            .ok_or(GeneratorError::NotCalibrated)?
            .window;
        self.update_within(&window, steps, stream, sink)
    }

    /// Step through `steps`, gated by a host-provided activation window
    pub fn update_within<W, S>(
        &mut self,
        window: &W,
        steps: Range<SimStep>,
        stream: &mut RandomStream,
        sink: &mut S,
    ) -> Result<u64>
    where
        W: ActivationWindowProvider + ?Sized,
        S: SpikeSink + ?Sized,
    {
        let Self {
            index,
            calibration,
            state,
            ..
        } = self;
        let cal = calibration.as_ref().ok_or(GeneratorError::NotCalibrated)?;

        let mut emitted = 0u64;
        for step in steps {
            let next_state = if window.is_active(step) {
                GeneratorState::Active
            } else {
                GeneratorState::Inactive
            };
            if next_state != *state {
                debug!(step, cursor = index.current(), state = ?next_state, "Generator state change");
                *state = next_state;
            }
            if next_state == GeneratorState::Inactive {
                continue;
            }

            let position = cal.trajectory.position(index.current());
            let rate = cal.field.rate(position);
            let count = cal.stepper.events(rate, stream);
            if count > 0 {
                let spike = SpikeTimestamp {
                    step,
                    time_ms: step as f64 * cal.resolution_ms,
                };
                for _ in 0..count {
                    sink.deliver(spike);
                }
                emitted += count;
            }
            index.step();
        }
        Ok(emitted)
    }

    /// Status update with a host-owned validator run after the core's own checks.
    ///
    /// A successful update invalidates the calibration. A replaced recording
    /// also leaves every other generator on the store needing calibration.
    pub fn set_status_with<F>(&mut self, dict: &StatusDict, host: F) -> Result<()>
    where
        F: FnOnce(&Candidate, &StatusDict) -> core::result::Result<(), String>,
    {
        self.params.try_set_with(dict, host)?;
        self.calibration = None;
        Ok(())
    }
}

impl StatusCodec for GeneratorController {
    fn get_status(&self, dict: &mut StatusDict) {
        self.params.get_status(dict);
    }

    fn set_status(&mut self, dict: &StatusDict) -> Result<()> {
        self.set_status_with(dict, |_, _| Ok(()))
    }
}
