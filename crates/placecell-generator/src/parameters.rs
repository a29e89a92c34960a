// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Generator Parameters
//!
//! Parameters are presented to the host as a flat status dictionary
//! (property name → number or sequence of numbers).
//!
//! Updates are all-or-nothing: a candidate is built from the live values
//! overlaid with the supplied properties, validated as a whole, handed to an
//! optional host validator, and only then committed. Any failure discards the
//! candidate and leaves the live parameters and the shared trajectory as they
//! were.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::trajectory::{Trajectory, TrajectoryStore};
use crate::types::{ConfigurationError, GeneratorError, Result};

/// Status dictionary property names
pub mod names {
    pub const RATE: &str = "rate";
    pub const CTR_X: &str = "ctr_x";
    pub const CTR_Y: &str = "ctr_y";
    pub const FIELD_SIZE: &str = "field_size";
    pub const ORIGIN: &str = "origin";
    pub const START: &str = "start";
    pub const STOP: &str = "stop";
    pub const RAT_POS_X: &str = "rat_pos_x";
    pub const RAT_POS_Y: &str = "rat_pos_y";
    pub const RAT_POS_DT: &str = "rat_pos_dt";
}

/// One status dictionary value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    Real(f64),
    Reals(Vec<f64>),
}

impl From<f64> for StatusValue {
    fn from(value: f64) -> Self {
        StatusValue::Real(value)
    }
}

impl From<Vec<f64>> for StatusValue {
    fn from(values: Vec<f64>) -> Self {
        StatusValue::Reals(values)
    }
}

/// Flat property mapping exchanged with the host
pub type StatusDict = BTreeMap<String, StatusValue>;

/// Interval `[origin + start, origin + stop)` during which spikes may be emitted (ms)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivationWindow {
    pub origin: f64,
    pub start: f64,
    pub stop: f64,
}

impl ActivationWindow {
    pub fn new(origin: f64, start: f64, stop: f64) -> Self {
        Self {
            origin,
            start,
            stop,
        }
    }

    /// First time the window is open (ms)
    pub fn opens_at(&self) -> f64 {
        self.origin + self.start
    }

    /// Time the window closes (ms), possibly infinite
    pub fn closes_at(&self) -> f64 {
        self.origin + self.stop
    }

    pub fn validate(&self) -> core::result::Result<(), ConfigurationError> {
        if !self.origin.is_finite() {
            return Err(ConfigurationError::bad_property(
                names::ORIGIN,
                "origin must be finite",
            ));
        }
        if !self.start.is_finite() {
            return Err(ConfigurationError::bad_property(
                names::START,
                "start must be finite",
            ));
        }
        if self.stop.is_nan() {
            return Err(ConfigurationError::bad_property(
                names::STOP,
                "stop must be a number",
            ));
        }
        if self.start > self.stop {
            return Err(ConfigurationError::InvertedWindow {
                start: self.start,
                stop: self.stop,
            });
        }
        Ok(())
    }
}

impl Default for ActivationWindow {
    fn default() -> Self {
        Self {
            origin: 0.0,
            start: 0.0,
            stop: f64::INFINITY,
        }
    }
}

/// Independent model parameters of one generator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    /// Rate at the field center (Hz)
    pub rate: f64,
    /// Field center X (cm)
    pub ctr_x: f64,
    /// Field center Y (cm)
    pub ctr_y: f64,
    /// Standard deviation of the Gaussian field (cm)
    pub field_size: f64,
    pub window: ActivationWindow,
}

impl Parameters {
    pub fn validate(&self) -> core::result::Result<(), ConfigurationError> {
        if !(self.rate.is_finite() && self.rate >= 0.0) {
            return Err(ConfigurationError::bad_property(
                names::RATE,
                format!("rate must be a finite value >= 0, got {}", self.rate),
            ));
        }
        if !self.ctr_x.is_finite() {
            return Err(ConfigurationError::bad_property(
                names::CTR_X,
                "field center must be finite",
            ));
        }
        if !self.ctr_y.is_finite() {
            return Err(ConfigurationError::bad_property(
                names::CTR_Y,
                "field center must be finite",
            ));
        }
        if !(self.field_size.is_finite() && self.field_size > 0.0) {
            return Err(ConfigurationError::bad_property(
                names::FIELD_SIZE,
                format!("field size must be a finite value > 0, got {}", self.field_size),
            ));
        }
        self.window.validate()
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            rate: 0.0,
            ctr_x: 0.0,
            ctr_y: 0.0,
            field_size: 1.0,
            window: ActivationWindow::default(),
        }
    }
}

/// Validated, not yet committed update
#[derive(Debug, Clone)]
pub struct Candidate {
    params: Parameters,
    trajectory: Option<Trajectory>,
}

impl Candidate {
    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// Replacement recording, if the update carried one
    pub fn trajectory(&self) -> Option<&Trajectory> {
        self.trajectory.as_ref()
    }
}

fn read_real(
    dict: &StatusDict,
    name: &'static str,
) -> core::result::Result<Option<f64>, ConfigurationError> {
    match dict.get(name) {
        None => Ok(None),
        Some(StatusValue::Real(v)) => Ok(Some(*v)),
        Some(StatusValue::Reals(_)) => Err(ConfigurationError::bad_property(
            name,
            "expected a number, got a sequence",
        )),
    }
}

fn read_reals(
    dict: &StatusDict,
    name: &'static str,
) -> core::result::Result<Option<Vec<f64>>, ConfigurationError> {
    match dict.get(name) {
        None => Ok(None),
        Some(StatusValue::Reals(v)) => Ok(Some(v.clone())),
        Some(StatusValue::Real(_)) => Err(ConfigurationError::bad_property(
            name,
            "expected a sequence, got a number",
        )),
    }
}

/// Live parameters plus the handle to the shared trajectory
#[derive(Debug, Clone)]
pub struct ParameterSet {
    params: Parameters,
    trajectory: TrajectoryStore,
}

impl ParameterSet {
    /// Default parameters against a shared recording
    pub fn new(trajectory: TrajectoryStore) -> Self {
        Self {
            params: Parameters::default(),
            trajectory,
        }
    }

    pub fn with_parameters(
        params: Parameters,
        trajectory: TrajectoryStore,
    ) -> core::result::Result<Self, ConfigurationError> {
        params.validate()?;
        Ok(Self { params, trajectory })
    }

    /// Snapshot of the live parameters
    pub fn get(&self) -> Parameters {
        self.params
    }

    /// Snapshot of the shared recording
    pub fn trajectory(&self) -> Arc<Trajectory> {
        self.trajectory.snapshot()
    }

    pub fn store(&self) -> &TrajectoryStore {
        &self.trajectory
    }

    /// Write every property into `dict`
    pub fn get_status(&self, dict: &mut StatusDict) {
        let p = &self.params;
        dict.insert(names::RATE.into(), p.rate.into());
        dict.insert(names::CTR_X.into(), p.ctr_x.into());
        dict.insert(names::CTR_Y.into(), p.ctr_y.into());
        dict.insert(names::FIELD_SIZE.into(), p.field_size.into());
        dict.insert(names::ORIGIN.into(), p.window.origin.into());
        dict.insert(names::START.into(), p.window.start.into());
        dict.insert(names::STOP.into(), p.window.stop.into());

        let trajectory = self.trajectory.snapshot();
        dict.insert(names::RAT_POS_X.into(), trajectory.x().to_vec().into());
        dict.insert(names::RAT_POS_Y.into(), trajectory.y().to_vec().into());
        dict.insert(names::RAT_POS_DT.into(), trajectory.dt_ms().into());
    }

    /// Build and validate a candidate from the live values overlaid with `dict`.
    ///
    /// Never touches the live state. Unknown keys are ignored; they belong to
    /// the host.
    pub fn prepare(&self, dict: &StatusDict) -> core::result::Result<Candidate, ConfigurationError> {
        let mut params = self.params;
        if let Some(v) = read_real(dict, names::RATE)? {
            params.rate = v;
        }
        if let Some(v) = read_real(dict, names::CTR_X)? {
            params.ctr_x = v;
        }
        if let Some(v) = read_real(dict, names::CTR_Y)? {
            params.ctr_y = v;
        }
        if let Some(v) = read_real(dict, names::FIELD_SIZE)? {
            params.field_size = v;
        }
        if let Some(v) = read_real(dict, names::ORIGIN)? {
            params.window.origin = v;
        }
        if let Some(v) = read_real(dict, names::START)? {
            params.window.start = v;
        }
        if let Some(v) = read_real(dict, names::STOP)? {
            params.window.stop = v;
        }
        params.validate()?;

        let new_x = read_reals(dict, names::RAT_POS_X)?;
        let new_y = read_reals(dict, names::RAT_POS_Y)?;
        let new_dt = read_real(dict, names::RAT_POS_DT)?;
        let trajectory = if new_x.is_some() || new_y.is_some() || new_dt.is_some() {
            let current = self.trajectory.snapshot();
            Some(Trajectory::new(
                new_x.unwrap_or_else(|| current.x().to_vec()),
                new_y.unwrap_or_else(|| current.y().to_vec()),
                new_dt.unwrap_or_else(|| current.dt_ms()),
            )?)
        } else {
            None
        };

        Ok(Candidate { params, trajectory })
    }

    /// Install a validated candidate
    pub fn commit(&mut self, candidate: Candidate) {
        self.params = candidate.params;
        if let Some(trajectory) = candidate.trajectory {
            self.trajectory.replace(trajectory);
        }
        debug!(params = ?self.params, "Committed generator parameters");
    }

    /// All-or-nothing update from a status dictionary
    pub fn try_set(&mut self, dict: &StatusDict) -> Result<()> {
        self.try_set_with(dict, |_, _| Ok(()))
    }

    /// All-or-nothing update with an additional host-owned validation step.
    ///
    /// `host` runs only after the core accepted the candidate. If it fails the
    /// candidate is dropped and nothing is committed.
    pub fn try_set_with<F>(&mut self, dict: &StatusDict, host: F) -> Result<()>
    where
        F: FnOnce(&Candidate, &StatusDict) -> core::result::Result<(), String>,
    {
        let candidate = self.prepare(dict)?;
        host(&candidate, dict).map_err(GeneratorError::HostRejected)?;
        self.commit(candidate);
        Ok(())
    }

    /// Typed variant of [`try_set`](Self::try_set) for the scalar parameters
    pub fn set_parameters(&mut self, params: Parameters) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real(v: f64) -> StatusValue {
        StatusValue::Real(v)
    }

    fn reals(v: Vec<f64>) -> StatusValue {
        StatusValue::Reals(v)
    }

    fn dict(entries: &[(&str, StatusValue)]) -> StatusDict {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn configured() -> ParameterSet {
        let store = TrajectoryStore::new(
            Trajectory::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0], 10.0).unwrap(),
        );
        let mut set = ParameterSet::new(store);
        set.try_set(&dict(&[
            (names::RATE, real(20.0)),
            (names::CTR_X, real(5.0)),
            (names::CTR_Y, real(-5.0)),
            (names::FIELD_SIZE, real(7.0)),
            (names::ORIGIN, real(100.0)),
            (names::START, real(10.0)),
            (names::STOP, real(90.0)),
        ]))
        .unwrap();
        set
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(Parameters::default().validate().is_ok());
        let set = ParameterSet::new(TrajectoryStore::default());
        assert_eq!(set.get(), Parameters::default());
        assert_eq!(set.trajectory().len(), 1);
    }

    #[test]
    fn test_get_status_reports_every_property() {
        let set = configured();
        let mut status = StatusDict::new();
        set.get_status(&mut status);

        assert_eq!(status[names::RATE], StatusValue::Real(20.0));
        assert_eq!(status[names::CTR_Y], StatusValue::Real(-5.0));
        assert_eq!(status[names::STOP], StatusValue::Real(90.0));
        assert_eq!(
            status[names::RAT_POS_X],
            StatusValue::Reals(vec![0.0, 1.0, 2.0])
        );
        assert_eq!(status[names::RAT_POS_DT], StatusValue::Real(10.0));
        assert_eq!(status.len(), 10);
    }

    #[test]
    fn test_single_invalid_field_leaves_everything_unchanged() {
        let invalid_updates = [
            dict(&[(names::RATE, real(30.0)), (names::FIELD_SIZE, real(0.0))]),
            dict(&[(names::CTR_X, real(1.0)), (names::RATE, real(-1.0))]),
            dict(&[(names::RATE, real(1.0)), (names::START, real(95.0))]),
            dict(&[(names::CTR_Y, real(3.0)), (names::STOP, real(5.0))]),
            dict(&[(names::RATE, real(f64::NAN))]),
            dict(&[
                (names::RATE, real(30.0)),
                (names::RAT_POS_X, reals(vec![1.0, 2.0])),
            ]),
            dict(&[(names::RAT_POS_DT, real(-2.0))]),
            dict(&[(names::FIELD_SIZE, reals(vec![1.0]))]),
        ];

        for update in &invalid_updates {
            let mut set = configured();
            let before = set.get();
            let trajectory_before = set.trajectory();

            let result = set.try_set(update);
            assert!(
                matches!(result, Err(GeneratorError::Configuration(_))),
                "update {:?} should fail, got {:?}",
                update,
                result
            );
            assert_eq!(set.get(), before);
            assert_eq!(*set.trajectory(), *trajectory_before);
        }
    }

    #[test]
    fn test_failure_reports_offending_property() {
        let mut set = configured();
        let err = set
            .try_set(&dict(&[(names::FIELD_SIZE, real(-3.0))]))
            .unwrap_err();
        assert!(matches!(
            err,
            GeneratorError::Configuration(ConfigurationError::BadProperty {
                property: names::FIELD_SIZE,
                ..
            })
        ));

        let err = set.try_set(&dict(&[(names::START, real(95.0))])).unwrap_err();
        assert_eq!(
            err,
            GeneratorError::Configuration(ConfigurationError::InvertedWindow {
                start: 95.0,
                stop: 90.0
            })
        );
    }

    #[test]
    fn test_host_rejection_discards_candidate() {
        let mut set = configured();
        let before = set.get();
        let trajectory_before = set.trajectory();

        let update = dict(&[
            (names::RATE, real(55.0)),
            (names::RAT_POS_X, reals(vec![9.0])),
            (names::RAT_POS_Y, reals(vec![9.0])),
        ]);
        let mut host_saw = None;
        let result = set.try_set_with(&update, |candidate, _| {
            host_saw = Some(candidate.parameters().rate);
            Err("device rejected window".to_string())
        });

        assert_eq!(
            result,
            Err(GeneratorError::HostRejected("device rejected window".into()))
        );
        // The host only ever sees a candidate the core already validated
        assert_eq!(host_saw, Some(55.0));
        assert_eq!(set.get(), before);
        assert_eq!(*set.trajectory(), *trajectory_before);
    }

    #[test]
    fn test_host_not_consulted_when_core_rejects() {
        let mut set = configured();
        let mut consulted = false;
        let result = set.try_set_with(&dict(&[(names::RATE, real(-5.0))]), |_, _| {
            consulted = true;
            Ok(())
        });
        assert!(result.is_err());
        assert!(!consulted);
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut set = configured();
        set.try_set(&dict(&[(names::CTR_X, real(42.0))])).unwrap();
        let p = set.get();
        assert_eq!(p.ctr_x, 42.0);
        assert_eq!(p.ctr_y, -5.0);
        assert_eq!(p.rate, 20.0);
        assert_eq!(p.window, ActivationWindow::new(100.0, 10.0, 90.0));
    }

    #[test]
    fn test_trajectory_update_is_shared() {
        let mut first = configured();
        let second = ParameterSet::new(first.store().clone());

        first
            .try_set(&dict(&[
                (names::RAT_POS_X, reals(vec![3.0, 4.0])),
                (names::RAT_POS_Y, reals(vec![5.0, 6.0])),
                (names::RAT_POS_DT, real(25.0)),
            ]))
            .unwrap();

        let seen = second.trajectory();
        assert_eq!(seen.x(), &[3.0, 4.0]);
        assert_eq!(seen.y(), &[5.0, 6.0]);
        assert_eq!(seen.dt_ms(), 25.0);
        // Scalar parameters stay per instance
        assert_eq!(second.get(), Parameters::default());
    }

    #[test]
    fn test_unknown_keys_are_left_to_host() {
        let mut set = configured();
        let before = set.get();
        set.try_set(&dict(&[("frequency", real(3.0))])).unwrap();
        assert_eq!(set.get(), before);
    }

    #[test]
    fn test_status_dict_from_json() {
        let json = r#"{"rate": 15, "ctr_x": 1.5, "rat_pos_x": [0, 1], "rat_pos_y": [2, 3]}"#;
        let parsed: StatusDict = serde_json::from_str(json).unwrap();
        let mut set = ParameterSet::new(TrajectoryStore::default());
        set.try_set(&parsed).unwrap();
        assert_eq!(set.get().rate, 15.0);
        assert_eq!(set.get().ctr_x, 1.5);
        assert_eq!(set.trajectory().y(), &[2.0, 3.0]);
    }

    #[test]
    fn test_set_parameters_validates() {
        let mut set = ParameterSet::new(TrajectoryStore::default());
        let mut params = Parameters::default();
        params.field_size = 0.0;
        assert!(set.set_parameters(params).is_err());
        assert_eq!(set.get(), Parameters::default());
    }
}
