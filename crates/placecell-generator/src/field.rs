// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Gaussian Place Field
//!
//! ```text
//! rate(x, y) = peak_rate × exp(-((x - ctr_x)² + (y - ctr_y)²) / (2 × field_size²))
//! ```
//!
//! Stationary and isotropic: one peak, circular contours, width given by the
//! single `field_size` standard deviation (cm).

use crate::parameters::Parameters;
use crate::types::Position;

/// Instantaneous firing rate as a function of position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRateModel {
    /// Rate at the field center (Hz)
    pub peak_rate: f64,
    pub center: Position,
    /// Standard deviation of the Gaussian (cm), > 0
    pub field_size: f64,
}

impl FieldRateModel {
    pub fn new(peak_rate: f64, center: Position, field_size: f64) -> Self {
        Self {
            peak_rate,
            center,
            field_size,
        }
    }

    /// Model described by a validated parameter snapshot
    pub fn from_parameters(params: &Parameters) -> Self {
        Self::new(
            params.rate,
            Position::new(params.ctr_x, params.ctr_y),
            params.field_size,
        )
    }

    /// Firing rate (Hz) at `position`
    #[inline]
    pub fn rate(&self, position: Position) -> f64 {
        let d2 = position.distance_sq(&self.center);
        self.peak_rate * (-d2 / (2.0 * self.field_size * self.field_size)).exp()
    }
}
