// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Square tiling of place-field centers over the arena.
//!
//! `n × n` centers, one per cell of an even grid over
//! `[-size/2, size/2]²`, placed at the cell midpoints.

use placecell_generator::Position;

use crate::error::{Result, RuntimeError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaceFieldGrid {
    arena_size_cm: f64,
    fields_per_side: usize,
}

impl PlaceFieldGrid {
    pub fn new(arena_size_cm: f64, fields_per_side: usize) -> Result<Self> {
        if !(arena_size_cm.is_finite() && arena_size_cm > 0.0) {
            return Err(RuntimeError::InvalidSetting {
                setting: "arena.size_cm",
                reason: format!("must be positive and finite, got {}", arena_size_cm),
            });
        }
        if fields_per_side == 0 {
            return Err(RuntimeError::InvalidSetting {
                setting: "arena.fields_per_side",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            arena_size_cm,
            fields_per_side,
        })
    }

    pub fn len(&self) -> usize {
        self.fields_per_side * self.fields_per_side
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distance between neighbouring centers (cm)
    pub fn spacing_cm(&self) -> f64 {
        self.arena_size_cm / self.fields_per_side as f64
    }

    /// Centers in row-major order (y outer, x inner)
    pub fn centers(&self) -> Vec<Position> {
        let spacing = self.spacing_cm();
        let offset = -self.arena_size_cm / 2.0 + spacing / 2.0;
        let n = self.fields_per_side;
        (0..n)
            .flat_map(|row| {
                (0..n).map(move |col| {
                    Position::new(
                        offset + col as f64 * spacing,
                        offset + row as f64 * spacing,
                    )
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_centers_tile_arena() {
        let grid = PlaceFieldGrid::new(180.0, 3).unwrap();
        let centers = grid.centers();
        assert_eq!(centers.len(), 9);
        assert_eq!(centers[0], Position::new(-60.0, -60.0));
        assert_eq!(centers[4], Position::new(0.0, 0.0));
        assert_eq!(centers[5], Position::new(60.0, 0.0));
        assert_eq!(centers[8], Position::new(60.0, 60.0));
    }

    #[test]
    fn test_single_field_sits_at_arena_center() {
        let grid = PlaceFieldGrid::new(100.0, 1).unwrap();
        assert_eq!(grid.centers(), vec![Position::ORIGIN]);
    }

    #[test]
    fn test_invalid_grid_rejected() {
        assert!(PlaceFieldGrid::new(0.0, 3).is_err());
        assert!(PlaceFieldGrid::new(100.0, 0).is_err());
    }
}
