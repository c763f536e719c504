// src/structures/layers.rs

use crate::error::{NanoError, Result};
use nalgebra::Vector3;

/// Default interlayer distance of graphite (Å).
pub const LAYER_SPACING: f64 = 3.35;

/// How copies of one layer are stacked: count, spacing, lateral shift applied
/// to every odd layer, and a rotation about z per layer (radians).
#[derive(Debug, Clone, PartialEq)]
pub struct Layers {
    nlayers: usize,
    spacing: f64,
    shift: Vector3<f64>,
    rotation_angles: Vec<f64>,
}

impl Layers {
    pub fn new(nlayers: usize, spacing: f64) -> Result<Self> {
        if nlayers == 0 {
            return Err(NanoError::config("nlayers", "need at least one layer"));
        }
        if !(spacing >= 0.0) {
            return Err(NanoError::config("layer spacing", format!("must be >= 0, got {}", spacing)));
        }
        Ok(Self {
            nlayers,
            spacing,
            shift: Vector3::zeros(),
            rotation_angles: vec![0.0; nlayers],
        })
    }

    pub fn single() -> Self {
        Self {
            nlayers: 1,
            spacing: LAYER_SPACING,
            shift: Vector3::zeros(),
            rotation_angles: vec![0.0],
        }
    }

    pub fn with_shift(mut self, shift: Vector3<f64>) -> Self {
        self.shift = shift;
        self
    }

    /// Layer `i` is rotated by `i * increment`.
    pub fn with_rotation_increment(mut self, increment: f64, degrees: bool) -> Self {
        let increment = if degrees { increment.to_radians() } else { increment };
        self.rotation_angles = (0..self.nlayers).map(|i| i as f64 * increment).collect();
        self
    }

    /// One explicit angle per layer.
    pub fn with_rotation_angles(mut self, angles: &[f64], degrees: bool) -> Result<Self> {
        if angles.len() != self.nlayers {
            return Err(NanoError::config(
                "layer rotation angles",
                format!("expected {} angles, got {}", self.nlayers, angles.len()),
            ));
        }
        self.rotation_angles = angles
            .iter()
            .map(|&a| if degrees { a.to_radians() } else { a })
            .collect();
        Ok(self)
    }

    pub fn nlayers(&self) -> usize {
        self.nlayers
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn shift(&self) -> Vector3<f64> {
        self.shift
    }

    pub fn rotation_angles(&self) -> &[f64] {
        &self.rotation_angles
    }
}

impl Default for Layers {
    fn default() -> Self {
        Self::single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn test_rotation_increment_in_degrees() {
        let layers = Layers::new(2, LAYER_SPACING).unwrap().with_rotation_increment(45.0, true);
        assert_eq!(layers.rotation_angles()[0], 0.0);
        assert!((layers.rotation_angles()[1] - FRAC_PI_4).abs() < 1e-15);
    }

    #[test]
    fn test_explicit_angles_must_match_count() {
        let layers = Layers::new(3, LAYER_SPACING).unwrap();
        assert!(layers.clone().with_rotation_angles(&[0.0, 1.0], false).is_err());
        let layers = layers.with_rotation_angles(&[0.0, 90.0, 180.0], true).unwrap();
        assert!((layers.rotation_angles()[2] - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_zero_layers_rejected() {
        assert!(Layers::new(0, LAYER_SPACING).is_err());
        assert!(Layers::new(1, -1.0).is_err());
    }
}
