// src/model/poav.rs
//
// Pi-orbital axis vectors of threefold-coordinated atoms.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoavKind {
    Poav1,
    Poav2,
    PoavR,
}

impl PoavKind {
    pub fn label(self) -> &'static str {
        match self {
            PoavKind::Poav1 => "POAV1",
            PoavKind::Poav2 => "POAV2",
            PoavKind::PoavR => "POAVR",
        }
    }
}

impl fmt::Display for PoavKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A pi-orbital axis vector and its angles to the three sigma bonds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Poav {
    pub kind: PoavKind,
    /// Unit vector, pointing away from the bonded neighbors.
    pub vpi: Vector3<f64>,
    /// Angle between `vpi` and each bond, radians.
    pub sigma_pi_angles: [f64; 3],
}

impl Poav {
    /// Wrap an axis computed elsewhere. `None` for a zero axis or a zero bond.
    pub fn new(kind: PoavKind, vpi: Vector3<f64>, bonds: &[Vector3<f64>; 3]) -> Option<Self> {
        let vpi = vpi.try_normalize(1e-12)?;
        let mut sigma_pi_angles = [0.0; 3];
        for (angle, b) in sigma_pi_angles.iter_mut().zip(bonds) {
            let u = b.try_normalize(1e-12)?;
            *angle = vpi.dot(&u).clamp(-1.0, 1.0).acos();
        }
        Some(Self {
            kind,
            vpi,
            sigma_pi_angles,
        })
    }

    /// POAV1: the axis normal to the plane through the tips of the unit bond
    /// vectors, so it makes the same angle with all three bonds.
    /// `None` when the tips are collinear.
    pub fn poav1(bonds: &[Vector3<f64>; 3]) -> Option<Self> {
        let u: Vec<Vector3<f64>> = bonds.iter().map(|b| b.try_normalize(1e-12)).collect::<Option<_>>()?;
        let mut vpi = (u[1] - u[0]).cross(&(u[2] - u[0])).try_normalize(1e-12)?;
        if vpi.dot(&(u[0] + u[1] + u[2])) > 0.0 {
            vpi = -vpi;
        }
        Self::new(PoavKind::Poav1, vpi, bonds)
    }

    pub fn mean_sigma_pi_angle(&self) -> f64 {
        self.sigma_pi_angles.iter().sum::<f64>() / 3.0
    }

    /// Sigma-pi angle minus 90 degrees, radians; zero for a planar sp2 center.
    pub fn pyramidalization_angle(&self) -> f64 {
        self.mean_sigma_pi_angle() - FRAC_PI_2
    }
}

/// POAV capability: one slot per analysis flavor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoavFields {
    pub poav1: Option<Poav>,
    pub poav2: Option<Poav>,
    pub poavr: Option<Poav>,
}

impl PoavFields {
    pub fn get(&self, kind: PoavKind) -> Option<&Poav> {
        match kind {
            PoavKind::Poav1 => self.poav1.as_ref(),
            PoavKind::Poav2 => self.poav2.as_ref(),
            PoavKind::PoavR => self.poavr.as_ref(),
        }
    }

    /// Store `poav` in the slot named by its kind.
    pub fn set(&mut self, poav: Poav) {
        match poav.kind {
            PoavKind::Poav1 => self.poav1 = Some(poav),
            PoavKind::Poav2 => self.poav2 = Some(poav),
            PoavKind::PoavR => self.poavr = Some(poav),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
