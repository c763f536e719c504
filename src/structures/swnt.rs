// src/structures/swnt.rs

use crate::error::{NanoError, Result};
use crate::model::atom::Atom;
use crate::model::atoms::AtomCollection;
use crate::model::lattice::{Lattice, UnitCell};
use crate::physics::operations::ScalingMatrix;
use crate::structures::chirality::{Chirality, CC_BOND};
use crate::structures::layers::{Layers, LAYER_SPACING};
use crate::utils::geometry::Point;
use nalgebra::Vector3;

const WRAP_EPS: f64 = 1e-9;

/// `value` folded into `[0, period)`.
fn wrap(value: f64, period: f64) -> f64 {
    let w = value.rem_euclid(period);
    if period - w < WRAP_EPS {
        0.0
    } else {
        w
    }
}

/// The 2N-atom tube unit cell generated by the screw operation (psi, tau).
/// When `unrolled`, the circumferential angle is laid flat as arc length along x.
fn tube_basis(ch: &Chirality, bond: f64, basis: &[String; 2], unrolled: bool) -> AtomCollection {
    let rt = ch.rt(bond);
    let circumference = ch.circumference(bond);
    let t = ch.translation_length(bond);
    let (psi, tau) = (ch.psi(), ch.tau(bond));
    let (dpsi, dtau) = (ch.dpsi(bond), ch.dtau(bond));

    let place = |angle: f64, z: f64| {
        if unrolled {
            Point::new(wrap(rt * angle, circumference), 0.0, z)
        } else {
            Point::new(rt * angle.cos(), rt * angle.sin(), z)
        }
    };

    let mut atoms = Vec::with_capacity(ch.natoms_per_cell());
    for i in 0..ch.nhex() {
        let i = i as f64;
        let r1 = place(i * psi, wrap(i * tau, t));
        let r2 = place(i * psi + dpsi, wrap(i * tau - dtau, t));
        atoms.push(Atom::builder(&basis[0]).position(r1).build());
        atoms.push(Atom::builder(&basis[1]).position(r2).build());
    }
    AtomCollection::from_atoms(atoms)
}

fn check_count(name: &str, n: u32) -> Result<()> {
    if n == 0 {
        return Err(NanoError::config(name, "repeat count must be >= 1"));
    }
    Ok(())
}

fn check_bond(bond: f64) -> Result<()> {
    if !(bond > 0.0) {
        return Err(NanoError::config("bond", format!("must be > 0, got {}", bond)));
    }
    Ok(())
}

/// Single-walled nanotube with its axis along z.
#[derive(Debug, Clone, PartialEq)]
pub struct Swnt {
    pub chirality: Chirality,
    pub bond: f64,
    pub basis: [String; 2],
    /// Unit cells along the tube axis.
    pub n3: u32,
}

impl Swnt {
    pub fn new(n: u32, m: u32) -> Result<Self> {
        Ok(Self::from_chirality(Chirality::new(n, m)?))
    }

    pub fn from_chirality(chirality: Chirality) -> Self {
        Self {
            chirality,
            bond: CC_BOND,
            basis: ["C".to_string(), "C".to_string()],
            n3: 1,
        }
    }

    pub fn with_n3(mut self, n3: u32) -> Result<Self> {
        check_count("n3", n3)?;
        self.n3 = n3;
        Ok(self)
    }

    /// Enough unit cells to reach `length` nm.
    pub fn with_tube_length(mut self, length: f64) -> Result<Self> {
        if !(length > 0.0) {
            return Err(NanoError::config("tube length", format!("must be > 0 nm, got {}", length)));
        }
        self.n3 = (10.0 * length / self.unit_cell_length()).ceil().max(1.0) as u32;
        Ok(self)
    }

    pub fn with_bond(mut self, bond: f64) -> Result<Self> {
        check_bond(bond)?;
        self.bond = bond;
        Ok(self)
    }

    pub fn with_basis(mut self, e1: &str, e2: &str) -> Self {
        self.basis = [e1.to_string(), e2.to_string()];
        self
    }

    pub fn dt(&self) -> f64 {
        self.chirality.dt(self.bond)
    }

    /// T in Å.
    pub fn unit_cell_length(&self) -> f64 {
        self.chirality.translation_length(self.bond)
    }

    /// Total tube length in nm.
    pub fn tube_length(&self) -> f64 {
        self.n3 as f64 * self.unit_cell_length() / 10.0
    }

    pub fn natoms(&self) -> usize {
        self.chirality.natoms_per_cell() * self.n3 as usize
    }

    /// Square cell in xy leaving one interlayer gap around the tube.
    pub fn lattice(&self) -> Result<Lattice> {
        let side = self.dt() + LAYER_SPACING;
        Lattice::from_parameters(side, side, self.unit_cell_length(), 90.0, 90.0, 90.0)
    }

    pub fn unit_cell(&self) -> Result<UnitCell> {
        Ok(UnitCell::new(
            self.lattice()?,
            tube_basis(&self.chirality, self.bond, &self.basis, false),
        ))
    }

    pub fn scaling_matrix(&self) -> Result<ScalingMatrix> {
        ScalingMatrix::diagonal(1, 1, self.n3 as i32)
    }
}

/// A nanotube unit cell cut along its axis and flattened into the xz plane;
/// layers stack along y.
#[derive(Debug, Clone, PartialEq)]
pub struct UnrolledSwnt {
    pub chirality: Chirality,
    pub bond: f64,
    pub basis: [String; 2],
    pub n1: u32,
    pub n3: u32,
    pub layers: Layers,
}

impl UnrolledSwnt {
    pub fn new(n: u32, m: u32) -> Result<Self> {
        Ok(Self::from_chirality(Chirality::new(n, m)?))
    }

    pub fn from_chirality(chirality: Chirality) -> Self {
        Self {
            chirality,
            bond: CC_BOND,
            basis: ["C".to_string(), "C".to_string()],
            n1: 1,
            n3: 1,
            layers: Layers::single(),
        }
    }

    pub fn with_cells(mut self, n1: u32, n3: u32) -> Result<Self> {
        check_count("n1", n1)?;
        check_count("n3", n3)?;
        self.n1 = n1;
        self.n3 = n3;
        Ok(self)
    }

    pub fn with_bond(mut self, bond: f64) -> Result<Self> {
        check_bond(bond)?;
        self.bond = bond;
        Ok(self)
    }

    pub fn with_basis(mut self, e1: &str, e2: &str) -> Self {
        self.basis = [e1.to_string(), e2.to_string()];
        self
    }

    pub fn with_layers(mut self, layers: Layers) -> Self {
        self.layers = layers;
        self
    }

    pub fn lattice(&self) -> Result<Lattice> {
        let spacing = self.layers.spacing();
        let b = if spacing > 0.0 { spacing } else { LAYER_SPACING };
        Lattice::from_vectors(
            &Vector3::new(self.chirality.circumference(self.bond), 0.0, 0.0),
            &Vector3::new(0.0, b, 0.0),
            &Vector3::new(0.0, 0.0, self.chirality.translation_length(self.bond)),
        )
    }

    pub fn unit_cell(&self) -> Result<UnitCell> {
        Ok(UnitCell::new(
            self.lattice()?,
            tube_basis(&self.chirality, self.bond, &self.basis, true),
        ))
    }

    pub fn scaling_matrix(&self) -> Result<ScalingMatrix> {
        ScalingMatrix::diagonal(self.n1 as i32, 1, self.n3 as i32)
    }
}
