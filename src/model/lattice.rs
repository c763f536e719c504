// src/model/lattice.rs

use crate::error::{NanoError, Result};
use crate::model::atom::Atom;
use crate::model::atoms::AtomCollection;
use crate::utils::geometry::Point;
use crate::utils::linalg::{cart_to_frac, frac_to_cart, row_matrix};
use nalgebra::{Matrix3, Vector3};

/// Lattice vectors stored as rows: [a, b, c].
#[derive(Clone, Debug, PartialEq)]
pub struct Lattice {
  matrix: Matrix3<f64>,
}

impl Lattice {
  /// From lengths (Å) and angles (degrees). `a` lies along x, `b` in the xy plane.
  pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Result<Self> {
    for (name, len) in [("a", a), ("b", b), ("c", c)] {
      if !(len > 0.0) || !len.is_finite() {
        return Err(NanoError::config(name, format!("lattice length must be > 0, got {}", len)));
      }
    }
    let (al, be, ga) = (alpha.to_radians(), beta.to_radians(), gamma.to_radians());
    if ga.sin().abs() < 1e-12 {
      return Err(NanoError::config("gamma", format!("degenerate angle {}", gamma)));
    }

    let va = Vector3::new(a, 0.0, 0.0);
    let vb = Vector3::new(b * ga.cos(), b * ga.sin(), 0.0);
    let cx = c * be.cos();
    let cy = c * (al.cos() - be.cos() * ga.cos()) / ga.sin();
    let cz_sq = c * c - cx * cx - cy * cy;
    if cz_sq <= 0.0 {
      return Err(NanoError::config(
        "angles",
        format!("({}, {}, {}) do not span a volume", alpha, beta, gamma),
      ));
    }
    let vc = Vector3::new(cx, cy, cz_sq.sqrt());
    Self::from_vectors(&va, &vb, &vc)
  }

  pub fn from_vectors(a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> Result<Self> {
    let matrix = row_matrix(a, b, c);
    if matrix.determinant().abs() < 1e-12 {
      return Err(NanoError::config("lattice", "lattice vectors are coplanar"));
    }
    Ok(Self { matrix })
  }

  pub fn matrix(&self) -> &Matrix3<f64> {
    &self.matrix
  }

  pub fn vector(&self, i: usize) -> Vector3<f64> {
    self.matrix.row(i).transpose()
  }

  pub fn vectors(&self) -> [Vector3<f64>; 3] {
    [self.vector(0), self.vector(1), self.vector(2)]
  }

  pub fn lengths(&self) -> [f64; 3] {
    self.vectors().map(|v| v.norm())
  }

  /// (alpha, beta, gamma) in degrees.
  pub fn angles(&self) -> [f64; 3] {
    let [a, b, c] = self.vectors();
    [b.angle(&c), a.angle(&c), a.angle(&b)].map(f64::to_degrees)
  }

  pub fn volume(&self) -> f64 {
    self.matrix.determinant().abs()
  }

  pub fn frac_to_cart(&self, frac: &Vector3<f64>) -> Vector3<f64> {
    frac_to_cart(frac, &self.matrix)
  }

  pub fn cart_to_frac(&self, cart: &Vector3<f64>) -> Option<Vector3<f64>> {
    cart_to_frac(cart, &self.matrix)
  }

  /// Lattice with every vector multiplied by the matching factor.
  pub fn scaled(&self, factors: [f64; 3]) -> Result<Self> {
    let [a, b, c] = self.vectors();
    Self::from_vectors(&(a * factors[0]), &(b * factors[1]), &(c * factors[2]))
  }
}

/// Atom basis (Cartesian positions) plus the lattice it repeats on.
#[derive(Clone, Debug)]
pub struct UnitCell {
  pub lattice: Lattice,
  pub basis: AtomCollection,
}

impl UnitCell {
  pub fn new(lattice: Lattice, basis: AtomCollection) -> Self {
    Self { lattice, basis }
  }

  /// Basis atoms given as (element, fractional coordinates).
  pub fn from_fractional(lattice: Lattice, sites: &[(&str, [f64; 3])]) -> Self {
    let basis = sites
      .iter()
      .map(|(element, f)| {
        let cart = lattice.frac_to_cart(&Vector3::new(f[0], f[1], f[2]));
        Atom::builder(element).position(Point::from(cart)).build()
      })
      .collect();
    Self { lattice, basis }
  }

  pub fn natoms(&self) -> usize {
    self.basis.len()
  }
}
