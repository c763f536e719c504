use crate::error::{NanoError, Result};
use crate::model::atoms::AtomCollection;
use crate::model::lattice::{Lattice, UnitCell};
use crate::utils::linalg::det_i32;
use nalgebra::{Matrix3, Vector3};

/// Upper bound on the number of unit cells in one supercell.
pub const MAX_LATTICE_POINTS: i128 = 10_000_000;

/// Upper bound on the lattice-point scan box of a non-diagonal matrix.
const MAX_SCAN_POINTS: i128 = 64 * MAX_LATTICE_POINTS;

/// Integer matrix whose rows give the supercell vectors in units of the
/// unit-cell vectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScalingMatrix([[i32; 3]; 3]);

impl ScalingMatrix {
  pub fn new(m: [[i32; 3]; 3]) -> Result<Self> {
    let det = det_i32(&m);
    if det <= 0 {
      return Err(NanoError::config(
        "scaling matrix",
        format!("determinant must be positive, got {} for {:?}", det, m),
      ));
    }
    if det > MAX_LATTICE_POINTS {
      return Err(NanoError::config(
        "scaling matrix",
        format!("{} unit cells exceeds the limit of {}", det, MAX_LATTICE_POINTS),
      ));
    }
    Ok(Self(m))
  }

  pub fn diagonal(n1: i32, n2: i32, n3: i32) -> Result<Self> {
    for (name, n) in [("n1", n1), ("n2", n2), ("n3", n3)] {
      if n < 1 {
        return Err(NanoError::config(name, format!("repeat count must be >= 1, got {}", n)));
      }
    }
    Self::new([[n1, 0, 0], [0, n2, 0], [0, 0, n3]])
  }

  pub fn rows(&self) -> &[[i32; 3]; 3] {
    &self.0
  }

  /// Number of unit cells in the supercell; bounded by [`MAX_LATTICE_POINTS`].
  pub fn det(&self) -> i64 {
    det_i32(&self.0) as i64
  }

  pub fn is_diagonal(&self) -> bool {
    let m = &self.0;
    (0..3).all(|i| (0..3).all(|j| i == j || m[i][j] == 0))
  }

  fn as_matrix(&self) -> Matrix3<f64> {
    Matrix3::from_fn(|i, j| self.0[i][j] as f64)
  }
}

/// A unit cell tiled by a scaling matrix.
#[derive(Clone, Debug)]
pub struct SuperCell {
  pub lattice: Lattice,
  pub scaling: ScalingMatrix,
  pub atoms: AtomCollection,
}

impl SuperCell {
  pub fn new(unit_cell: &UnitCell, scaling: ScalingMatrix) -> Result<Self> {
    let super_matrix = scaling.as_matrix() * unit_cell.lattice.matrix();
    let lattice = Lattice::from_vectors(
      &super_matrix.row(0).transpose(),
      &super_matrix.row(1).transpose(),
      &super_matrix.row(2).transpose(),
    )?;

    let translations = if scaling.is_diagonal() {
      let m = scaling.rows();
      diagonal_translations(m[0][0], m[1][1], m[2][2])
    } else {
      lattice_points(&scaling)?
    };

    let [va, vb, vc] = unit_cell.lattice.vectors();
    let mut tiled = Vec::with_capacity(translations.len() * unit_cell.natoms());
    for [x, y, z] in &translations {
      let t = va * *x as f64 + vb * *y as f64 + vc * *z as f64;
      for atom in unit_cell.basis.iter() {
        let mut new_atom = atom.clone();
        new_atom.r += t;
        tiled.push(new_atom);
      }
    }
    let atoms = AtomCollection::from_atoms(tiled);

    log::debug!(
      "supercell {:?}: {} lattice points, {} atoms",
      scaling.rows(),
      translations.len(),
      atoms.len()
    );
    Ok(Self {
      lattice,
      scaling,
      atoms,
    })
  }

  pub fn into_atoms(self) -> AtomCollection {
    self.atoms
  }
}

fn diagonal_translations(nx: i32, ny: i32, nz: i32) -> Vec<[i32; 3]> {
  let count: usize = [nx, ny, nz].iter().map(|&n| n.max(0) as usize).product();
  let mut out = Vec::with_capacity(count);
  for x in 0..nx {
    for y in 0..ny {
      for z in 0..nz {
        out.push([x, y, z]);
      }
    }
  }
  out
}

/// Unit-cell lattice points inside the supercell, found by scanning the
/// bounding box of its corners.
fn lattice_points(scaling: &ScalingMatrix) -> Result<Vec<[i32; 3]>> {
  let s = scaling.as_matrix();
  let inv = s
    .try_inverse()
    .ok_or_else(|| NanoError::config("scaling matrix", "matrix is singular"))?;
  let m = scaling.rows();

  let mut lo = [0i64; 3];
  let mut hi = [0i64; 3];
  for corner in 0..8u8 {
    let mut p = [0i64; 3];
    for (row, bit) in m.iter().zip([1u8, 2, 4]) {
      if corner & bit != 0 {
        for k in 0..3 {
          p[k] += i64::from(row[k]);
        }
      }
    }
    for k in 0..3 {
      lo[k] = lo[k].min(p[k]);
      hi[k] = hi[k].max(p[k]);
    }
  }

  let scan: i128 = (0..3).map(|k| i128::from(hi[k] - lo[k] + 1)).product();
  if scan > MAX_SCAN_POINTS {
    return Err(NanoError::config(
      "scaling matrix",
      format!("lattice-point search over {} points exceeds the limit of {}", scan, MAX_SCAN_POINTS),
    ));
  }
  let to_i32 = |v: i64| {
    i32::try_from(v).map_err(|_| NanoError::config("scaling matrix", format!("lattice point {} out of range", v)))
  };
  let lo = [to_i32(lo[0])?, to_i32(lo[1])?, to_i32(lo[2])?];
  let hi = [to_i32(hi[0])?, to_i32(hi[1])?, to_i32(hi[2])?];

  let eps = 1e-9;
  let mut points = Vec::new();
  for i in lo[0]..=hi[0] {
    for j in lo[1]..=hi[1] {
      for k in lo[2]..=hi[2] {
        // fractional coordinates in the supercell basis: f = p * S^-1
        let f = inv.transpose() * Vector3::new(i as f64, j as f64, k as f64);
        if f.iter().all(|c| *c >= -eps && *c < 1.0 - eps) {
          points.push([i, j, k]);
        }
      }
    }
  }

  let expected = scaling.det() as usize;
  if points.len() != expected {
    return Err(NanoError::config(
      "scaling matrix",
      format!("found {} lattice points, expected {}", points.len(), expected),
    ));
  }
  Ok(points)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::atom::Atom;
  use approx::assert_relative_eq;

  fn cubic_cell() -> UnitCell {
    let lattice = Lattice::from_parameters(2.0, 2.0, 2.0, 90.0, 90.0, 90.0).unwrap();
    let basis = AtomCollection::from_atoms(vec![Atom::builder("C").build(), Atom::builder("C").xyz(1.0, 1.0, 1.0).build()]);
    UnitCell::new(lattice, basis)
  }

  #[test]
  fn test_diagonal_tiling() {
    let sc = SuperCell::new(&cubic_cell(), ScalingMatrix::diagonal(3, 2, 1).unwrap()).unwrap();
    assert_eq!(sc.atoms.len(), 12);
    assert_relative_eq!(sc.lattice.volume(), 8.0 * 6.0, epsilon = 1e-9);
    for (len, expected) in sc.lattice.lengths().iter().zip([6.0, 4.0, 2.0]) {
      assert_relative_eq!(*len, expected, epsilon = 1e-9);
    }
  }

  #[test]
  fn test_general_matrix_point_count() {
    let scaling = ScalingMatrix::new([[1, 1, 0], [-1, 1, 0], [0, 0, 1]]).unwrap();
    let sc = SuperCell::new(&cubic_cell(), scaling).unwrap();
    assert_eq!(scaling.det(), 2);
    assert_eq!(sc.atoms.len(), 4);
  }

  #[test]
  fn test_huge_scaling_is_an_error() {
    assert!(ScalingMatrix::diagonal(i32::MAX, i32::MAX, 2).is_err());
    assert!(ScalingMatrix::diagonal(10_000, 10_000, 1_000).is_err());
    assert!(ScalingMatrix::new([[i32::MAX, 0, 0], [0, i32::MAX, 0], [0, 0, i32::MAX]]).is_err());

    // unit determinant, but the shear puts the search box out of reach
    let sheared = ScalingMatrix::new([[1, i32::MAX, 0], [0, 1, 0], [0, 0, 1]]).unwrap();
    assert_eq!(sheared.det(), 1);
    assert!(SuperCell::new(&cubic_cell(), sheared).is_err());
  }

  #[test]
  fn test_rejects_bad_matrices() {
    assert!(ScalingMatrix::diagonal(0, 1, 1).is_err());
    assert!(ScalingMatrix::new([[1, 0, 0], [0, 1, 0], [0, 0, -1]]).is_err());
    assert!(ScalingMatrix::new([[1, 1, 0], [1, 1, 0], [0, 0, 1]]).is_err());
  }
}
