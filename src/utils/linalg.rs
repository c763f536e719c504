// src/utils/linalg.rs

use nalgebra::{Matrix3, Vector3};

/// Build the row matrix [[ax, ay, az], [bx, by, bz], [cx, cy, cz]] from lattice vectors
pub fn row_matrix(a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> Matrix3<f64> {
  Matrix3::from_rows(&[a.transpose(), b.transpose(), c.transpose()])
}

/// Convert fractional coordinates to Cartesian using lattice matrix
///
/// # Arguments
/// * `frac` - Fractional coordinates
/// * `lattice` - Lattice vectors as row matrix [[ax, ay, az], [bx, by, bz], [cx, cy, cz]]
///
/// # Formula
/// ```text
/// Cartesian = Lattice^T × Fractional
/// ```
pub fn frac_to_cart(frac: &Vector3<f64>, lattice: &Matrix3<f64>) -> Vector3<f64> {
  lattice.transpose() * frac
}

/// Convert Cartesian coordinates to fractional using lattice matrix
///
/// Returns None if the lattice is singular
///
/// # Formula
/// ```text
/// Fractional = (Lattice^T)^-1 × Cartesian
/// ```
pub fn cart_to_frac(cart: &Vector3<f64>, lattice: &Matrix3<f64>) -> Option<Vector3<f64>> {
  let inv_lat = lattice.transpose().try_inverse()?;
  Some(inv_lat * cart)
}

/// Integer determinant of a 3x3 integer matrix
pub fn det_i32(m: &[[i32; 3]; 3]) -> i128 {
  let m = m.map(|row| row.map(i128::from));
  m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1]) - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
    + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Greatest common divisor (always non-negative)
pub fn gcd(a: i64, b: i64) -> i64 {
  let (mut a, mut b) = (a.abs(), b.abs());
  while b != 0 {
    let t = a % b;
    a = b;
    b = t;
  }
  a
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cubic_lattice() {
    // Simple cubic lattice 5.0 Å
    let lattice = Matrix3::from_diagonal_element(5.0);

    let cart = frac_to_cart(&Vector3::new(0.5, 0.5, 0.5), &lattice);

    assert!((cart[0] - 2.5).abs() < 1e-10);
    assert!((cart[1] - 2.5).abs() < 1e-10);
    assert!((cart[2] - 2.5).abs() < 1e-10);
  }

  #[test]
  fn test_non_orthogonal_back_conversion() {
    let lattice = row_matrix(
      &Vector3::new(4.0, 0.0, 0.0),
      &Vector3::new(2.0, 3.46, 0.0),
      &Vector3::new(0.0, 0.0, 5.0),
    );

    let frac_orig = Vector3::new(0.333, 0.667, 0.25);
    let cart = frac_to_cart(&frac_orig, &lattice);
    let frac_back = cart_to_frac(&cart, &lattice).unwrap();

    assert!((frac_back - frac_orig).norm() < 1e-10);
  }

  #[test]
  fn test_singular_lattice() {
    let lattice = Matrix3::zeros();
    assert!(cart_to_frac(&Vector3::new(1.0, 0.0, 0.0), &lattice).is_none());
  }

  #[test]
  fn test_integer_helpers() {
    assert_eq!(det_i32(&[[2, 0, 0], [0, 3, 0], [0, 0, 1]]), 6);
    assert_eq!(det_i32(&[[1, 1, 0], [1, 1, 0], [0, 0, 1]]), 0);
    assert_eq!(gcd(25, 20), 5);
    assert_eq!(gcd(-4, 6), 2);
  }
}
