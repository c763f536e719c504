// src/utils/geometry.rs

use crate::error::{NanoError, Result};
use nalgebra::{Point3, Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

/// A position in Cartesian space (Angstroms).
pub type Point = Point3<f64>;

/// Cartesian axis selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit_vector(self) -> Vector3<f64> {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
            Axis::Z => Vector3::z(),
        }
    }
}

impl FromStr for Axis {
    type Err = NanoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            other => Err(NanoError::config("axis", format!("'{}' is not one of x, y, z", other))),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(s)
    }
}

/// A 3-D vector that remembers where it starts (`p0`) and ends (`p`).
///
/// The components are always `p - p0`. Every coordinate edit goes through
/// [`Vector::set_components`], which moves the terminal point along.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    components: Vector3<f64>,
    p0: Point,
    p: Point,
}

impl Vector {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self::from_components(Vector3::new(x, y, z))
    }

    pub fn zeros() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Vector anchored at the origin.
    pub fn from_components(components: Vector3<f64>) -> Self {
        Self::with_origin(components, Point::origin())
    }

    pub fn with_origin(components: Vector3<f64>, p0: Point) -> Self {
        Self {
            components,
            p0,
            p: p0 + components,
        }
    }

    /// Vector pointing from `p0` to `p`.
    pub fn between(p0: Point, p: Point) -> Self {
        Self {
            components: p - p0,
            p0,
            p,
        }
    }

    pub fn x(&self) -> f64 {
        self.components.x
    }

    pub fn y(&self) -> f64 {
        self.components.y
    }

    pub fn z(&self) -> f64 {
        self.components.z
    }

    pub fn components(&self) -> Vector3<f64> {
        self.components
    }

    pub fn p0(&self) -> Point {
        self.p0
    }

    pub fn p(&self) -> Point {
        self.p
    }

    pub fn set_components(&mut self, components: Vector3<f64>) {
        self.components = components;
        self.p = self.p0 + components;
    }

    pub fn set_component(&mut self, axis: Axis, value: f64) {
        let mut c = self.components;
        c[axis.index()] = value;
        self.set_components(c);
    }

    pub fn set_x(&mut self, value: f64) {
        self.set_component(Axis::X, value);
    }

    pub fn set_y(&mut self, value: f64) {
        self.set_component(Axis::Y, value);
    }

    pub fn set_z(&mut self, value: f64) {
        self.set_component(Axis::Z, value);
    }

    /// Moves the terminal point; components follow.
    pub fn set_p(&mut self, p: Point) {
        self.set_components(p - self.p0);
    }

    /// Moves the origin point while keeping the terminal point fixed.
    pub fn set_p0(&mut self, p0: Point) {
        self.p0 = p0;
        self.components = self.p - p0;
    }

    pub fn dot(&self, other: &Vector) -> f64 {
        self.components.dot(&other.components)
    }

    pub fn cross(&self, other: &Vector) -> Vector {
        Vector::from_components(self.components.cross(&other.components))
    }

    pub fn norm(&self) -> f64 {
        self.components.norm()
    }

    /// Unit vector in the same direction, or the zero vector for zero length.
    pub fn unit(&self) -> Vector {
        let l = self.norm();
        if l == 0.0 {
            Vector::zeros()
        } else {
            Vector::with_origin(self.components / l, self.p0)
        }
    }

    /// Angle to `other` in radians.
    pub fn angle(&self, other: &Vector) -> f64 {
        angle_between(&self.components, &other.components)
    }

    /// Sets components with `|c| <= epsilon` to exactly zero.
    pub fn rezero(&mut self, epsilon: f64) {
        let c = self.components.map(|v| if v.abs() <= epsilon { 0.0 } else { v });
        self.set_components(c);
    }
}

impl From<Vector3<f64>> for Vector {
    fn from(v: Vector3<f64>) -> Self {
        Vector::from_components(v)
    }
}

impl From<[f64; 3]> for Vector {
    fn from(v: [f64; 3]) -> Self {
        Vector::new(v[0], v[1], v[2])
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::with_origin(self.components + rhs.components, self.p0)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::with_origin(self.components - rhs.components, self.p0)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector::with_origin(-self.components, self.p0)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Vector {
        Vector::with_origin(self.components * rhs, self.p0)
    }
}

/// Angle between two vectors in radians (0 for zero-length input).
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let denom = a.norm() * b.norm();
    if denom == 0.0 {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

/// Calculates distance between two points (Angstroms)
pub fn calculate_distance(p1: &Point, p2: &Point) -> f64 {
    (p1 - p2).norm()
}

/// Calculates angle P1-P2-P3 in degrees
pub fn calculate_angle(p1: &Point, center: &Point, p3: &Point) -> f64 {
    angle_between(&(p1 - center), &(p3 - center)).to_degrees()
}

/// Right-handed rotation of `angle` radians about `axis`.
pub fn rotation_matrix(angle: f64, axis: &Vector3<f64>) -> Result<Rotation3<f64>> {
    if axis.norm() == 0.0 {
        return Err(NanoError::config("rotation axis", "axis vector has zero length"));
    }
    Ok(Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle))
}

/// Rotates `point` about `pivot`.
pub fn rotate_point(point: &Point, rotation: &Rotation3<f64>, pivot: &Point) -> Point {
    pivot + rotation * (point - pivot)
}
