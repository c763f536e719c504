// src/model/regions.rs

use crate::utils::geometry::Point;
use nalgebra::{Matrix3, Vector3};

/// A closed region of space with a point-membership test.
pub trait GeometricRegion: std::fmt::Debug {
    fn contains(&self, p: &Point) -> bool;
    fn centroid(&self) -> Point;
}

const EPS: f64 = 1e-10;

#[derive(Clone, Debug, PartialEq)]
pub struct Sphere {
    pub center: Point,
    pub r: f64,
}

impl Default for Sphere {
    fn default() -> Self {
        Self {
            center: Point::origin(),
            r: 1.0,
        }
    }
}

impl GeometricRegion for Sphere {
    fn contains(&self, p: &Point) -> bool {
        (p - self.center).norm_squared() <= self.r * self.r + EPS
    }

    fn centroid(&self) -> Point {
        self.center
    }
}

/// Right circular cylinder between the centers of its two end caps.
#[derive(Clone, Debug, PartialEq)]
pub struct Cylinder {
    pub p1: Point,
    pub p2: Point,
    pub r: f64,
}

impl Default for Cylinder {
    fn default() -> Self {
        Self {
            p1: Point::new(0.0, 0.0, -1.0),
            p2: Point::new(0.0, 0.0, 1.0),
            r: 1.0,
        }
    }
}

impl GeometricRegion for Cylinder {
    fn contains(&self, p: &Point) -> bool {
        let axis = self.p2 - self.p1;
        let len_sq = axis.norm_squared();
        if len_sq == 0.0 {
            return false;
        }
        let d = p - self.p1;
        let t = d.dot(&axis) / len_sq;
        if !(-EPS..=1.0 + EPS).contains(&t) {
            return false;
        }
        let radial = d - axis * t;
        radial.norm_squared() <= self.r * self.r + EPS
    }

    fn centroid(&self) -> Point {
        nalgebra::center(&self.p1, &self.p2)
    }
}

/// Parallelepiped spanned by `u`, `v`, `w` from corner `o`.
#[derive(Clone, Debug, PartialEq)]
pub struct Parallelepiped {
    pub o: Point,
    pub u: Vector3<f64>,
    pub v: Vector3<f64>,
    pub w: Vector3<f64>,
}

impl Default for Parallelepiped {
    fn default() -> Self {
        Self {
            o: Point::origin(),
            u: Vector3::x(),
            v: Vector3::y(),
            w: Vector3::z(),
        }
    }
}

impl GeometricRegion for Parallelepiped {
    fn contains(&self, p: &Point) -> bool {
        let basis = Matrix3::from_columns(&[self.u, self.v, self.w]);
        let Some(inv) = basis.try_inverse() else {
            return false;
        };
        let frac = inv * (p - self.o);
        frac.iter().all(|c| (-EPS..=1.0 + EPS).contains(c))
    }

    fn centroid(&self) -> Point {
        self.o + (self.u + self.v + self.w) / 2.0
    }
}

/// Axis-aligned box.
#[derive(Clone, Debug, PartialEq)]
pub struct Cuboid {
    pub pmin: Point,
    pub pmax: Point,
}

impl Default for Cuboid {
    fn default() -> Self {
        Self {
            pmin: Point::origin(),
            pmax: Point::new(1.0, 1.0, 1.0),
        }
    }
}

impl Cuboid {
    pub fn lengths(&self) -> Vector3<f64> {
        self.pmax - self.pmin
    }
}

impl GeometricRegion for Cuboid {
    fn contains(&self, p: &Point) -> bool {
        (0..3).all(|i| p[i] >= self.pmin[i] - EPS && p[i] <= self.pmax[i] + EPS)
    }

    fn centroid(&self) -> Point {
        nalgebra::center(&self.pmin, &self.pmax)
    }
}

/// Axis-aligned ellipsoid with semi-axes `a`, `b`, `c`.
#[derive(Clone, Debug, PartialEq)]
pub struct Ellipsoid {
    pub center: Point,
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self {
            center: Point::origin(),
            a: 1.0,
            b: 1.0,
            c: 1.0,
        }
    }
}

impl GeometricRegion for Ellipsoid {
    fn contains(&self, p: &Point) -> bool {
        if self.a <= 0.0 || self.b <= 0.0 || self.c <= 0.0 {
            return false;
        }
        let d = p - self.center;
        (d.x / self.a).powi(2) + (d.y / self.b).powi(2) + (d.z / self.c).powi(2) <= 1.0 + EPS
    }

    fn centroid(&self) -> Point {
        self.center
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_boundary_is_inside() {
        let s = Sphere { center: Point::origin(), r: 2.0 };
        assert!(s.contains(&Point::new(2.0, 0.0, 0.0)));
        assert!(!s.contains(&Point::new(2.0, 0.1, 0.0)));
    }

    #[test]
    fn test_cylinder_caps_and_radius() {
        let c = Cylinder {
            p1: Point::new(0.0, -15.0, 0.0),
            p2: Point::new(0.0, 25.0, 0.0),
            r: 15.0,
        };
        assert!(c.contains(&Point::new(10.0, 0.0, 0.0)));
        assert!(!c.contains(&Point::new(0.0, 26.0, 0.0)));
        assert!(!c.contains(&Point::new(12.0, 0.0, 12.0)));
        assert_eq!(c.centroid(), Point::new(0.0, 5.0, 0.0));
    }

    #[test]
    fn test_parallelepiped_skewed() {
        let p = Parallelepiped {
            o: Point::origin(),
            u: Vector3::new(2.0, 0.0, 0.0),
            v: Vector3::new(1.0, 1.0, 0.0),
            w: Vector3::new(0.0, 0.0, 1.0),
        };
        assert!(p.contains(&Point::new(2.5, 0.5, 0.5)));
        assert!(!p.contains(&Point::new(0.2, 0.8, 0.5)));
    }

    #[test]
    fn test_degenerate_regions_contain_nothing() {
        let flat = Parallelepiped { w: Vector3::zeros(), ..Default::default() };
        assert!(!flat.contains(&Point::origin()));
        let line = Cylinder { p1: Point::origin(), p2: Point::origin(), r: 1.0 };
        assert!(!line.contains(&Point::origin()));
    }

    #[test]
    fn test_cuboid_and_ellipsoid() {
        let b = Cuboid::default();
        assert!(b.contains(&Point::new(0.5, 1.0, 0.0)));
        assert!(!b.contains(&Point::new(-0.5, 0.5, 0.5)));
        let e = Ellipsoid { a: 2.0, ..Default::default() };
        assert!(e.contains(&Point::new(1.9, 0.0, 0.0)));
        assert!(!e.contains(&Point::new(0.0, 1.1, 0.0)));
    }
}
