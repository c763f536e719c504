//! Compiled selection trees and their evaluation against an atom collection.

use crate::error::Result;
use crate::model::atom::Atom;
use crate::model::atoms::AtomCollection;
use crate::model::regions::{Cuboid, Cylinder, Ellipsoid, GeometricRegion, Parallelepiped, Sphere};
use crate::physics::neighbors::{Norm, SpatialIndex};
use crate::utils::geometry::Axis;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CmpOp {
    pub fn apply(self, a: f64, b: f64) -> bool {
        match self {
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A region named in a `within Shape(...)` term.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    Sphere(Sphere),
    Cylinder(Cylinder),
    Parallelepiped(Parallelepiped),
    Cuboid(Cuboid),
    Ellipsoid(Ellipsoid),
}

impl Region {
    pub fn as_region(&self) -> &dyn GeometricRegion {
        match self {
            Region::Sphere(r) => r,
            Region::Cylinder(r) => r,
            Region::Parallelepiped(r) => r,
            Region::Cuboid(r) => r,
            Region::Ellipsoid(r) => r,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    All,
    Nothing,
    Id(Vec<usize>),
    MolId(Vec<usize>),
    Type(Vec<usize>),
    Element(Vec<String>),
    Compare { axis: Axis, op: CmpOp, value: f64 },
    /// Atoms within `radius` (inclusive) of any atom matched by `inner`, plus those atoms.
    /// Distances are Euclidean regardless of the collection's neighbor norm.
    Within { radius: f64, inner: Box<Predicate> },
    /// `Within` minus the atoms matched by `inner`.
    ExWithin { radius: f64, inner: Box<Predicate> },
    InRegion(Region),
    Not(Box<Predicate>),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    pub fn needs_spatial_index(&self) -> bool {
        match self {
            Predicate::Within { .. } | Predicate::ExWithin { .. } => true,
            Predicate::Not(p) => p.needs_spatial_index(),
            Predicate::And(a, b) | Predicate::Or(a, b) => a.needs_spatial_index() || b.needs_spatial_index(),
            _ => false,
        }
    }
}

/// State shared across one evaluation: the atoms, the full id set and the
/// spatial index (borrowed, or built on first use).
pub(crate) struct EvalContext<'a> {
    atoms: &'a AtomCollection,
    all_ids: BTreeSet<usize>,
    external: Option<&'a SpatialIndex>,
    owned: Option<SpatialIndex>,
}

impl<'a> EvalContext<'a> {
    pub(crate) fn new(atoms: &'a AtomCollection, index: Option<&'a SpatialIndex>) -> Self {
        let external = match index {
            Some(idx) if idx.is_stale(atoms) => {
                log::warn!("ignoring stale spatial index; building a fresh one for this selection");
                None
            }
            Some(idx) if idx.norm() != Norm::Euclidean => {
                log::warn!("ignoring {:?} spatial index; selection radii are Euclidean", idx.norm());
                None
            }
            other => other,
        };
        Self {
            atoms,
            all_ids: atoms.iter().map(|a| a.id).collect(),
            external,
            owned: None,
        }
    }

    fn index(&mut self) -> Result<Option<&SpatialIndex>> {
        if let Some(idx) = self.external {
            return Ok(Some(idx));
        }
        if self.owned.is_none() {
            let atoms = self.atoms;
            self.owned = SpatialIndex::from_points(&atoms.positions(), Norm::Euclidean, atoms.revision())?;
        }
        Ok(self.owned.as_ref())
    }

    fn ids_where<F: Fn(&Atom) -> bool>(&self, f: F) -> BTreeSet<usize> {
        self.atoms.iter().filter(|a| f(a)).map(|a| a.id).collect()
    }

    fn neighborhood(&mut self, radius: f64, inner: &Predicate) -> Result<(BTreeSet<usize>, BTreeSet<usize>)> {
        let centers = self.eval(inner)?;
        let atoms = self.atoms;
        let mut found = centers.clone();
        if let Some(index) = self.index()? {
            for atom in atoms.iter().filter(|a| centers.contains(&a.id)) {
                for (_, j) in index.within(&atom.r, radius)? {
                    if let Some(hit) = atoms.get(j) {
                        found.insert(hit.id);
                    }
                }
            }
        }
        Ok((found, centers))
    }

    pub(crate) fn eval(&mut self, pred: &Predicate) -> Result<BTreeSet<usize>> {
        let ids = match pred {
            Predicate::All => self.all_ids.clone(),
            Predicate::Nothing => BTreeSet::new(),
            Predicate::Id(list) => self.ids_where(|a| list.contains(&a.id)),
            Predicate::MolId(list) => self.ids_where(|a| list.contains(&a.mol)),
            Predicate::Type(list) => self.ids_where(|a| list.contains(&a.atom_type)),
            Predicate::Element(list) => self.ids_where(|a| list.iter().any(|e| *e == a.element)),
            Predicate::Compare { axis, op, value } => {
                let k = axis.index();
                self.ids_where(|a| op.apply(a.r[k], *value))
            }
            Predicate::InRegion(region) => {
                let region = region.as_region();
                self.ids_where(|a| region.contains(&a.r))
            }
            Predicate::Within { radius, inner } => self.neighborhood(*radius, inner)?.0,
            Predicate::ExWithin { radius, inner } => {
                let (found, centers) = self.neighborhood(*radius, inner)?;
                found.difference(&centers).copied().collect()
            }
            Predicate::Not(inner) => {
                let matched = self.eval(inner)?;
                self.all_ids.difference(&matched).copied().collect()
            }
            Predicate::And(a, b) => {
                let left = self.eval(a)?;
                let right = self.eval(b)?;
                left.intersection(&right).copied().collect()
            }
            Predicate::Or(a, b) => {
                let mut left = self.eval(a)?;
                left.extend(self.eval(b)?);
                left
            }
        };
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn chain() -> AtomCollection {
        let mut atoms: AtomCollection = (0..5)
            .map(|i| Atom::builder(if i % 2 == 0 { "B" } else { "N" }).xyz(i as f64, 0.0, 0.0).mol(i / 2 + 1).build())
            .collect();
        atoms.assign_unique_ids(1);
        atoms
    }

    fn eval(atoms: &AtomCollection, pred: &Predicate) -> Vec<usize> {
        EvalContext::new(atoms, None).eval(pred).unwrap().into_iter().collect()
    }

    #[test]
    fn test_leaf_terms() {
        let atoms = chain();
        assert_eq!(eval(&atoms, &Predicate::Element(vec!["N".into()])), vec![2, 4]);
        assert_eq!(eval(&atoms, &Predicate::MolId(vec![2])), vec![3, 4]);
        assert_eq!(
            eval(&atoms, &Predicate::Compare { axis: Axis::X, op: CmpOp::Ge, value: 3.0 }),
            vec![4, 5]
        );
        assert!(eval(&atoms, &Predicate::Nothing).is_empty());
    }

    #[test]
    fn test_within_and_exwithin() {
        let atoms = chain();
        let inner = Box::new(Predicate::Id(vec![3]));
        let within = Predicate::Within { radius: 1.0, inner: inner.clone() };
        let ex = Predicate::ExWithin { radius: 1.0, inner };
        assert_eq!(eval(&atoms, &within), vec![2, 3, 4]);
        assert_eq!(eval(&atoms, &ex), vec![2, 4]);
    }

    #[test]
    fn test_zero_radius_keeps_centers() {
        let atoms = chain();
        let within = Predicate::Within { radius: 0.0, inner: Box::new(Predicate::Id(vec![1, 5])) };
        assert_eq!(eval(&atoms, &within), vec![1, 5]);
    }

    #[test]
    fn test_region_term() {
        let atoms = chain();
        let sphere = Predicate::InRegion(Region::Sphere(Sphere { center: Point3::new(2.0, 0.0, 0.0), r: 1.0 }));
        assert_eq!(eval(&atoms, &sphere), vec![2, 3, 4]);
        assert!(!sphere.needs_spatial_index());
    }

    #[test]
    fn test_within_radius_ignores_neighbor_norm() {
        let mut atoms: AtomCollection = [[0.0, 0.0, 0.0], [0.6, 0.6, 0.0], [0.0, 0.0, 2.0]]
            .into_iter()
            .map(|p| Atom::builder("C").xyz(p[0], p[1], p[2]).build())
            .collect();
        atoms.assign_unique_ids(1);
        atoms.set_norm(Norm::Manhattan);
        let within = Predicate::Within { radius: 1.0, inner: Box::new(Predicate::Id(vec![1])) };
        assert_eq!(eval(&atoms, &within), vec![1, 2]);

        let manhattan = SpatialIndex::build(&atoms).unwrap().unwrap();
        assert_eq!(manhattan.norm(), Norm::Manhattan);
        let mut ctx = EvalContext::new(&atoms, Some(&manhattan));
        assert!(ctx.external.is_none());
        assert_eq!(ctx.eval(&within).unwrap().into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_stale_index_is_not_used() {
        let mut atoms = chain();
        let index = SpatialIndex::build(&atoms).unwrap().unwrap();
        atoms.translate(&nalgebra::Vector3::new(0.0, 10.0, 0.0));
        let ctx = EvalContext::new(&atoms, Some(&index));
        assert!(ctx.external.is_none());
    }
}
