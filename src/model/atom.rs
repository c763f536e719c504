// src/model/atom.rs

use crate::error::{NanoError, Result};
use crate::model::elements;
use crate::model::poav::{Poav, PoavFields, PoavKind};
use crate::utils::geometry::Point;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Non-owning reference to a neighboring atom, resolved by id through the
/// collection that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeighborRef {
    pub id: usize,
    pub distance: f64,
}

/// Neighbor-analysis capability: valid only after an explicit update pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialFields {
    pub cn: Option<usize>,
    pub nn: Option<Vec<NeighborRef>>,
}

impl SpatialFields {
    pub fn invalidate(&mut self) {
        self.cn = None;
        self.nn = None;
    }
}

/// Trajectory capability: links an atom to its counterpart in a reference frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryFields {
    pub reference_id: Option<usize>,
    pub r0: Option<Point>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// 1-based once assigned, 0 while unassigned.
    pub id: usize,
    pub element: String,
    /// Atomic number, 0 for symbols missing from the element table.
    pub atomic_number: u32,
    pub r: Point,
    pub v: Vector3<f64>,
    pub q: f64,
    pub mass: f64,
    pub mol: usize,
    pub atom_type: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial: Option<SpatialFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trajectory: Option<TrajectoryFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poav: Option<PoavFields>,
}

/// Dynamically typed value for [`Atom::set_attribute`].
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Str(String),
    Vector([f64; 3]),
    Neighbors(Vec<NeighborRef>),
    Poav(Poav),
}

impl AttrValue {
    fn kind(&self) -> &'static str {
        match self {
            AttrValue::Int(_) => "integer",
            AttrValue::Float(_) => "float",
            AttrValue::Str(_) => "string",
            AttrValue::Vector(_) => "vector",
            AttrValue::Neighbors(_) => "neighbor list",
            AttrValue::Poav(p) => p.kind.label(),
        }
    }
}

impl Atom {
    pub fn builder(element: &str) -> AtomBuilder {
        AtomBuilder::new(element)
    }

    pub fn x(&self) -> f64 {
        self.r.x
    }

    pub fn y(&self) -> f64 {
        self.r.y
    }

    pub fn z(&self) -> f64 {
        self.r.z
    }

    pub fn cn(&self) -> Option<usize> {
        self.spatial.as_ref().and_then(|s| s.cn)
    }

    pub fn nn(&self) -> Option<&[NeighborRef]> {
        self.spatial.as_ref().and_then(|s| s.nn.as_deref())
    }

    /// Attaches the neighbor-analysis bundle if missing.
    pub fn spatial_mut(&mut self) -> &mut SpatialFields {
        self.spatial.get_or_insert_with(SpatialFields::default)
    }

    pub fn poav(&self, kind: PoavKind) -> Option<&Poav> {
        self.poav.as_ref().and_then(|p| p.get(kind))
    }

    /// Attaches the POAV bundle if missing.
    pub fn poav_mut(&mut self) -> &mut PoavFields {
        self.poav.get_or_insert_with(PoavFields::default)
    }

    /// Drops neighbor lists and the POAV results derived from them.
    pub(crate) fn invalidate_neighbors(&mut self) {
        if let Some(s) = self.spatial.as_mut() {
            s.invalidate();
        }
        if let Some(p) = self.poav.as_mut() {
            p.clear();
        }
    }

    /// Displacement from the reference-frame position, when one is linked.
    pub fn displacement(&self) -> Option<Vector3<f64>> {
        let r0 = self.trajectory.as_ref()?.r0?;
        Some(self.r - r0)
    }

    /// Assign an attribute by name. Values are never coerced between kinds.
    pub fn set_attribute(&mut self, name: &str, value: AttrValue) -> Result<()> {
        let mismatch = |expected: &'static str, value: &AttrValue| NanoError::TypeMismatch {
            attribute: name.to_string(),
            expected,
            found: value.kind(),
        };

        match name {
            "id" | "mol" | "molid" | "type" => {
                let i = match value {
                    AttrValue::Int(i) => i,
                    other => return Err(mismatch("integer", &other)),
                };
                let i = usize::try_from(i).map_err(|_| {
                    NanoError::config(name, format!("expected a non-negative integer, got {}", i))
                })?;
                match name {
                    "id" => self.id = i,
                    "type" => self.atom_type = i,
                    _ => self.mol = i,
                }
            }
            "element" => {
                let s = match value {
                    AttrValue::Str(s) => s,
                    other => return Err(mismatch("string", &other)),
                };
                self.atomic_number = elements::atomic_number(&s).unwrap_or(0);
                self.element = s;
            }
            "q" | "charge" | "mass" | "x" | "y" | "z" | "vx" | "vy" | "vz" => {
                let f = match value {
                    AttrValue::Float(f) => f,
                    other => return Err(mismatch("float", &other)),
                };
                match name {
                    "q" | "charge" => self.q = f,
                    "mass" => self.mass = f,
                    "x" => self.r.x = f,
                    "y" => self.r.y = f,
                    "z" => self.r.z = f,
                    "vx" => self.v.x = f,
                    "vy" => self.v.y = f,
                    _ => self.v.z = f,
                }
            }
            "r" | "v" => {
                let c = match value {
                    AttrValue::Vector(c) => c,
                    other => return Err(mismatch("vector", &other)),
                };
                if name == "r" {
                    self.r = Point::new(c[0], c[1], c[2]);
                } else {
                    self.v = Vector3::new(c[0], c[1], c[2]);
                }
            }
            "nn" | "NN" => {
                let list = match value {
                    AttrValue::Neighbors(list) => list,
                    other => return Err(mismatch("neighbor list", &other)),
                };
                self.spatial_mut().nn = Some(list);
            }
            "poav1" | "POAV1" | "poav2" | "POAV2" | "poavr" | "POAVR" => {
                let kind = match name {
                    "poav1" | "POAV1" => PoavKind::Poav1,
                    "poav2" | "POAV2" => PoavKind::Poav2,
                    _ => PoavKind::PoavR,
                };
                match value {
                    AttrValue::Poav(p) if p.kind == kind => self.poav_mut().set(p),
                    other => return Err(mismatch(kind.label(), &other)),
                }
            }
            other => return Err(NanoError::UnknownAttribute(other.to_string())),
        }
        Ok(())
    }
}

/// Builder with an explicit "not provided" state for every field.
#[derive(Clone, Debug, Default)]
pub struct AtomBuilder {
    element: String,
    id: Option<usize>,
    r: Option<Point>,
    v: Option<Vector3<f64>>,
    q: Option<f64>,
    mass: Option<f64>,
    mol: Option<usize>,
    atom_type: Option<usize>,
    spatial: bool,
    trajectory: Option<TrajectoryFields>,
    poav: bool,
}

impl AtomBuilder {
    pub fn new(element: &str) -> Self {
        Self {
            element: element.to_string(),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: usize) -> Self {
        self.id = Some(id);
        self
    }

    pub fn position(mut self, r: Point) -> Self {
        self.r = Some(r);
        self
    }

    pub fn xyz(self, x: f64, y: f64, z: f64) -> Self {
        self.position(Point::new(x, y, z))
    }

    pub fn velocity(mut self, v: Vector3<f64>) -> Self {
        self.v = Some(v);
        self
    }

    pub fn charge(mut self, q: f64) -> Self {
        self.q = Some(q);
        self
    }

    pub fn mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn mol(mut self, mol: usize) -> Self {
        self.mol = Some(mol);
        self
    }

    pub fn atom_type(mut self, atom_type: usize) -> Self {
        self.atom_type = Some(atom_type);
        self
    }

    pub fn with_spatial(mut self) -> Self {
        self.spatial = true;
        self
    }

    pub fn with_trajectory(mut self, fields: TrajectoryFields) -> Self {
        self.trajectory = Some(fields);
        self
    }

    pub fn with_poav(mut self) -> Self {
        self.poav = true;
        self
    }

    pub fn build(self) -> Atom {
        let atomic_number = elements::atomic_number(&self.element).unwrap_or(0);
        let mass = self
            .mass
            .unwrap_or_else(|| elements::atomic_mass(&self.element).unwrap_or(0.0));
        Atom {
            id: self.id.unwrap_or(0),
            atomic_number,
            r: self.r.unwrap_or_else(Point::origin),
            v: self.v.unwrap_or_else(Vector3::zeros),
            q: self.q.unwrap_or(0.0),
            mass,
            mol: self.mol.unwrap_or(0),
            atom_type: self.atom_type.unwrap_or(0),
            spatial: self.spatial.then(SpatialFields::default),
            trajectory: self.trajectory,
            poav: self.poav.then(PoavFields::default),
            element: self.element,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_from_element_table() {
        let atom = Atom::builder("N").xyz(1.0, 2.0, 3.0).build();
        assert_eq!(atom.atomic_number, 7);
        assert!((atom.mass - 14.007).abs() < 1e-9);
        assert_eq!(atom.id, 0);
        assert_eq!(atom.v, Vector3::zeros());
        assert!(atom.spatial.is_none());
        assert_eq!(atom.y(), 2.0);
    }

    #[test]
    fn test_explicit_fields_win() {
        let atom = Atom::builder("C").mass(13.0).charge(-0.5).mol(2).atom_type(3).with_spatial().build();
        assert_eq!(atom.mass, 13.0);
        assert_eq!(atom.q, -0.5);
        assert_eq!((atom.mol, atom.atom_type), (2, 3));
        assert_eq!(atom.cn(), None);
        assert!(atom.spatial.is_some());
    }

    #[test]
    fn test_set_attribute_rejects_wrong_kind() {
        let mut atom = Atom::builder("C").build();
        let err = atom.set_attribute("nn", AttrValue::Int(3)).unwrap_err();
        assert!(matches!(err, NanoError::TypeMismatch { expected: "neighbor list", .. }));

        let err = atom.set_attribute("q", AttrValue::Int(1)).unwrap_err();
        assert!(matches!(err, NanoError::TypeMismatch { found: "integer", .. }));

        assert!(matches!(
            atom.set_attribute("spin", AttrValue::Float(0.5)),
            Err(NanoError::UnknownAttribute(_))
        ));
    }

    #[test]
    fn test_set_attribute_updates_fields() {
        let mut atom = Atom::builder("C").build();
        atom.set_attribute("element", AttrValue::Str("B".into())).unwrap();
        atom.set_attribute("mol", AttrValue::Int(4)).unwrap();
        atom.set_attribute("z", AttrValue::Float(1.5)).unwrap();
        atom.set_attribute("nn", AttrValue::Neighbors(vec![NeighborRef { id: 2, distance: 1.4 }]))
            .unwrap();
        assert_eq!(atom.atomic_number, 5);
        assert_eq!(atom.mol, 4);
        assert_eq!(atom.z(), 1.5);
        assert_eq!(atom.nn().map(|n| n.len()), Some(1));
    }

    #[test]
    fn test_poav_slots_are_type_checked() {
        let bonds = [Vector3::x(), Vector3::y(), Vector3::new(-1.0, -1.0, 0.0)];
        let poavr = Poav::new(PoavKind::PoavR, Vector3::z(), &bonds).unwrap();
        let mut atom = Atom::builder("C").build();
        assert!(atom.poav.is_none());

        let err = atom.set_attribute("POAV1", AttrValue::Poav(poavr.clone())).unwrap_err();
        assert!(matches!(err, NanoError::TypeMismatch { expected: "POAV1", found: "POAVR", .. }));
        let err = atom.set_attribute("poav2", AttrValue::Float(1.0)).unwrap_err();
        assert!(matches!(err, NanoError::TypeMismatch { expected: "POAV2", found: "float", .. }));
        assert!(atom.poav.is_none());

        atom.set_attribute("POAVR", AttrValue::Poav(poavr.clone())).unwrap();
        assert_eq!(atom.poav(PoavKind::PoavR), Some(&poavr));
        assert_eq!(atom.poav(PoavKind::Poav1), None);
        assert!(Atom::builder("C").with_poav().build().poav.is_some());
    }

    #[test]
    fn test_displacement() {
        let atom = Atom::builder("C")
            .xyz(1.0, 1.0, 1.0)
            .with_trajectory(TrajectoryFields {
                reference_id: Some(1),
                r0: Some(Point::new(0.0, 1.0, 1.0)),
            })
            .build();
        assert_eq!(atom.displacement(), Some(Vector3::new(1.0, 0.0, 0.0)));
        assert_eq!(Atom::builder("C").build().displacement(), None);
    }
}
