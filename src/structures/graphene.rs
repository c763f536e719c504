// src/structures/graphene.rs

use crate::error::{NanoError, Result};
use crate::model::atom::Atom;
use crate::model::atoms::AtomCollection;
use crate::model::lattice::{Lattice, UnitCell};
use crate::physics::operations::ScalingMatrix;
use crate::structures::chirality::CC_BOND;
use crate::structures::layers::{Layers, LAYER_SPACING};
use crate::utils::geometry::Point;
use nalgebra::Vector3;

/// Which repeating cell a graphene sheet is built from, with its edge lengths in nm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrapheneCell {
    /// Rectangular 4-atom cell; zigzag edge along x, armchair edge along y.
    Conventional { armchair_edge_length: f64, zigzag_edge_length: f64 },
    /// Hexagonal 2-atom cell with 60 degrees between r1 and r2.
    Primitive { edge_length: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Graphene {
    pub cell: GrapheneCell,
    pub bond: f64,
    pub basis: [String; 2],
    pub layers: Layers,
}

fn check_length(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(NanoError::config(name, format!("edge length must be > 0 nm, got {}", value)))
    }
}

impl Graphene {
    pub fn conventional(armchair_edge_length: f64, zigzag_edge_length: f64) -> Result<Self> {
        check_length("armchair_edge_length", armchair_edge_length)?;
        check_length("zigzag_edge_length", zigzag_edge_length)?;
        Ok(Self::with_cell(GrapheneCell::Conventional {
            armchair_edge_length,
            zigzag_edge_length,
        }))
    }

    pub fn primitive(edge_length: f64) -> Result<Self> {
        check_length("edge_length", edge_length)?;
        Ok(Self::with_cell(GrapheneCell::Primitive { edge_length }))
    }

    fn with_cell(cell: GrapheneCell) -> Self {
        Self {
            cell,
            bond: CC_BOND,
            basis: ["C".to_string(), "C".to_string()],
            layers: Layers::single(),
        }
    }

    pub fn with_bond(mut self, bond: f64) -> Result<Self> {
        if !(bond > 0.0) {
            return Err(NanoError::config("bond", format!("must be > 0, got {}", bond)));
        }
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

    /// AB stacking: odd layers are shifted by one bond length along y.
    pub fn ab_shift(&self) -> Vector3<f64> {
        Vector3::new(0.0, self.bond, 0.0)
    }

    /// Lattice constant |a1| = sqrt(3) * bond.
    pub fn lattice_constant(&self) -> f64 {
        3f64.sqrt() * self.bond
    }

    pub fn r1(&self) -> Vector3<f64> {
        Vector3::new(self.lattice_constant(), 0.0, 0.0)
    }

    pub fn r2(&self) -> Vector3<f64> {
        let a = self.lattice_constant();
        match self.cell {
            GrapheneCell::Conventional { .. } => Vector3::new(0.0, 3.0 * self.bond, 0.0),
            GrapheneCell::Primitive { .. } => Vector3::new(a / 2.0, a * 3f64.sqrt() / 2.0, 0.0),
        }
    }

    fn cell_height(&self) -> f64 {
        let spacing = self.layers.spacing();
        2.0 * if spacing > 0.0 { spacing } else { LAYER_SPACING }
    }

    pub fn lattice(&self) -> Result<Lattice> {
        Lattice::from_vectors(&self.r1(), &self.r2(), &Vector3::new(0.0, 0.0, self.cell_height()))
    }

    pub fn unit_cell(&self) -> Result<UnitCell> {
        let lattice = self.lattice()?;
        let (a, b) = (self.lattice_constant(), self.bond);
        let (e1, e2) = (self.basis[0].as_str(), self.basis[1].as_str());
        let sites: Vec<(&str, Point)> = match self.cell {
            GrapheneCell::Conventional { .. } => vec![
                (e1, Point::new(0.0, 0.0, 0.0)),
                (e2, Point::new(a / 2.0, b / 2.0, 0.0)),
                (e1, Point::new(a / 2.0, 3.0 * b / 2.0, 0.0)),
                (e2, Point::new(0.0, 2.0 * b, 0.0)),
            ],
            GrapheneCell::Primitive { .. } => {
                vec![(e1, Point::origin()), (e2, Point::from((self.r1() + self.r2()) / 3.0))]
            }
        };
        let basis: AtomCollection = sites
            .into_iter()
            .map(|(element, r)| Atom::builder(element).position(r).build())
            .collect();
        Ok(UnitCell::new(lattice, basis))
    }

    /// Cells along r1 and r2 needed to cover the requested edge lengths.
    pub fn repeats(&self) -> (u32, u32) {
        let cells = |len_nm: f64, period: f64| (10.0 * len_nm / period).ceil().max(1.0) as u32;
        match self.cell {
            GrapheneCell::Conventional {
                armchair_edge_length,
                zigzag_edge_length,
            } => (
                cells(zigzag_edge_length, self.r1().norm()),
                cells(armchair_edge_length, self.r2().norm()),
            ),
            GrapheneCell::Primitive { edge_length } => {
                let n = cells(edge_length, self.lattice_constant());
                (n, n)
            }
        }
    }

    pub fn scaling_matrix(&self) -> Result<ScalingMatrix> {
        let (n1, n2) = self.repeats();
        ScalingMatrix::diagonal(n1 as i32, n2 as i32, 1)
    }

    /// Sheet area in nm^2.
    pub fn area(&self) -> f64 {
        match self.cell {
            GrapheneCell::Conventional {
                armchair_edge_length,
                zigzag_edge_length,
            } => armchair_edge_length * zigzag_edge_length,
            GrapheneCell::Primitive { edge_length } => edge_length * edge_length * 3f64.sqrt() / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_conventional_cell() {
        let g = Graphene::conventional(10.0, 10.0).unwrap();
        let cell = g.unit_cell().unwrap();
        assert_eq!(cell.basis.len(), 4);
        for angle in cell.lattice.angles() {
            assert_relative_eq!(angle, 90.0, epsilon = 1e-9);
        }
        assert_eq!(g.repeats(), (41, 24));
    }

    #[test]
    fn test_conventional_bonds_are_uniform() {
        let g = Graphene::conventional(1.0, 1.0).unwrap();
        let cell = g.unit_cell().unwrap();
        let r: Vec<Point> = cell.basis.positions();
        for pair in r.windows(2) {
            assert_relative_eq!((pair[1] - pair[0]).norm(), CC_BOND, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_primitive_cell() {
        let g = Graphene::primitive(10.0).unwrap();
        assert_relative_eq!(g.r1().angle(&g.r2()).to_degrees(), 60.0, epsilon = 1e-9);
        let cell = g.unit_cell().unwrap();
        assert_eq!(cell.basis.len(), 2);
        let d = cell.basis.get(1).unwrap().r.coords.norm();
        assert_relative_eq!(d, CC_BOND, epsilon = 1e-12);
    }

    #[test]
    fn test_bn_basis() {
        let g = Graphene::conventional(1.0, 1.0).unwrap().with_basis("B", "N");
        let cell = g.unit_cell().unwrap();
        assert_eq!(cell.basis.elements(), vec!["B", "N", "B", "N"]);
    }

    #[test]
    fn test_invalid_lengths() {
        assert!(Graphene::conventional(-1.0, 10.0).is_err());
        assert!(Graphene::primitive(0.0).is_err());
        assert!(Graphene::primitive(1.0).unwrap().with_bond(0.0).is_err());
    }
}
