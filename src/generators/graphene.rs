// src/generators/graphene.rs

use super::{stack_layers, GeneratorCore, GeneratorState, StructureGenerator};
use crate::error::Result;
use crate::physics::operations::SuperCell;
use crate::structures::graphene::{Graphene, GrapheneCell};
use crate::structures::layers::Layers;
use crate::utils::geometry::Axis;

/// Single- or multi-layer graphene sheets stacked along z.
#[derive(Debug, Clone)]
pub struct GrapheneGenerator {
  params: Graphene,
  core: GeneratorCore,
}

impl GrapheneGenerator {
  pub fn new(params: Graphene) -> Self {
    Self {
      params,
      core: GeneratorCore::default(),
    }
  }

  /// Two AB-stacked layers, the second rotated by `rotation` about z.
  pub fn bilayer(params: Graphene, spacing: f64, rotation: f64, degrees: bool) -> Result<Self> {
    let layers = Layers::new(2, spacing)?
      .with_shift(params.ab_shift())
      .with_rotation_increment(rotation, degrees);
    Ok(Self::new(params.with_layers(layers)))
  }

  pub fn params(&self) -> &Graphene {
    &self.params
  }
}

impl StructureGenerator for GrapheneGenerator {
  fn core(&self) -> &GeneratorCore {
    &self.core
  }

  fn core_mut(&mut self) -> &mut GeneratorCore {
    &mut self.core
  }

  fn generate(&mut self, finalize: bool) -> Result<()> {
    self.core.reset();

    let unit_cell = self.params.unit_cell()?;
    self.core.advance(GeneratorState::BasisBuilt);

    let supercell = SuperCell::new(&unit_cell, self.params.scaling_matrix()?)?;
    self.core.lattice = Some(supercell.lattice.clone());
    let mut layer0 = supercell.into_atoms();
    self.core.advance(GeneratorState::Tiled);

    layer0.center_centroid();
    let layers = &self.params.layers;
    self.core.atoms = stack_layers(&layer0, layers, Axis::Z);
    if layers.nlayers() > 1 {
      self.core.advance(GeneratorState::LayersTransformed);
    }

    if finalize {
      self.core.finalize();
    }
    log::info!("generated {}: {} atoms", self.description(), self.core.atoms.len());
    Ok(())
  }

  fn generate_fname(&self) -> String {
    let n = self.params.layers.nlayers();
    match self.params.cell {
      GrapheneCell::Conventional {
        armchair_edge_length,
        zigzag_edge_length,
      } => format!("{}layer_graphene_{}nmx{}nm", n, armchair_edge_length, zigzag_edge_length),
      GrapheneCell::Primitive { edge_length } => {
        format!("{}layer_graphene_primitive_{}nm", n, edge_length)
      }
    }
  }

  fn description(&self) -> String {
    let [e1, e2] = &self.params.basis;
    let kind = match self.params.cell {
      GrapheneCell::Conventional { .. } => "conventional",
      GrapheneCell::Primitive { .. } => "primitive",
    };
    format!(
      "{}-layer {}{} graphene ({} cell, bond {} A)",
      self.params.layers.nlayers(),
      e1,
      e2,
      kind,
      self.params.bond
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::utils::geometry::rotate_point;
  use crate::utils::geometry::Point;
  use approx::assert_relative_eq;
  use nalgebra::{Rotation3, Vector3};
  use std::f64::consts::FRAC_PI_4;

  #[test]
  fn test_generate_is_idempotent() {
    let mut gen = GrapheneGenerator::new(Graphene::conventional(1.0, 1.0).unwrap());
    gen.generate(true).unwrap();
    let first = gen.atoms().len();
    gen.generate(true).unwrap();
    assert_eq!(gen.atoms().len(), first);
    // (5 x 3) conventional cells of 4 atoms
    assert_eq!(first, 60);
    assert_eq!(gen.state(), GeneratorState::Finalized);
    assert_eq!(gen.atoms().ids(), (1..=60).collect::<Vec<_>>());
  }

  #[test]
  fn test_fname() {
    let gen = GrapheneGenerator::new(Graphene::conventional(10.0, 5.0).unwrap());
    assert_eq!(gen.generate_fname(), "1layer_graphene_10nmx5nm");
    let gen = GrapheneGenerator::bilayer(Graphene::conventional(2.5, 2.5).unwrap(), 3.35, 0.0, true).unwrap();
    assert_eq!(gen.generate_fname(), "2layer_graphene_2.5nmx2.5nm");
  }

  #[test]
  fn test_bilayer_rotation() {
    let params = Graphene::conventional(1.0, 1.0).unwrap();
    let mut gen = GrapheneGenerator::bilayer(params, 3.35, 45.0, true).unwrap();
    gen.generate(true).unwrap();
    assert_eq!(gen.state(), GeneratorState::Finalized);

    let atoms = gen.atoms();
    let bottom: Vec<_> = atoms.iter().filter(|a| a.mol == 1).collect();
    let top: Vec<_> = atoms.iter().filter(|a| a.mol == 2).collect();
    assert_eq!(bottom.len(), top.len());

    let shift = gen.params().ab_shift();
    let rot = Rotation3::from_axis_angle(&Vector3::z_axis(), FRAC_PI_4);
    for (b, t) in bottom.iter().zip(&top) {
      let expected = rotate_point(&(b.r + shift + Vector3::new(0.0, 0.0, 3.35)), &rot, &Point::origin());
      assert_relative_eq!(t.r, expected, epsilon = 1e-9);
    }
  }

  #[test]
  fn test_layer_is_centered_before_stacking() {
    let mut gen = GrapheneGenerator::new(Graphene::primitive(1.0).unwrap());
    gen.generate(false).unwrap();
    assert_eq!(gen.state(), GeneratorState::Tiled);
    let c = gen.atoms().centroid();
    assert_relative_eq!(c.coords.norm(), 0.0, epsilon = 1e-9);
    assert!(gen.lattice().is_some());
  }
}
