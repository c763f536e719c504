// src/generators/unrolled_swnt.rs

use super::{pluralize, stack_layers, GeneratorCore, GeneratorState, StructureGenerator};
use crate::error::Result;
use crate::physics::operations::SuperCell;
use crate::structures::swnt::UnrolledSwnt;
use crate::utils::geometry::{Axis, Vector};

/// Flattened nanotube sheets in the xz plane, stacked along y.
#[derive(Debug, Clone)]
pub struct UnrolledSwntGenerator {
  params: UnrolledSwnt,
  core: GeneratorCore,
  lattice_shift: Vector,
}

impl UnrolledSwntGenerator {
  pub fn new(params: UnrolledSwnt) -> Self {
    Self {
      params,
      core: GeneratorCore::default(),
      lattice_shift: Vector::zeros(),
    }
  }

  pub fn params(&self) -> &UnrolledSwnt {
    &self.params
  }

  /// Offset from the tiled sheet's centroid to the recentered first layer,
  /// with the z component scaled by the layer count.
  pub fn lattice_shift(&self) -> &Vector {
    &self.lattice_shift
  }
}

impl StructureGenerator for UnrolledSwntGenerator {
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
    let tiled_centroid = supercell.atoms.centroid();
    let mut layer0 = supercell.into_atoms();
    self.core.advance(GeneratorState::Tiled);

    layer0.center_centroid();
    let layers = &self.params.layers;
    let mut shift = Vector::between(tiled_centroid, layer0.centroid());
    shift.set_z(layers.nlayers() as f64 * shift.z());
    self.lattice_shift = shift;

    self.core.atoms = stack_layers(&layer0, layers, Axis::Y);
    if layers.nlayers() > 1 {
      self.core.advance(GeneratorState::LayersTransformed);
    }

    if finalize {
      self.core.finalize();
    }
    log::info!("generated {}: {} atoms", self.description(), self.core.atoms.len());
    Ok(())
  }

  /// e.g. `unrolled_(10,5)_1cellx1cell`.
  fn generate_fname(&self) -> String {
    format!(
      "unrolled_{}_{}x{}",
      self.params.chirality,
      pluralize(self.params.n1, "cell"),
      pluralize(self.params.n3, "cell")
    )
  }

  fn description(&self) -> String {
    let [e1, e2] = &self.params.basis;
    format!(
      "{}-layer unrolled {}{} SWNT {}, {} x {}",
      self.params.layers.nlayers(),
      e1,
      e2,
      self.params.chirality,
      pluralize(self.params.n1, " cell"),
      pluralize(self.params.n3, " cell")
    )
  }
}
