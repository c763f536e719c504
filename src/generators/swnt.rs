// src/generators/swnt.rs

use super::{pluralize, GeneratorCore, GeneratorState, StructureGenerator};
use crate::error::Result;
use crate::physics::operations::SuperCell;
use crate::structures::swnt::Swnt;

/// Nanotube along z built from `n3` translational unit cells.
#[derive(Debug, Clone)]
pub struct SwntGenerator {
  params: Swnt,
  core: GeneratorCore,
}

impl SwntGenerator {
  pub fn new(params: Swnt) -> Self {
    Self {
      params,
      core: GeneratorCore::default(),
    }
  }

  pub fn params(&self) -> &Swnt {
    &self.params
  }
}

impl StructureGenerator for SwntGenerator {
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
    let mut atoms = supercell.into_atoms();
    for atom in atoms.iter_mut() {
      atom.mol = 1;
    }
    self.core.atoms = atoms;
    self.core.advance(GeneratorState::Tiled);

    if finalize {
      self.core.finalize();
    }
    log::info!(
      "generated {}: {} atoms, {:.3} nm long",
      self.description(),
      self.core.atoms.len(),
      self.params.tube_length()
    );
    Ok(())
  }

  /// e.g. `1005_1cell` for a single (10,5) cell.
  fn generate_fname(&self) -> String {
    let ch = self.params.chirality;
    format!("{:02}{:02}_{}", ch.n, ch.m, pluralize(self.params.n3, "cell"))
  }

  fn description(&self) -> String {
    let [e1, e2] = &self.params.basis;
    format!(
      "{}{} SWNT {} dt={:.4} A, {}",
      e1,
      e2,
      self.params.chirality,
      self.params.dt(),
      pluralize(self.params.n3, " cell")
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::io::{read_structure, StructureFormat};

  #[test]
  fn test_generate_tube() {
    let mut gen = SwntGenerator::new(Swnt::new(10, 5).unwrap().with_n3(2).unwrap());
    gen.generate(true).unwrap();
    assert_eq!(gen.atoms().len(), 280);
    assert_eq!(gen.atoms().formula(), "C280");
    assert!(gen.atoms().mol_ids().iter().all(|&m| m == 1));
    gen.generate(true).unwrap();
    assert_eq!(gen.atoms().len(), 280);
  }

  #[test]
  fn test_fname() {
    let gen = SwntGenerator::new(Swnt::new(10, 5).unwrap());
    assert_eq!(gen.generate_fname(), "1005_1cell");
    let gen = SwntGenerator::new(Swnt::new(5, 5).unwrap().with_n3(3).unwrap());
    assert_eq!(gen.generate_fname(), "0505_3cells");
  }

  #[test]
  fn test_save_centers_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut gen = SwntGenerator::new(Swnt::new(5, 5).unwrap().with_basis("B", "N"));
    let path = gen
      .save(None, Some(dir.path()), Some(StructureFormat::Xyz), true)
      .unwrap();
    assert_eq!(path, dir.path().join("0505_1cell.xyz"));

    let data = read_structure(&path, None).unwrap();
    assert_eq!(data.atoms.len(), gen.atoms().len());
    assert_eq!(data.atoms.formula(), "B10N10");
    assert!(data.atoms.centroid().coords.norm() < 1e-6);
  }
}
