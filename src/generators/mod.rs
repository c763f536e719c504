// src/generators/mod.rs
//
// Generators turn structural parameter sets into atom collections:
// unit cell -> supercell tiling -> optional layer stacking -> finalize.

pub mod graphene;
pub mod swnt;
pub mod unrolled_swnt;

pub use graphene::GrapheneGenerator;
pub use swnt::SwntGenerator;
pub use unrolled_swnt::UnrolledSwntGenerator;

use crate::error::Result;
use crate::io::{self, StructureFormat};
use crate::model::atoms::AtomCollection;
use crate::model::lattice::Lattice;
use crate::structures::layers::Layers;
use crate::utils::geometry::{Axis, Point};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum GeneratorState {
  #[default]
  Uninitialized,
  BasisBuilt,
  Tiled,
  LayersTransformed,
  Finalized,
}

impl fmt::Display for GeneratorState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      GeneratorState::Uninitialized => "uninitialized",
      GeneratorState::BasisBuilt => "basis built",
      GeneratorState::Tiled => "tiled",
      GeneratorState::LayersTransformed => "layers transformed",
      GeneratorState::Finalized => "finalized",
    };
    f.write_str(s)
  }
}

/// Output shared by every generator.
#[derive(Debug, Clone, Default)]
pub struct GeneratorCore {
  pub atoms: AtomCollection,
  pub lattice: Option<Lattice>,
  state: GeneratorState,
}

impl GeneratorCore {
  /// Drop any previous result so a new `generate` starts from scratch.
  pub fn reset(&mut self) {
    self.atoms.clear();
    self.lattice = None;
    self.state = GeneratorState::Uninitialized;
  }

  pub fn state(&self) -> GeneratorState {
    self.state
  }

  pub fn advance(&mut self, state: GeneratorState) {
    log::debug!("generator: {} -> {}", self.state, state);
    self.state = state;
  }

  /// Unique ids from 1, element-ordered types, fresh type index.
  pub fn finalize(&mut self) {
    self.atoms.assign_unique_ids(1);
    self.atoms.assign_unique_types();
    self.atoms.rebuild_type_index();
    self.advance(GeneratorState::Finalized);
  }
}

pub trait StructureGenerator {
  fn core(&self) -> &GeneratorCore;

  fn core_mut(&mut self) -> &mut GeneratorCore;

  /// Build the structure. Any earlier result is discarded first, so repeated
  /// calls produce the same atoms.
  fn generate(&mut self, finalize: bool) -> Result<()>;

  /// Canonical file stem derived from the structural parameters.
  fn generate_fname(&self) -> String;

  /// One-line description used as the file comment.
  fn description(&self) -> String;

  fn atoms(&self) -> &AtomCollection {
    &self.core().atoms
  }

  fn atoms_mut(&mut self) -> &mut AtomCollection {
    &mut self.core_mut().atoms
  }

  fn lattice(&self) -> Option<&Lattice> {
    self.core().lattice.as_ref()
  }

  fn state(&self) -> GeneratorState {
    self.core().state()
  }

  fn finalize(&mut self) {
    self.core_mut().finalize();
  }

  /// Atoms of layer `index` (molecule id `index + 1`).
  fn layer(&self, index: usize) -> AtomCollection {
    self
      .atoms()
      .iter()
      .filter(|a| a.mol == index + 1)
      .cloned()
      .collect()
  }

  /// Write the structure, generating it first if needed.
  ///
  /// `fname` defaults to [`generate_fname`](Self::generate_fname); a name that
  /// already carries a known extension is used as is. When `center_centroid`
  /// is set the atoms are recentered in place once, then written unchanged.
  fn save(
    &mut self,
    fname: Option<&str>,
    outpath: Option<&Path>,
    format: Option<StructureFormat>,
    center_centroid: bool,
  ) -> Result<PathBuf> {
    let comment = self.description();
    self.save_with_comment(fname, outpath, format, center_centroid, &comment)
  }

  /// [`save`](Self::save) with an explicit comment line.
  fn save_with_comment(
    &mut self,
    fname: Option<&str>,
    outpath: Option<&Path>,
    format: Option<StructureFormat>,
    center_centroid: bool,
    comment: &str,
  ) -> Result<PathBuf> {
    if self.state() == GeneratorState::Uninitialized {
      self.generate(true)?;
    }
    let path = resolve_output(fname, &self.generate_fname(), outpath, format);
    if center_centroid {
      self.atoms_mut().center_centroid();
    }
    io::write_structure(&path, self.atoms(), format, comment)?;
    Ok(path)
  }
}

fn resolve_output(
  fname: Option<&str>,
  default_stem: &str,
  outpath: Option<&Path>,
  format: Option<StructureFormat>,
) -> PathBuf {
  if let Some(name) = fname {
    if StructureFormat::from_path(Path::new(name)).is_ok() {
      return match outpath {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
      };
    }
  }
  let stem = fname.unwrap_or(default_stem);
  io::output_path(stem, outpath, format.unwrap_or_default())
}

/// "1cell", "3cells".
pub fn pluralize(count: u32, noun: &str) -> String {
  if count == 1 {
    format!("{}{}", count, noun)
  } else {
    format!("{}{}s", count, noun)
  }
}

/// Copies `layer0` once per layer: layer `i` is offset by `i * spacing` along
/// `stack_axis`, tagged with molecule id `i + 1`, shifted by the layer shift
/// when `i` is odd, and rotated about z through the origin.
pub fn stack_layers(layer0: &AtomCollection, layers: &Layers, stack_axis: Axis) -> AtomCollection {
  let mut stacked = AtomCollection::new();
  let offset = stack_axis.unit_vector() * layers.spacing();
  for (i, &angle) in layers.rotation_angles().iter().enumerate() {
    let mut layer = layer0.clone();
    layer.translate(&(offset * i as f64));
    for atom in layer.iter_mut() {
      atom.mol = i + 1;
    }
    if i % 2 == 1 {
      layer.translate(&layers.shift());
    }
    if angle != 0.0 {
      layer.rotate_about(angle, Axis::Z, Some(Point::origin()));
    }
    stacked.extend(layer.into_vec());
  }
  stacked
}
