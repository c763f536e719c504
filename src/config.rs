// src/config.rs

use crate::error::{NanoError, Result};
use crate::io::StructureFormat;
use crate::model::atoms::NeighborParams;
use crate::structures::chirality::CC_BOND;
use crate::structures::layers::LAYER_SPACING;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

const QUALIFIER: &str = "org";
const ORGANIZATION: &str = "nanogen";
const APPLICATION: &str = "nanogen";

/// User defaults for the generators and the neighbor analysis.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
  #[serde(default = "default_bond")]
  pub bond: f64,

  #[serde(default = "default_layer_spacing")]
  pub layer_spacing: f64,

  #[serde(default = "default_nn_number")]
  pub nn_number: usize,

  /// `None` means no distance cutoff.
  #[serde(default)]
  pub nn_cutoff: Option<f64>,

  #[serde(default)]
  pub default_format: StructureFormat,

  /// Recenter generated structures on their centroid before writing.
  #[serde(default = "default_true")]
  pub center_centroid: bool,

  /// Comment line written instead of the generator's own description.
  #[serde(default)]
  pub comment_line: Option<String>,
}

fn default_bond() -> f64 {
  CC_BOND
}

fn default_layer_spacing() -> f64 {
  LAYER_SPACING
}

fn default_nn_number() -> usize {
  NeighborParams::default().number
}

fn default_true() -> bool {
  true
}

impl Default for Config {
  fn default() -> Self {
    Self {
      bond: default_bond(),
      layer_spacing: default_layer_spacing(),
      nn_number: default_nn_number(),
      nn_cutoff: None,
      default_format: StructureFormat::Xyz,
      center_centroid: true,
      comment_line: None,
    }
  }
}

impl Config {
  /// Loads config from the standard OS location (e.g. ~/.config/nanogen/settings.json).
  /// A missing or unreadable file falls back to defaults with a warning.
  pub fn load() -> Self {
    let path = Self::get_path();
    if !path.exists() {
      log::debug!("no config at {:?}, using defaults", path);
      return Self::default();
    }
    match Self::load_from(&path) {
      Ok(cfg) => {
        log::debug!("config loaded from {:?}", path);
        cfg
      }
      Err(e) => {
        log::warn!("ignoring config {:?}: {}", path, e);
        Self::default()
      }
    }
  }

  pub fn load_from(path: &Path) -> Result<Self> {
    let reader = BufReader::new(File::open(path)?);
    let cfg: Config = serde_json::from_reader(reader)
      .map_err(|e| NanoError::config("config file", e.to_string()))?;
    cfg.validate()?;
    Ok(cfg)
  }

  /// Saves config to the standard OS location.
  pub fn save(&self) -> Result<PathBuf> {
    let path = Self::get_path();
    self.save_to(&path)?;
    log::info!("config saved to {:?}", path);
    Ok(path)
  }

  pub fn save_to(&self, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, self)
      .map_err(|e| NanoError::config("config file", e.to_string()))
  }

  pub fn validate(&self) -> Result<()> {
    if !(self.bond > 0.0) {
      return Err(NanoError::config("bond", format!("must be > 0, got {}", self.bond)));
    }
    if !(self.layer_spacing >= 0.0) {
      return Err(NanoError::config(
        "layer_spacing",
        format!("must be >= 0, got {}", self.layer_spacing),
      ));
    }
    if let Some(rc) = self.nn_cutoff {
      if !(rc >= 0.0) {
        return Err(NanoError::config("nn_cutoff", format!("must be >= 0, got {}", rc)));
      }
    }
    Ok(())
  }

  /// Neighbor query defaults derived from this config.
  pub fn neighbor_params(&self) -> NeighborParams {
    NeighborParams {
      number: self.nn_number,
      cutoff: self.nn_cutoff.unwrap_or(f64::INFINITY),
      ..NeighborParams::default()
    }
  }

  /// The configured comment line, or `base` when none is set.
  pub fn comment(&self, base: &str) -> String {
    match &self.comment_line {
      Some(line) if !line.is_empty() => line.clone(),
      _ => base.to_string(),
    }
  }

  fn get_path() -> PathBuf {
    if let Some(proj) = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION) {
      proj.config_dir().join("settings.json")
    } else {
      PathBuf::from("settings.json")
    }
  }
}
