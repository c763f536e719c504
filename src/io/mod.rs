// src/io/mod.rs
pub mod lammps_data;
pub mod xyz;

use crate::error::{NanoError, Result};
use crate::model::atoms::AtomCollection;
use crate::model::lattice::Lattice;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Structure file formats known to the reader/writer dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StructureFormat {
    #[default]
    Xyz,
    /// LAMMPS data file, atom_style full
    Data,
    /// LAMMPS dump; recognized but not supported
    Dump,
}

impl StructureFormat {
    pub const ALL: [StructureFormat; 3] = [StructureFormat::Xyz, StructureFormat::Data, StructureFormat::Dump];

    pub fn extension(self) -> &'static str {
        match self {
            StructureFormat::Xyz => "xyz",
            StructureFormat::Data => "data",
            StructureFormat::Dump => "dump",
        }
    }

    /// Infer from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| NanoError::UnsupportedFormat(format!("{} has no extension", path.display())))?;
        ext.parse()
    }
}

impl FromStr for StructureFormat {
    type Err = NanoError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim_start_matches('.').to_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.extension() == lower)
            .ok_or(NanoError::UnsupportedFormat(s.to_string()))
    }
}

impl fmt::Display for StructureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// What a reader hands back: the atoms, the comment/title line and the
/// simulation cell when the file carries one.
#[derive(Debug, Clone, Default)]
pub struct StructureData {
    pub atoms: AtomCollection,
    pub comment: String,
    pub lattice: Option<Lattice>,
}

pub trait StructureReader {
    fn read(&self, path: &Path) -> Result<StructureData>;
}

/// Writers serialize a collection without modifying it.
pub trait StructureWriter {
    fn write(&self, path: &Path, atoms: &AtomCollection, comment: &str) -> Result<()>;
}

pub trait StructureConverter {
    fn convert(&self, infile: &Path, outfile: &Path) -> Result<()>;
}

pub fn reader_for(format: StructureFormat) -> Result<Box<dyn StructureReader>> {
    match format {
        StructureFormat::Xyz => Ok(Box::new(xyz::XyzFormat)),
        StructureFormat::Data => Ok(Box::new(lammps_data::DataFormat::default())),
        StructureFormat::Dump => Err(NanoError::UnsupportedFormat("dump".into())),
    }
}

pub fn writer_for(format: StructureFormat) -> Result<Box<dyn StructureWriter>> {
    match format {
        StructureFormat::Xyz => Ok(Box::new(xyz::XyzFormat)),
        StructureFormat::Data => Ok(Box::new(lammps_data::DataFormat::default())),
        StructureFormat::Dump => Err(NanoError::UnsupportedFormat("dump".into())),
    }
}

fn resolve(path: &Path, format: Option<StructureFormat>) -> Result<StructureFormat> {
    match format {
        Some(f) => Ok(f),
        None => StructureFormat::from_path(path),
    }
}

/// Read `path`, inferring the format from its extension unless one is given.
pub fn read_structure(path: &Path, format: Option<StructureFormat>) -> Result<StructureData> {
    let format = resolve(path, format)?;
    let data = reader_for(format)?.read(path)?;
    log::info!("read {} atoms from {} ({})", data.atoms.len(), path.display(), format);
    Ok(data)
}

pub fn write_structure(
    path: &Path,
    atoms: &AtomCollection,
    format: Option<StructureFormat>,
    comment: &str,
) -> Result<()> {
    let format = resolve(path, format)?;
    writer_for(format)?.write(path, atoms, comment)?;
    log::info!("wrote {} atoms to {} ({})", atoms.len(), path.display(), format);
    Ok(())
}

/// `<outpath>/<stem>.<ext>`, or `<stem>.<ext>` in the working directory.
pub fn output_path(stem: &str, outpath: Option<&Path>, format: StructureFormat) -> PathBuf {
    let file = format!("{}.{}", stem, format.extension());
    match outpath {
        Some(dir) => dir.join(file),
        None => PathBuf::from(file),
    }
}

/// Reads one format and writes another; atom data passes through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatConverter {
    pub from: Option<StructureFormat>,
    pub to: Option<StructureFormat>,
}

impl StructureConverter for FormatConverter {
    fn convert(&self, infile: &Path, outfile: &Path) -> Result<()> {
        let data = read_structure(infile, self.from)?;
        write_structure(outfile, &data.atoms, self.to, &data.comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom::Atom;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(StructureFormat::from_path(Path::new("a/b/tube.XYZ")).unwrap(), StructureFormat::Xyz);
        assert_eq!(StructureFormat::from_path(Path::new("sheet.data")).unwrap(), StructureFormat::Data);
        assert!(StructureFormat::from_path(Path::new("noext")).is_err());
        assert!(matches!("pdb".parse::<StructureFormat>(), Err(NanoError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_dump_is_unsupported() {
        assert!(writer_for(StructureFormat::Dump).is_err());
        assert!(reader_for(StructureFormat::Dump).is_err());
    }

    #[test]
    fn test_convert_xyz_to_data() {
        let dir = tempfile::tempdir().unwrap();
        let xyz_path = dir.path().join("in.xyz");
        let data_path = dir.path().join("out.data");

        let mut atoms: AtomCollection = vec![
            Atom::builder("B").xyz(0.0, 0.0, 0.0).build(),
            Atom::builder("N").xyz(1.45, 0.0, 0.0).build(),
        ]
        .into_iter()
        .collect();
        atoms.assign_unique_ids(1);
        write_structure(&xyz_path, &atoms, None, "BN pair").unwrap();

        FormatConverter::default().convert(&xyz_path, &data_path).unwrap();
        let back = read_structure(&data_path, None).unwrap();
        assert_eq!(back.atoms.elements(), vec!["B", "N"]);
        assert_eq!(back.comment, "BN pair");
        assert!((back.atoms.get(1).unwrap().x() - 1.45).abs() < 1e-6);
    }

    #[test]
    fn test_output_path() {
        let p = output_path("1005_1cell", Some(Path::new("/tmp/out")), StructureFormat::Data);
        assert_eq!(p, PathBuf::from("/tmp/out/1005_1cell.data"));
    }
}
