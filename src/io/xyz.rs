// src/io/xyz.rs
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Vector3;

use super::{StructureData, StructureReader, StructureWriter};
use crate::error::{NanoError, Result};
use crate::model::atom::Atom;
use crate::model::atoms::AtomCollection;
use crate::model::elements::normalize_element;
use crate::model::lattice::Lattice;

/// Plain/extended XYZ: count line, comment line, then `El x y z` per atom.
#[derive(Debug, Clone, Copy, Default)]
pub struct XyzFormat;

fn bad(line: usize, reason: impl Into<String>) -> NanoError {
    NanoError::Format {
        format: "xyz",
        line,
        reason: reason.into(),
    }
}

/// Parses `Lattice="ax ay az bx by bz cx cy cz"` out of an extended XYZ comment.
fn parse_lattice(comment: &str) -> Option<Lattice> {
    let start = comment.find("Lattice=\"")?;
    let remainder = &comment[start + 9..];
    let end = remainder.find('"')?;
    let parts: Vec<f64> = remainder[..end]
        .split_whitespace()
        .filter_map(|s| s.parse().ok())
        .collect();
    if parts.len() != 9 {
        return None;
    }
    let row = |i: usize| Vector3::new(parts[3 * i], parts[3 * i + 1], parts[3 * i + 2]);
    Lattice::from_vectors(&row(0), &row(1), &row(2)).ok()
}

fn parse_coord(token: &str, line: usize, axis: char) -> Result<f64> {
    token
        .parse()
        .map_err(|_| bad(line, format!("invalid {} coordinate '{}'", axis, token)))
}

pub fn read(path: &Path) -> Result<StructureData> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines();

    let count_line = lines.next().ok_or_else(|| bad(1, "empty file"))??;
    let natoms: usize = count_line
        .trim()
        .parse()
        .map_err(|_| bad(1, format!("invalid atom count '{}'", count_line.trim())))?;

    let comment = lines.next().transpose()?.unwrap_or_default();
    let lattice = parse_lattice(&comment);

    let mut atoms = Vec::with_capacity(natoms);
    for (i, line) in lines.enumerate() {
        if atoms.len() == natoms {
            break;
        }
        let lineno = i + 3;
        let line = line?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }
        if parts.len() < 4 {
            return Err(bad(lineno, "expected 'element x y z'"));
        }
        let element = normalize_element(parts[0]).unwrap_or(parts[0]);
        let x = parse_coord(parts[1], lineno, 'x')?;
        let y = parse_coord(parts[2], lineno, 'y')?;
        let z = parse_coord(parts[3], lineno, 'z')?;
        atoms.push(
            Atom::builder(element)
                .id(atoms.len() + 1)
                .xyz(x, y, z)
                .build(),
        );
    }

    if atoms.len() != natoms {
        return Err(bad(
            atoms.len() + 3,
            format!("header declares {} atoms, found {}", natoms, atoms.len()),
        ));
    }

    let mut atoms = AtomCollection::from_atoms(atoms);
    atoms.assign_unique_types();
    Ok(StructureData {
        atoms,
        comment: comment.trim_end().to_string(),
        lattice,
    })
}

pub fn write(path: &Path, atoms: &AtomCollection, comment: &str) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);

    writeln!(file, "{}", atoms.len())?;
    // a newline in the comment would shift every atom line
    writeln!(file, "{}", comment.replace('\n', " "))?;
    for atom in atoms {
        writeln!(
            file,
            "{:<3} {:>16.8} {:>16.8} {:>16.8}",
            atom.element, atom.r.x, atom.r.y, atom.r.z
        )?;
    }
    file.flush()?;
    Ok(())
}

impl StructureReader for XyzFormat {
    fn read(&self, path: &Path) -> Result<StructureData> {
        read(path)
    }
}

impl StructureWriter for XyzFormat {
    fn write(&self, path: &Path, atoms: &AtomCollection, comment: &str) -> Result<()> {
        write(path, atoms, comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::fs;

    #[test]
    fn test_read_extended_lattice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pair.xyz");
        fs::write(
            &path,
            "2\nLattice=\"10 0 0 0 10 0 0 0 4.2\" Properties=species:S:1:pos:R:3\nC 0.0 0.0 0.0\n6 1.42 0.0 0.0\n",
        )
        .unwrap();

        let data = read(&path).unwrap();
        assert_eq!(data.atoms.len(), 2);
        assert_eq!(data.atoms.elements(), vec!["C", "C"]);
        assert_eq!(data.atoms.ids(), vec![1, 2]);
        assert_eq!(data.atoms.types(), vec![1, 1]);
        let lattice = data.lattice.unwrap();
        assert_relative_eq!(lattice.lengths()[2], 4.2, epsilon = 1e-12);
        assert!(data.comment.starts_with("Lattice="));
    }

    #[test]
    fn test_bad_coordinate_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.xyz");
        fs::write(&path, "2\n\nC 0 0 0\nC 0 zero 0\n").unwrap();
        match read(&path) {
            Err(NanoError::Format { line, .. }) => assert_eq!(line, 4),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_short_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.xyz");
        fs::write(&path, "3\ncomment\nC 0 0 0\n").unwrap();
        assert!(matches!(read(&path), Err(NanoError::Format { .. })));
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xyz");
        let atoms: AtomCollection = vec![
            Atom::builder("B").xyz(0.5, -1.25, 3.0).build(),
            Atom::builder("N").xyz(1.95, -1.25, 3.0).build(),
        ]
        .into_iter()
        .collect();
        write(&path, &atoms, "hBN\nfragment").unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().nth(1), Some("hBN fragment"));

        let back = read(&path).unwrap();
        assert_eq!(back.atoms.formula(), "BN");
        assert_relative_eq!(back.atoms.get(0).unwrap().y(), -1.25, epsilon = 1e-8);
        assert!(back.lattice.is_none());
    }
}
