// src/io/lammps_data.rs
//
// LAMMPS data files, atom_style full: `id mol type q x y z` per atom.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Vector3;

use super::{StructureData, StructureReader, StructureWriter};
use crate::error::{NanoError, Result};
use crate::model::atom::Atom;
use crate::model::atoms::AtomCollection;
use crate::model::elements::element_by_mass;
use crate::model::lattice::Lattice;

/// Space left between the outermost atoms and the box faces (Å).
pub const BOX_PADDING: f64 = 1.0;

/// Masses are matched to elements within this tolerance (amu).
const MASS_TOL: f64 = 0.05;

#[derive(Debug, Clone, Copy)]
pub struct DataFormat {
    pub box_padding: f64,
}

impl Default for DataFormat {
    fn default() -> Self {
        Self {
            box_padding: BOX_PADDING,
        }
    }
}

fn bad(line: usize, reason: impl Into<String>) -> NanoError {
    NanoError::Format {
        format: "lammps data",
        line,
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Header,
    Masses,
    Atoms,
    Velocities,
    /// Bonds, Angles, coefficient blocks, ...
    Skipped,
}

fn section_for(title: &str) -> Section {
    match title.split_whitespace().next() {
        Some("Masses") => Section::Masses,
        Some("Atoms") => Section::Atoms,
        Some("Velocities") => Section::Velocities,
        _ => Section::Skipped,
    }
}

fn field<T: std::str::FromStr>(parts: &[&str], i: usize, line: usize, what: &str) -> Result<T> {
    let token = parts
        .get(i)
        .ok_or_else(|| bad(line, format!("missing {}", what)))?;
    token
        .parse()
        .map_err(|_| bad(line, format!("invalid {} '{}'", what, token)))
}

struct AtomLine {
    id: usize,
    mol: usize,
    atom_type: usize,
    q: f64,
    r: [f64; 3],
}

pub fn read(path: &Path) -> Result<StructureData> {
    let reader = BufReader::new(File::open(path)?);

    let mut comment = String::new();
    let mut natoms: Option<usize> = None;
    let mut bounds = [(0.0f64, 0.0f64); 3];
    let mut has_box = false;
    let mut masses: BTreeMap<usize, (f64, Option<String>)> = BTreeMap::new();
    let mut atom_lines: Vec<AtomLine> = Vec::new();
    let mut velocities: HashMap<usize, Vector3<f64>> = HashMap::new();
    let mut section = Section::Header;

    for (i, line) in reader.lines().enumerate() {
        let lineno = i + 1;
        let line = line?;
        if i == 0 {
            comment = line.trim().to_string();
            continue;
        }
        let (content, trailing) = match line.split_once('#') {
            Some((c, t)) => (c.trim(), Some(t.trim())),
            None => (line.trim(), None),
        };
        if content.is_empty() {
            continue;
        }
        if content.starts_with(|c: char| c.is_ascii_alphabetic()) {
            section = section_for(content);
            continue;
        }

        let parts: Vec<&str> = content.split_whitespace().collect();
        match section {
            Section::Header => {
                if content.ends_with("atom types") {
                    continue;
                } else if content.ends_with("atoms") {
                    natoms = Some(field(&parts, 0, lineno, "atom count")?);
                } else if let Some(axis) = ["xlo xhi", "ylo yhi", "zlo zhi"]
                    .iter()
                    .position(|tag| content.ends_with(tag))
                {
                    bounds[axis] = (
                        field(&parts, 0, lineno, "lower bound")?,
                        field(&parts, 1, lineno, "upper bound")?,
                    );
                    has_box = true;
                }
            }
            Section::Masses => {
                let t: usize = field(&parts, 0, lineno, "atom type")?;
                let mass: f64 = field(&parts, 1, lineno, "mass")?;
                let label = trailing.filter(|s| !s.is_empty()).map(str::to_string);
                masses.insert(t, (mass, label));
            }
            Section::Atoms => {
                if parts.len() < 7 {
                    return Err(bad(lineno, "expected 'id mol type q x y z'"));
                }
                atom_lines.push(AtomLine {
                    id: field(&parts, 0, lineno, "atom id")?,
                    mol: field(&parts, 1, lineno, "molecule id")?,
                    atom_type: field(&parts, 2, lineno, "atom type")?,
                    q: field(&parts, 3, lineno, "charge")?,
                    r: [
                        field(&parts, 4, lineno, "x")?,
                        field(&parts, 5, lineno, "y")?,
                        field(&parts, 6, lineno, "z")?,
                    ],
                });
            }
            Section::Velocities => {
                let id: usize = field(&parts, 0, lineno, "atom id")?;
                let v = Vector3::new(
                    field(&parts, 1, lineno, "vx")?,
                    field(&parts, 2, lineno, "vy")?,
                    field(&parts, 3, lineno, "vz")?,
                );
                velocities.insert(id, v);
            }
            Section::Skipped => {}
        }
    }

    if let Some(n) = natoms {
        if n != atom_lines.len() {
            return Err(bad(0, format!("header declares {} atoms, found {}", n, atom_lines.len())));
        }
    }

    let atoms: Vec<Atom> = atom_lines
        .into_iter()
        .map(|a| {
            let (mass, label) = masses.get(&a.atom_type).cloned().unwrap_or((0.0, None));
            let element = label
                .or_else(|| element_by_mass(mass, MASS_TOL).map(str::to_string))
                .unwrap_or_else(|| "X".to_string());
            let mut builder = Atom::builder(&element)
                .id(a.id)
                .mol(a.mol)
                .atom_type(a.atom_type)
                .charge(a.q)
                .xyz(a.r[0], a.r[1], a.r[2]);
            if mass > 0.0 {
                builder = builder.mass(mass);
            }
            if let Some(v) = velocities.get(&a.id) {
                builder = builder.velocity(*v);
            }
            builder.build()
        })
        .collect();

    let lattice = if has_box {
        let edge = |axis: usize| bounds[axis].1 - bounds[axis].0;
        Lattice::from_vectors(
            &Vector3::new(edge(0), 0.0, 0.0),
            &Vector3::new(0.0, edge(1), 0.0),
            &Vector3::new(0.0, 0.0, edge(2)),
        )
        .ok()
    } else {
        None
    };

    Ok(StructureData {
        atoms: AtomCollection::from_atoms(atoms),
        comment,
        lattice,
    })
}

/// Per-atom type ids. Unassigned types (0) are numbered by first element appearance.
fn type_ids(atoms: &AtomCollection) -> Vec<usize> {
    if atoms.iter().all(|a| a.atom_type > 0) {
        return atoms.types();
    }
    let mut seen: HashMap<&str, usize> = HashMap::new();
    atoms
        .iter()
        .map(|a| {
            let next = seen.len() + 1;
            *seen.entry(a.element.as_str()).or_insert(next)
        })
        .collect()
}

pub fn write(path: &Path, atoms: &AtomCollection, comment: &str, padding: f64) -> Result<()> {
    let types = type_ids(atoms);
    let renumber = !atoms.ids_are_unique() || atoms.iter().any(|a| a.id == 0);

    let mut masses: BTreeMap<usize, (f64, &str)> = BTreeMap::new();
    for (atom, t) in atoms.iter().zip(&types) {
        masses.entry(*t).or_insert((atom.mass, atom.element.as_str()));
    }

    let (lo, hi) = match atoms.bounding_box() {
        Some(b) => (b.pmin.coords.add_scalar(-padding), b.pmax.coords.add_scalar(padding)),
        None => (Vector3::zeros(), Vector3::zeros()),
    };

    let mut file = BufWriter::new(File::create(path)?);

    writeln!(file, "{}", comment.replace('\n', " "))?;
    writeln!(file)?;
    writeln!(file, "{} atoms", atoms.len())?;
    writeln!(file, "{} atom types", masses.len())?;
    writeln!(file)?;
    for (axis, tag) in ["xlo xhi", "ylo yhi", "zlo zhi"].iter().enumerate() {
        writeln!(file, "{:.8} {:.8} {}", lo[axis], hi[axis], tag)?;
    }

    writeln!(file, "\nMasses\n")?;
    for (t, (mass, element)) in &masses {
        writeln!(file, "{} {:.4} # {}", t, mass, element)?;
    }

    writeln!(file, "\nAtoms # full\n")?;
    for (i, (atom, t)) in atoms.iter().zip(&types).enumerate() {
        let id = if renumber { i + 1 } else { atom.id };
        writeln!(
            file,
            "{} {} {} {:.6} {:.8} {:.8} {:.8}",
            id, atom.mol, t, atom.q, atom.r.x, atom.r.y, atom.r.z
        )?;
    }

    if atoms.iter().any(|a| a.v != Vector3::zeros()) {
        writeln!(file, "\nVelocities\n")?;
        for (i, atom) in atoms.iter().enumerate() {
            let id = if renumber { i + 1 } else { atom.id };
            writeln!(file, "{} {:.8} {:.8} {:.8}", id, atom.v.x, atom.v.y, atom.v.z)?;
        }
    }

    file.flush()?;
    Ok(())
}

impl StructureReader for DataFormat {
    fn read(&self, path: &Path) -> Result<StructureData> {
        read(path)
    }
}

impl StructureWriter for DataFormat {
    fn write(&self, path: &Path, atoms: &AtomCollection, comment: &str) -> Result<()> {
        write(path, atoms, comment, self.box_padding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::fs;

    fn sample() -> AtomCollection {
        vec![
            Atom::builder("B").id(1).mol(1).atom_type(1).charge(0.3).xyz(0.0, 0.0, 0.0).build(),
            Atom::builder("N")
                .id(2)
                .mol(1)
                .atom_type(2)
                .charge(-0.3)
                .xyz(1.45, 0.0, 0.0)
                .velocity(Vector3::new(0.1, 0.0, -0.2))
                .build(),
            Atom::builder("B").id(3).mol(2).atom_type(1).charge(0.3).xyz(0.0, 2.5, 0.0).build(),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_write_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bn.data");
        write(&path, &sample(), "BN test", 1.0).unwrap();
        let text = fs::read_to_string(&path).unwrap();

        assert!(text.starts_with("BN test\n"));
        assert!(text.contains("3 atoms\n"));
        assert!(text.contains("2 atom types\n"));
        assert!(text.contains("-1.00000000 2.45000000 xlo xhi"));
        assert!(text.contains("1 10.8100 # B"));
        assert!(text.contains("Atoms # full"));
        assert!(text.contains("Velocities"));
    }

    #[test]
    fn test_read_back_full_style() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bn.data");
        write(&path, &sample(), "BN test", 1.0).unwrap();

        let data = read(&path).unwrap();
        let atoms = data.atoms;
        assert_eq!(atoms.ids(), vec![1, 2, 3]);
        assert_eq!(atoms.mol_ids(), vec![1, 1, 2]);
        assert_eq!(atoms.types(), vec![1, 2, 1]);
        assert_eq!(atoms.elements(), vec!["B", "N", "B"]);
        assert_relative_eq!(atoms.net_charge(), 0.3, epsilon = 1e-9);
        assert_relative_eq!(atoms.get(1).unwrap().v.z, -0.2, epsilon = 1e-9);
        let lengths = data.lattice.unwrap().lengths();
        assert_relative_eq!(lengths[0], 3.45, epsilon = 1e-8);
    }

    #[test]
    fn test_element_from_mass_without_label() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.data");
        fs::write(
            &path,
            "carbon\n\n1 atoms\n1 atom types\n\n0 5 xlo xhi\n0 5 ylo yhi\n0 5 zlo zhi\n\nMasses\n\n1 12.0107\n\nAtoms\n\n1 1 1 0.0 1.0 2.0 3.0\n",
        )
        .unwrap();
        let data = read(&path).unwrap();
        assert_eq!(data.atoms.elements(), vec!["C"]);
        assert_relative_eq!(data.atoms.get(0).unwrap().z(), 3.0);
    }

    #[test]
    fn test_truncated_atom_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.data");
        fs::write(&path, "bad\n\n1 atoms\n\nAtoms\n\n1 1 1 0.0 1.0\n").unwrap();
        match read(&path) {
            Err(NanoError::Format { line, .. }) => assert_eq!(line, 7),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_untyped_atoms_get_types_by_element() {
        let atoms: AtomCollection = vec![
            Atom::builder("C").build(),
            Atom::builder("H").build(),
            Atom::builder("C").build(),
        ]
        .into_iter()
        .collect();
        assert_eq!(type_ids(&atoms), vec![1, 2, 1]);
    }
}
