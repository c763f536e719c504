// src/utils/report.rs

use crate::model::atoms::AtomCollection;
use crate::utils::geometry;
use std::collections::BTreeMap;

const PREVIEW_ATOMS: usize = 20;

/// Formula line plus a table of the first atoms.
pub fn structure_summary(atoms: &AtomCollection, title: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("Structure: {}\n", title));
    out.push_str(&format!("Formula: {} ({} atoms)\n", atoms.formula(), atoms.len()));
    out.push_str("--------------------------------------------------------------\n");
    out.push_str(&format!(
        "{:<8} {:<8} {:<6} {:<6} {:<10} {:<10} {:<10}\n",
        "Id", "Element", "Type", "Mol", "X", "Y", "Z"
    ));
    out.push_str("--------------------------------------------------------------\n");

    for atom in atoms.iter().take(PREVIEW_ATOMS) {
        out.push_str(&format!(
            "{:<8} {:<8} {:<6} {:<6} {:<10.4} {:<10.4} {:<10.4}\n",
            atom.id, atom.element, atom.atom_type, atom.mol, atom.r.x, atom.r.y, atom.r.z
        ));
    }

    if atoms.len() > PREVIEW_ATOMS {
        out.push_str(&format!("... and {} more atoms.\n", atoms.len() - PREVIEW_ATOMS));
    }

    out
}

/// Histogram of coordination numbers, e.g. "CN 3: 120 atoms".
pub fn coordination_summary(cns: &[usize]) -> String {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for &cn in cns {
        *counts.entry(cn).or_insert(0) += 1;
    }

    let mut out = String::from("Coordination numbers:\n");
    if counts.is_empty() {
        out.push_str("  (no atoms)\n");
    }
    for (cn, count) in counts {
        out.push_str(&format!("  CN {}: {} atoms\n", cn, count));
    }
    out
}

/// Distance between two atoms, or the A-B-C angle for three, looked up by id.
pub fn geometry_analysis(atoms: &AtomCollection, ids: &[usize]) -> String {
    let mut found = Vec::with_capacity(ids.len());
    for &id in ids {
        match atoms.get_atom(id) {
            Some(atom) => found.push(atom),
            None => return format!("No atom with id {}.", id),
        }
    }

    let labels: Vec<String> = found.iter().map(|a| format!("#{} {}", a.id, a.element)).collect();
    let mut out = format!("Atoms: {}\n", labels.join(" - "));
    match found.as_slice() {
        [a, b] => {
            let d = geometry::calculate_distance(&a.r, &b.r);
            out.push_str(&format!("Distance: {:.5} A", d));
        }
        [a, b, c] => {
            let angle = geometry::calculate_angle(&a.r, &b.r, &c.r);
            let d1 = geometry::calculate_distance(&a.r, &b.r);
            let d2 = geometry::calculate_distance(&b.r, &c.r);
            out.push_str(&format!("Angle (A-B-C): {:.2} deg\n", angle));
            out.push_str(&format!("Dist (A-B):    {:.4} A\n", d1));
            out.push_str(&format!("Dist (B-C):    {:.4} A", d2));
        }
        _ => out.push_str("Give 2 or 3 atom ids to measure."),
    }
    out
}
