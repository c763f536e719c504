// src/model/atoms.rs

use crate::error::{NanoError, Result};
use crate::model::atom::{Atom, NeighborRef};
use crate::model::poav::Poav;
use crate::model::regions::Cuboid;
use crate::physics::neighbors::{NeighborQuery, Norm, SpatialIndex};
use crate::selection::Selection;
use crate::utils::geometry::{rotate_point, rotation_matrix, Axis, Point};
use nalgebra::{Rotation3, Vector3};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

/// Defaults used by the parameterless neighbor updates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NeighborParams {
    pub number: usize,
    pub cutoff: f64,
    pub norm: Norm,
}

impl Default for NeighborParams {
    fn default() -> Self {
        Self {
            number: 6,
            cutoff: f64::INFINITY,
            norm: Norm::Euclidean,
        }
    }
}

/// Mass and charge recorded for one element.
#[derive(Clone, Debug, PartialEq)]
pub struct AtomTypeEntry {
    pub mass: f64,
    pub q: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SortKey {
    /// (element, atomic number, type, molecule id, id)
    #[default]
    Composite,
    Id,
    Element,
    MolId,
    Type,
    X,
    Y,
    Z,
}

/// Ordered atom container.
///
/// Bulk views (`positions`, `ids`, ...) are computed from the atoms on every
/// call. Two derived states are cached and explicitly invalidated instead:
/// per-atom coordination numbers / neighbor lists, and the element type index.
#[derive(Clone, Debug)]
pub struct AtomCollection {
    atoms: Vec<Atom>,
    nn: NeighborParams,
    type_index: Option<BTreeMap<String, AtomTypeEntry>>,
    revision: u64,
}

impl Default for AtomCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Atom> for AtomCollection {
    fn from_iter<I: IntoIterator<Item = Atom>>(iter: I) -> Self {
        Self::from_atoms(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a AtomCollection {
    type Item = &'a Atom;
    type IntoIter = std::slice::Iter<'a, Atom>;

    fn into_iter(self) -> Self::IntoIter {
        self.atoms.iter()
    }
}

impl AtomCollection {
    pub fn new() -> Self {
        Self::from_atoms(Vec::new())
    }

    pub fn from_atoms(atoms: Vec<Atom>) -> Self {
        Self {
            atoms,
            nn: NeighborParams::default(),
            type_index: None,
            revision: next_revision(),
        }
    }

    /// Marks positions/structure as changed: spatial indexes built earlier go stale.
    fn touch(&mut self) {
        self.revision = next_revision();
    }

    fn invalidate_neighbors(&mut self) {
        for atom in &mut self.atoms {
            atom.invalidate_neighbors();
        }
    }

    /// Called after any edit that may move atoms or change their attributes.
    fn mark_modified(&mut self) {
        self.touch();
        self.type_index = None;
        self.invalidate_neighbors();
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Atom> {
        self.atoms.iter()
    }

    /// Mutable access to every atom. Neighbor caches and the type index are
    /// dropped up front since any field may change.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Atom> {
        self.mark_modified();
        self.atoms.iter_mut()
    }

    pub fn as_slice(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn into_vec(self) -> Vec<Atom> {
        self.atoms
    }

    pub fn get(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Atom> {
        if index >= self.atoms.len() {
            return None;
        }
        self.mark_modified();
        self.atoms.get_mut(index)
    }

    /// Atom with the given id, or `None`. Checks slot `id - 1` first since
    /// ids are usually assigned sequentially.
    pub fn get_atom(&self, id: usize) -> Option<&Atom> {
        if let Some(atom) = id.checked_sub(1).and_then(|i| self.atoms.get(i)) {
            if atom.id == id {
                return Some(atom);
            }
        }
        self.atoms.iter().find(|a| a.id == id)
    }

    pub fn append(&mut self, atom: Atom) {
        self.atoms.push(atom);
        self.touch();
        self.type_index = None;
    }

    pub fn extend<I: IntoIterator<Item = Atom>>(&mut self, atoms: I) {
        self.atoms.extend(atoms);
        self.touch();
        self.type_index = None;
    }

    pub fn clear(&mut self) {
        self.atoms.clear();
        self.touch();
        self.type_index = None;
    }

    /// Stable sort; `SortKey::Composite` orders by (element, Z, type, mol, id).
    pub fn sort(&mut self, key: SortKey, reverse: bool) {
        let coord = |a: &Atom, i: usize| a.r[i];
        self.atoms.sort_by(|a, b| {
            let ord = match key {
                SortKey::Composite => (&a.element, a.atomic_number, a.atom_type, a.mol, a.id)
                    .cmp(&(&b.element, b.atomic_number, b.atom_type, b.mol, b.id)),
                SortKey::Id => a.id.cmp(&b.id),
                SortKey::Element => a.element.cmp(&b.element),
                SortKey::MolId => a.mol.cmp(&b.mol),
                SortKey::Type => a.atom_type.cmp(&b.atom_type),
                SortKey::X => coord(a, 0).total_cmp(&coord(b, 0)),
                SortKey::Y => coord(a, 1).total_cmp(&coord(b, 1)),
                SortKey::Z => coord(a, 2).total_cmp(&coord(b, 2)),
            };
            if reverse {
                ord.reverse()
            } else {
                ord
            }
        });
        self.touch();
    }

    /// New collection with only (or, inverted, all but) the atoms whose id is in `ids`.
    /// Per-atom values, including neighbor caches, are copied unchanged.
    pub fn filter<I: IntoIterator<Item = usize>>(&self, ids: I, invert: bool) -> AtomCollection {
        let wanted: HashSet<usize> = ids.into_iter().collect();
        let atoms = self
            .atoms
            .iter()
            .filter(|a| wanted.contains(&a.id) != invert)
            .cloned()
            .collect();
        let mut out = AtomCollection::from_atoms(atoms);
        out.nn = self.nn;
        out
    }

    /// Ids of the atoms that `filter` would keep.
    pub fn filtered_ids<I: IntoIterator<Item = usize>>(&self, ids: I, invert: bool) -> Vec<usize> {
        let wanted: HashSet<usize> = ids.into_iter().collect();
        self.atoms
            .iter()
            .map(|a| a.id)
            .filter(|id| wanted.contains(id) != invert)
            .collect()
    }

    /// Compile and evaluate a selection string; the result keeps the original order.
    pub fn select(&self, selstr: &str) -> Result<AtomCollection> {
        Selection::parse(selstr)?.select(self, None)
    }

    /// Renumbers ids from `start`. Cached neighbor lists refer to the old ids
    /// and are dropped.
    pub fn assign_unique_ids(&mut self, start: usize) {
        for (i, atom) in self.atoms.iter_mut().enumerate() {
            atom.id = start + i;
        }
        self.type_index = None;
        self.invalidate_neighbors();
    }

    /// Numbers atom types 1, 2, ... by order of first element appearance.
    pub fn assign_unique_types(&mut self) {
        let mut seen: HashMap<String, usize> = HashMap::new();
        for atom in &mut self.atoms {
            let next = seen.len() + 1;
            atom.atom_type = *seen.entry(atom.element.clone()).or_insert(next);
        }
        self.type_index = None;
    }

    pub fn ids_are_unique(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.atoms.len());
        self.atoms.iter().all(|a| seen.insert(a.id))
    }

    // --- Type index ---

    /// Rebuild the element -> {mass, charge} table. The first atom seen for an
    /// element defines its entry.
    pub fn rebuild_type_index(&mut self) {
        let mut index = BTreeMap::new();
        for atom in &self.atoms {
            index.entry(atom.element.clone()).or_insert(AtomTypeEntry {
                mass: atom.mass,
                q: atom.q,
            });
        }
        self.type_index = Some(index);
    }

    /// The type table, or `None` if it was invalidated since the last rebuild.
    pub fn type_index(&self) -> Option<&BTreeMap<String, AtomTypeEntry>> {
        self.type_index.as_ref()
    }

    pub fn ntypes(&self) -> usize {
        self.atoms.iter().map(|a| a.element.as_str()).collect::<HashSet<_>>().len()
    }

    // --- Bulk views ---

    pub fn positions(&self) -> Vec<Point> {
        self.atoms.iter().map(|a| a.r).collect()
    }

    pub fn ids(&self) -> Vec<usize> {
        self.atoms.iter().map(|a| a.id).collect()
    }

    pub fn mol_ids(&self) -> Vec<usize> {
        self.atoms.iter().map(|a| a.mol).collect()
    }

    pub fn types(&self) -> Vec<usize> {
        self.atoms.iter().map(|a| a.atom_type).collect()
    }

    pub fn elements(&self) -> Vec<&str> {
        self.atoms.iter().map(|a| a.element.as_str()).collect()
    }

    pub fn charges(&self) -> Vec<f64> {
        self.atoms.iter().map(|a| a.q).collect()
    }

    pub fn masses(&self) -> Vec<f64> {
        self.atoms.iter().map(|a| a.mass).collect()
    }

    pub fn velocities(&self) -> Vec<Vector3<f64>> {
        self.atoms.iter().map(|a| a.v).collect()
    }

    pub fn net_charge(&self) -> f64 {
        self.atoms.iter().map(|a| a.q).sum()
    }

    /// Mean position; the origin for an empty collection.
    pub fn centroid(&self) -> Point {
        if self.atoms.is_empty() {
            return Point::origin();
        }
        let sum: Vector3<f64> = self.atoms.iter().map(|a| a.r.coords).sum();
        Point::from(sum / self.atoms.len() as f64)
    }

    /// Mass-weighted mean position; falls back to the centroid when total mass is zero.
    pub fn center_of_mass(&self) -> Point {
        let total: f64 = self.atoms.iter().map(|a| a.mass).sum();
        if total == 0.0 {
            return self.centroid();
        }
        let sum: Vector3<f64> = self.atoms.iter().map(|a| a.r.coords * a.mass).sum();
        Point::from(sum / total)
    }

    pub fn bounding_box(&self) -> Option<Cuboid> {
        let first = self.atoms.first()?.r;
        let (pmin, pmax) = self.atoms.iter().fold((first, first), |(lo, hi), a| {
            (lo.inf(&a.r), hi.sup(&a.r))
        });
        Some(Cuboid { pmin, pmax })
    }

    /// Hill-style formula with alphabetical element order, e.g. "B70N70".
    pub fn formula(&self) -> String {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for atom in &self.atoms {
            *counts.entry(atom.element.as_str()).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .map(|(el, count)| if count > 1 { format!("{}{}", el, count) } else { el.to_string() })
            .collect::<Vec<_>>()
            .join("")
    }

    // --- Rigid transforms ---

    pub fn translate(&mut self, t: &Vector3<f64>) {
        for atom in &mut self.atoms {
            atom.r += t;
        }
        self.mark_modified();
    }

    pub fn center_centroid(&mut self) {
        let shift = -self.centroid().coords;
        self.translate(&shift);
    }

    /// Rotate positions (and velocities) by `angle` radians about `axis`
    /// through `pivot`, or through the centroid when no pivot is given.
    pub fn rotate(&mut self, angle: f64, axis: &Vector3<f64>, pivot: Option<Point>) -> Result<()> {
        let rotation = rotation_matrix(angle, axis)?;
        self.apply_rotation(&rotation, pivot);
        Ok(())
    }

    pub fn rotate_about(&mut self, angle: f64, axis: Axis, pivot: Option<Point>) {
        let rotation = Rotation3::from_axis_angle(
            &nalgebra::Unit::new_unchecked(axis.unit_vector()),
            angle,
        );
        self.apply_rotation(&rotation, pivot);
    }

    /// Extrinsic x-y-z (roll, pitch, yaw) rotation, radians.
    pub fn rotate_euler(&mut self, roll: f64, pitch: f64, yaw: f64, pivot: Option<Point>) {
        let rotation = Rotation3::from_euler_angles(roll, pitch, yaw);
        self.apply_rotation(&rotation, pivot);
    }

    pub fn apply_rotation(&mut self, rotation: &Rotation3<f64>, pivot: Option<Point>) {
        let pivot = pivot.unwrap_or_else(|| self.centroid());
        for atom in &mut self.atoms {
            atom.r = rotate_point(&atom.r, rotation, &pivot);
            atom.v = rotation * atom.v;
        }
        self.mark_modified();
    }

    // --- Neighbor analysis ---

    pub fn nn_params(&self) -> NeighborParams {
        self.nn
    }

    pub fn nn_number(&self) -> usize {
        self.nn.number
    }

    pub fn set_nn_number(&mut self, n: usize) {
        self.nn.number = n;
    }

    pub fn nn_cutoff(&self) -> f64 {
        self.nn.cutoff
    }

    pub fn set_nn_cutoff(&mut self, cutoff: f64) -> Result<()> {
        if cutoff.is_nan() || cutoff < 0.0 {
            return Err(NanoError::config("neighbor cutoff", format!("must be >= 0, got {}", cutoff)));
        }
        self.nn.cutoff = cutoff;
        Ok(())
    }

    pub fn norm(&self) -> Norm {
        self.nn.norm
    }

    pub fn set_norm(&mut self, norm: Norm) {
        self.nn.norm = norm;
    }

    /// A freshly built index over the current positions (`None` when empty).
    pub fn atom_tree(&self) -> Result<Option<SpatialIndex>> {
        SpatialIndex::build(self)
    }

    /// Neighbor distances/indices for every atom; empty for an empty collection.
    pub fn query_atom_tree(&self, n: usize, cutoff: f64) -> Result<NeighborQuery> {
        match self.atom_tree()? {
            Some(tree) => tree.query(n, cutoff),
            None => Ok(NeighborQuery::default()),
        }
    }

    fn store_coordination_numbers(&mut self, query: &NeighborQuery, rc: f64) {
        for (i, atom) in self.atoms.iter_mut().enumerate() {
            atom.spatial_mut().cn = Some(query.count_within(i, rc));
        }
    }

    fn store_nearest_neighbors(&mut self, query: &NeighborQuery, rc: f64) {
        if !self.ids_are_unique() {
            log::warn!("atom ids are not unique; neighbor references may resolve ambiguously");
        }
        let ids = self.ids();
        for (i, atom) in self.atoms.iter_mut().enumerate() {
            let refs = query.indices[i]
                .iter()
                .zip(&query.distances[i])
                .filter(|(_, d)| **d < rc)
                .map(|(&j, &d)| NeighborRef { id: ids[j], distance: d })
                .collect();
            atom.spatial_mut().nn = Some(refs);
        }
    }

    pub fn update_coordination_numbers(&mut self) -> Result<()> {
        let NeighborParams { number, cutoff, .. } = self.nn;
        self.query_coordination_numbers(number, cutoff).map(|_| ())
    }

    pub fn update_nearest_neighbors(&mut self) -> Result<()> {
        let NeighborParams { number, cutoff, .. } = self.nn;
        self.query_nearest_neighbors(number, cutoff).map(|_| ())
    }

    /// Recompute and return coordination numbers: neighbors (at most `n`)
    /// strictly closer than `rc`.
    pub fn query_coordination_numbers(&mut self, n: usize, rc: f64) -> Result<Vec<usize>> {
        let query = self.query_atom_tree(n, rc)?;
        self.store_coordination_numbers(&query, rc);
        log::debug!("updated coordination numbers for {} atoms (n={}, rc={})", self.len(), n, rc);
        Ok(self.atoms.iter().map(|a| a.cn().unwrap_or(0)).collect())
    }

    pub fn query_nearest_neighbors(&mut self, n: usize, rc: f64) -> Result<Vec<Vec<NeighborRef>>> {
        let query = self.query_atom_tree(n, rc)?;
        self.store_nearest_neighbors(&query, rc);
        Ok(self
            .atoms
            .iter()
            .map(|a| a.nn().map(<[NeighborRef]>::to_vec).unwrap_or_default())
            .collect())
    }

    /// Always recomputed with the current neighbor parameters.
    pub fn coordination_numbers(&mut self) -> Result<Vec<usize>> {
        let NeighborParams { number, cutoff, .. } = self.nn;
        self.query_coordination_numbers(number, cutoff)
    }

    pub fn nearest_neighbors(&mut self) -> Result<Vec<Vec<NeighborRef>>> {
        let NeighborParams { number, cutoff, .. } = self.nn;
        self.query_nearest_neighbors(number, cutoff)
    }

    /// Resolve an atom's neighbor references against this collection.
    /// References to atoms no longer present are skipped.
    pub fn neighbors_of(&self, atom: &Atom) -> Vec<&Atom> {
        atom.nn()
            .unwrap_or(&[])
            .iter()
            .filter_map(|r| self.get_atom(r.id))
            .collect()
    }

    /// Computes POAV1 for every atom whose cached neighbor list holds exactly
    /// three resolvable atoms. Returns the number of atoms updated.
    pub fn update_poav1(&mut self) -> usize {
        let results: Vec<Option<Poav>> = self
            .atoms
            .iter()
            .map(|atom| {
                let bonded = self.neighbors_of(atom);
                match bonded.as_slice() {
                    [a, b, c] => Poav::poav1(&[a.r - atom.r, b.r - atom.r, c.r - atom.r]),
                    _ => None,
                }
            })
            .collect();

        let mut updated = 0;
        for (atom, poav) in self.atoms.iter_mut().zip(results) {
            if let Some(poav) = poav {
                atom.poav_mut().set(poav);
                updated += 1;
            }
        }
        log::debug!("POAV1 assigned to {} of {} atoms", updated, self.atoms.len());
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn sample() -> AtomCollection {
        let mut atoms: AtomCollection = [
            ("C", [0.0, 0.0, 0.0]),
            ("N", [1.0, 0.0, 0.0]),
            ("C", [2.0, 0.0, 0.0]),
            ("B", [3.0, 0.0, 0.0]),
        ]
        .into_iter()
        .map(|(el, p)| Atom::builder(el).xyz(p[0], p[1], p[2]).build())
        .collect();
        atoms.assign_unique_ids(1);
        atoms
    }

    #[test]
    fn test_empty_views() {
        let mut atoms = AtomCollection::new();
        assert!(atoms.positions().is_empty());
        assert!(atoms.ids().is_empty());
        assert_eq!(atoms.centroid(), Point::origin());
        assert!(atoms.bounding_box().is_none());
        assert!(atoms.atom_tree().unwrap().is_none());
        assert!(atoms.query_atom_tree(6, f64::INFINITY).unwrap().is_empty());
        assert!(atoms.coordination_numbers().unwrap().is_empty());
    }

    #[test]
    fn test_filter_partitions() {
        let atoms = sample();
        let kept = atoms.filter([1, 3], false);
        let rest = atoms.filter([1, 3], true);
        assert_eq!(kept.ids(), vec![1, 3]);
        assert_eq!(rest.ids(), vec![2, 4]);
        assert!(kept.filter(kept.ids(), true).is_empty());
    }

    #[test]
    fn test_filter_keeps_cached_values() {
        let mut atoms = sample();
        atoms.query_coordination_numbers(2, 1.5).unwrap();
        let sub = atoms.filter([2], false);
        assert_eq!(sub.get(0).unwrap().cn(), Some(2));
    }

    #[test]
    fn test_composite_sort() {
        let mut atoms = sample();
        atoms.sort(SortKey::Composite, false);
        assert_eq!(atoms.elements(), vec!["B", "C", "C", "N"]);
        assert_eq!(atoms.ids(), vec![4, 1, 3, 2]);
        atoms.sort(SortKey::X, true);
        assert_eq!(atoms.ids(), vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_center_and_rotate() {
        let mut atoms = sample();
        atoms.center_centroid();
        assert_relative_eq!(atoms.centroid().coords.norm(), 0.0, epsilon = 1e-12);

        atoms.rotate(FRAC_PI_2, &Vector3::z(), None).unwrap();
        let first = atoms.get(0).unwrap().r;
        assert_relative_eq!(first.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(first.y, -1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_turns_velocities() {
        let mut atoms = AtomCollection::from_atoms(vec![Atom::builder("C")
            .velocity(Vector3::new(1.0, 0.0, 0.0))
            .build()]);
        atoms.rotate_about(FRAC_PI_2, Axis::Z, Some(Point::origin()));
        let v = atoms.get(0).unwrap().v;
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_coordination_numbers_on_chain() {
        let mut atoms = sample();
        let cn = atoms.query_coordination_numbers(6, 1.5).unwrap();
        assert_eq!(cn, vec![1, 2, 2, 1]);
        assert!(cn.iter().all(|&c| c <= 6));
    }

    #[test]
    fn test_neighbor_refs_resolve_and_go_stale() {
        let mut atoms = sample();
        atoms.query_nearest_neighbors(6, 1.5).unwrap();
        let second = atoms.get(1).unwrap().clone();
        let mut resolved: Vec<usize> = atoms.neighbors_of(&second).iter().map(|a| a.id).collect();
        resolved.sort();
        assert_eq!(resolved, vec![1, 3]);

        let without_first = atoms.filter([2, 3, 4], false);
        assert_eq!(without_first.neighbors_of(&second).len(), 1);

        atoms.translate(&Vector3::new(1.0, 0.0, 0.0));
        assert!(atoms.get(1).unwrap().nn().is_none());
    }

    #[test]
    fn test_renumbering_drops_neighbor_lists() {
        let mut atoms = sample();
        atoms.query_nearest_neighbors(1, 1.5).unwrap();
        assert!(atoms.get(0).unwrap().nn().is_some());

        atoms.assign_unique_ids(100);
        assert_eq!(atoms.ids(), vec![100, 101, 102, 103]);
        for atom in atoms.iter() {
            assert!(atom.nn().is_none());
            assert!(atom.cn().is_none());
            assert!(atoms.neighbors_of(atom).is_empty());
        }

        atoms.query_nearest_neighbors(1, 1.5).unwrap();
        let first = atoms.get(0).unwrap();
        let resolved: Vec<usize> = atoms.neighbors_of(first).iter().map(|a| a.id).collect();
        assert_eq!(resolved, vec![101]);
    }

    #[test]
    fn test_poav1_from_cached_neighbors() {
        use crate::model::poav::PoavKind;

        // a pyramidal center bonded to three atoms, plus a far-away spectator
        let alpha = 15f64.to_radians();
        let mut atoms: AtomCollection = std::iter::once(Atom::builder("C").build())
            .chain((0..3).map(|k| {
                let phi = k as f64 * 2.0 * std::f64::consts::PI / 3.0;
                let b = Vector3::new(phi.cos() * alpha.cos(), phi.sin() * alpha.cos(), -alpha.sin()) * 1.42;
                Atom::builder("C").position(Point::from(b)).build()
            }))
            .chain(std::iter::once(Atom::builder("C").xyz(20.0, 0.0, 0.0).build()))
            .collect();
        atoms.assign_unique_ids(1);
        atoms.query_nearest_neighbors(3, 1.5).unwrap();

        assert_eq!(atoms.update_poav1(), 1);
        let center = atoms.get(0).unwrap().poav(PoavKind::Poav1).unwrap();
        assert_relative_eq!(center.vpi, Vector3::z(), epsilon = 1e-10);
        assert_relative_eq!(center.pyramidalization_angle(), alpha, epsilon = 1e-10);
        assert!(atoms.get(4).unwrap().poav(PoavKind::Poav1).is_none());

        atoms.translate(&Vector3::new(1.0, 0.0, 0.0));
        assert!(atoms.get(0).unwrap().poav(PoavKind::Poav1).is_none());
    }

    #[test]
    fn test_index_goes_stale_after_edit() {
        let mut atoms = sample();
        let tree = atoms.atom_tree().unwrap().unwrap();
        assert!(!tree.is_stale(&atoms));
        atoms.append(Atom::builder("C").xyz(9.0, 0.0, 0.0).build());
        assert!(tree.is_stale(&atoms));
    }

    #[test]
    fn test_type_index_is_explicit() {
        let mut atoms = sample();
        assert!(atoms.type_index().is_none());
        atoms.rebuild_type_index();
        assert_eq!(atoms.type_index().unwrap().len(), 3);
        atoms.append(Atom::builder("O").build());
        assert!(atoms.type_index().is_none());
        assert_eq!(atoms.ntypes(), 4);
    }

    #[test]
    fn test_unique_types_follow_first_appearance() {
        let mut atoms = sample();
        atoms.assign_unique_types();
        assert_eq!(atoms.types(), vec![1, 2, 1, 3]);
        assert_eq!(atoms.formula(), "BC2N");
    }

    #[test]
    fn test_get_atom_lookup() {
        let mut atoms = sample();
        assert_eq!(atoms.get_atom(3).unwrap().element, "C");
        assert!(atoms.get_atom(42).is_none());
        atoms.sort(SortKey::Element, false);
        assert_eq!(atoms.get_atom(2).unwrap().element, "N");
    }

    #[test]
    fn test_bounding_box() {
        let atoms = sample();
        let bb = atoms.bounding_box().unwrap();
        assert_eq!(bb.pmin, Point::origin());
        assert_eq!(bb.pmax, Point::new(3.0, 0.0, 0.0));
    }
}
