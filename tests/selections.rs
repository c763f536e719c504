use nanogen::generators::{StructureGenerator, SwntGenerator};
use nanogen::model::AtomCollection;
use nanogen::physics::neighbors::SpatialIndex;
use nanogen::structures::Swnt;
use nanogen::{NanoError, Selection};
use std::collections::BTreeSet;

fn tube_1005() -> AtomCollection {
    let mut gen = SwntGenerator::new(Swnt::new(10, 5).unwrap());
    gen.generate(true).unwrap();
    gen.atoms().clone()
}

fn id_set(atoms: &AtomCollection, selstr: &str) -> BTreeSet<usize> {
    Selection::parse(selstr).unwrap().evaluate(atoms, None).unwrap()
}

#[test]
fn and_or_match_set_algebra() {
    let atoms = tube_1005();
    assert_eq!(atoms.len(), 140);

    let a = id_set(&atoms, "id 1 2 3 4 5");
    let b = id_set(&atoms, "id 99 100");
    let union = id_set(&atoms, "id 1 2 3 4 5 or id 99 100");
    let inter = id_set(&atoms, "id 1 2 3 4 5 and id 99 100");

    assert_eq!(union.len(), 7);
    assert_eq!(inter.len(), 0);
    assert_eq!(union, a.union(&b).copied().collect());
}

#[test]
fn all_preserves_order() {
    let atoms = tube_1005();
    let all = atoms.select("all").unwrap();
    assert_eq!(all.ids(), atoms.ids());
}

#[test]
fn not_is_the_complement() {
    let atoms = tube_1005();
    let full: BTreeSet<usize> = atoms.ids().into_iter().collect();
    for expr in ["z < 3.0", "x >= 0 and y < 0", "within 2.0 of id 10", "element C"] {
        let matched = id_set(&atoms, expr);
        let negated = id_set(&atoms, &format!("not ({})", expr));
        let expected: BTreeSet<usize> = full.difference(&matched).copied().collect();
        assert_eq!(negated, expected, "{}", expr);
    }
}

#[test]
fn within_contains_inner_and_exwithin_drops_it() {
    let atoms = tube_1005();
    let inner = id_set(&atoms, "id 1 2 3");
    for r in [0.0, 1.0, 1.5, 3.0] {
        let within = id_set(&atoms, &format!("within {} of id 1 2 3", r));
        let exwithin = id_set(&atoms, &format!("exwithin {} of id 1 2 3", r));
        assert!(within.is_superset(&inner), "r = {}", r);
        let expected: BTreeSet<usize> = within.difference(&inner).copied().collect();
        assert_eq!(exwithin, expected, "r = {}", r);
    }
}

#[test]
fn interior_atom_has_three_bonded_neighbors() {
    let mut gen = SwntGenerator::new(Swnt::new(10, 5).unwrap().with_n3(3).unwrap());
    gen.generate(true).unwrap();
    // id 141 opens the middle cell
    assert_eq!(id_set(gen.atoms(), "exwithin 1.5 of id 141").len(), 3);
}

#[test]
fn shared_index_gives_same_result() {
    let atoms = tube_1005();
    let index = SpatialIndex::build(&atoms).unwrap().unwrap();
    let sel = Selection::parse("within 2.5 of (z < 2)").unwrap();
    assert_eq!(
        sel.evaluate(&atoms, Some(&index)).unwrap(),
        sel.evaluate(&atoms, None).unwrap()
    );
}

#[test]
fn filter_partitions_the_collection() {
    let atoms = tube_1005();
    let ids: Vec<usize> = atoms.ids().into_iter().filter(|id| id % 3 == 0).collect();
    let kept = atoms.filter(ids.iter().copied(), false);
    let dropped = atoms.filter(ids.iter().copied(), true);
    assert_eq!(kept.len() + dropped.len(), atoms.len());
    assert!(kept.filter(ids.iter().copied(), true).is_empty());

    let mut merged: Vec<usize> = kept.ids();
    merged.extend(dropped.ids());
    merged.sort_unstable();
    assert_eq!(merged, atoms.ids());
}

#[test]
fn parse_errors_abort_before_evaluation() {
    let atoms = tube_1005();
    for bad in ["", "id", "(id 1", "within of id 1", "bogus 3", "within Blob(r=1)"] {
        assert!(matches!(atoms.select(bad), Err(NanoError::Parse(_))), "{:?}", bad);
    }
}
