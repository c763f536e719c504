//src/model/mod.rs
pub mod atom;
pub mod atoms;
pub mod elements;
pub mod lattice;
pub mod poav;
pub mod regions;
pub mod trajectory;

// Re-exports for cleaner imports
pub use atom::{Atom, AtomBuilder, AttrValue, NeighborRef, SpatialFields, TrajectoryFields};
pub use atoms::{AtomCollection, AtomTypeEntry, NeighborParams, SortKey};
pub use lattice::{Lattice, UnitCell};
pub use poav::{Poav, PoavFields, PoavKind};
pub use regions::{Cuboid, Cylinder, Ellipsoid, GeometricRegion, Parallelepiped, Sphere};
pub use trajectory::Trajectory;
