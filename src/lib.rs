//! Nanostructure generation and atom selection.
//!
//! Generators build graphene sheets and carbon nanotubes (rolled or unrolled)
//! as [`model::AtomCollection`]s; collections answer neighbor queries through
//! a k-d tree and filter themselves with a small selection language.

pub mod config;
pub mod error;
pub mod generators;
pub mod io;
pub mod model;
pub mod physics;
pub mod selection;
pub mod structures;
pub mod utils;

pub use error::{NanoError, Result};
pub use generators::StructureGenerator;
pub use model::{Atom, AtomCollection};
pub use selection::Selection;
