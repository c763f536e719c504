pub mod supercell;

pub use supercell::{ScalingMatrix, SuperCell};
