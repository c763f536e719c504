pub mod neighbors;
pub mod operations;
