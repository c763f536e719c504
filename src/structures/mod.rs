//! Structural parameter sets and their unit cells.

pub mod chirality;
pub mod graphene;
pub mod layers;
pub mod swnt;

pub use chirality::{
    filter_ch_list, generate_ch_list, generate_ch_list_imax, generate_ch_property_grid, ChProperty, ChiralType,
    Chirality, Handedness, PropertyFilter, CC_BOND,
};
pub use graphene::{Graphene, GrapheneCell};
pub use layers::{Layers, LAYER_SPACING};
pub use swnt::{Swnt, UnrolledSwnt};
