//! In-situ loading

mod far_field;

pub use far_field::FarFieldStress;
