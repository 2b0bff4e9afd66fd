//! Helpers shared by the `Record` and `FromRow` derives.

pub mod attrs;
pub mod syn_types;
