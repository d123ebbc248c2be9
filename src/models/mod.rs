//! Regression models served by the registry.
//!
//! Models are small, immutable values behind the `Regressor` trait so the
//! dispatcher can stay generic over artifact kinds.

pub mod linear;
pub mod model;
pub mod tree;

pub use model::*;
