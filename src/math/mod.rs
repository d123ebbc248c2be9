//! Numeric containers shared by the dispatcher and the models.

pub mod table;

pub use table::*;
