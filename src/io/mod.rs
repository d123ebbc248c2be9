//! Input/output helpers.
//!
//! - model manifest read + validation (`manifest`)
//! - request body files for offline prediction (`records`)

pub mod manifest;
pub mod records;

pub use manifest::*;
pub use records::*;
