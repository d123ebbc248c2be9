//! Domain types used throughout the service.
//!
//! This module defines:
//!
//! - the feature schema (`FeatureSchema`, `SchemaVariant`)
//! - target/artifact configuration (`TargetSpec`, `ModelConfig`, `RemoteConfig`)
//! - prediction outputs (`Prediction`, `PredictionResponse`)

pub mod types;

pub use types::*;
