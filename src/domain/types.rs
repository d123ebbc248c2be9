//! Shared domain types.
//!
//! These types are intentionally kept small and serializable so they can be:
//!
//! - built from CLI flags or a JSON manifest
//! - shared read-only across request handlers
//! - returned directly as HTTP response bodies

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Sensor columns the gas-turbine models were trained on, in training order.
pub const STANDARD_COLUMNS: [&str; 15] = [
    "Lever_position",
    "Ship_speed_v",
    "Gas_Turbine_GT_shaft_torque_GTT_kN_m",
    "GT_rate_of_revolutions_GTn_rpm",
    "Gas_Generator_rate_of_revolutions_GGn_rpm",
    "Starboard_Propeller_Torque_Ts_kN",
    "Port_Propeller_Torque_Tp_kN",
    "Hight_Pressure_HP_Turbine_exit_temperature_T48_C",
    "GT_Compressor_inlet_air_temperature_T1_C",
    "GT_Compressor_outlet_air_temperature_T2_C",
    "HP_Turbine_exit_pressure_P48_bar",
    "GT_Compressor_inlet_air_pressure_P1_bar",
    "GT_Compressor_outlet_air_pressure_P2_bar",
    "GT_exhaust_gas_pressure_Pexh_bar",
    "Turbine_Injecton_Control_TIC_",
];

/// Leading column of the `indexed` schema (the dataset row index).
pub const INDEX_COLUMN: &str = "index";

/// Which built-in feature schema to validate requests against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVariant {
    /// The 15 sensor columns.
    Standard,
    /// `index` followed by the 15 sensor columns.
    ///
    /// Some of the trained artifacts were fitted on a frame that still carried
    /// the dataset's row index as a feature.
    Indexed,
}

/// Ordered list of required input columns.
///
/// Order and names must match what the models were trained on. Matching is
/// exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    /// Build a schema from explicit column names.
    ///
    /// Rejects empty schemas, blank names and duplicates.
    pub fn new(columns: Vec<String>) -> Result<Self, String> {
        if columns.is_empty() {
            return Err("Feature schema must list at least one column.".to_string());
        }
        let mut seen = HashSet::new();
        for name in &columns {
            if name.trim().is_empty() {
                return Err("Feature schema contains a blank column name.".to_string());
            }
            if !seen.insert(name.as_str()) {
                return Err(format!("Feature schema lists column '{name}' twice."));
            }
        }
        Ok(Self { columns })
    }

    pub fn from_variant(variant: SchemaVariant) -> Self {
        let mut columns = Vec::with_capacity(STANDARD_COLUMNS.len() + 1);
        if variant == SchemaVariant::Indexed {
            columns.push(INDEX_COLUMN.to_string());
        }
        columns.extend(STANDARD_COLUMNS.iter().map(|c| c.to_string()));
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Schema columns absent from `present`, in schema order.
    pub fn missing_from(&self, present: &HashSet<&str>) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| !present.contains(c.as_str()))
            .cloned()
            .collect()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::from_variant(SchemaVariant::Standard)
    }
}

/// A logical prediction target and the artifact file its model lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub name: String,
    pub file: String,
}

impl TargetSpec {
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
        }
    }
}

/// The three gas-turbine targets served by default.
pub fn default_targets() -> Vec<TargetSpec> {
    vec![
        TargetSpec::new("Fuel_flow_mf_kg/s", "rf_Fuel_flow_mf_kg_s.json"),
        TargetSpec::new(
            "GT_Turbine_decay_state_coefficient",
            "rf_GT_Turbine_decay_state_coefficient.json",
        ),
        TargetSpec::new(
            "GT_Compressor_decay_state_coefficient",
            "rf_GT_Compressor_decay_state_coefficient.json",
        ),
    ]
}

/// Where and how to fetch artifacts that are not on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Base URL; the artifact file name is appended after a `/`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Total attempts per artifact (at least 1).
    pub attempts: u32,
}

/// Everything the registry bootstrap needs, resolved from flags, env and manifest.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model_dir: PathBuf,
    pub schema: FeatureSchema,
    pub targets: Vec<TargetSpec>,
    /// `None` disables remote fetching; missing artifacts are then simply missing.
    pub remote: Option<RemoteConfig>,
}

/// A single target's shaped result.
///
/// One input record yields a bare number, several yield a list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Prediction {
    Single(f64),
    Many(Vec<f64>),
}

impl Prediction {
    pub fn from_values(mut values: Vec<f64>) -> Self {
        if values.len() == 1 {
            Prediction::Single(values.remove(0))
        } else {
            Prediction::Many(values)
        }
    }

    pub fn as_single(&self) -> Option<f64> {
        match self {
            Prediction::Single(v) => Some(*v),
            Prediction::Many(_) => None,
        }
    }

    pub fn as_many(&self) -> Option<&[f64]> {
        match self {
            Prediction::Single(_) => None,
            Prediction::Many(v) => Some(v),
        }
    }
}

/// Target name -> shaped prediction, in registry order.
///
/// Serialized as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionResponse {
    entries: Vec<(String, Prediction)>,
}

impl PredictionResponse {
    pub fn push(&mut self, target: impl Into<String>, prediction: Prediction) {
        self.entries.push((target.into(), prediction));
    }

    pub fn get(&self, target: &str) -> Option<&Prediction> {
        self.entries
            .iter()
            .find(|(name, _)| name == target)
            .map(|(_, p)| p)
    }
}

impl Serialize for PredictionResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, prediction) in &self.entries {
            map.serialize_entry(name, prediction)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_schema_prepends_index() {
        let standard = FeatureSchema::from_variant(SchemaVariant::Standard);
        let indexed = FeatureSchema::from_variant(SchemaVariant::Indexed);
        assert_eq!(standard.len(), 15);
        assert_eq!(indexed.len(), 16);
        assert_eq!(indexed.columns()[0], INDEX_COLUMN);
        assert_eq!(&indexed.columns()[1..], standard.columns());
    }

    #[test]
    fn schema_rejects_duplicates_and_blanks() {
        assert!(FeatureSchema::new(vec![]).is_err());
        assert!(FeatureSchema::new(vec!["a".into(), " ".into()]).is_err());
        let err = FeatureSchema::new(vec!["a".into(), "b".into(), "a".into()]).unwrap_err();
        assert!(err.contains("'a'"), "unexpected message: {err}");
    }

    #[test]
    fn missing_columns_follow_schema_order() {
        let columns = ["a", "b", "c", "d"].map(String::from).to_vec();
        let schema = FeatureSchema::new(columns).unwrap();
        let present: HashSet<&str> = ["c", "a", "zzz"].into_iter().collect();
        assert_eq!(schema.missing_from(&present), vec!["b".to_string(), "d".to_string()]);
    }

    #[test]
    fn single_value_is_unwrapped() {
        assert_eq!(Prediction::from_values(vec![1.5]), Prediction::Single(1.5));
        assert_eq!(Prediction::from_values(vec![1.0, 2.0]), Prediction::Many(vec![1.0, 2.0]));
    }

    #[test]
    fn response_serializes_as_object_in_insertion_order() {
        let mut response = PredictionResponse::default();
        response.push("z_target", Prediction::Single(1.0));
        response.push("a_target", Prediction::Many(vec![2.0, 3.0]));
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"z_target":1.0,"a_target":[2.0,3.0]}"#);
    }
}
