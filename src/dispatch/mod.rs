//! Inference dispatch: request body in, per-target predictions out.
//!
//! The workflow for one request is:
//! registry check -> normalize records -> schema check -> projection -> predict -> shape
//!
//! The dispatcher holds no per-request state. It only reads the registry, the
//! schema and the bootstrap report, all immutable after startup.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::{FeatureSchema, Prediction, PredictionResponse};
use crate::math::FeatureTable;
use crate::registry::{BootstrapReport, ModelRegistry};

/// Why a prediction request could not be answered.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictError {
    /// No model loaded at all.
    Unavailable {
        missing: Vec<String>,
        download_errors: Vec<String>,
    },
    /// The body is neither an object nor an array of objects.
    InvalidPayload(String),
    /// Required schema columns are absent from every record (schema order).
    MissingColumns(Vec<String>),
    /// Table construction or a model invocation failed.
    Inference(String),
}

impl PredictError {
    /// True for errors caused by the request itself (HTTP 4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PredictError::InvalidPayload(_) | PredictError::MissingColumns(_)
        )
    }
}

impl std::fmt::Display for PredictError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictError::Unavailable { .. } => write!(f, "No models loaded"),
            PredictError::InvalidPayload(msg) => write!(f, "Invalid request body: {msg}"),
            PredictError::MissingColumns(cols) => {
                write!(f, "Missing input columns: {}", cols.join(", "))
            }
            PredictError::Inference(msg) => write!(f, "Prediction failed: {msg}"),
        }
    }
}

impl std::error::Error for PredictError {}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ModelRegistry>,
    schema: Arc<FeatureSchema>,
    report: Arc<BootstrapReport>,
}

impl Dispatcher {
    pub fn new(registry: ModelRegistry, schema: FeatureSchema, report: BootstrapReport) -> Self {
        Self {
            registry: Arc::new(registry),
            schema: Arc::new(schema),
            report: Arc::new(report),
        }
    }

    /// `Unavailable` when no model loaded; checked before the body is looked at.
    pub fn ensure_available(&self) -> Result<(), PredictError> {
        if self.registry.is_empty() {
            return Err(PredictError::Unavailable {
                missing: self.report.missing_files(),
                download_errors: self.report.download_errors(),
            });
        }
        Ok(())
    }

    /// Run every loaded model on the records in `body`.
    ///
    /// All-or-nothing: if any target fails, the whole request fails.
    pub fn predict(&self, body: &Value) -> Result<PredictionResponse, PredictError> {
        self.ensure_available()?;

        let records = normalize(body)?;

        let missing = missing_columns(&self.schema, &records);
        if !missing.is_empty() {
            return Err(PredictError::MissingColumns(missing));
        }

        let table = project(&self.schema, &records).map_err(PredictError::Inference)?;
        debug!(
            rows = table.n_rows(),
            targets = self.registry.len(),
            "dispatching prediction"
        );

        let mut response = PredictionResponse::default();
        for (target, model) in self.registry.iter() {
            let values = model
                .predict(&table)
                .map_err(|e| PredictError::Inference(format!("model for '{target}' failed: {e}")))?;
            if values.len() != table.n_rows() {
                return Err(PredictError::Inference(format!(
                    "model for '{target}' returned {} values for {} rows",
                    values.len(),
                    table.n_rows()
                )));
            }
            if let Some(row) = values.iter().position(|v| v.is_infinite()) {
                return Err(PredictError::Inference(format!(
                    "model for '{target}' returned a non-finite value for row {row}"
                )));
            }
            response.push(target, Prediction::from_values(values));
        }
        Ok(response)
    }
}

/// One object -> one record; array -> its elements, which must all be objects.
fn normalize(body: &Value) -> Result<Vec<&Map<String, Value>>, PredictError> {
    match body {
        Value::Object(record) => Ok(vec![record]),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                item.as_object().ok_or_else(|| {
                    PredictError::InvalidPayload(format!("record {idx} is not a JSON object"))
                })
            })
            .collect(),
        _ => Err(PredictError::InvalidPayload(
            "expected a JSON object or an array of objects".to_string(),
        )),
    }
}

/// Schema columns that no record carries.
fn missing_columns(schema: &FeatureSchema, records: &[&Map<String, Value>]) -> Vec<String> {
    let present: HashSet<&str> = records
        .iter()
        .flat_map(|r| r.keys().map(|k| k.as_str()))
        .collect();
    schema.missing_from(&present)
}

/// Build the schema-ordered table; absent or null cells become `NaN`.
fn project(
    schema: &FeatureSchema,
    records: &[&Map<String, Value>],
) -> Result<FeatureTable, String> {
    let mut rows = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        let mut row = Vec::with_capacity(schema.len());
        for column in schema.columns() {
            let cell = cell_value(record.get(column))
                .map_err(|e| format!("record {idx}, column '{column}': {e}"))?;
            row.push(cell);
        }
        rows.push(row);
    }
    FeatureTable::from_rows(schema.columns().to_vec(), &rows)
}

fn cell_value(value: Option<&Value>) -> Result<f64, String> {
    match value {
        None | Some(Value::Null) => Ok(f64::NAN),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| format!("number {n} is not representable as f64")),
        Some(Value::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("could not convert string to float: '{s}'")),
        Some(other) => Err(format!("expected a number, got {other}")),
    }
}
