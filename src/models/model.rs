//! The model capability and the artifact decoder.
//!
//! The dispatcher only ever sees `dyn Regressor`: something that turns a
//! `FeatureTable` into one number per row. Artifacts are JSON documents tagged
//! by `kind`; `decode_model` parses one, checks it against the feature schema
//! and returns the ready-to-serve regressor.

use serde::Deserialize;

use crate::domain::FeatureSchema;
use crate::math::FeatureTable;
use crate::models::linear::LinearModel;
use crate::models::tree::{Aggregation, Ensemble, Tree};

/// A loaded, ready-to-serve regression model.
pub trait Regressor: Send + Sync {
    /// Short artifact kind label, for logs.
    fn kind(&self) -> &'static str;

    /// Predict one value per table row, in row order.
    fn predict(&self, table: &FeatureTable) -> Result<Vec<f64>, ModelError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// The artifact bytes are not a valid model document.
    Decode(String),
    /// The document parsed but describes an unusable model.
    Invalid(String),
    /// The table handed to `predict` does not fit the model.
    Shape(String),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Decode(msg) => write!(f, "malformed model artifact: {msg}"),
            ModelError::Invalid(msg) => write!(f, "invalid model: {msg}"),
            ModelError::Shape(msg) => write!(f, "input shape mismatch: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {}

fn default_learning_rate() -> f64 {
    1.0
}

/// On-disk artifact document.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ModelArtifact {
    Linear {
        #[serde(default)]
        feature_names: Option<Vec<String>>,
        intercept: f64,
        coefficients: Vec<f64>,
    },
    RandomForest {
        #[serde(default)]
        feature_names: Option<Vec<String>>,
        trees: Vec<Tree>,
    },
    GradientBoosting {
        #[serde(default)]
        feature_names: Option<Vec<String>>,
        base_score: f64,
        #[serde(default = "default_learning_rate")]
        learning_rate: f64,
        trees: Vec<Tree>,
    },
}

impl ModelArtifact {
    fn feature_names(&self) -> Option<&[String]> {
        match self {
            ModelArtifact::Linear { feature_names, .. }
            | ModelArtifact::RandomForest { feature_names, .. }
            | ModelArtifact::GradientBoosting { feature_names, .. } => feature_names.as_deref(),
        }
    }
}

/// Decode artifact bytes into a regressor for `schema`.
pub fn decode_model(
    bytes: &[u8],
    schema: &FeatureSchema,
) -> Result<Box<dyn Regressor>, ModelError> {
    let artifact: ModelArtifact =
        serde_json::from_slice(bytes).map_err(|e| ModelError::Decode(e.to_string()))?;

    if let Some(names) = artifact.feature_names() {
        if names != schema.columns() {
            return Err(ModelError::Invalid(format!(
                "artifact was trained on columns {names:?}, which differ from the configured schema"
            )));
        }
    }

    let n_features = schema.len();
    let model: Box<dyn Regressor> = match artifact {
        ModelArtifact::Linear {
            intercept,
            coefficients,
            ..
        } => Box::new(LinearModel::new(intercept, coefficients, n_features)?),
        ModelArtifact::RandomForest { trees, .. } => {
            Box::new(Ensemble::new(trees, Aggregation::Mean, n_features)?)
        }
        ModelArtifact::GradientBoosting {
            base_score,
            learning_rate,
            trees,
            ..
        } => Box::new(Ensemble::new(
            trees,
            Aggregation::Boosted {
                base_score,
                learning_rate,
            },
            n_features,
        )?),
    };
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(vec!["a".into(), "b".into()]).unwrap()
    }

    fn one_row(a: f64, b: f64) -> FeatureTable {
        FeatureTable::from_rows(vec!["a".into(), "b".into()], &[vec![a, b]]).unwrap()
    }

    #[test]
    fn decodes_each_kind() {
        let linear = decode_model(
            br#"{"kind":"linear","intercept":1.0,"coefficients":[2.0,0.0]}"#,
            &schema(),
        )
        .unwrap();
        assert_eq!(linear.kind(), "linear");
        assert_eq!(linear.predict(&one_row(3.0, 9.0)).unwrap(), vec![7.0]);

        let forest = decode_model(
            br#"{"kind":"random_forest","trees":[{"nodes":[{"value":4.0}]},{"nodes":[{"value":2.0}]}]}"#,
            &schema(),
        )
        .unwrap();
        assert_eq!(forest.kind(), "random_forest");
        assert_eq!(forest.predict(&one_row(0.0, 0.0)).unwrap(), vec![3.0]);

        let boosted = decode_model(
            br#"{"kind":"gradient_boosting","base_score":0.5,"trees":[{"nodes":[{"value":1.0}]}]}"#,
            &schema(),
        )
        .unwrap();
        assert_eq!(boosted.kind(), "gradient_boosting");
        assert_eq!(boosted.predict(&one_row(0.0, 0.0)).unwrap(), vec![1.5]);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode_model(b"\x80\x04\x95 not json", &schema()).err().unwrap();
        assert!(matches!(err, ModelError::Decode(_)));
        let err = decode_model(br#"{"kind":"svm"}"#, &schema()).err().unwrap();
        assert!(matches!(err, ModelError::Decode(_)));
    }

    #[test]
    fn feature_names_must_match_schema_order() {
        let err = decode_model(
            br#"{"kind":"linear","feature_names":["b","a"],"intercept":0.0,"coefficients":[1.0,1.0]}"#,
            &schema(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ModelError::Invalid(_)));

        assert!(
            decode_model(
                br#"{"kind":"linear","feature_names":["a","b"],"intercept":0.0,"coefficients":[1.0,1.0]}"#,
                &schema(),
            )
            .is_ok()
        );
    }
}
