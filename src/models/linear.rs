//! Linear regression: `y = intercept + Σ coefficient_j * x_j`.

use crate::math::FeatureTable;
use crate::models::model::{ModelError, Regressor};

#[derive(Debug, Clone)]
pub struct LinearModel {
    intercept: f64,
    coefficients: Vec<f64>,
}

impl LinearModel {
    pub fn new(
        intercept: f64,
        coefficients: Vec<f64>,
        n_features: usize,
    ) -> Result<Self, ModelError> {
        if coefficients.len() != n_features {
            return Err(ModelError::Invalid(format!(
                "linear model has {} coefficients but the schema has {n_features} columns",
                coefficients.len()
            )));
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::Invalid(
                "linear model parameters must be finite".to_string(),
            ));
        }
        Ok(Self {
            intercept,
            coefficients,
        })
    }
}

impl Regressor for LinearModel {
    fn kind(&self) -> &'static str {
        "linear"
    }

    fn predict(&self, table: &FeatureTable) -> Result<Vec<f64>, ModelError> {
        table.affine(&self.coefficients, self.intercept).ok_or_else(|| {
            ModelError::Shape(format!(
                "expected {} feature columns, got {}",
                self.coefficients.len(),
                table.n_cols()
            ))
        })
    }
}
