//! Regression tree ensembles.
//!
//! Trees are stored as flat node arrays (node 0 is the root). A split sends a
//! row left when `x <= threshold`, and routes missing values (`NaN`) by its
//! `default_left` flag. Children always sit at a larger index than their
//! parent, which is checked at load time and guarantees every walk terminates.

use rayon::prelude::*;
use serde::Deserialize;

use crate::math::FeatureTable;
use crate::models::model::{ModelError, Regressor};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default = "default_true")]
        default_left: bool,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Check node references, feature indices and numeric values.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let n = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {idx} has a non-finite value"));
                    }
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    if feature >= n_features {
                        return Err(format!(
                            "split {idx} uses feature {feature} \
                             but the schema has {n_features} columns"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("split {idx} has a non-finite threshold"));
                    }
                    for child in [left, right] {
                        if child <= idx || child >= n {
                            return Err(format!("split {idx} points to invalid child {child}"));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk the tree for one table row.
    pub fn eval(&self, table: &FeatureTable, row: usize) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let x = table.value(row, feature);
                    idx = if x.is_nan() {
                        if default_left { left } else { right }
                    } else if x <= threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// How per-tree outputs are combined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregation {
    /// Random forest: mean of the tree outputs.
    Mean,
    /// Gradient boosting: `base_score + learning_rate * Σ tree outputs`.
    Boosted { base_score: f64, learning_rate: f64 },
}

/// A validated tree ensemble.
#[derive(Debug, Clone)]
pub struct Ensemble {
    trees: Vec<Tree>,
    aggregation: Aggregation,
    n_features: usize,
}

impl Ensemble {
    pub fn new(
        trees: Vec<Tree>,
        aggregation: Aggregation,
        n_features: usize,
    ) -> Result<Self, ModelError> {
        if trees.is_empty() {
            return Err(ModelError::Invalid("ensemble has no trees".to_string()));
        }
        if let Aggregation::Boosted {
            base_score,
            learning_rate,
        } = aggregation
        {
            if !(base_score.is_finite() && learning_rate.is_finite()) {
                return Err(ModelError::Invalid(
                    "base_score and learning_rate must be finite".to_string(),
                ));
            }
        }
        for (idx, tree) in trees.iter().enumerate() {
            tree.validate(n_features)
                .map_err(|e| ModelError::Invalid(format!("tree {idx}: {e}")))?;
        }
        Ok(Self {
            trees,
            aggregation,
            n_features,
        })
    }

    fn predict_row(&self, table: &FeatureTable, row: usize) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.eval(table, row)).sum();
        match self.aggregation {
            Aggregation::Mean => sum / self.trees.len() as f64,
            Aggregation::Boosted {
                base_score,
                learning_rate,
            } => base_score + learning_rate * sum,
        }
    }
}

impl Regressor for Ensemble {
    fn kind(&self) -> &'static str {
        match self.aggregation {
            Aggregation::Mean => "random_forest",
            Aggregation::Boosted { .. } => "gradient_boosting",
        }
    }

    fn predict(&self, table: &FeatureTable) -> Result<Vec<f64>, ModelError> {
        if table.n_cols() != self.n_features {
            return Err(ModelError::Shape(format!(
                "expected {} feature columns, got {}",
                self.n_features,
                table.n_cols()
            )));
        }
        // Rows are independent; evaluate them in parallel.
        Ok((0..table.n_rows())
            .into_par_iter()
            .map(|row| self.predict_row(table, row))
            .collect())
    }
}
