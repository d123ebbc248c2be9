//! Dense feature table handed to the models.
//!
//! A `FeatureTable` is the projection of a request onto the feature schema:
//! one row per input record (input order), one column per schema column
//! (schema order). Missing values are stored as `NaN`.
//!
//! Storage is a `nalgebra::DMatrix<f64>` so linear models can evaluate a whole
//! batch as a single matrix-vector product.

use nalgebra::{DMatrix, DVector};

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    values: DMatrix<f64>,
}

impl FeatureTable {
    /// Build a table from row-major values.
    ///
    /// Every row must have exactly `columns.len()` entries.
    pub fn from_rows(columns: Vec<String>, rows: &[Vec<f64>]) -> Result<Self, String> {
        let n_cols = columns.len();
        let mut flat = Vec::with_capacity(rows.len() * n_cols);
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(format!(
                    "Row {idx} has {} values but the table has {n_cols} columns.",
                    row.len()
                ));
            }
            flat.extend_from_slice(row);
        }
        let values = DMatrix::from_row_slice(rows.len(), n_cols, &flat);
        Ok(Self { columns, values })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    /// Value at `(row, col)`.
    ///
    /// # Panics
    /// Panics if either index is out of bounds.
    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values[(row, col)]
    }

    /// Copy of one row, in column order.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.values.row(row).iter().copied().collect()
    }

    /// `intercept + X · coefficients` for every row.
    ///
    /// Returns `None` when the coefficient count does not match the column count.
    pub fn affine(&self, coefficients: &[f64], intercept: f64) -> Option<Vec<f64>> {
        if coefficients.len() != self.n_cols() {
            return None;
        }
        let beta = DVector::from_column_slice(coefficients);
        let y = &self.values * beta;
        Some(y.iter().map(|v| v + intercept).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rows_keep_input_order() {
        let rows = [vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let table = FeatureTable::from_rows(cols(&["a", "b"]), &rows).unwrap();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.n_cols(), 2);
        assert_eq!(table.row(1), vec![3.0, 4.0]);
        assert_eq!(table.value(2, 0), 5.0);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err =
            FeatureTable::from_rows(cols(&["a", "b"]), &[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(err.contains("Row 1"), "unexpected message: {err}");
    }

    #[test]
    fn affine_matches_manual_dot_product() {
        let table =
            FeatureTable::from_rows(cols(&["a", "b"]), &[vec![1.0, 2.0], vec![-1.0, 0.5]]).unwrap();
        let y = table.affine(&[2.0, 3.0], 1.0).unwrap();
        assert!((y[0] - 9.0).abs() < 1e-12);
        assert!((y[1] - 0.5).abs() < 1e-12);
        assert!(table.affine(&[1.0], 0.0).is_none());
    }
}
