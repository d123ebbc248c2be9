//! Read request bodies from disk for `turbine predict` / `turbine probe`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::Value;

use crate::error::{AppError, EXIT_INPUT};

/// Read a JSON document (object or array of records) from `path`.
pub fn read_records_json(path: &Path) -> Result<Value, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::config(format!("Failed to open input '{}': {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        AppError::new(EXIT_INPUT, format!("Invalid JSON in '{}': {e}", path.display()))
    })
}
