//! Read the optional model manifest (JSON).
//!
//! A manifest lets a deployment replace the built-in feature schema and target
//! list without rebuilding:
//!
//! ```json
//! {
//!   "schema": "indexed",
//!   "targets": [
//!     { "name": "Fuel_flow_mf_kg/s", "file": "xgb_fuel_flow.json" }
//!   ]
//! }
//! ```
//!
//! `schema` is either a built-in variant name or an explicit list of columns.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{FeatureSchema, SchemaVariant, TargetSpec};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SchemaSetting {
    Variant(SchemaVariant),
    Columns(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub schema: Option<SchemaSetting>,
    #[serde(default)]
    pub targets: Option<Vec<TargetSpec>>,
}

impl Manifest {
    /// The manifest's schema, or `fallback` when it does not set one.
    pub fn schema_or(&self, fallback: FeatureSchema) -> Result<FeatureSchema, AppError> {
        match &self.schema {
            None => Ok(fallback),
            Some(SchemaSetting::Variant(v)) => Ok(FeatureSchema::from_variant(*v)),
            Some(SchemaSetting::Columns(cols)) => {
                FeatureSchema::new(cols.clone())
                    .map_err(|e| AppError::config(format!("Invalid manifest: {e}")))
            }
        }
    }

    /// The manifest's targets, or `fallback` when it does not list any.
    pub fn targets_or(&self, fallback: Vec<TargetSpec>) -> Result<Vec<TargetSpec>, AppError> {
        let targets = self.targets.clone().unwrap_or(fallback);
        validate_targets(&targets)?;
        Ok(targets)
    }
}

/// Read a manifest file.
pub fn read_manifest(path: &Path) -> Result<Manifest, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::config(format!("Failed to open manifest '{}': {e}", path.display()))
    })?;
    let manifest: Manifest = serde_json::from_reader(file)
        .map_err(|e| AppError::config(format!("Invalid manifest '{}': {e}", path.display())))?;
    Ok(manifest)
}

/// Targets must be non-empty, uniquely named, and point at plain file names.
pub fn validate_targets(targets: &[TargetSpec]) -> Result<(), AppError> {
    if targets.is_empty() {
        return Err(AppError::config("At least one target must be configured."));
    }
    let mut names = HashSet::new();
    for t in targets {
        if t.name.trim().is_empty() {
            return Err(AppError::config("Target names must not be blank."));
        }
        if !names.insert(t.name.as_str()) {
            return Err(AppError::config(format!("Target '{}' is listed twice.", t.name)));
        }
        let safe_file = !t.file.is_empty()
            && !t.file.contains("..")
            && !t.file.contains('/')
            && !t.file.contains('\\')
            && !t.file.contains('\0');
        if !safe_file {
            return Err(AppError::config(format!(
                "Target '{}' has an invalid artifact file name '{}'.",
                t.name, t.file
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::default_targets;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_manifest(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn variant_and_targets_override_defaults() {
        let file = write_manifest(
            r#"{"schema":"indexed","targets":[{"name":"fuel","file":"fuel.json"}]}"#,
        );
        let manifest = read_manifest(file.path()).unwrap();
        let schema = manifest.schema_or(FeatureSchema::default()).unwrap();
        assert_eq!(schema.len(), 16);
        let targets = manifest.targets_or(default_targets()).unwrap();
        assert_eq!(targets, vec![TargetSpec::new("fuel", "fuel.json")]);
    }

    #[test]
    fn explicit_columns_are_validated() {
        let file = write_manifest(r#"{"schema":["x","y","x"]}"#);
        let manifest = read_manifest(file.path()).unwrap();
        let err = manifest.schema_or(FeatureSchema::default()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);
    }

    #[test]
    fn empty_manifest_keeps_defaults() {
        let file = write_manifest("{}");
        let manifest = read_manifest(file.path()).unwrap();
        assert_eq!(manifest.schema_or(FeatureSchema::default()).unwrap(), FeatureSchema::default());
        assert_eq!(manifest.targets_or(default_targets()).unwrap().len(), 3);
    }

    #[test]
    fn unknown_keys_and_unsafe_files_are_rejected() {
        let file = write_manifest(r#"{"shema":"standard"}"#);
        assert!(read_manifest(file.path()).is_err());

        let bad = vec![TargetSpec::new("t", "../etc/passwd")];
        assert!(validate_targets(&bad).is_err());
        let dup = vec![TargetSpec::new("t", "a.json"), TargetSpec::new("t", "b.json")];
        assert!(validate_targets(&dup).is_err());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = read_manifest(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.message().contains("Failed to open manifest"));
    }
}
