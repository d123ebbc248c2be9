//! Model registry and its one-time bootstrap.
//!
//! The registry maps target names to loaded regressors. It is built once,
//! before the server starts, and shared read-only afterwards. Bootstrap never
//! fails as a whole: each target either loads or is recorded as a failure in
//! the `BootstrapReport`, and the registry simply omits it.

use tracing::{debug, error, info, warn};

use crate::data::{ArtifactSource, FetchError};
use crate::domain::{FeatureSchema, TargetSpec};
use crate::models::{ModelError, Regressor, decode_model};

/// Loaded models, in configured target order.
#[derive(Default)]
pub struct ModelRegistry {
    models: Vec<(String, Box<dyn Regressor>)>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a model under `target`, replacing any previous model of that name.
    pub fn with_model(mut self, target: impl Into<String>, model: Box<dyn Regressor>) -> Self {
        let target = target.into();
        self.models.retain(|(name, _)| *name != target);
        self.models.push((target, model));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Regressor)> {
        self.models.iter().map(|(name, model)| (name.as_str(), model.as_ref()))
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.models.iter().map(|(name, model)| (name, model.kind())))
            .finish()
    }
}

/// Why a target did not load.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureCause {
    /// The artifact bytes could not be obtained.
    Fetch(FetchError),
    /// The bytes were obtained but are not a usable model.
    Load(ModelError),
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureCause::Fetch(e) => write!(f, "{e}"),
            FailureCause::Load(e) => write!(f, "{e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadFailure {
    pub target: String,
    pub file: String,
    pub cause: FailureCause,
}

/// Outcome of the bootstrap, kept for the status endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BootstrapReport {
    pub loaded: Vec<String>,
    pub failures: Vec<LoadFailure>,
}

impl BootstrapReport {
    /// Artifacts that could not be obtained at all.
    pub fn missing_files(&self) -> Vec<String> {
        self.failures
            .iter()
            .filter(|f| matches!(f.cause, FailureCause::Fetch(_)))
            .map(|f| f.file.clone())
            .collect()
    }

    /// Artifacts whose download was attempted and failed.
    pub fn download_errors(&self) -> Vec<String> {
        self.failures
            .iter()
            .filter(|f| matches!(&f.cause, FailureCause::Fetch(e) if e.is_remote()))
            .map(|f| f.file.clone())
            .collect()
    }

    /// Artifacts that were obtained but failed to decode or validate.
    pub fn load_errors(&self) -> Vec<String> {
        self.failures
            .iter()
            .filter(|f| matches!(f.cause, FailureCause::Load(_)))
            .map(|f| f.file.clone())
            .collect()
    }
}

/// Load every target sequentially from `source`.
pub fn bootstrap(
    source: &dyn ArtifactSource,
    schema: &FeatureSchema,
    targets: &[TargetSpec],
) -> (ModelRegistry, BootstrapReport) {
    let mut registry = ModelRegistry::new();
    let mut report = BootstrapReport::default();

    for spec in targets {
        match load_target(source, schema, spec) {
            Ok(model) => {
                info!(
                    target_name = %spec.name,
                    file = %spec.file,
                    kind = model.kind(),
                    "loaded model"
                );
                registry = registry.with_model(spec.name.clone(), model);
                report.loaded.push(spec.name.clone());
            }
            Err(cause) => {
                match &cause {
                    FailureCause::Fetch(e) => warn!(
                        target_name = %spec.name,
                        file = %spec.file,
                        error = %e,
                        "model artifact unavailable"
                    ),
                    FailureCause::Load(e) => error!(
                        target_name = %spec.name,
                        file = %spec.file,
                        error = %e,
                        "failed to load model"
                    ),
                }
                report.failures.push(LoadFailure {
                    target: spec.name.clone(),
                    file: spec.file.clone(),
                    cause,
                });
            }
        }
    }

    if registry.is_empty() {
        error!(targets = targets.len(), "no models loaded; /predict will answer 500");
    } else {
        info!(
            loaded = report.loaded.len(),
            failed = report.failures.len(),
            "model bootstrap complete"
        );
    }
    debug!(registry = ?registry, "registry contents");

    (registry, report)
}

fn load_target(
    source: &dyn ArtifactSource,
    schema: &FeatureSchema,
    spec: &TargetSpec,
) -> Result<Box<dyn Regressor>, FailureCause> {
    let bytes = source.fetch(&spec.file).map_err(FailureCause::Fetch)?;
    let model = decode_model(&bytes, schema).map_err(FailureCause::Load)?;
    source.commit(&spec.file, &bytes);
    Ok(model)
}
