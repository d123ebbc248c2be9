//! Shared startup logic used by both `serve` and `predict`.
//!
//! Keeping this in one place avoids duplicating the startup workflow:
//! flags/env/manifest -> artifact source -> registry bootstrap -> dispatcher
//!
//! The front-ends can then focus on what they do with the dispatcher.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::cli::ModelArgs;
use crate::data::remote::github_raw_base;
use crate::data::{ArtifactSource, CachedSource, LocalDir, RemoteSource};
use crate::dispatch::Dispatcher;
use crate::domain::{FeatureSchema, ModelConfig, RemoteConfig, default_targets};
use crate::error::AppError;
use crate::io::{Manifest, read_manifest};
use crate::registry::bootstrap;
use crate::report::StatusReport;

/// Everything produced by a bootstrap.
#[derive(Debug, Clone)]
pub struct Bootstrapped {
    pub dispatcher: Dispatcher,
    pub status: StatusReport,
}

/// Resolve CLI flags (with env fallbacks) and the optional manifest.
pub fn model_config_from_args(args: &ModelArgs) -> Result<ModelConfig, AppError> {
    let manifest = match &args.manifest {
        Some(path) => read_manifest(path)?,
        None => Manifest::default(),
    };

    let schema = manifest.schema_or(FeatureSchema::from_variant(args.schema))?;
    let targets = manifest.targets_or(default_targets())?;

    let remote = if args.no_remote {
        None
    } else {
        if args.fetch_attempts == 0 {
            return Err(AppError::config("--fetch-attempts must be at least 1."));
        }
        let base_url = args.remote_base.clone().unwrap_or_else(|| {
            github_raw_base(&args.github_user, &args.github_repo, &args.github_branch)
        });
        Some(RemoteConfig {
            base_url,
            timeout: Duration::from_secs(args.fetch_timeout),
            attempts: args.fetch_attempts,
        })
    };

    Ok(ModelConfig {
        model_dir: args.model_dir.clone(),
        schema,
        targets,
        remote,
    })
}

/// Build the artifact source for `config`.
pub fn artifact_source(config: &ModelConfig) -> Result<CachedSource, AppError> {
    let remote: Option<Box<dyn ArtifactSource>> = match &config.remote {
        Some(remote) => Some(Box::new(RemoteSource::new(remote)?)),
        None => None,
    };
    Ok(CachedSource::new(LocalDir::new(&config.model_dir), remote))
}

/// Load every configured target and wrap the result in a dispatcher.
///
/// Never fails because of a missing or broken artifact; those end up in the
/// status report. Only configuration problems are errors.
pub fn load_models(config: &ModelConfig) -> Result<Bootstrapped, AppError> {
    let source = artifact_source(config)?;
    load_models_from(&source, config)
}

/// Same as `load_models`, with an explicit source.
pub fn load_models_from(
    source: &CachedSource,
    config: &ModelConfig,
) -> Result<Bootstrapped, AppError> {
    info!(
        model_dir = %source.local().dir().display(),
        targets = config.targets.len(),
        columns = config.schema.len(),
        remote = config.remote.as_ref().map(|r| r.base_url.as_str()).unwrap_or("disabled"),
        "loading models"
    );
    for name in source.local().list_files() {
        debug!(file = %name, "model directory entry");
    }

    let (registry, report) = bootstrap(source, &config.schema, &config.targets);
    let status = StatusReport::new(&report, Utc::now());
    let dispatcher = Dispatcher::new(registry, config.schema.clone(), report);
    Ok(Bootstrapped { dispatcher, status })
}
