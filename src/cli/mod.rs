//! Command-line parsing for the gas-turbine prediction service.
//!
//! The goal of this module is to keep **argument parsing** separate from
//! bootstrap and serving. Most flags can also be set through the environment
//! (a `.env` file is loaded first).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data::remote::{
    DEFAULT_ATTEMPTS, DEFAULT_GITHUB_BRANCH, DEFAULT_GITHUB_REPO, DEFAULT_GITHUB_USER,
    DEFAULT_TIMEOUT_SECS,
};
use crate::domain::SchemaVariant;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "turbine", version, about = "Marine gas-turbine prediction service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load the models and serve `GET /` and `POST /predict`.
    Serve(ServeArgs),
    /// Load the models and predict once for a JSON file, without a server.
    Predict(PredictArgs),
    /// Send a prediction request to a running server and print the answer.
    Probe(ProbeArgs),
}

/// Where models come from and what they expect.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Directory holding the model artifacts (downloads are cached here).
    #[arg(long, env = "TURBINE_MODEL_DIR", default_value = ".")]
    pub model_dir: PathBuf,

    /// JSON manifest overriding the feature schema and/or target list.
    #[arg(long, env = "TURBINE_MANIFEST", value_name = "JSON")]
    pub manifest: Option<PathBuf>,

    /// Built-in feature schema (ignored when the manifest sets one).
    #[arg(long, env = "TURBINE_SCHEMA", value_enum, default_value_t = SchemaVariant::Standard)]
    pub schema: SchemaVariant,

    /// Base URL for downloading missing artifacts (defaults to GitHub raw).
    #[arg(long, env = "TURBINE_REMOTE_BASE", value_name = "URL")]
    pub remote_base: Option<String>,

    /// GitHub user for the default download location.
    #[arg(long, env = "GITHUB_USER", default_value = DEFAULT_GITHUB_USER)]
    pub github_user: String,

    /// GitHub repository for the default download location.
    #[arg(long, env = "GITHUB_REPO", default_value = DEFAULT_GITHUB_REPO)]
    pub github_repo: String,

    /// GitHub branch for the default download location.
    #[arg(long, env = "GITHUB_BRANCH", default_value = DEFAULT_GITHUB_BRANCH)]
    pub github_branch: String,

    /// Never download; only use artifacts already on disk.
    #[arg(long)]
    pub no_remote: bool,

    /// Per-request download timeout (seconds).
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub fetch_timeout: u64,

    /// Download attempts per artifact.
    #[arg(long, default_value_t = DEFAULT_ATTEMPTS)]
    pub fetch_attempts: u32,
}

/// Options for `turbine serve`.
#[derive(Debug, Args, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Address to bind.
    #[arg(long, env = "TURBINE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind.
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,
}

/// Options for `turbine predict`.
#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// JSON file with one record (object) or several (array).
    #[arg(long, value_name = "JSON")]
    pub input: PathBuf,
}

/// Options for `turbine probe`.
#[derive(Debug, Args, Clone)]
pub struct ProbeArgs {
    /// Prediction endpoint to call.
    #[arg(long, default_value = "http://localhost:5000/predict")]
    pub url: String,

    /// JSON file to send (defaults to the built-in reference record).
    #[arg(long, value_name = "JSON")]
    pub input: Option<PathBuf>,

    /// Request timeout (seconds).
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,
}
