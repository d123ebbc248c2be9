//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - bootstraps the model registry
//! - serves HTTP, predicts once, or probes a running server

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use reqwest::blocking::Client;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Command, PredictArgs, ProbeArgs, ServeArgs};
use crate::error::{AppError, EXIT_INPUT, EXIT_RUNTIME};

pub mod bootstrap;

/// Entry point for the `turbine` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` must be loaded before clap reads env fallbacks.
    dotenvy::dotenv().ok();
    init_logging();

    // We want a bare `turbine` (or `turbine --port 8080`) to behave like
    // `turbine serve ...`, the way the service is usually launched.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Serve(args) => handle_serve(args),
        Command::Predict(args) => handle_predict(args),
        Command::Probe(args) => handle_probe(args),
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn handle_serve(args: ServeArgs) -> Result<(), AppError> {
    let host: IpAddr = args
        .host
        .parse()
        .map_err(|e| AppError::config(format!("Invalid --host '{}': {e}", args.host)))?;
    let addr = SocketAddr::new(host, args.port);

    let config = bootstrap::model_config_from_args(&args.model)?;
    let loaded = bootstrap::load_models(&config)?;

    info!(
        loaded = ?loaded.status.models_loaded,
        missing = ?loaded.status.missing_files,
        "starting server"
    );
    let state = crate::server::AppState::new(loaded.dispatcher, loaded.status);
    crate::server::run(addr, state)
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let body = crate::io::read_records_json(&args.input)?;
    let config = bootstrap::model_config_from_args(&args.model)?;
    let loaded = bootstrap::load_models(&config)?;

    match loaded.dispatcher.predict(&body) {
        Ok(response) => {
            println!("{}", to_pretty(&response)?);
            Ok(())
        }
        Err(e) => {
            let code = if e.is_client_error() { EXIT_INPUT } else { EXIT_RUNTIME };
            Err(AppError::new(code, e.to_string()))
        }
    }
}

fn handle_probe(args: ProbeArgs) -> Result<(), AppError> {
    let body = match &args.input {
        Some(path) => crate::io::read_records_json(path)?,
        None => crate::data::sample_record(),
    };

    let client = Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()
        .map_err(|e| AppError::config(format!("Failed to build HTTP client: {e}")))?;

    let resp = client
        .post(&args.url)
        .json(&body)
        .send()
        .map_err(|e| AppError::runtime(format!("Request to {} failed: {e}", args.url)))?;

    let status = resp.status();
    let text = resp
        .text()
        .map_err(|e| AppError::runtime(format!("Failed to read response body: {e}")))?;

    println!("Status {}", status.as_u16());
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(json) => println!("{}", to_pretty(&json)?),
        Err(_) => println!("{text}"),
    }

    if status.is_client_error() {
        return Err(AppError::new(EXIT_INPUT, format!("Server rejected the request ({status}).")));
    }
    if !status.is_success() {
        return Err(AppError::runtime(format!("Server answered {status}.")));
    }
    Ok(())
}

fn to_pretty<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::runtime(format!("Failed to encode JSON: {e}")))
}

/// Rewrite argv so `turbine` defaults to `turbine serve`.
///
/// Rules:
/// - `turbine`                        -> `turbine serve`
/// - `turbine --port 8080 ...`        -> `turbine serve --port 8080 ...`
/// - `turbine --help/--version/-h`    -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("serve".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "serve" | "predict" | "probe");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "serve flags".
    if arg1.starts_with('-') {
        argv.insert(1, "serve".to_string());
        return argv;
    }

    // Otherwise, leave as-is and let clap report it.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_serves() {
        assert_eq!(rewrite_args(argv(&["turbine"])), argv(&["turbine", "serve"]));
    }

    #[test]
    fn leading_flags_are_serve_flags() {
        assert_eq!(
            rewrite_args(argv(&["turbine", "--port", "8080"])),
            argv(&["turbine", "serve", "--port", "8080"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        assert_eq!(
            rewrite_args(argv(&["turbine", "probe"])),
            argv(&["turbine", "probe"])
        );
        assert_eq!(rewrite_args(argv(&["turbine", "-h"])), argv(&["turbine", "-h"]));
    }
}
