//! Status reporting for the `GET /` endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::registry::{BootstrapReport, FailureCause};

/// One target that did not load, with its cause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureDetail {
    pub target: String,
    pub file: String,
    /// `"fetch"` or `"load"`.
    pub stage: &'static str,
    pub message: String,
}

/// Body of the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub models_loaded: Vec<String>,
    pub missing_files: Vec<String>,
    pub download_errors: Vec<String>,
    pub load_errors: Vec<String>,
    pub failures: Vec<FailureDetail>,
    pub loaded_at: DateTime<Utc>,
}

impl StatusReport {
    pub fn new(report: &BootstrapReport, loaded_at: DateTime<Utc>) -> Self {
        let failures = report
            .failures
            .iter()
            .map(|f| FailureDetail {
                target: f.target.clone(),
                file: f.file.clone(),
                stage: match f.cause {
                    FailureCause::Fetch(_) => "fetch",
                    FailureCause::Load(_) => "load",
                },
                message: f.cause.to_string(),
            })
            .collect();

        Self {
            models_loaded: report.loaded.clone(),
            missing_files: report.missing_files(),
            download_errors: report.download_errors(),
            load_errors: report.load_errors(),
            failures,
            loaded_at,
        }
    }

    /// Healthy means every configured target loaded.
    pub fn is_healthy(&self) -> bool {
        self.failures.is_empty()
    }
}
