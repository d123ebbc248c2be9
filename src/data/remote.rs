//! Remote artifact download (GitHub raw or any static file host).

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{info, warn};

use crate::data::source::{ArtifactSource, FetchError};
use crate::domain::RemoteConfig;
use crate::error::AppError;

pub const DEFAULT_GITHUB_USER: &str = "subramanyaprasad21";
pub const DEFAULT_GITHUB_REPO: &str = "marine-gas-turbine-engine-dissertation";
pub const DEFAULT_GITHUB_BRANCH: &str = "main";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Base delay between attempts; attempt `k` waits `k * BACKOFF_STEP`.
const BACKOFF_STEP: Duration = Duration::from_millis(500);

/// Raw-content base URL for a GitHub repository branch.
pub fn github_raw_base(user: &str, repo: &str, branch: &str) -> String {
    format!("https://raw.githubusercontent.com/{user}/{repo}/{branch}")
}

pub struct RemoteSource {
    client: Client,
    base_url: String,
    attempts: u32,
    backoff: Duration,
}

impl RemoteSource {
    pub fn new(config: &RemoteConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            attempts: config.attempts.max(1),
            backoff: BACKOFF_STEP,
        })
    }

    /// Override the retry backoff step.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn url_for(&self, file: &str) -> String {
        format!("{}/{}", self.base_url, file)
    }

    fn fetch_once(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self.client.get(url).send().map_err(|e| FetchError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = resp.bytes().map_err(|e| FetchError::Network {
            url: url.to_string(),
            reason: format!("failed to read body: {e}"),
        })?;
        Ok(bytes.to_vec())
    }
}

impl ArtifactSource for RemoteSource {
    fn fetch(&self, file: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.url_for(file);
        let mut attempt = 1;
        loop {
            info!(file, url = %url, attempt, "downloading artifact");
            match self.fetch_once(&url) {
                Ok(bytes) => {
                    info!(file, bytes = bytes.len(), "downloaded artifact");
                    return Ok(bytes);
                }
                Err(e) if e.is_retryable() && attempt < self.attempts => {
                    warn!(file, attempt, error = %e, "download failed, retrying");
                    thread::sleep(self.backoff * attempt);
                    attempt += 1;
                }
                Err(e) => {
                    warn!(file, attempt, error = %e, "download failed");
                    return Err(e);
                }
            }
        }
    }
}
