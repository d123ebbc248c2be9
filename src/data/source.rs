//! Artifact sources: where model bytes come from.
//!
//! - `LocalDir` reads `<dir>/<file>`
//! - `RemoteSource` (see `remote`) downloads `<base_url>/<file>`
//! - `CachedSource` tries local first, then downloads; once the caller has
//!   accepted the bytes (`commit`) they are written back to the local
//!   directory so the next start is offline

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

/// Why an artifact could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Not present locally and no remote configured.
    NotFound { location: String },
    /// Local read failed for another reason.
    Io { location: String, reason: String },
    /// Remote answered with a non-success status.
    Http { url: String, status: u16 },
    /// Remote could not be reached (connect error, timeout, broken body).
    Network { url: String, reason: String },
}

impl FetchError {
    /// True when the failure happened while downloading.
    pub fn is_remote(&self) -> bool {
        matches!(self, FetchError::Http { .. } | FetchError::Network { .. })
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network { .. } => true,
            FetchError::Http { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            FetchError::NotFound { .. } | FetchError::Io { .. } => false,
        }
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::NotFound { location } => write!(f, "{location} not found"),
            FetchError::Io { location, reason } => write!(f, "failed to read {location}: {reason}"),
            FetchError::Http { url, status } => {
                write!(f, "download of {url} failed: HTTP {status}")
            }
            FetchError::Network { url, reason } => write!(f, "download of {url} failed: {reason}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Supplies raw artifact bytes for a logical file name.
pub trait ArtifactSource {
    fn fetch(&self, file: &str) -> Result<Vec<u8>, FetchError>;

    /// Called once fetched bytes turned out to be usable.
    fn commit(&self, _file: &str, _bytes: &[u8]) {}
}

/// Artifacts stored in a local directory.
#[derive(Debug, Clone)]
pub struct LocalDir {
    dir: PathBuf,
}

impl LocalDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Sorted file names in the directory (empty if it cannot be read).
    pub fn list_files(&self) -> Vec<String> {
        let mut names: Vec<String> = match fs::read_dir(&self.dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    /// Write bytes to `<dir>/<file>`, creating the directory if needed.
    pub fn store(&self, file: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(file);
        fs::write(&path, bytes)?;
        Ok(path)
    }
}

impl ArtifactSource for LocalDir {
    fn fetch(&self, file: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.path_for(file);
        match fs::read(&path) {
            Ok(bytes) => {
                debug!(path = %path.display(), bytes = bytes.len(), "read local artifact");
                Ok(bytes)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(FetchError::NotFound {
                location: path.display().to_string(),
            }),
            Err(e) => Err(FetchError::Io {
                location: path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Local directory backed by an optional remote.
pub struct CachedSource {
    local: LocalDir,
    remote: Option<Box<dyn ArtifactSource>>,
}

impl CachedSource {
    pub fn new(local: LocalDir, remote: Option<Box<dyn ArtifactSource>>) -> Self {
        Self { local, remote }
    }

    pub fn local(&self) -> &LocalDir {
        &self.local
    }
}

impl ArtifactSource for CachedSource {
    fn fetch(&self, file: &str) -> Result<Vec<u8>, FetchError> {
        let not_found = match self.local.fetch(file) {
            Ok(bytes) => {
                info!(file, "found artifact locally");
                return Ok(bytes);
            }
            Err(e @ FetchError::NotFound { .. }) => e,
            Err(e) => return Err(e),
        };

        let Some(remote) = &self.remote else {
            return Err(not_found);
        };

        info!(file, "artifact not found locally, fetching from remote");
        remote.fetch(file)
    }

    /// Cache downloaded bytes; a file already on disk is left alone.
    fn commit(&self, file: &str, bytes: &[u8]) {
        if self.remote.is_none() || self.local.path_for(file).exists() {
            return;
        }
        // A failed cache write only costs a re-download on the next start.
        match self.local.store(file, bytes) {
            Ok(path) => info!(file, path = %path.display(), "cached downloaded artifact"),
            Err(e) => warn!(file, error = %e, "failed to cache downloaded artifact"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct FixedRemote {
        result: Result<Vec<u8>, FetchError>,
    }

    impl ArtifactSource for FixedRemote {
        fn fetch(&self, _file: &str) -> Result<Vec<u8>, FetchError> {
            self.result.clone()
        }
    }

    #[test]
    fn local_dir_reports_not_found() {
        let tmp = TempDir::new().unwrap();
        let local = LocalDir::new(tmp.path());
        let err = local.fetch("nope.json").unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }));
        assert!(!err.is_remote());
    }

    #[test]
    fn cached_source_prefers_local() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("m.json"), b"local").unwrap();
        let source = CachedSource::new(LocalDir::new(tmp.path()), None);
        assert_eq!(source.fetch("m.json").unwrap(), b"local");
    }

    #[test]
    fn cached_source_downloads_and_stores() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("models");
        let source = CachedSource::new(
            LocalDir::new(&dir),
            Some(Box::new(FixedRemote {
                result: Ok(b"remote".to_vec()),
            })),
        );
        let bytes = source.fetch("m.json").unwrap();
        assert_eq!(bytes, b"remote");
        assert!(!dir.join("m.json").exists());

        source.commit("m.json", &bytes);
        assert_eq!(std::fs::read(dir.join("m.json")).unwrap(), b"remote");
        assert_eq!(source.local().list_files(), vec!["m.json".to_string()]);
    }

    #[test]
    fn commit_never_overwrites_local_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("m.json"), b"local").unwrap();
        let source = CachedSource::new(
            LocalDir::new(tmp.path()),
            Some(Box::new(FixedRemote {
                result: Ok(b"remote".to_vec()),
            })),
        );
        source.commit("m.json", b"remote");
        assert_eq!(std::fs::read(tmp.path().join("m.json")).unwrap(), b"local");
    }

    #[test]
    fn cached_source_surfaces_remote_failure() {
        let tmp = TempDir::new().unwrap();
        let source = CachedSource::new(
            LocalDir::new(tmp.path()),
            Some(Box::new(FixedRemote {
                result: Err(FetchError::Http {
                    url: "http://host/m.json".into(),
                    status: 404,
                }),
            })),
        );
        let err = source.fetch("m.json").unwrap_err();
        assert!(err.is_remote());
        assert!(!err.is_retryable());
        assert!(!tmp.path().join("m.json").exists());
    }

    #[test]
    fn retryable_statuses() {
        let http = |status| FetchError::Http {
            url: "u".into(),
            status,
        };
        assert!(http(503).is_retryable());
        assert!(http(429).is_retryable());
        assert!(!http(404).is_retryable());
        assert!(!http(403).is_retryable());
    }
}
