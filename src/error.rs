//! Process-level error type.
//!
//! Everything that ends the `turbine` binary (bad configuration, unreadable
//! input, a server that fails to bind) is reported as an `AppError`. Request
//! handling has its own error type (`dispatch::PredictError`) because those
//! failures are answered over HTTP and never end the process.

/// Configuration or local IO problem (bad manifest, unreadable file, bad flag).
pub const EXIT_CONFIG: u8 = 2;
/// The input handed to `predict`/`probe` was rejected (HTTP 4xx equivalent).
pub const EXIT_INPUT: u8 = 3;
/// Runtime failure: server error, network error, bind failure.
pub const EXIT_RUNTIME: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(EXIT_RUNTIME, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
