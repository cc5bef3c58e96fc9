//! Audit error types and exit-code mapping

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Why a diagnostics endpoint produced no usable payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Server answered with a non-2xx status
    Status(u16),
    /// Request exceeded the fixed timeout
    Timeout,
    /// Connection refused, DNS failure, reset, ...
    Network(String),
    /// Body was not the expected JSON document
    Decode(String),
    /// Body was valid JSON but carried no data
    Empty,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Status(code) => write!(f, "HTTP status {}", code),
            FetchFailure::Timeout => write!(f, "request timed out"),
            FetchFailure::Network(msg) => write!(f, "network error: {}", msg),
            FetchFailure::Decode(msg) => write!(f, "invalid JSON body: {}", msg),
            FetchFailure::Empty => write!(f, "empty payload"),
        }
    }
}

impl From<reqwest::Error> for FetchFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchFailure::Timeout
        } else if err.is_decode() {
            FetchFailure::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            FetchFailure::Status(status.as_u16())
        } else {
            FetchFailure::Network(err.to_string())
        }
    }
}

/// Audit run error types
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: FetchFailure },

    #[error("Unexpected payload shape from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write report {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Console output failed: {0}")]
    Console(#[from] std::io::Error),

    #[error("Interrupted by user")]
    Interrupted,
}

impl AuditError {
    /// Process exit status for this failure
    pub fn exit_code(&self) -> u8 {
        match self {
            AuditError::Interrupted => 130,
            _ => 1,
        }
    }
}

/// Result type alias using AuditError
pub type Result<T> = std::result::Result<T, AuditError>;
