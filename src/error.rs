//! Error types for the capture pipeline.
//!
//! None of these terminate the process. The handler logs them and keeps
//! answering the caller; only upstream failures change the response status.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while dispatching and capturing a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The inbound body could not be read to completion.
    #[error("failed to read request body: {0}")]
    Parse(#[source] axum::Error),

    /// The outbound request could not be constructed.
    #[error("failed to build upstream request: {0}")]
    ProxyBuild(String),

    /// The upstream call failed before a response was obtained.
    #[error("upstream request failed: {0}")]
    ProxyCall(#[source] reqwest::Error),

    /// The upstream HTTP client could not be created.
    #[error("failed to initialize upstream client: {0}")]
    ClientInit(#[source] reqwest::Error),

    /// Opening or writing a payload file failed.
    #[error("failed to write payload to {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The payload was only partially written.
    #[error("short write to {}: wrote {written} of {expected} bytes", .path.display())]
    ShortWrite {
        path: PathBuf,
        written: usize,
        expected: usize,
    },

    /// A payload could not be encoded as JSON.
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl DispatchError {
    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Parse(_) => "parse",
            DispatchError::ProxyBuild(_) => "proxy_build",
            DispatchError::ProxyCall(_) => "proxy_call",
            DispatchError::ClientInit(_) => "client_init",
            DispatchError::Persistence { .. } | DispatchError::ShortWrite { .. } => "persistence",
            DispatchError::Serialize(_) => "serialize",
        }
    }
}
