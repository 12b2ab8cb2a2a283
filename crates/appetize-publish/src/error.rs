//! Publish error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the publish pipeline and its components
#[derive(Debug, Error)]
pub enum PublishError {
    /// Bad platform or app path
    #[error("{0}")]
    Validation(String),

    /// No stored credential matches the configured reference
    #[error("Credential not found: {0}. Please reconfigure the Appetize.io credential reference")]
    CredentialNotFound(String),

    /// The credential store could not be queried
    #[error("Credential store unavailable: {0}")]
    CredentialStore(String),

    /// Network-level failure (DNS, refused connection, timeout, broken stream)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx response from the remote service
    #[error("{}", format_api_error(.status, .body))]
    Api { status: u16, body: Option<String> },

    /// 2xx response whose body could not be decoded
    #[error("Invalid response (status {status}): {message}")]
    InvalidResponse { status: u16, message: String },

    /// Artifact path is missing or has the wrong shape
    #[error("Could not find app in {}", .0.display())]
    ArtifactNotFound(PathBuf),

    /// Compressing the bundle failed
    #[error("Error creating zip file: {0}")]
    Packaging(String),

    /// A build record could not be encoded, decoded or stored
    #[error("Build record error: {0}")]
    Record(String),

    /// The surrounding build was cancelled
    #[error("Cancelled")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_api_error(status: &u16, body: &Option<String>) -> String {
    match body.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
        Some(body) => format!("Status {}: {}", status, body),
        None => format!("Status {}", status),
    }
}

impl From<reqwest::Error> for PublishError {
    fn from(err: reqwest::Error) -> Self {
        PublishError::Transport(err.to_string())
    }
}

/// Result type for publish operations
pub type Result<T> = std::result::Result<T, PublishError>;
