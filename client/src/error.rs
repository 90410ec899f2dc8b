//! Error types for backend communication and site configuration.

use thiserror::Error;

/// Errors from talking to the metadata backend.
///
/// HTTP status codes are folded into the variants the dispatcher cares
/// about; anything else surfaces as [`Api`](BackendError::Api) with the
/// message extracted from the response body.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure (connection refused, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Credentials rejected (HTTP 401).
    #[error("authentication failed: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (HTTP 403).
    #[error("permission denied: {0}")]
    Forbidden(String),

    /// Resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Resource already exists (HTTP 409).
    #[error("already exists: {0}")]
    Conflict(String),

    /// Any other non-success response.
    #[error("backend error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape.
    #[error("unexpected response shape: {0}")]
    UnexpectedResponse(String),
}

/// Errors from loading or validating a site profile.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The referenced profile file does not exist.
    #[error("site profile not found at {0}")]
    ProfileNotFound(String),

    /// A required setting is empty after file load and env overrides.
    #[error("site profile is missing {0}; set it in the profile file or via {1}")]
    MissingValue(&'static str, &'static str),
}
