//! Error types for the Foreman provider.

use thiserror::Error;

use crate::schema::Diagnostic;

/// Errors that can occur while serving a provider operation.
///
/// Every layer hands the first error it meets straight back to its caller;
/// nothing in the crate retries or recovers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request could not be built (bad endpoint, bad identifier).
    #[error("Request construction error: {0}")]
    RequestConstruction(String),

    /// A request body could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP round trip failed before a response was received.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Foreman answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        message: String,
    },

    /// Foreman rejected the credentials (401/403).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A response body did not have the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The requested object was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A search did not return exactly one match.
    #[error("Query error: {0}")]
    Query(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource or data source type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// Operation not supported for this object.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),
}

impl ProviderError {
    /// Get the error message as a string.
    pub fn message(&self) -> &str {
        match self {
            Self::RequestConstruction(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
            Self::Transport(_err) => "transport error (see Debug output)",
            Self::Api { message, .. } => message,
            Self::PermissionDenied(msg) => msg,
            Self::Decode(msg) => msg,
            Self::NotFound(msg) => msg,
            Self::Query(msg) => msg,
            Self::Validation(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::Unimplemented(msg) => msg,
        }
    }

    /// Whether the error means the remote object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Render the error as an error diagnostic for the host runtime.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string())
    }
}

impl From<url::ParseError> for ProviderError {
    fn from(err: url::ParseError) -> Self {
        Self::RequestConstruction(err.to_string())
    }
}
