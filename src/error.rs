//! Error types for seance-archive.

use std::io;
use thiserror::Error;

/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in archive operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage I/O error.
    #[error("Storage error: {0}")]
    Storage(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Date or HTML shape not recognized.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Request exceeded the configured timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Http {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// Connection or transfer failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Session not found in the store.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// The store could not be written.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error came from the network layer.
    ///
    /// Transport failures are recorded per page or per file and never abort a run.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Http { .. } | Self::Network(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_classified() {
        assert!(Error::Timeout("https://example.org".to_string()).is_transport());
        assert!(
            Error::Http {
                url: "https://example.org".to_string(),
                status: 503,
            }
            .is_transport()
        );
        assert!(Error::Network("reset".to_string()).is_transport());
        assert!(!Error::Parse("bad".to_string()).is_transport());
        assert!(!Error::SessionNotFound("x".to_string()).is_transport());
    }

    #[test]
    fn http_error_display_includes_status() {
        let err = Error::Http {
            url: "https://example.org/a".to_string(),
            status: 404,
        };
        assert_eq!(err.to_string(), "HTTP 404 for https://example.org/a");
    }
}
