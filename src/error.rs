//! Error types for the facetstate library.
//!
//! All fallible operations return [`FacetStateError`] through the crate-wide
//! [`Result`] alias. Failures that happen while a request is in flight
//! (transport, malformed payloads, timeouts) never reach the caller of an
//! action; they are converted into an [`ErrorInfo`](crate::store::ErrorInfo)
//! and published on the store's snapshot instead.
//!
//! # Examples
//!
//! ```
//! use facetstate::error::{FacetStateError, Result};
//!
//! fn check_rows(rows: usize) -> Result<usize> {
//!     if rows == 0 {
//!         return Err(FacetStateError::configuration("rows must be at least 1"));
//!     }
//!     Ok(rows)
//! }
//!
//! assert!(check_rows(0).is_err());
//! assert_eq!(check_rows(20).unwrap(), 20);
//! ```

use std::io;

use thiserror::Error;

/// The main error type for facetstate operations.
#[derive(Error, Debug)]
pub enum FacetStateError {
    /// Invalid controller configuration given to `init`.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The index request failed to complete.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The index answered with a payload that could not be normalized.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// No answer arrived before the timeout policy expired the request.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// An action that does not fit the current query model.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// I/O errors (reading config or document files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with FacetStateError.
pub type Result<T> = std::result::Result<T, FacetStateError>;

impl FacetStateError {
    /// Create a new configuration error.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        FacetStateError::Configuration(msg.into())
    }

    /// Create a new transport error.
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        FacetStateError::Transport(msg.into())
    }

    /// Create a new malformed response error.
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        FacetStateError::MalformedResponse(msg.into())
    }

    /// Create a new timeout error.
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        FacetStateError::Timeout(msg.into())
    }

    /// Create a new invalid action error.
    pub fn invalid_action<S: Into<String>>(msg: S) -> Self {
        FacetStateError::InvalidAction(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        FacetStateError::Other(msg.into())
    }

    /// Whether this error was raised by configuration validation.
    pub fn is_configuration(&self) -> bool {
        matches!(self, FacetStateError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = FacetStateError::configuration("rows must be at least 1");
        assert_eq!(
            error.to_string(),
            "Configuration error: rows must be at least 1"
        );
        assert!(error.is_configuration());

        let error = FacetStateError::malformed("numFound missing");
        assert_eq!(error.to_string(), "Malformed response: numFound missing");
        assert!(!error.is_configuration());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        match FacetStateError::from(json_error) {
            FacetStateError::Json(_) => {}
            other => panic!("Expected JSON error variant, got {other:?}"),
        }
    }

    #[test]
    fn test_anyhow_error_conversion() {
        let error = FacetStateError::from(anyhow::anyhow!("connection refused"));
        assert!(error.to_string().contains("connection refused"));
    }
}
