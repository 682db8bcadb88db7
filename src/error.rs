//! Error types for dpres-dl
//!
//! This module provides the error taxonomy for the library:
//! - Configuration faults detected before any network call
//! - Authentication and session faults
//! - Transient transport faults (retried internally with backoff)
//! - Local-storage and data-integrity faults during download

use thiserror::Error;

/// Result type alias for dpres-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dpres-dl
///
/// Each variant includes contextual information to help diagnose issues.
/// Transient variants are retried at the lowest layer that detects them
/// (see [`crate::retry`]); everything else propagates unchanged to the
/// caller, which owns presentation (printing, exit codes).
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    ///
    /// Always raised before any network call and always fatal to the run.
    #[error("configuration error: {message}")]
    Validation {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "tenant")
        key: Option<String>,
    },

    /// Credentials rejected, login target unreachable, or session lost
    ///
    /// A session whose token renewal failed stays in this state: every
    /// subsequent call fails with this variant without touching the network.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Transport-level network error
    ///
    /// Retryable when the underlying fault is a timeout, a connection
    /// failure, or a 5xx/429 response status; permanent otherwise
    /// (e.g., a malformed response body).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Entity reference no longer resolves (e.g., concurrent deletion)
    ///
    /// Surfaced to the caller; a traversal consumer may treat it as
    /// skippable or fatal at its own discretion.
    #[error("entity not found: {0}")]
    NotFound(String),

    /// Bitstream interrupted mid-download
    ///
    /// Retryable: the partial temporary file is discarded before the next
    /// attempt starts from scratch.
    #[error("remote read error: {0}")]
    RemoteRead(String),

    /// Local storage failure while writing a download
    ///
    /// Never retried; surfaced immediately.
    #[error("I/O write error: {0}")]
    IoWrite(#[from] std::io::Error),

    /// Transferred byte count does not match the server-declared length
    ///
    /// The partial temporary file is discarded; never retried.
    #[error("integrity error: expected {expected} bytes, wrote {actual}")]
    Integrity {
        /// Byte count declared by the server
        expected: u64,
        /// Byte count actually transferred
        actual: u64,
    },

    /// Unrecoverable remote state during traversal
    ///
    /// Raised when the traversal root or a previously-listed folder no
    /// longer resolves. Aborts the stream at the point of failure,
    /// preserving items already yielded.
    #[error("traversal error: {0}")]
    Traversal(String),
}

impl Error {
    /// Build a [`Error::Validation`] for a specific configuration key
    pub(crate) fn validation(key: &str, message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_includes_message() {
        let err = Error::validation("tenant", "tenant must not be empty");
        assert_eq!(
            err.to_string(),
            "configuration error: tenant must not be empty"
        );
        match err {
            Error::Validation { key, .. } => assert_eq!(key.as_deref(), Some("tenant")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn integrity_display_reports_both_counts() {
        let err = Error::Integrity {
            expected: 100,
            actual: 42,
        };
        assert_eq!(
            err.to_string(),
            "integrity error: expected 100 bytes, wrote 42"
        );
    }

    #[test]
    fn io_error_converts_to_io_write() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(matches!(err, Error::IoWrite(_)));
    }
}
