//! Error types for uplink selection and network model validation.
//!
//! All errors implement `std::error::Error` via `thiserror`. Nothing in this
//! crate panics on caller input; every failure is reported through
//! [`UplinkResult`].

use std::io;
use thiserror::Error;
use uplink_types::ParseError;

/// Result type alias for uplink manager operations.
pub type UplinkResult<T> = Result<T, UplinkError>;

/// Errors that can occur while classifying, selecting or validating.
#[derive(Debug, Error)]
pub enum UplinkError {
    /// A lookup (port, address owner, network) found no match.
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// What was looked up (e.g., "port", "network").
        kind: &'static str,
        /// The name or key that did not match.
        name: String,
    },

    /// The eligible address set for a selection was empty.
    #[error("No address available: {detail}")]
    NoAddressAvailable {
        /// The filter that produced the empty set.
        detail: String,
    },

    /// Malformed input from the configuration pipeline.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// The field or entity that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// A primitive (address, prefix, MAC) failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Reading a snapshot file failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// The file being read.
        path: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A snapshot document did not decode.
    #[error("Failed to decode {what}: {source}")]
    Json {
        /// The document being decoded.
        what: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

impl UplinkError {
    /// Creates a not-found error.
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Creates a no-address-available error.
    pub fn no_address(detail: impl Into<String>) -> Self {
        Self::NoAddressAvailable {
            detail: detail.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns true if a later snapshot or a different filter may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UplinkError::NoAddressAvailable { .. } | UplinkError::NotFound { .. }
        )
    }

    /// Returns true for malformed-input rejections.
    pub fn is_validation(&self) -> bool {
        matches!(self, UplinkError::Validation { .. } | UplinkError::Parse(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = UplinkError::not_found("port", "wlan0");
        assert_eq!(err.to_string(), "port 'wlan0' not found");
    }

    #[test]
    fn test_validation_error() {
        let err = UplinkError::validation("ACE", "no actions");
        assert_eq!(err.to_string(), "Invalid ACE: no actions");
        assert!(err.is_validation());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_parse_error_conversion() {
        let parse: UplinkResult<uplink_types::IpAddress> =
            "not-an-ip".parse().map_err(UplinkError::from);
        let err = parse.unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("not-an-ip"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(UplinkError::no_address("free management ports").is_retryable());
        assert!(UplinkError::not_found("port", "eth9").is_retryable());
        assert!(!UplinkError::validation("port", "duplicate").is_retryable());
    }
}
